//! Notes repository: cache-first reads, write-through mutations, and
//! offline write queueing.

mod pending;

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::task::TaskTracker;

use crate::cache::NoteCache;
use crate::models::{
    validate_file_path, CreateNoteParams, Note, PendingOperation, UpdateNoteParams,
};
use crate::network::NetworkDataSource;
use crate::util::unix_millis_now;
use crate::{Error, Result};

use pending::PendingQueue;

/// Outcome of one `sync_pending_operations` pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Operations replayed and removed from the queue by this pass
    pub replayed: usize,
    /// Operations still queued when the pass finished
    pub remaining: usize,
}

/// Mediates between the remote note service and the local cache.
///
/// Reads answer from the cache when they can and refresh it in the
/// background. Writes go to the network first; a write that fails for
/// connectivity reasons is queued for FIFO replay and the failure is still
/// returned to the caller. Cloning shares the same cache, queue, and
/// background tasks.
pub struct NotesRepository<N, C> {
    inner: Arc<Inner<N, C>>,
}

struct Inner<N, C> {
    network: N,
    cache: Arc<C>,
    queue: PendingQueue,
    sync_lock: Mutex<()>,
    tasks: TaskTracker,
}

impl<N, C> Clone for NotesRepository<N, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<N: NetworkDataSource, C: NoteCache> NotesRepository<N, C> {
    pub fn new(network: N, cache: C) -> Self {
        Self {
            inner: Arc::new(Inner {
                network,
                cache: Arc::new(cache),
                queue: PendingQueue::default(),
                sync_lock: Mutex::new(()),
                tasks: TaskTracker::new(),
            }),
        }
    }

    /// Create a note remotely and cache the server's copy.
    ///
    /// On a connectivity failure the create is queued, a local placeholder
    /// is cached, and the failure is returned.
    pub async fn create_note(&self, params: CreateNoteParams) -> Result<Note> {
        validate_file_path(&params.file_path)?;

        match self.push_create(&params).await {
            Ok(note) => Ok(note),
            Err(error) if error.is_connectivity() => {
                tracing::warn!(path = %params.file_path, "Create queued for later sync: {}", error);
                let placeholder = Note::placeholder(&params, unix_millis_now());
                self.inner
                    .queue
                    .push(PendingOperation::Create(params))
                    .await;
                self.cache_note(placeholder).await;
                Err(error)
            }
            Err(error) => Err(error),
        }
    }

    /// Return the cached note immediately and refresh it in the background,
    /// or fetch it from the network when nothing is cached.
    pub async fn get_note(&self, file_path: &str) -> Result<Note> {
        validate_file_path(file_path)?;

        let path = file_path.to_string();
        let cached = self.read_cache(move |cache| cache.get_note(&path)).await;
        if let Some(note) = cached.flatten() {
            self.spawn_note_refresh(file_path.to_string());
            return Ok(note);
        }

        let note = self.inner.network.get_note(file_path).await?;
        self.cache_note(note.clone()).await;
        Ok(note)
    }

    /// Notes under `path` (a path prefix; empty lists everything), served
    /// the same cache-first way as `get_note`.
    pub async fn list_notes(&self, path: &str) -> Result<Vec<Note>> {
        let prefix = path.to_string();
        let cached = self
            .read_cache(move |cache| cache.list_notes(&prefix))
            .await
            .unwrap_or_default();
        if !cached.is_empty() {
            self.spawn_list_refresh(path.to_string());
            return Ok(cached);
        }

        let notes = self.inner.network.list_notes(path).await?;
        self.cache_notes(notes.clone()).await;
        Ok(notes)
    }

    /// Update a note remotely, then cache the refetched full note.
    ///
    /// On a connectivity failure of either the update or the refetch, the
    /// update is queued, the cached copy (if any) gets the new fields, and
    /// the failure is returned.
    pub async fn update_note(&self, params: UpdateNoteParams) -> Result<Note> {
        validate_file_path(&params.file_path)?;
        if params.is_empty() {
            return Err(Error::InvalidInput(
                "update must change the title or the content".into(),
            ));
        }

        match self.push_update(&params).await {
            Ok(note) => Ok(note),
            Err(error) if error.is_connectivity() => {
                tracing::warn!(path = %params.file_path, "Update queued for later sync: {}", error);
                let path = params.file_path.clone();
                let cached = self
                    .read_cache(move |cache| cache.get_note(&path))
                    .await
                    .flatten();
                let placeholder = cached.map(|note| note.with_update(&params, unix_millis_now()));
                self.inner
                    .queue
                    .push(PendingOperation::Update(params))
                    .await;
                if let Some(placeholder) = placeholder {
                    self.cache_note(placeholder).await;
                }
                Err(error)
            }
            Err(error) => Err(error),
        }
    }

    /// Delete a note remotely, then drop it from the cache. Failures are
    /// returned as-is; deletes are never queued.
    pub async fn delete_note(&self, file_path: &str) -> Result<()> {
        validate_file_path(file_path)?;

        self.inner.network.delete_note(file_path).await?;
        let path = file_path.to_string();
        self.with_cache(move |cache| cache.delete_note(&path))
            .await?;
        tracing::debug!(path = %file_path, "Deleted note");
        Ok(())
    }

    /// Point-in-time copy of the queue, oldest first.
    pub async fn pending_operations(&self) -> Vec<PendingOperation> {
        self.inner.queue.operations().await
    }

    pub async fn pending_operation_count(&self) -> usize {
        self.inner.queue.len().await
    }

    /// Replay queued writes in FIFO order.
    ///
    /// Each operation leaves the queue as soon as its own replay succeeds.
    /// The first failure stops the pass, keeps it and everything after it
    /// queued, and is returned. Passes never overlap; a second caller waits
    /// for the running pass and then replays whatever is left.
    pub async fn sync_pending_operations(&self) -> Result<SyncReport> {
        let _pass = self.inner.sync_lock.lock().await;

        let snapshot = self.inner.queue.snapshot().await;
        if snapshot.is_empty() {
            return Ok(SyncReport::default());
        }
        tracing::info!("Replaying {} pending operation(s)", snapshot.len());

        let mut replayed = 0;
        for entry in snapshot {
            let result = match &entry.operation {
                PendingOperation::Create(params) => self.push_create(params).await,
                PendingOperation::Update(params) => self.push_update(params).await,
            };
            if let Err(error) = result {
                tracing::warn!(
                    path = %entry.operation.file_path(),
                    kind = entry.operation.kind(),
                    "Sync stopped after {} replayed operation(s): {}",
                    replayed,
                    error
                );
                return Err(error);
            }
            self.inner.queue.remove(entry.seq).await;
            replayed += 1;
        }

        let remaining = self.inner.queue.len().await;
        tracing::info!(replayed, remaining, "Sync pass finished");
        Ok(SyncReport {
            replayed,
            remaining,
        })
    }

    /// Empty the cache and drop every queued write.
    pub async fn clear_local_data(&self) -> Result<()> {
        let dropped = self.inner.queue.clear().await;
        if dropped > 0 {
            tracing::warn!("Discarded {} pending operation(s)", dropped);
        }
        self.with_cache(|cache| cache.clear()).await
    }

    /// Wait until every background refresh spawned so far has finished.
    pub async fn wait_for_background_tasks(&self) {
        self.inner.tasks.close();
        self.inner.tasks.wait().await;
        self.inner.tasks.reopen();
    }

    async fn push_create(&self, params: &CreateNoteParams) -> Result<Note> {
        let note = self.inner.network.create_note(params).await?;
        self.cache_note(note.clone()).await;
        Ok(note)
    }

    async fn push_update(&self, params: &UpdateNoteParams) -> Result<Note> {
        self.inner.network.update_note(params).await?;
        let note = self.inner.network.get_note(&params.file_path).await?;
        self.cache_note(note.clone()).await;
        Ok(note)
    }

    fn spawn_note_refresh(&self, file_path: String) {
        let repository = self.clone();
        self.inner.tasks.spawn(async move {
            match repository.inner.network.get_note(&file_path).await {
                Ok(note) => {
                    if repository.inner.queue.contains_path(&file_path).await {
                        tracing::debug!(path = %file_path, "Keeping local copy with pending write");
                        return;
                    }
                    repository.cache_note(note).await;
                }
                Err(error) => {
                    tracing::warn!(path = %file_path, "Background refresh failed: {}", error);
                }
            }
        });
    }

    fn spawn_list_refresh(&self, path: String) {
        let repository = self.clone();
        self.inner.tasks.spawn(async move {
            match repository.inner.network.list_notes(&path).await {
                Ok(notes) => {
                    let mut fresh = Vec::with_capacity(notes.len());
                    for note in notes {
                        if !repository.inner.queue.contains_path(&note.file_path).await {
                            fresh.push(note);
                        }
                    }
                    repository.cache_notes(fresh).await;
                }
                Err(error) => {
                    tracing::warn!(prefix = %path, "Background list refresh failed: {}", error);
                }
            }
        });
    }

    /// Cache writes after a remote success are best-effort; the remote
    /// state is already authoritative.
    async fn cache_note(&self, note: Note) {
        let path = note.file_path.clone();
        if let Err(error) = self.with_cache(move |cache| cache.save_note(&note)).await {
            tracing::warn!(path = %path, "Failed to cache note: {}", error);
        }
    }

    async fn cache_notes(&self, notes: Vec<Note>) {
        if notes.is_empty() {
            return;
        }
        if let Err(error) = self.with_cache(move |cache| cache.save_notes(&notes)).await {
            tracing::warn!("Failed to cache notes: {}", error);
        }
    }

    /// Cache reads that fail are treated as misses.
    async fn read_cache<R, F>(&self, read: F) -> Option<R>
    where
        R: Send + 'static,
        F: FnOnce(&C) -> Result<R> + Send + 'static,
    {
        match self.with_cache(read).await {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!("Cache read failed, falling back to network: {}", error);
                None
            }
        }
    }

    async fn with_cache<R, F>(&self, operation: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&C) -> Result<R> + Send + 'static,
    {
        let cache = Arc::clone(&self.inner.cache);
        tokio::task::spawn_blocking(move || operation(cache.as_ref())).await?
    }
}
