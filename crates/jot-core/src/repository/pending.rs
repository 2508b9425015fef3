//! FIFO queue of writes awaiting replay.

use std::collections::VecDeque;

use tokio::sync::Mutex;

use crate::models::PendingOperation;

/// A queued write tagged with its insertion sequence number.
#[derive(Debug, Clone)]
pub(crate) struct QueuedOperation {
    pub seq: u64,
    pub operation: PendingOperation,
}

#[derive(Default)]
struct QueueState {
    entries: VecDeque<QueuedOperation>,
    next_seq: u64,
}

/// Entries are removed by sequence number, so an append that lands while a
/// replay is running never shifts what gets removed.
#[derive(Default)]
pub(crate) struct PendingQueue {
    state: Mutex<QueueState>,
}

impl PendingQueue {
    pub async fn push(&self, operation: PendingOperation) -> u64 {
        let mut state = self.state.lock().await;
        let seq = state.next_seq;
        state.next_seq += 1;
        state.entries.push_back(QueuedOperation { seq, operation });
        seq
    }

    pub async fn snapshot(&self) -> Vec<QueuedOperation> {
        self.state.lock().await.entries.iter().cloned().collect()
    }

    pub async fn operations(&self) -> Vec<PendingOperation> {
        self.state
            .lock()
            .await
            .entries
            .iter()
            .map(|entry| entry.operation.clone())
            .collect()
    }

    pub async fn remove(&self, seq: u64) -> bool {
        let mut state = self.state.lock().await;
        let before = state.entries.len();
        state.entries.retain(|entry| entry.seq != seq);
        state.entries.len() != before
    }

    pub async fn contains_path(&self, file_path: &str) -> bool {
        self.state
            .lock()
            .await
            .entries
            .iter()
            .any(|entry| entry.operation.file_path() == file_path)
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn clear(&self) -> usize {
        let mut state = self.state.lock().await;
        let dropped = state.entries.len();
        state.entries.clear();
        dropped
    }
}
