pub mod auth_cmd;
pub mod common;
pub mod config;
pub mod notes;
pub mod sync;

use crate::cli::Commands;
use crate::error::CliError;
use crate::session::Session;

/// Run one command that needs a session. `config` and `shell` are handled
/// by the caller.
pub async fn dispatch(session: &Session, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Login { email, password } => {
            auth_cmd::run_login(session, &email, &password).await
        }
        Commands::Logout => auth_cmd::run_logout(session).await,
        Commands::Get { path, json } => notes::run_get(session, &path, json).await,
        Commands::List { prefix, json } => notes::run_list(session, &prefix, json).await,
        Commands::Create {
            path,
            title,
            content,
        } => notes::run_create(session, &path, &title, content).await,
        Commands::Update {
            path,
            title,
            content,
        } => notes::run_update(session, &path, title, content).await,
        Commands::Delete { path } => notes::run_delete(session, &path).await,
        Commands::Pending { json } => sync::run_pending(session, json).await,
        Commands::Sync => sync::run_sync(session).await,
        Commands::Config { .. } => Err(CliError::Shell(
            "`config` cannot run inside a session".to_string(),
        )),
        Commands::Shell => Err(CliError::Shell("Already in a shell".to_string())),
    }
}
