use crate::commands::common::{pending_to_item, PendingItem};
use crate::error::CliError;
use crate::session::Session;

pub async fn run_pending(session: &Session, as_json: bool) -> Result<(), CliError> {
    let operations = session.repository().pending_operations().await;

    if as_json {
        let json_items = operations
            .iter()
            .map(pending_to_item)
            .collect::<Vec<PendingItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if operations.is_empty() {
        println!("No pending writes.");
        return Ok(());
    }

    for (index, operation) in operations.iter().enumerate() {
        println!("{:>3}. {:<6}  {}", index + 1, operation.kind(), operation.file_path());
    }
    Ok(())
}

pub async fn run_sync(session: &Session) -> Result<(), CliError> {
    let report = session.repository().sync_pending_operations().await?;
    if report.replayed == 0 && report.remaining == 0 {
        println!("Nothing to sync");
    } else {
        println!(
            "Synced {} write(s); {} still pending",
            report.replayed, report.remaining
        );
    }
    Ok(())
}
