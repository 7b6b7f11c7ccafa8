//! Scheduled cleanup of naturally-expired blacklist entries.

use crate::db::Database;
use std::time::Duration;
use tracing::{error, info};

/// Interval between cleanup runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60); // 1 hour

/// Run all cleanup tasks once.
pub async fn run_cleanup(db: &Database) {
    // Blacklist entries for tokens past their expiry carry no information:
    // the token already fails expiry validation
    match db.blacklist().delete_expired().await {
        Ok(count) if count > 0 => info!("Cleaned up {} expired blacklist entries", count),
        Ok(_) => {}
        Err(e) => error!("Failed to clean up blacklist entries: {}", e),
    }
}

/// Spawn a background task that runs cleanup periodically.
/// Returns a handle that can be used to abort the task.
pub fn spawn_cleanup_scheduler(db: Database) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

        loop {
            interval.tick().await;
            run_cleanup(&db).await;
        }
    })
}
