//! Periodic cleanup of old dedup entries.

use crate::config::RetentionSettings;
use buyalert_alerts::Database;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Purge notified events older than `settings.days`, once at startup and then
/// every `settings.interval_secs`, until `shutdown` is cancelled.
pub async fn run_retention_loop(
    db: Database,
    settings: RetentionSettings,
    shutdown: CancellationToken,
) {
    info!(
        days = settings.days,
        interval_secs = settings.interval_secs,
        "Starting retention job"
    );
    let mut interval = tokio::time::interval(Duration::from_secs(settings.interval_secs.max(1)));

    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {
                match db.purge_notified_older_than(settings.days).await {
                    Ok(0) => debug!("No notified events to purge"),
                    Ok(removed) => info!(removed, days = settings.days, "Purged old notified events"),
                    Err(e) => error!(error = %e, "Failed to purge notified events"),
                }
            }
        }
    }

    info!("Retention job stopped");
}
