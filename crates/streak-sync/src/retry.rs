//! Bounded-retry wrapper around the sync gateway.

use std::path::Path;
use std::time::Duration;
use streak_core::traits::SyncGateway;
use tracing::{error, info, warn};

/// Upload `local_path` as `remote_name`, retrying up to `max_attempts` times
/// with a fixed delay between attempts.
///
/// Returns true on the first success, false after exhausting all attempts.
/// Gateway errors never propagate past this function; each is logged with its
/// attempt number and counted as a failed attempt. The caller's local write
/// is already durable at this point and is never rolled back.
pub async fn sync_with_retry(
    gateway: &dyn SyncGateway,
    local_path: &Path,
    remote_name: &str,
    max_attempts: u32,
    delay: Duration,
) -> bool {
    for attempt in 1..=max_attempts {
        match gateway.sync_file(local_path, remote_name).await {
            Ok(()) => {
                info!("{} sync successful (attempt {attempt})", gateway.name());
                return true;
            }
            Err(e) => {
                warn!(
                    "{} sync failed (attempt {attempt}/{max_attempts}): {e}",
                    gateway.name()
                );
                if attempt < max_attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
    error!("{} sync failed after {max_attempts} attempts", gateway.name());
    false
}
