use crate::{
    error::StreakError,
    message::{IncomingMessage, OutgoingMessage},
};
use async_trait::async_trait;
use std::path::Path;

/// Messaging Channel trait.
///
/// Every messaging platform (Telegram today, others later) implements this
/// trait to receive and send messages.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name.
    fn name(&self) -> &str;

    /// Start listening for incoming messages.
    /// Returns a receiver that yields incoming messages and button presses.
    async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<IncomingMessage>, StreakError>;

    /// Send a message (or edit one in place) through this channel.
    async fn send(&self, message: OutgoingMessage) -> Result<(), StreakError>;

    /// Graceful shutdown.
    async fn stop(&self) -> Result<(), StreakError>;
}

/// Sync Gateway trait — the durable off-device copy of the plan document.
///
/// Implementations resolve the remote object by name and update it in place;
/// if no object exists yet, exactly one is created.
#[async_trait]
pub trait SyncGateway: Send + Sync {
    /// Human-readable gateway name.
    fn name(&self) -> &str;

    /// Upload `local_path` as the remote object called `remote_name`.
    async fn sync_file(&self, local_path: &Path, remote_name: &str) -> Result<(), StreakError>;
}
