use thiserror::Error;

/// Top-level error type for Streak.
#[derive(Debug, Error)]
pub enum StreakError {
    /// Error from a messaging channel.
    #[error("channel error: {0}")]
    Channel(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Error from the plan document.
    #[error("ledger error: {0}")]
    Ledger(String),

    /// Error reading or writing the interaction state record.
    #[error("state error: {0}")]
    State(String),

    /// Error from the sync gateway.
    #[error("sync error: {0}")]
    Sync(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
