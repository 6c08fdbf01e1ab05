use thiserror::Error;

/// Top-level error type for Warden.
#[derive(Debug, Error)]
pub enum WardenError {
    /// Error from the external platform client (or its bridge).
    #[error("client error: {0}")]
    Client(String),

    /// Error from the credential store gateway.
    #[error("store error: {0}")]
    Store(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Command handler failure (isolated per invocation).
    #[error("command error: {0}")]
    Command(String),

    /// Reconnect attempt ceiling exhausted — requires operator restart.
    #[error("reconnect attempts exhausted after {attempts} tries")]
    ReconnectExhausted { attempts: u32 },

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
