//! Error types for sheet-relay.

/// Top-level error type for the relay.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Sheet error: {0}")]
    Sheet(#[from] SheetError),
}

/// Configuration-related errors. All of these are fatal at startup;
/// nothing in this enum is raised per-message.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse category config: {0}")]
    ParseError(String),

    #[error("Invalid field pattern for {field}: {reason}")]
    InvalidPattern { field: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Chat channel errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send to destination {destination}: {reason}")]
    SendFailed { destination: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(String),
}

/// Spreadsheet collaborator errors.
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("Append to sheet {sheet_id} failed: {reason}")]
    AppendFailed { sheet_id: String, reason: String },

    #[error("Sheets client not configured: {0}")]
    NotConfigured(String),

    #[error("HTTP error: {0}")]
    Http(String),
}

/// Result type alias for the relay.
pub type Result<T> = std::result::Result<T, Error>;
