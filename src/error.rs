//! Error types for the monitor facade and bootstrap

use crate::model::ServiceKey;

/// Result type alias for monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Errors surfaced to callers of the monitor API
///
/// Failures inside a running poll worker never show up here; they stay in the
/// worker and are only visible through logs and client notifications.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// One or more input rules were violated (one line per violation)
    #[error("input validation failed:\n{0}")]
    Validation(String),

    /// A service with the same host and port is already registered
    #[error(
        "service {0} is already being monitored, register a client with register_interest_in_existing_service instead"
    )]
    AlreadyMonitored(ServiceKey),

    /// No registered service matches the given host and port
    #[error("service {0} is not being monitored")]
    NotFound(ServiceKey),

    /// Grace period outside the accepted range
    #[error("grace period of {0}ms is not valid")]
    InvalidGracePeriod(u64),

    /// The monitor has been shut down and accepts no new services
    #[error("monitor has been shut down")]
    ShutDown,

    /// Invalid bootstrap configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error (file access, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse error
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}
