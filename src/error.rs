//! Error types for schedule construction

use thiserror::Error;

/// Result type for schedule construction
pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Construction errors. Once a timeline is running no error can occur.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Invalid shape ({m}, {n}, {k}): dimensions must be >= 1 and not overflow")]
    InvalidShape { m: usize, n: usize, k: usize },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl ScheduleError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        ScheduleError::InvalidConfiguration { message: msg.into() }
    }

    pub fn parse_error(position: usize, msg: impl Into<String>) -> Self {
        ScheduleError::Parse {
            position,
            message: msg.into(),
        }
    }

    /// Reject a strategy parameter below 1
    pub fn require_positive(name: &str, value: usize) -> ScheduleResult<()> {
        if value == 0 {
            Err(Self::invalid_config(format!("{} must be at least 1, got 0", name)))
        } else {
            Ok(())
        }
    }
}
