use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid port: {0} (must be between 1024 and 65535)")]
    InvalidPort(i64),

    #[error("Invalid host: {0:?}")]
    InvalidHost(String),

    #[error("Invalid allowedHosts entry: {0:?}")]
    InvalidAllowedHost(String),

    #[error("Invalid proxy matchPrefix {0:?}: {1}")]
    InvalidPrefix(String, String),

    #[error("Duplicate proxy matchPrefix: {0:?}")]
    DuplicatePrefix(String),

    #[error("Invalid proxy target for {prefix:?}: {reason}")]
    InvalidTarget { prefix: String, reason: String },

    #[error("Invalid pathRewrite pattern {pattern:?} for {prefix:?}: {reason}")]
    InvalidRewrite {
        prefix: String,
        pattern: String,
        reason: String,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Environment variable missing: {0}")]
    MissingEnvVar(String),

    #[error("Dev server exited with status {0}")]
    HostExited(i32),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for errors raised while building or loading a configuration.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            AppError::InvalidPort(_)
                | AppError::InvalidHost(_)
                | AppError::InvalidAllowedHost(_)
                | AppError::InvalidPrefix(..)
                | AppError::DuplicatePrefix(_)
                | AppError::InvalidTarget { .. }
                | AppError::InvalidRewrite { .. }
                | AppError::Validation(_)
                | AppError::Configuration(_)
                | AppError::MissingEnvVar(_)
        )
    }
}

/// Result type alias for AppResult
pub type AppResult<T> = Result<T, AppError>;
