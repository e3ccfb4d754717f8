/// Errors from storage driver operations.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The requested key does not exist.
    #[error("path not found: {0}")]
    NotFound(String),

    /// I/O failure in the underlying backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The driver name or parameters are unusable.
    #[error("invalid driver configuration: {0}")]
    InvalidConfiguration(String),
}

impl DriverError {
    /// Returns `true` if this error means the key is absent rather than the
    /// backend failing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DriverError::NotFound(_))
    }
}

/// Result alias for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;
