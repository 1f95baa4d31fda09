/// Convenience result type used across Keyline.
pub type KeylineResult<T> = Result<T, KeylineError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Stale-id lookups and out-of-range times are deliberately not errors:
/// those surface as `None`/`false`/empty results or silent clamping.
#[derive(thiserror::Error, Debug)]
pub enum KeylineError {
    /// Invalid user-provided or project data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors from the load/save contract (file IO, storage backend).
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KeylineError {
    /// Build a [`KeylineError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`KeylineError::Persistence`] value.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Build a [`KeylineError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}
