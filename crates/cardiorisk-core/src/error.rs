//! Error types for CardioRisk

/// Result type alias using CardioRisk's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for CardioRisk operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A model component has not been loaded yet
    #[error("{component} not ready: artifacts have not been loaded")]
    NotReady { component: String },

    /// A patient record failed validation
    #[error("invalid input for '{field}': {reason}")]
    InvalidInput { field: String, reason: String },

    /// Loaded artifacts are mutually inconsistent
    #[error("integrity error: {0}")]
    Integrity(String),

    /// An artifact could not be read or parsed
    #[error("artifact '{name}' failed to load: {detail}")]
    Artifact { name: String, detail: String },

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new not-ready error for a named component
    pub fn not_ready(component: impl Into<String>) -> Self {
        Self::NotReady {
            component: component.into(),
        }
    }

    /// Create a new invalid-input error for a named field
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a new integrity error
    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::Integrity(msg.into())
    }

    /// Create a new artifact error
    pub fn artifact(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Artifact {
            name: name.into(),
            detail: detail.into(),
        }
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
