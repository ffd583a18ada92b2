//! Error types for agentguard

/// Result type alias using agentguard's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for agentguard operations
///
/// None of these ever reach the caller of a moderation call: the moderation
/// layer turns them into blocked decisions.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Policy table errors (bad allow-list, bad rule table)
    #[error("policy error: {0}")]
    Policy(String),

    /// Classifier answered outside its contract (unknown label, bad score)
    #[error("classifier error: {0}")]
    Classifier(String),

    /// External classification service unreachable or returned malformed data
    #[error("service error: {0}")]
    Service(String),

    /// Image failed to open, decode or verify
    #[error("image error: {0}")]
    Image(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Deadline exceeded on an external call
    #[error("operation timed out")]
    Timeout,

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new policy error
    pub fn policy(msg: impl Into<String>) -> Self {
        Self::Policy(msg.into())
    }

    /// Create a new classifier error
    pub fn classifier(msg: impl Into<String>) -> Self {
        Self::Classifier(msg.into())
    }

    /// Create a new service error
    pub fn service(msg: impl Into<String>) -> Self {
        Self::Service(msg.into())
    }

    /// Create a new image error
    pub fn image(msg: impl Into<String>) -> Self {
        Self::Image(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
