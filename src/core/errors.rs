use thiserror::Error;

/// Failure of a service operation, mapped to an HTTP status by the api layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Groq API key not found")]
    MissingApiKey,

    /// The completion endpoint failed; carries its message.
    #[error("{0}")]
    Upstream(String),

    #[error("Server error")]
    Storage,
}

impl From<()> for ServiceError {
    fn from(_: ()) -> Self {
        // repositories have already logged the cause
        ServiceError::Storage
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
