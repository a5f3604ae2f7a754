use thiserror::Error;

/// Errors surfaced by the session and conversation controller.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("authentication required")]
    AuthRequired,

    #[error("network error: {0}")]
    Network(String),

    #[error("backend rejected the request: {0}")]
    BackendRejected(String),

    #[error("stored session is corrupt: {0}")]
    CorruptSession(String),

    #[error("a chat turn is already pending")]
    TurnPending,

    #[error("no active analysis")]
    NoActiveAnalysis,

    #[error("cannot {action} while {state}")]
    InvalidTransition { state: String, action: &'static str },

    #[error("active analysis has no saved record to update")]
    NotResumable,

    #[error("credential storage error: {0}")]
    Storage(String),
}

/// Errors from calls to the remote backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport failure or timeout.
    #[error("request failed: {0}")]
    Network(String),

    /// The backend answered with a failure envelope.
    #[error("{0}")]
    Rejected(String),

    /// The backend refused the bearer token (HTTP 401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The response did not match the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<BackendError> for SessionError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Network(msg) => SessionError::Network(msg),
            BackendError::Rejected(msg) => SessionError::BackendRejected(msg),
            BackendError::Unauthorized(msg) => SessionError::BackendRejected(msg),
            BackendError::InvalidResponse(msg) => {
                SessionError::BackendRejected(format!("invalid response: {msg}"))
            }
        }
    }
}

/// Errors from the persisted credential store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(String),

    #[error("store unavailable")]
    Unavailable,
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        SessionError::Storage(err.to_string())
    }
}

/// A JSON payload that does not fit the expected domain shape.
#[derive(Debug, Error)]
pub enum ShapeError {
    #[error("{0} is not a JSON object")]
    NotAnObject(&'static str),

    #[error("malformed {what}: {reason}")]
    Malformed { what: &'static str, reason: String },

    #[error("missing field '{0}'")]
    MissingField(&'static str),
}

impl From<ShapeError> for BackendError {
    fn from(err: ShapeError) -> Self {
        BackendError::InvalidResponse(err.to_string())
    }
}
