use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Permission denied: {resource}")]
    Forbidden { resource: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Invalid request: {message}")]
    BadRequest { message: String },

    #[error("Unprocessable entity: {message}")]
    UnprocessableEntity { message: String },

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Request deadline exceeded")]
    DeadlineExceeded,
}

/// Coarse classification of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Required call configuration was missing. Raised before any request is sent.
    Options,
    /// Network failure or a non-2xx response.
    Transport,
    /// The response body did not match the expected JSON shape.
    Decode,
    /// The request body could not be serialized.
    Encode,
    /// The caller cancelled the call or its deadline elapsed.
    Cancelled,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::InvalidOptions(_) => ErrorKind::Options,
            ApiError::Decode(_) => ErrorKind::Decode,
            ApiError::Encode(_) => ErrorKind::Encode,
            ApiError::Cancelled | ApiError::DeadlineExceeded => ErrorKind::Cancelled,
            ApiError::RequestFailed(_)
            | ApiError::RateLimitExceeded { .. }
            | ApiError::AuthenticationFailed { .. }
            | ApiError::Forbidden { .. }
            | ApiError::NotFound { .. }
            | ApiError::BadRequest { .. }
            | ApiError::UnprocessableEntity { .. }
            | ApiError::ServerError { .. }
            | ApiError::InvalidUrl(_) => ErrorKind::Transport,
        }
    }

    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::RateLimitExceeded { .. } => Some(429),
            ApiError::AuthenticationFailed { .. } => Some(401),
            ApiError::Forbidden { .. } => Some(403),
            ApiError::NotFound { .. } => Some(404),
            ApiError::BadRequest { .. } => Some(400),
            ApiError::UnprocessableEntity { .. } => Some(422),
            ApiError::ServerError { status, .. } => Some(*status),
            ApiError::RequestFailed(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn suggestion(&self) -> Option<&str> {
        match self {
            ApiError::AuthenticationFailed { .. } => {
                Some("Verify your email and API token in the active profile")
            }
            ApiError::Forbidden { .. } => {
                Some("The Jira integration may not be enabled for this account")
            }
            ApiError::RateLimitExceeded { .. } => Some("Wait before sending more requests"),
            ApiError::NotFound { .. } => Some("Check if the link ID is correct"),
            ApiError::BadRequest { .. } | ApiError::UnprocessableEntity { .. } => {
                Some("Review the request parameters")
            }
            ApiError::DeadlineExceeded => Some("Increase --timeout or try again later"),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
