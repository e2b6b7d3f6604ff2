use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("credential rejected: {0}")]
    Auth(String),

    #[error("quota exhausted: {0}")]
    Quota(String),

    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("transient failure: {0}")]
    Transient(String),

    #[error("request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl GenerationError {
    /// Classify a non-success response from the generation service.
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Auth(message),
            StatusCode::TOO_MANY_REQUESTS => Self::Quota(message),
            StatusCode::NOT_FOUND => Self::ModelNotFound(message),
            // Bad keys come back as 400 with an API_KEY_INVALID reason.
            StatusCode::BAD_REQUEST if message.contains("API_KEY_INVALID") => Self::Auth(message),
            s if s.is_server_error() => Self::Transient(message),
            s => Self::Rejected {
                status: s.as_u16(),
                message,
            },
        }
    }

    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Self::from_status(status, err.to_string())
        } else if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            // Timeouts, DNS, refused connections
            Self::Transient(err.to_string())
        }
    }

    /// Short tag for logs and the exhaustion summary.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth",
            Self::Quota(_) => "quota",
            Self::ModelNotFound(_) => "model_not_found",
            Self::Transient(_) => "transient",
            Self::Rejected { .. } => "rejected",
            Self::Malformed(_) => "malformed",
        }
    }
}
