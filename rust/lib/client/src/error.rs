/// Client-side API error.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// HTTP 409: the resource is already in the requested state.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("HTTP {status}: {message}")]
    Server { status: u16, message: String },

    #[error("network: {0}")]
    Network(#[from] reqwest::Error),

    #[error("auth: {0}")]
    Auth(String),

    #[error("decode: {0}")]
    Decode(String),
}

impl ApiError {
    /// Map a non-success HTTP status and its body to an error.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            409 => ApiError::Conflict(body),
            401 => ApiError::Auth(format!("unauthorized: {}", body)),
            _ => ApiError::Server {
                status,
                message: body,
            },
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ApiError::Conflict(_))
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Auth(_))
    }
}
