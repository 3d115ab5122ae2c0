use std::fmt;

#[derive(Debug)]
pub enum AiError {
    /// Timeout or transport failure before an HTTP status was obtained.
    NetworkError(String),
    /// The API rejected the bearer credential (HTTP 401).
    AuthenticationError(String),
    /// Any other non-200 response.
    ApiError { status: u16, body: String },
    /// HTTP 200 with a body missing the expected fields.
    MalformedResponse(String),
}

impl fmt::Display for AiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkError(msg) => write!(f, "Network error: {}", msg),
            Self::AuthenticationError(msg) => write!(f, "Authentication error: {}", msg),
            Self::ApiError { status, body } => {
                write!(f, "API error: status {} - {}", status, body)
            }
            Self::MalformedResponse(msg) => write!(f, "Malformed response: {}", msg),
        }
    }
}

impl std::error::Error for AiError {}
