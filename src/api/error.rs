use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized - check API credentials")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Structured error body returned by the backend on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    success: bool,
    error: String,
    code: String,
    #[serde(default)]
    details: Option<String>,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data. The cut
    /// point is backed up to a char boundary so multibyte bodies slice
    /// cleanly.
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!(
            "{}... (truncated, {} total bytes)",
            &body[..end],
            body.len()
        )
    }

    /// Extract the backend's structured error message, falling back to a
    /// generic HTTP-status message when the body isn't parseable JSON.
    fn describe(status: reqwest::StatusCode, body: &str) -> String {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => match parsed.details {
                Some(details) => format!("{} [{}]: {}", parsed.error, parsed.code, details),
                None => format!("{} [{}]", parsed.error, parsed.code),
            },
            Err(_) => format!("HTTP {}: {}", status, Self::truncate_body(body)),
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 | 403 => ApiError::Unauthorized,
            404 => ApiError::NotFound(Self::describe(status, body)),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(Self::describe(status, body)),
            _ => ApiError::InvalidResponse(Self::describe(status, body)),
        }
    }
}
