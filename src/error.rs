// src/error.rs
use thiserror::Error;

/// Every way a fetch + normalize call can fail. No partial readings:
/// any of these means the whole operation failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no API credential configured (set OPENAI_API_KEY)")]
    Auth,

    #[error("request failed with HTTP {status}: {body}")]
    Request { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("response contained no usable content")]
    NoContent,

    #[error("response text is not valid JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),

    #[error("reading is missing or has invalid field(s): {}", .missing.join(", "))]
    Validation { missing: Vec<&'static str> },
}

impl FetchError {
    /// Stable label for logs and metric tags.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Auth => "auth",
            FetchError::Request { .. } => "request",
            FetchError::Transport(_) => "transport",
            FetchError::NoContent => "no_content",
            FetchError::MalformedJson(_) => "malformed_json",
            FetchError::Validation { .. } => "validation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_names_fields() {
        let e = FetchError::Validation {
            missing: vec!["ppm", "source"],
        };
        assert_eq!(
            e.to_string(),
            "reading is missing or has invalid field(s): ppm, source"
        );
        assert_eq!(e.kind(), "validation");
    }

    #[test]
    fn request_message_carries_status_and_body() {
        let e = FetchError::Request {
            status: 401,
            body: "bad key".into(),
        };
        assert_eq!(e.to_string(), "request failed with HTTP 401: bad key");
    }
}
