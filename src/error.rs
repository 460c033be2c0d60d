use thiserror::Error;

/// Failures while talking to the relay server or the external webhook.
///
/// These never escape a transport: they are folded into a
/// [`ResponseEnvelope`](crate::webhook::ResponseEnvelope) with `success=false`.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The relay answered with a non-success status.
    #[error("Webhook request failed: {status} {reason}")]
    Status { status: u16, reason: String },

    /// The external webhook answered, but with a non-success status.
    #[error("External webhook responded with {status} {reason}")]
    Upstream {
        status: u16,
        reason: String,
        body: String,
    },
}

impl WebhookError {
    /// Body returned by the external endpoint, if it answered at all.
    pub fn upstream_body(&self) -> Option<&str> {
        match self {
            Self::Upstream { body, .. } => Some(body),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpeechError {
    #[error("speech capability is not available")]
    Unavailable,
    #[error("no speech was recognized")]
    NoMatch,
    #[error("speech engine error: {0}")]
    Engine(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_carries_code_and_reason() {
        let err = WebhookError::Status {
            status: 502,
            reason: "Bad Gateway".to_string(),
        };
        assert_eq!(err.to_string(), "Webhook request failed: 502 Bad Gateway");
        assert!(err.upstream_body().is_none());
    }

    #[test]
    fn upstream_error_exposes_body() {
        let err = WebhookError::Upstream {
            status: 404,
            reason: "Not Found".to_string(),
            body: "no workflow".to_string(),
        };
        assert_eq!(err.upstream_body(), Some("no workflow"));
        assert!(err.to_string().contains("404"));
    }
}
