//! Failure classification for a single remote attempt.
//!
//! | Class               | Matches                                                  | Next step          |
//! |---------------------|----------------------------------------------------------|--------------------|
//! | `RateLimited`       | HTTP 429, `RESOURCE_EXHAUSTED`                           | next credential    |
//! | `Transient`         | 500/502/503/504, `UNAVAILABLE`, `INTERNAL`, network      | next credential    |
//! | `InvalidCredential` | 401/403, `API_KEY_INVALID`, `PERMISSION_DENIED`          | next credential    |
//! | `MalformedRequest`  | any other 400, 404, 413                                  | abort              |
//! | `ContentRejected`   | blocked prompt or output                                 | abort              |
//! | `Unrecognized`      | everything else                                          | abort              |
//!
//! Reason strings are checked before status codes: Gemini reports a bad key
//! as `400 INVALID_ARGUMENT` with reason `API_KEY_INVALID`, which must not be
//! mistaken for a malformed request.

use crate::error::RemoteError;

/// Outcome class of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    RateLimited,
    Transient,
    InvalidCredential,
    MalformedRequest,
    ContentRejected,
    Unrecognized,
}

impl FailureKind {
    /// Another credential may succeed where this one failed.
    pub fn is_recoverable(self) -> bool {
        matches!(self, FailureKind::RateLimited | FailureKind::Transient)
    }

    /// Keep rotating (recoverable, or bad only for this key).
    pub fn tries_next_credential(self) -> bool {
        self.is_recoverable() || self == FailureKind::InvalidCredential
    }
}

/// Classify one attempt's error.
pub fn classify(error: &RemoteError) -> FailureKind {
    match error {
        RemoteError::Network { .. } => FailureKind::Transient,
        RemoteError::Blocked { .. } => FailureKind::ContentRejected,
        RemoteError::InvalidResponse { .. } => FailureKind::Unrecognized,
        RemoteError::Http {
            status,
            reason,
            message,
        } => {
            if let Some(kind) = reason.as_deref().and_then(classify_reason) {
                return kind;
            }
            if message.contains("API key not valid") {
                return FailureKind::InvalidCredential;
            }
            match status {
                429 => FailureKind::RateLimited,
                500 | 502 | 503 | 504 => FailureKind::Transient,
                401 | 403 => FailureKind::InvalidCredential,
                400 | 404 | 413 => FailureKind::MalformedRequest,
                _ => FailureKind::Unrecognized,
            }
        }
    }
}

fn classify_reason(reason: &str) -> Option<FailureKind> {
    match reason {
        "RESOURCE_EXHAUSTED" | "RATE_LIMIT_EXCEEDED" => Some(FailureKind::RateLimited),
        "UNAVAILABLE" | "INTERNAL" | "DEADLINE_EXCEEDED" => Some(FailureKind::Transient),
        "API_KEY_INVALID" | "API_KEY_EXPIRED" | "PERMISSION_DENIED" | "UNAUTHENTICATED" => {
            Some(FailureKind::InvalidCredential)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16, reason: Option<&str>, message: &str) -> RemoteError {
        RemoteError::Http {
            status,
            reason: reason.map(str::to_string),
            message: message.to_string(),
        }
    }

    #[test]
    fn classification_table() {
        let cases = [
            (http(429, None, "slow down"), FailureKind::RateLimited),
            (http(429, Some("RESOURCE_EXHAUSTED"), "quota"), FailureKind::RateLimited),
            (http(500, None, ""), FailureKind::Transient),
            (http(502, None, ""), FailureKind::Transient),
            (http(503, Some("UNAVAILABLE"), "overloaded"), FailureKind::Transient),
            (http(504, None, ""), FailureKind::Transient),
            (http(401, None, ""), FailureKind::InvalidCredential),
            (http(403, Some("PERMISSION_DENIED"), ""), FailureKind::InvalidCredential),
            (
                http(400, Some("API_KEY_INVALID"), "API key not valid."),
                FailureKind::InvalidCredential,
            ),
            (
                http(400, Some("INVALID_ARGUMENT"), "API key not valid. Please pass a valid API key."),
                FailureKind::InvalidCredential,
            ),
            (http(400, Some("INVALID_ARGUMENT"), "bad field"), FailureKind::MalformedRequest),
            (http(404, Some("NOT_FOUND"), "model"), FailureKind::MalformedRequest),
            (http(413, None, "too big"), FailureKind::MalformedRequest),
            (http(418, None, "teapot"), FailureKind::Unrecognized),
            (
                RemoteError::Network {
                    timeout: true,
                    message: "timed out".into(),
                },
                FailureKind::Transient,
            ),
            (
                RemoteError::Blocked {
                    reason: "SAFETY".into(),
                },
                FailureKind::ContentRejected,
            ),
            (
                RemoteError::InvalidResponse {
                    message: "eof".into(),
                },
                FailureKind::Unrecognized,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(classify(&error), expected, "{error}");
        }
    }

    #[test]
    fn only_rate_limit_and_transient_are_recoverable() {
        assert!(FailureKind::RateLimited.is_recoverable());
        assert!(FailureKind::Transient.is_recoverable());
        assert!(!FailureKind::InvalidCredential.is_recoverable());
        assert!(!FailureKind::Unrecognized.is_recoverable());
        assert!(FailureKind::InvalidCredential.tries_next_credential());
        assert!(!FailureKind::MalformedRequest.tries_next_credential());
        assert!(!FailureKind::ContentRejected.tries_next_credential());
    }
}
