//! Error types for the edgequake-doc2word library.
//!
//! Two distinct error types reflect two distinct layers:
//!
//! * [`Doc2WordError`] — **Operation-level**: the job (or the top-level call
//!   that started it) cannot continue as-is. Returned from the `convert*`
//!   entry points and carried inside [`crate::job::JobOutcome::Failed`].
//!
//! * [`RemoteError`] — **Attempt-level**: one `generateContent` call with one
//!   credential failed. These never reach the caller directly; the rotating
//!   caller classifies them (see [`crate::pipeline::classify`]) and folds
//!   them into exactly one `Doc2WordError` once rotation is over.
//!
//! Only [`Doc2WordError::AllCredentialsExhausted`] is pausable: it is the one
//! outcome where supplying more credentials lets the same job continue.

use std::path::PathBuf;
use thiserror::Error;

/// Maximum length of remote error details surfaced to users.
pub const MAX_DETAIL_CHARS: usize = 150;

/// All operation-level errors returned by the edgequake-doc2word library.
#[derive(Debug, Error)]
pub enum Doc2WordError {
    // ── Credential errors ─────────────────────────────────────────────────
    /// The key pool was empty when the operation started.
    #[error("No API keys configured.\nAdd at least one key (one per line) and try again.")]
    NoCredentialsConfigured,

    /// Every key that was tried was rejected as invalid, and none was
    /// merely rate-limited.
    #[error("API key rejected: {detail}\nReview the key list.")]
    InvalidCredential { detail: String },

    /// Every key in the pool failed recoverably for the current unit.
    ///
    /// This is the only pausable error: add keys and resume the job.
    #[error("All {attempted} API keys are exhausted at unit {unit}.\nAdd more keys and resume.")]
    AllCredentialsExhausted { unit: usize, attempted: usize },

    /// `resume` was called without any new, non-empty key.
    #[error("Resume requires at least one additional API key")]
    ResumeWithoutCredentials,

    // ── Remote errors ─────────────────────────────────────────────────────
    /// The request itself was rejected; other keys would not help.
    #[error("Malformed request: {detail}")]
    MalformedRequest { detail: String },

    /// The model refused the content (safety / policy block).
    #[error("Content rejected by the model: {detail}")]
    ContentRejected { detail: String },

    /// The remote failure could not be classified; treated as terminal.
    #[error("Remote service error: {detail}")]
    RemoteFailure { detail: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file is neither an image nor a PDF.
    #[error("Unsupported file '{name}': {mime_type} is not an image or PDF")]
    UnsupportedMediaType { name: String, mime_type: String },

    /// More pages than a single job accepts.
    #[error("Too many pages: {count} (maximum {max} per job)")]
    TooManyPages { count: usize, max: usize },

    /// Text input could not be decoded.
    #[error("Text file '{path}' is not valid UTF-8")]
    NotUtf8 { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A paused job could not be (de)serialised.
    #[error("Invalid job state: {0}")]
    StateSerialization(#[from] serde_json::Error),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Doc2WordError {
    /// Whether the job that produced this error may be resumed with more keys.
    pub fn is_pausable(&self) -> bool {
        matches!(self, Self::AllCredentialsExhausted { .. })
    }
}

/// A single failed `generateContent` attempt, before classification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// The service answered with a non-success HTTP status.
    ///
    /// `reason` carries the machine-readable status or error reason from the
    /// response body when one was present (e.g. `RESOURCE_EXHAUSTED`,
    /// `API_KEY_INVALID`).
    #[error("HTTP {status}{}: {message}", .reason.as_deref().map(|r| format!(" {r}")).unwrap_or_default())]
    Http {
        status: u16,
        reason: Option<String>,
        message: String,
    },

    /// The request never produced a response (connect failure, timeout).
    #[error("Network error: {message}")]
    Network { timeout: bool, message: String },

    /// The model returned no text because the prompt or output was blocked.
    #[error("Blocked: {reason}")]
    Blocked { reason: String },

    /// A 2xx response whose body could not be understood.
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },
}

/// Shorten a remote error detail to [`MAX_DETAIL_CHARS`] characters.
pub fn truncate_detail(detail: &str) -> String {
    let mut chars = detail.chars();
    let head: String = chars.by_ref().take(MAX_DETAIL_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}\u{2026}")
    } else {
        head
    }
}
