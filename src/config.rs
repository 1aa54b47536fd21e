//! Configuration types for chunked document jobs.
//!
//! All job behaviour is controlled through [`JobConfig`], built via its
//! [`JobConfigBuilder`]. Task-specific defaults (chunk size, pacing) live on
//! [`TaskKind`] so a config can be shared across OCR, formatting and
//! translation runs and only override what the caller cares about.

use crate::error::Doc2WordError;
use crate::pipeline::gemini::RemoteModel;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default Gemini model identifier.
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Default Gemini REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Configuration for a chunked job.
///
/// Built via [`JobConfig::builder()`] or using [`JobConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_doc2word::JobConfig;
///
/// let config = JobConfig::builder()
///     .model("gemini-2.5-flash")
///     .media_group_size(4)
///     .pacing_ms(0)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct JobConfig {
    /// Model identifier sent in the request path. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Base URL of the Gemini REST API. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// Images or PDFs sent together in one multimodal request. Default: 6.
    ///
    /// Larger groups mean fewer calls but longer responses; six pages keeps
    /// a dense scan comfortably under the model's output token ceiling.
    pub media_group_size: usize,

    /// Maximum characters per text unit. `None` uses the task default
    /// (7000 for formatting, 4500 for translation).
    pub max_chars: Option<usize>,

    /// Minimum delay between consecutive remote calls in milliseconds.
    /// `None` uses the task default (800 / 1000 / 1200 ms). `Some(0)` disables
    /// pacing.
    pub pacing_ms: Option<u64>,

    /// Per-request HTTP timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Maximum number of media files accepted in one job. Default: 200.
    pub max_media_files: usize,

    /// Pre-constructed remote model. Takes precedence over building a
    /// [`crate::pipeline::gemini::GeminiClient`] from `base_url`.
    pub remote: Option<Arc<dyn RemoteModel>>,

    /// Receives per-unit progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            media_group_size: 6,
            max_chars: None,
            pacing_ms: None,
            api_timeout_secs: 120,
            download_timeout_secs: 120,
            max_media_files: 200,
            remote: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for JobConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("media_group_size", &self.media_group_size)
            .field("max_chars", &self.max_chars)
            .field("pacing_ms", &self.pacing_ms)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("max_media_files", &self.max_media_files)
            .field("remote", &self.remote.as_ref().map(|_| "<dyn RemoteModel>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl JobConfig {
    /// Create a new builder for `JobConfig`.
    pub fn builder() -> JobConfigBuilder {
        JobConfigBuilder {
            config: Self::default(),
        }
    }

    /// Text unit size for `task`, honouring the override.
    pub fn chunk_chars(&self, task: &TaskKind) -> usize {
        self.max_chars.unwrap_or_else(|| task.default_max_chars())
    }

    /// Delay between consecutive calls for `task`, honouring the override.
    pub fn pacing(&self, task: &TaskKind) -> Duration {
        Duration::from_millis(self.pacing_ms.unwrap_or_else(|| task.default_pacing_ms()))
    }
}

/// Builder for [`JobConfig`].
#[derive(Debug)]
pub struct JobConfigBuilder {
    config: JobConfig,
}

impl JobConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn media_group_size(mut self, n: usize) -> Self {
        self.config.media_group_size = n;
        self
    }

    pub fn max_chars(mut self, n: usize) -> Self {
        self.config.max_chars = Some(n);
        self
    }

    pub fn pacing_ms(mut self, ms: u64) -> Self {
        self.config.pacing_ms = Some(ms);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn max_media_files(mut self, n: usize) -> Self {
        self.config.max_media_files = n;
        self
    }

    pub fn remote(mut self, remote: Arc<dyn RemoteModel>) -> Self {
        self.config.remote = Some(remote);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<JobConfig, Doc2WordError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(Doc2WordError::InvalidConfig("model must not be empty".into()));
        }
        if c.media_group_size == 0 {
            return Err(Doc2WordError::InvalidConfig(
                "media group size must be ≥ 1".into(),
            ));
        }
        if let Some(n) = c.max_chars {
            if n < 100 {
                return Err(Doc2WordError::InvalidConfig(format!(
                    "max chars per unit must be ≥ 100, got {n}"
                )));
            }
        }
        if c.api_timeout_secs == 0 {
            return Err(Doc2WordError::InvalidConfig(
                "API timeout must be ≥ 1s".into(),
            ));
        }
        if c.max_media_files == 0 {
            return Err(Doc2WordError::InvalidConfig(
                "max media files must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// What the remote model is asked to do with each unit.
///
/// The task fixes the default chunk size, the pacing between calls and the
/// instruction text. Heavier tasks get smaller units and longer pauses:
/// translation output is longer than its input, so its units are smaller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskKind {
    /// Transcribe scanned pages (images / PDFs) to plain text.
    Ocr,
    /// Turn raw text into academic HTML for a word processor.
    Format {
        /// Also gather footnotes at the end of each unit.
        footnotes: bool,
    },
    /// Translate text and emit HTML.
    Translate {
        target_language: String,
        /// Subject domain hint (e.g. "legal", "medical").
        domain: String,
        footnotes: bool,
    },
}

impl TaskKind {
    /// Default maximum characters per text unit.
    pub fn default_max_chars(&self) -> usize {
        match self {
            TaskKind::Translate { .. } => 4500,
            TaskKind::Ocr | TaskKind::Format { .. } => 7000,
        }
    }

    /// Default delay between consecutive calls in milliseconds.
    pub fn default_pacing_ms(&self) -> u64 {
        match self {
            TaskKind::Ocr => 800,
            TaskKind::Format { .. } => 1000,
            TaskKind::Translate { .. } => 1200,
        }
    }

    /// Short name used in logs and file names.
    pub fn label(&self) -> &'static str {
        match self {
            TaskKind::Ocr => "ocr",
            TaskKind::Format { .. } => "format",
            TaskKind::Translate { .. } => "translate",
        }
    }

    /// Whether the assembled output is HTML (as opposed to plain text).
    pub fn produces_html(&self) -> bool {
        !matches!(self, TaskKind::Ocr)
    }
}
