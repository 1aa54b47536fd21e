//! # edgequake-doc2word
//!
//! OCR, format and translate long documents with Google Gemini, producing a
//! Word-compatible document.
//!
//! ## Why this crate?
//!
//! A book-length scan or manuscript does not fit in one model call, and a
//! free-tier API key runs out of quota long before the book does. This crate
//! splits the work into bounded units, sends them one at a time, rotates
//! through a list of API keys when one is rate limited, and when every key
//! is spent it *pauses* instead of failing: the finished units are kept, and
//! the job resumes from the same unit once more keys are supplied.
//!
//! ## Pipeline Overview
//!
//! ```text
//! pages / text
//!  │
//!  ├─ 1. Input     read paths, download URLs, sniff media types
//!  ├─ 2. Chunk     6 pages per unit, or ≤ 7000-char text spans
//!  ├─ 3. Request   instruction + unit content
//!  ├─ 4. Rotate    key 1 → key 2 → … until one succeeds
//!  ├─ 5. Pause     every key exhausted → PausedJob (resumable)
//!  ├─ 6. Assemble  strip fences, join units in order
//!  └─ 7. Document  plain text, or Word HTML with RTL support
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_doc2word::{format_text, JobConfig, JobOutcome, KeyPool};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // DOC2WORD_API_KEYS="key1,key2" or GEMINI_API_KEY=key
//!     let mut pool = KeyPool::from_env();
//!     let config = JobConfig::default();
//!     let text = std::fs::read_to_string("manuscript.txt")?;
//!
//!     let mut outcome = format_text(&text, true, &pool, &config).await?;
//!     while let JobOutcome::Paused(paused) = outcome {
//!         eprintln!("keys exhausted at unit {}", paused.next_unit());
//!         let more = std::fs::read_to_string("more-keys.txt")?;
//!         outcome = edgequake_doc2word::resume(&paused, &mut pool, more.lines(), &config).await?;
//!     }
//!     let output = outcome.into_result()?;
//!     println!("{}", output.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc2word` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-doc2word = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod job;
pub mod keys;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{JobConfig, JobConfigBuilder, TaskKind, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use convert::{
    extract_text, extract_text_to_file, format_text, format_text_to_file, render_document,
    render_word_document, resume, translate_text, translate_text_to_file, write_document,
    write_word_document,
};
pub use document::{is_rtl, text_document, text_word_document, word_document};
pub use error::{Doc2WordError, RemoteError};
pub use job::{run_chunked_job, JobOutcome, Orchestrator, PausedJob, ProcessingJob};
pub use keys::{Credential, KeyPool};
pub use output::{JobOutput, JobStats, UnitResult};
pub use pipeline::chunk::{MediaPayload, WorkUnit};
pub use pipeline::gemini::{GeminiClient, RemoteModel};
pub use pipeline::request::PromptPart;
pub use progress::{JobProgressCallback, NoopProgressCallback, ProgressCallback};
