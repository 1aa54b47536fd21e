//! API key pool: an ordered list of credentials tried first-to-last.
//!
//! The pool is a plain value owned by the calling session. A run borrows it
//! shared; only [`crate::job::Orchestrator::resume`] borrows it mutably, and
//! only while the job is paused, so the list can never change under an
//! in-flight request.
//!
//! Insertion order is priority order. The pool never reorders or
//! deduplicates: a key listed twice is simply tried twice per rotation.

use crate::error::Doc2WordError;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Environment variable holding a newline- or comma-separated key list.
pub const KEYS_ENV_VAR: &str = "DOC2WORD_API_KEYS";

/// Single-key fallback environment variable.
pub const SINGLE_KEY_ENV_VAR: &str = "GEMINI_API_KEY";

/// An opaque API key.
///
/// `Debug` and [`Credential::masked`] show only the first five characters so
/// keys can be logged safely.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw key. Returns `None` when it is empty after trimming.
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The raw key, for placing into a request.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// First five characters followed by an ellipsis.
    pub fn masked(&self) -> String {
        let head: String = self.0.chars().take(5).collect();
        format!("{head}\u{2026}")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.masked()).finish()
    }
}

/// Ordered set of credentials.
#[derive(Debug, Clone, Default)]
pub struct KeyPool {
    keys: Vec<Credential>,
}

impl KeyPool {
    /// Build a pool from raw entries, trimming each and dropping empties.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut pool = Self::default();
        pool.append(entries);
        pool
    }

    /// Parse the flat one-key-per-line format.
    pub fn from_lines(text: &str) -> Self {
        Self::new(text.lines())
    }

    /// Read a key file in the one-key-per-line format.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Doc2WordError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Doc2WordError::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => Doc2WordError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => Doc2WordError::Internal(format!("reading {}: {e}", path.display())),
        })?;
        let pool = Self::from_lines(&text);
        debug!("Loaded {} keys from {}", pool.len(), path.display());
        Ok(pool)
    }

    /// Read keys from `DOC2WORD_API_KEYS` (newline or comma separated),
    /// falling back to a single `GEMINI_API_KEY`.
    pub fn from_env() -> Self {
        if let Ok(list) = std::env::var(KEYS_ENV_VAR) {
            let pool = Self::new(list.split(['\n', ',']));
            if !pool.is_empty() {
                return pool;
            }
        }
        match std::env::var(SINGLE_KEY_ENV_VAR) {
            Ok(key) => Self::new([key]),
            Err(_) => Self::default(),
        }
    }

    /// The ordered credentials.
    pub fn load(&self) -> &[Credential] {
        &self.keys
    }

    /// Append entries in order. Returns how many non-empty keys were added.
    pub fn append<I, S>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let before = self.keys.len();
        self.keys
            .extend(entries.into_iter().filter_map(Credential::new));
        self.keys.len() - before
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Fail with [`Doc2WordError::NoCredentialsConfigured`] when empty.
    pub fn ensure_not_empty(&self) -> Result<(), Doc2WordError> {
        if self.is_empty() {
            Err(Doc2WordError::NoCredentialsConfigured)
        } else {
            Ok(())
        }
    }

    /// Render back to the one-key-per-line format.
    pub fn to_lines(&self) -> String {
        self.keys
            .iter()
            .map(Credential::expose)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
