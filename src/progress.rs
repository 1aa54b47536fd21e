//! Progress-callback trait for per-unit job events.
//!
//! Inject an [`Arc<dyn JobProgressCallback>`] via
//! [`crate::config::JobConfigBuilder::progress_callback`] to receive events
//! as the orchestrator works through a job.
//!
//! Units run strictly one after another, so events for a single job never
//! overlap. The trait is still `Send + Sync` so one callback can be shared
//! by several jobs or moved into a spawned task.
//!
//! # Example
//!
//! ```rust
//! use edgequake_doc2word::{JobConfig, JobProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct Counter(AtomicUsize);
//!
//! impl JobProgressCallback for Counter {
//!     fn on_unit_complete(&self, completed: usize, total: usize, _chars: usize) {
//!         self.0.store(completed, Ordering::SeqCst);
//!         eprintln!("{completed}/{total}");
//!     }
//! }
//!
//! let config = JobConfig::builder()
//!     .progress_callback(Arc::new(Counter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the orchestrator as it processes each unit.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait JobProgressCallback: Send + Sync {
    /// Called once when a run (or resumed run) starts.
    ///
    /// # Arguments
    /// * `completed` — units already finished before this run (non-zero on resume)
    /// * `total`     — units in the whole job
    fn on_job_start(&self, completed: usize, total: usize) {
        let _ = (completed, total);
    }

    /// Called just before the request for a unit is sent.
    ///
    /// # Arguments
    /// * `unit_num` — 1-indexed unit number
    /// * `total`    — units in the whole job
    fn on_unit_start(&self, unit_num: usize, total: usize) {
        let _ = (unit_num, total);
    }

    /// Called after a unit's text has been appended to the job.
    ///
    /// Fires exactly once per unit; `completed` is strictly increasing
    /// within a job, across pauses and resumes.
    ///
    /// # Arguments
    /// * `completed` — units finished so far
    /// * `total`     — units in the whole job
    /// * `chars`     — characters returned for this unit
    fn on_unit_complete(&self, completed: usize, total: usize, chars: usize) {
        let _ = (completed, total, chars);
    }

    /// Called when every key is exhausted and the job pauses.
    fn on_paused(&self, completed: usize, total: usize) {
        let _ = (completed, total);
    }

    /// Called when the job fails terminally.
    fn on_failed(&self, completed: usize, total: usize, error: String) {
        let _ = (completed, total, error);
    }

    /// Called once after the last unit completes.
    fn on_job_complete(&self, total: usize) {
        let _ = total;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl JobProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::JobConfig`].
pub type ProgressCallback = Arc<dyn JobProgressCallback>;
