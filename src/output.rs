//! Result types for completed jobs.

use serde::{Deserialize, Serialize};

/// Per-unit record of a successful remote call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitResult {
    /// 0-based unit index within the job.
    pub index: usize,
    /// Characters returned by the model for this unit (before assembly).
    pub chars: usize,
    /// Credentials tried before one succeeded (1 = first key worked).
    pub attempts: usize,
    /// Wall-clock time spent on this unit, including failed attempts.
    pub duration_ms: u64,
}

/// Aggregate statistics for a job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStats {
    pub total_units: usize,
    /// Units already finished when the last run started (0 unless resumed).
    pub resumed_from: usize,
    /// Sum of `attempts` across units.
    pub total_attempts: usize,
    pub total_duration_ms: u64,
}

/// The output of a completed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOutput {
    /// Assembled text (plain text for OCR, HTML fragments otherwise).
    pub text: String,
    /// Units processed in this job, in order. Units finished before a pause
    /// are included.
    pub units: Vec<UnitResult>,
    pub stats: JobStats,
}

impl JobOutput {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl JobStats {
    pub(crate) fn from_units(units: &[UnitResult], resumed_from: usize) -> Self {
        Self {
            total_units: units.len(),
            resumed_from,
            total_attempts: units.iter().map(|u| u.attempts).sum(),
            total_duration_ms: units.iter().map(|u| u.duration_ms).sum(),
        }
    }
}
