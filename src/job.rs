//! Sequential orchestrator: drive a job's units one at a time.
//!
//! OCR, formatting and translation all run through [`run_chunked_job`];
//! they differ only in their units, their request builder and their pacing.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle ──run──▶ Running ──▶ Completed(JobOutput)
//!                   │
//!                   ├──────▶ Failed { error, partials }
//!                   │
//!                   └──────▶ Paused(PausedJob) ──resume(new keys)──▶ Running
//! ```
//!
//! A job pauses only when every key is exhausted for the current unit. The
//! [`PausedJob`] holds the unfinished job by value: the units still to do,
//! the text already produced, and the index to restart at. It can be saved
//! with [`PausedJob::to_json`] and resumed in a later process.
//!
//! Cancelling is dropping the future returned by [`Orchestrator::run`]. The
//! in-flight request is dropped with it and nothing is assembled.

use crate::config::{JobConfig, TaskKind};
use crate::error::Doc2WordError;
use crate::keys::KeyPool;
use crate::output::{JobOutput, JobStats, UnitResult};
use crate::pipeline::assemble::assemble;
use crate::pipeline::chunk::WorkUnit;
use crate::pipeline::gemini::{GeminiClient, RemoteModel};
use crate::pipeline::request::{build_request, RequestBuilder};
use crate::pipeline::rotate::{call_with_rotation, CallSuccess};
use crate::progress::{JobProgressCallback, NoopProgressCallback};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Version tag written into saved job state.
const STATE_VERSION: u32 = 1;

/// A job: its task, its units, and the results of the units finished so far.
///
/// Invariant: `partials.len() == results.len() <= units.len()`, and
/// `partials[i]` is the raw text returned for `units[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingJob {
    task: TaskKind,
    units: Vec<WorkUnit>,
    partials: Vec<String>,
    results: Vec<UnitResult>,
}

impl ProcessingJob {
    pub fn new(task: TaskKind, units: Vec<WorkUnit>) -> Self {
        Self {
            task,
            units,
            partials: Vec::new(),
            results: Vec::new(),
        }
    }

    pub fn task(&self) -> &TaskKind {
        &self.task
    }

    pub fn units(&self) -> &[WorkUnit] {
        &self.units
    }

    /// Raw text of finished units, in order.
    pub fn partials(&self) -> &[String] {
        &self.partials
    }

    /// Number of finished units.
    pub fn completed(&self) -> usize {
        self.partials.len()
    }

    pub fn total(&self) -> usize {
        self.units.len()
    }

    /// Units still to process.
    pub fn remaining(&self) -> &[WorkUnit] {
        &self.units[self.completed()..]
    }

    fn record(&mut self, success: CallSuccess, elapsed: Duration) -> usize {
        let chars = success.text.chars().count();
        self.results.push(UnitResult {
            index: self.partials.len(),
            chars,
            attempts: success.attempts,
            duration_ms: elapsed.as_millis() as u64,
        });
        self.partials.push(success.text);
        chars
    }

    fn finish(self, resumed_from: usize) -> JobOutput {
        let stats = JobStats::from_units(&self.results, resumed_from);
        JobOutput {
            text: assemble(&self.partials),
            units: self.results,
            stats,
        }
    }
}

/// A job stopped because every key was exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PausedJob {
    version: u32,
    job: ProcessingJob,
    /// Keys tried for the unit that could not be completed.
    attempted: usize,
}

impl PausedJob {
    pub fn job(&self) -> &ProcessingJob {
        &self.job
    }

    /// Units finished before the pause.
    pub fn completed(&self) -> usize {
        self.job.completed()
    }

    pub fn total(&self) -> usize {
        self.job.total()
    }

    /// 1-based number of the unit that will run first on resume.
    pub fn next_unit(&self) -> usize {
        self.job.completed() + 1
    }

    pub fn attempted(&self) -> usize {
        self.attempted
    }

    /// Assemble what has been produced so far.
    pub fn partial_text(&self) -> String {
        assemble(&self.job.partials)
    }

    pub fn to_json(&self) -> Result<String, Doc2WordError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, Doc2WordError> {
        let paused: Self = serde_json::from_str(json)?;
        if paused.version != STATE_VERSION {
            return Err(Doc2WordError::InvalidConfig(format!(
                "unsupported job state version {} (expected {STATE_VERSION})",
                paused.version
            )));
        }
        if paused.job.partials.len() > paused.job.units.len()
            || paused.job.partials.len() != paused.job.results.len()
        {
            return Err(Doc2WordError::InvalidConfig(
                "job state is inconsistent: partials do not match units".into(),
            ));
        }
        Ok(paused)
    }
}

/// How a run ended.
#[derive(Debug)]
pub enum JobOutcome {
    Completed(JobOutput),
    /// Every key was exhausted. Add keys and call [`Orchestrator::resume`].
    Paused(PausedJob),
    /// Terminal failure. `partials` holds the raw text of finished units.
    Failed {
        error: Doc2WordError,
        partials: Vec<String>,
    },
}

impl JobOutcome {
    /// Turn the outcome into a `Result`, treating a pause as an error.
    pub fn into_result(self) -> Result<JobOutput, Doc2WordError> {
        match self {
            JobOutcome::Completed(output) => Ok(output),
            JobOutcome::Paused(paused) => Err(Doc2WordError::AllCredentialsExhausted {
                unit: paused.next_unit(),
                attempted: paused.attempted,
            }),
            JobOutcome::Failed { error, .. } => Err(error),
        }
    }
}

/// Run `job` to completion, pause, or failure.
///
/// Units run strictly in order: unit `i + 1` is not requested until unit
/// `i`'s text has been stored. `pacing` is slept between consecutive remote
/// calls (not before the first one of a run). The pool is checked once,
/// before any call; an empty pool fails with
/// [`Doc2WordError::NoCredentialsConfigured`].
pub async fn run_chunked_job(
    mut job: ProcessingJob,
    pool: &KeyPool,
    remote: &dyn RemoteModel,
    model: &str,
    build_request: RequestBuilder,
    progress: &dyn JobProgressCallback,
    pacing: Duration,
) -> JobOutcome {
    let total = job.total();
    let resumed_from = job.completed();

    if let Err(error) = pool.ensure_not_empty() {
        progress.on_failed(resumed_from, total, error.to_string());
        return JobOutcome::Failed {
            error,
            partials: job.partials,
        };
    }

    info!(
        "Starting {} job: {} unit(s), {} already done, {} key(s)",
        job.task.label(),
        total,
        resumed_from,
        pool.len()
    );
    progress.on_job_start(resumed_from, total);

    while job.completed() < total {
        let index = job.completed();
        let unit_num = index + 1;

        if index > resumed_from && !pacing.is_zero() {
            sleep(pacing).await;
        }

        progress.on_unit_start(unit_num, total);
        let parts = build_request(&job.task, &job.units[index], index, total);
        debug!("Unit {}/{}: {} part(s)", unit_num, total, parts.len());

        let start = Instant::now();
        match call_with_rotation(remote, model, pool, &parts, unit_num).await {
            Ok(success) => {
                let chars = job.record(success, start.elapsed());
                progress.on_unit_complete(job.completed(), total, chars);
            }
            Err(Doc2WordError::AllCredentialsExhausted { attempted, .. }) => {
                warn!(
                    "Paused at unit {}/{}: all {} key(s) exhausted",
                    unit_num, total, attempted
                );
                progress.on_paused(index, total);
                return JobOutcome::Paused(PausedJob {
                    version: STATE_VERSION,
                    job,
                    attempted,
                });
            }
            Err(error) => {
                warn!("Unit {}/{} failed: {}", unit_num, total, error);
                progress.on_failed(index, total, error.to_string());
                return JobOutcome::Failed {
                    error,
                    partials: job.partials,
                };
            }
        }
    }

    info!("{} job complete: {} unit(s)", job.task.label(), total);
    progress.on_job_complete(total);
    JobOutcome::Completed(job.finish(resumed_from))
}

/// Runs jobs against one remote model with one configuration.
#[derive(Clone)]
pub struct Orchestrator {
    remote: Arc<dyn RemoteModel>,
    config: JobConfig,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Use `config.remote` when set, otherwise a [`GeminiClient`] for
    /// `config.base_url`.
    pub fn new(config: &JobConfig) -> Result<Self, Doc2WordError> {
        let remote: Arc<dyn RemoteModel> = match &config.remote {
            Some(remote) => Arc::clone(remote),
            None => Arc::new(GeminiClient::from_config(config)?),
        };
        Ok(Self {
            remote,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Run a fresh or partially finished job.
    pub async fn run(&self, job: ProcessingJob, pool: &KeyPool) -> JobOutcome {
        let noop = NoopProgressCallback;
        let progress: &dyn JobProgressCallback = match &self.config.progress_callback {
            Some(cb) => cb.as_ref(),
            None => &noop,
        };
        let pacing = self.config.pacing(&job.task);
        run_chunked_job(
            job,
            pool,
            self.remote.as_ref(),
            &self.config.model,
            build_request,
            progress,
            pacing,
        )
        .await
    }

    /// Append `new_credentials` to `pool` and continue `paused` at its
    /// stored index.
    ///
    /// Fails with [`Doc2WordError::ResumeWithoutCredentials`] when no
    /// non-empty key is supplied; `paused` is left untouched so the caller
    /// can try again.
    pub async fn resume<I, S>(
        &self,
        paused: &PausedJob,
        pool: &mut KeyPool,
        new_credentials: I,
    ) -> Result<JobOutcome, Doc2WordError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let added = pool.append(new_credentials);
        if added == 0 {
            return Err(Doc2WordError::ResumeWithoutCredentials);
        }
        info!(
            "Resuming at unit {}/{} with {} new key(s)",
            paused.next_unit(),
            paused.total(),
            added
        );
        Ok(self.run(paused.job.clone(), pool).await)
    }
}
