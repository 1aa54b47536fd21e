//! Top-level entry points: OCR, formatting, translation, resume.
//!
//! Each entry point loads or splits its input, builds a [`ProcessingJob`]
//! and hands it to the [`Orchestrator`]. They return a [`JobOutcome`] rather
//! than a bare result because a pause is an expected outcome, not an error:
//! the caller decides whether to ask for more keys, save the state, or give
//! up.
//!
//! Input errors (missing file, unsupported type, empty key pool) are
//! returned as `Err` before any remote call is made.

use crate::config::{JobConfig, TaskKind};
use crate::document::{text_document, text_word_document, word_document, write_output};
use crate::error::Doc2WordError;
use crate::job::{JobOutcome, Orchestrator, PausedJob, ProcessingJob};
use crate::keys::KeyPool;
use crate::output::JobOutput;
use crate::pipeline::{chunk, input};
use std::path::Path;
use tracing::info;

/// Transcribe scanned pages (image or PDF paths / URLs) to plain text.
///
/// Pages are sent in groups of [`JobConfig::media_group_size`], in the order
/// given.
///
/// # Example
/// ```rust,no_run
/// use edgequake_doc2word::{extract_text, JobConfig, JobOutcome, KeyPool};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = KeyPool::from_env();
/// let pages = vec!["page1.png".to_string(), "page2.png".to_string()];
/// match extract_text(&pages, &pool, &JobConfig::default()).await? {
///     JobOutcome::Completed(out) => println!("{}", out.text),
///     JobOutcome::Paused(p) => eprintln!("paused at unit {}", p.next_unit()),
///     JobOutcome::Failed { error, .. } => eprintln!("{error}"),
/// }
/// # Ok(())
/// # }
/// ```
pub async fn extract_text(
    inputs: &[String],
    pool: &KeyPool,
    config: &JobConfig,
) -> Result<JobOutcome, Doc2WordError> {
    pool.ensure_not_empty()?;
    let orchestrator = Orchestrator::new(config)?;

    let files = input::load_media(
        inputs,
        config.max_media_files,
        config.download_timeout_secs,
    )
    .await?;
    let units = chunk::split_media(files, config.media_group_size);
    info!("OCR: {} file(s) in {} unit(s)", inputs.len(), units.len());

    let job = ProcessingJob::new(TaskKind::Ocr, units);
    Ok(orchestrator.run(job, pool).await)
}

/// Convert raw text into academic HTML.
pub async fn format_text(
    text: &str,
    footnotes: bool,
    pool: &KeyPool,
    config: &JobConfig,
) -> Result<JobOutcome, Doc2WordError> {
    run_text_task(TaskKind::Format { footnotes }, text, pool, config).await
}

/// Translate text into `target_language`, producing HTML.
pub async fn translate_text(
    text: &str,
    target_language: &str,
    domain: &str,
    footnotes: bool,
    pool: &KeyPool,
    config: &JobConfig,
) -> Result<JobOutcome, Doc2WordError> {
    let task = TaskKind::Translate {
        target_language: target_language.to_string(),
        domain: domain.to_string(),
        footnotes,
    };
    run_text_task(task, text, pool, config).await
}

async fn run_text_task(
    task: TaskKind,
    text: &str,
    pool: &KeyPool,
    config: &JobConfig,
) -> Result<JobOutcome, Doc2WordError> {
    pool.ensure_not_empty()?;
    let orchestrator = Orchestrator::new(config)?;

    let units = chunk::text_units(text, config.chunk_chars(&task));
    info!(
        "{}: {} chars in {} unit(s)",
        task.label(),
        text.chars().count(),
        units.len()
    );

    let job = ProcessingJob::new(task, units);
    Ok(orchestrator.run(job, pool).await)
}

/// Continue a paused job after adding `new_credentials` to `pool`.
///
/// `paused` is only borrowed: if no usable key is supplied the caller still
/// holds the state and can try again.
pub async fn resume<I, S>(
    paused: &PausedJob,
    pool: &mut KeyPool,
    new_credentials: I,
    config: &JobConfig,
) -> Result<JobOutcome, Doc2WordError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let orchestrator = Orchestrator::new(config)?;
    orchestrator.resume(paused, pool, new_credentials).await
}

/// Render a finished job as file contents: plain text for OCR, a Word HTML
/// document otherwise.
pub fn render_document(task: &TaskKind, output: &JobOutput) -> String {
    match task {
        TaskKind::Ocr => text_document(&output.text),
        TaskKind::Format { .. } => word_document(&output.text, None),
        TaskKind::Translate {
            target_language, ..
        } => word_document(&output.text, Some(target_language)),
    }
}

/// Render a finished job as a Word document. OCR text keeps its line
/// breaks; formatted and translated HTML renders as in [`render_document`].
pub fn render_word_document(task: &TaskKind, output: &JobOutput) -> String {
    match task {
        TaskKind::Ocr => text_word_document(&output.text),
        _ => render_document(task, output),
    }
}

/// Render and atomically write a finished job.
pub fn write_document(
    path: impl AsRef<Path>,
    task: &TaskKind,
    output: &JobOutput,
) -> Result<(), Doc2WordError> {
    write_output(path.as_ref(), &render_document(task, output))
}

/// Write a finished job as a Word document, whatever the task.
pub fn write_word_document(
    path: impl AsRef<Path>,
    task: &TaskKind,
    output: &JobOutput,
) -> Result<(), Doc2WordError> {
    write_output(path.as_ref(), &render_word_document(task, output))
}

/// [`extract_text`], writing the text file when the job completes.
pub async fn extract_text_to_file(
    inputs: &[String],
    output_path: impl AsRef<Path>,
    pool: &KeyPool,
    config: &JobConfig,
) -> Result<JobOutcome, Doc2WordError> {
    let outcome = extract_text(inputs, pool, config).await?;
    write_if_completed(output_path.as_ref(), &TaskKind::Ocr, outcome)
}

/// [`format_text`], writing the Word document when the job completes.
pub async fn format_text_to_file(
    text: &str,
    footnotes: bool,
    output_path: impl AsRef<Path>,
    pool: &KeyPool,
    config: &JobConfig,
) -> Result<JobOutcome, Doc2WordError> {
    let outcome = format_text(text, footnotes, pool, config).await?;
    write_if_completed(
        output_path.as_ref(),
        &TaskKind::Format { footnotes },
        outcome,
    )
}

/// [`translate_text`], writing the Word document when the job completes.
pub async fn translate_text_to_file(
    text: &str,
    target_language: &str,
    domain: &str,
    footnotes: bool,
    output_path: impl AsRef<Path>,
    pool: &KeyPool,
    config: &JobConfig,
) -> Result<JobOutcome, Doc2WordError> {
    let outcome =
        translate_text(text, target_language, domain, footnotes, pool, config).await?;
    let task = TaskKind::Translate {
        target_language: target_language.to_string(),
        domain: domain.to_string(),
        footnotes,
    };
    write_if_completed(output_path.as_ref(), &task, outcome)
}

fn write_if_completed(
    path: &Path,
    task: &TaskKind,
    outcome: JobOutcome,
) -> Result<JobOutcome, Doc2WordError> {
    if let JobOutcome::Completed(ref output) = outcome {
        write_document(path, task, output)?;
    }
    Ok(outcome)
}
