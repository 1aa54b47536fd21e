//! CLI binary for edgequake-doc2word.
//!
//! A thin shim over the library crate: maps CLI flags to `JobConfig`, shows
//! a progress bar, and turns a paused job into either an interactive "paste
//! more keys" prompt or a saved state file for `doc2word resume`.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_doc2word::pipeline::input::load_text;
use edgequake_doc2word::{
    extract_text, format_text, render_document, render_word_document, resume, translate_text,
    write_document, write_word_document, JobConfig, JobOutcome, JobOutput, JobProgressCallback, KeyPool, PausedJob, ProgressCallback,
    TaskKind,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Exit status when a job stops because every key is exhausted.
const EXIT_PAUSED: i32 = 2;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// Progress bar over units. Survives pause/resume cycles: the bar is kept
/// and picks up at the resumed position.
struct CliProgressCallback {
    bar: ProgressBar,
    unit_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} units  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);
        bar.set_style(style);
        bar.set_prefix("Working");

        Arc::new(Self {
            bar,
            unit_started: Mutex::new(None),
        })
    }

    fn elapsed_secs(&self) -> f64 {
        self.unit_started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl JobProgressCallback for CliProgressCallback {
    fn on_job_start(&self, completed: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(completed as u64);
        self.bar.reset_eta();
        self.bar.enable_steady_tick(Duration::from_millis(80));
        let verb = if completed > 0 { "Resuming" } else { "Starting" };
        self.bar.println(format!(
            "{} {}",
            bold("◆"),
            bold(&format!("{verb}: {total} unit(s), {completed} done"))
        ));
    }

    fn on_unit_start(&self, unit_num: usize, _total: usize) {
        if let Ok(mut t) = self.unit_started.lock() {
            *t = Some(Instant::now());
        }
        self.bar.set_message(format!("unit {unit_num}"));
    }

    fn on_unit_complete(&self, completed: usize, total: usize, chars: usize) {
        self.bar.println(format!(
            "  {} Unit {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            completed,
            total,
            dim(&format!("{chars:>5} chars")),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
        self.bar.set_position(completed as u64);
    }

    fn on_paused(&self, completed: usize, total: usize) {
        self.bar.disable_steady_tick();
        self.bar.println(format!(
            "  {} Paused at unit {}/{}: every API key is exhausted",
            yellow("⏸"),
            completed + 1,
            total
        ));
    }

    fn on_failed(&self, completed: usize, total: usize, error: String) {
        self.bar.println(format!(
            "  {} Unit {:>3}/{:<3}  {}",
            red("✗"),
            completed + 1,
            total,
            red(&error)
        ));
        self.bar.finish_and_clear();
    }

    fn on_job_complete(&self, total: usize) {
        self.bar.finish_and_clear();
        eprintln!("{} {} unit(s) processed", green("✔"), bold(&total.to_string()));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # OCR scanned pages (6 pages per request) to a text file
  doc2word ocr page-*.png -o book.txt

  # Same, as a Word document
  doc2word ocr page-*.png -o book.doc

  # Format a manuscript as academic HTML for Word
  doc2word format manuscript.txt --footnotes -o manuscript.doc

  # Translate to English (legal domain)
  doc2word translate contract.txt --to English --domain legal -o contract.doc

  # Resume a job saved after all keys ran out
  doc2word resume doc2word-state.json --add-keys fresh-keys.txt -o book.txt

API KEYS:
  Keys are tried in order; a rate-limited key is skipped for the next one.
  When every key is exhausted the job pauses. In a terminal you are asked to
  paste more keys; otherwise the job is saved to --state-file and the
  process exits with status 2.

ENVIRONMENT VARIABLES:
  DOC2WORD_API_KEYS    Newline- or comma-separated key list
  GEMINI_API_KEY       Single key (used when DOC2WORD_API_KEYS is unset)
  DOC2WORD_KEYS_FILE   Key file, one key per line
  DOC2WORD_MODEL       Model ID (default gemini-3-flash-preview)
  RUST_LOG             Log filter override (e.g. edgequake_doc2word=debug)
"#;

/// OCR, format and translate documents into Word-compatible files with Gemini.
#[derive(Parser, Debug)]
#[command(
    name = "doc2word",
    version,
    about = "OCR, format and translate documents into Word-compatible files with Gemini",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    opts: GlobalOpts,
}

#[derive(Args, Debug)]
struct GlobalOpts {
    /// File with API keys, one per line. Default: DOC2WORD_API_KEYS / GEMINI_API_KEY.
    #[arg(long, global = true, env = "DOC2WORD_KEYS_FILE")]
    keys_file: Option<PathBuf>,

    /// Gemini model ID.
    #[arg(long, global = true, env = "DOC2WORD_MODEL")]
    model: Option<String>,

    /// Gemini API base URL.
    #[arg(long, global = true, env = "DOC2WORD_BASE_URL")]
    base_url: Option<String>,

    /// Pages sent together in one OCR request.
    #[arg(long, global = true, env = "DOC2WORD_GROUP_SIZE", default_value_t = 6)]
    group_size: usize,

    /// Maximum characters per text unit (default: 7000, 4500 for translation).
    #[arg(long, global = true, env = "DOC2WORD_MAX_CHARS")]
    max_chars: Option<usize>,

    /// Delay between requests in milliseconds (default: 800 / 1000 / 1200).
    #[arg(long, global = true, env = "DOC2WORD_PACING_MS")]
    pacing_ms: Option<u64>,

    /// Per-request timeout in seconds.
    #[arg(long, global = true, env = "DOC2WORD_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// URL download timeout in seconds.
    #[arg(long, global = true, env = "DOC2WORD_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Where to save a paused job.
    #[arg(
        long,
        global = true,
        env = "DOC2WORD_STATE_FILE",
        default_value = "doc2word-state.json"
    )]
    state_file: PathBuf,

    /// Never prompt for keys; save the state file on pause instead.
    #[arg(long, global = true)]
    no_prompt: bool,

    /// Write OCR text as a Word document (implied by a `.doc` output path).
    #[arg(long, global = true)]
    word: bool,

    /// Output structured JSON (JobOutput) instead of the document.
    #[arg(long, global = true)]
    json: bool,

    /// Disable progress bar.
    #[arg(long, global = true, env = "DOC2WORD_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOC2WORD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Transcribe scanned pages (images or PDFs, paths or URLs) to text.
    Ocr {
        /// Page files or URLs, in reading order.
        #[arg(required = true)]
        inputs: Vec<String>,
        /// Write the text here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert raw text to academic HTML for Word.
    Format {
        /// Text file path, URL, or `-` for stdin.
        input: String,
        /// Collect footnotes at the end of each unit.
        #[arg(long)]
        footnotes: bool,
        /// Write the Word document here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Translate text, producing HTML for Word.
    Translate {
        /// Text file path, URL, or `-` for stdin.
        input: String,
        /// Target language (name or ISO code).
        #[arg(long = "to")]
        target_language: String,
        /// Subject domain hint.
        #[arg(long, default_value = "general")]
        domain: String,
        #[arg(long)]
        footnotes: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Resume a job saved after all keys were exhausted.
    Resume {
        /// State file written by a paused run.
        state: PathBuf,
        /// File with additional keys, one per line (prompted for if omitted).
        #[arg(long)]
        add_keys: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let opts = &cli.opts;

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs unless --verbose is given.
    let show_progress = !opts.quiet && !opts.no_progress && !opts.json;
    let filter = if opts.verbose {
        "debug"
    } else if opts.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress = show_progress.then(CliProgressCallback::new);
    let config = build_config(opts, progress.clone().map(|p| p as ProgressCallback))?;
    let mut pool = load_pool(opts)?;

    let (task, outcome, output_path) = match &cli.command {
        Command::Ocr { inputs, output } => {
            let outcome = extract_text(inputs, &pool, &config)
                .await
                .context("OCR failed")?;
            (TaskKind::Ocr, outcome, output.clone())
        }
        Command::Format {
            input,
            footnotes,
            output,
        } => {
            let text = read_text_input(input, opts.download_timeout).await?;
            let outcome = format_text(&text, *footnotes, &pool, &config)
                .await
                .context("Formatting failed")?;
            (
                TaskKind::Format {
                    footnotes: *footnotes,
                },
                outcome,
                output.clone(),
            )
        }
        Command::Translate {
            input,
            target_language,
            domain,
            footnotes,
            output,
        } => {
            let text = read_text_input(input, opts.download_timeout).await?;
            let outcome = translate_text(
                &text,
                target_language,
                domain,
                *footnotes,
                &pool,
                &config,
            )
            .await
            .context("Translation failed")?;
            let task = TaskKind::Translate {
                target_language: target_language.clone(),
                domain: domain.clone(),
                footnotes: *footnotes,
            };
            (task, outcome, output.clone())
        }
        Command::Resume {
            state,
            add_keys,
            output,
        } => {
            let json = std::fs::read_to_string(state)
                .with_context(|| format!("Failed to read state file {}", state.display()))?;
            let paused = PausedJob::from_json(&json).context("Invalid state file")?;
            let new_keys = match add_keys {
                Some(path) => KeyPool::from_file(path)
                    .with_context(|| format!("Failed to read keys from {}", path.display()))?
                    .to_lines(),
                None => prompt_for_keys(&paused, progress.as_deref(), opts)?.join("\n"),
            };
            let outcome = resume(&paused, &mut pool, new_keys.lines(), &config)
                .await
                .context("Resume failed")?;
            (paused.job().task().clone(), outcome, output.clone())
        }
    };

    let output = drive(outcome, &mut pool, &config, progress.as_deref(), opts).await?;
    emit(&task, &output, output_path.as_deref(), opts)
}

/// Follow an outcome through pauses until it completes or fails.
async fn drive(
    mut outcome: JobOutcome,
    pool: &mut KeyPool,
    config: &JobConfig,
    progress: Option<&CliProgressCallback>,
    opts: &GlobalOpts,
) -> Result<JobOutput> {
    loop {
        match outcome {
            JobOutcome::Completed(output) => return Ok(output),
            JobOutcome::Failed { error, partials } => {
                if !opts.quiet && !partials.is_empty() {
                    eprintln!(
                        "{} {} unit(s) had completed before the failure",
                        dim("…"),
                        partials.len()
                    );
                }
                return Err(anyhow::Error::from(error)).context("Job failed");
            }
            JobOutcome::Paused(paused) => {
                let keys = prompt_for_keys(&paused, progress, opts)?;
                if keys.is_empty() {
                    save_state(&paused, &opts.state_file)?;
                    std::process::exit(EXIT_PAUSED);
                }
                outcome = resume(&paused, pool, keys, config)
                    .await
                    .context("Resume failed")?;
            }
        }
    }
}

/// Ask for more keys on a terminal. Returns an empty list when not
/// interactive or when the user enters none.
fn prompt_for_keys(
    paused: &PausedJob,
    progress: Option<&CliProgressCallback>,
    opts: &GlobalOpts,
) -> Result<Vec<String>> {
    if opts.no_prompt || opts.quiet || !io::stdin().is_terminal() {
        return Ok(Vec::new());
    }
    let ask = || -> Result<Vec<String>> {
        eprintln!(
            "{} All keys are exhausted at unit {}/{} ({} done).",
            yellow("⏸"),
            paused.next_unit(),
            paused.total(),
            paused.completed()
        );
        eprintln!("Paste more API keys, one per line, then an empty line (empty to save and quit):");
        io::stderr().flush().ok();

        let mut keys = Vec::new();
        for line in io::stdin().lock().lines() {
            let line = line.context("Failed to read keys from stdin")?;
            if line.trim().is_empty() {
                break;
            }
            keys.push(line);
        }
        Ok(keys)
    };
    match progress {
        Some(p) => p.bar.suspend(ask),
        None => ask(),
    }
}

fn save_state(paused: &PausedJob, path: &Path) -> Result<()> {
    let json = paused.to_json().context("Failed to serialise job state")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write state file {}", path.display()))?;
    eprintln!(
        "{} Job paused at unit {}/{}. State saved to {}",
        yellow("⏸"),
        paused.next_unit(),
        paused.total(),
        bold(&path.display().to_string())
    );
    eprintln!(
        "   Resume with: doc2word resume {} --add-keys <FILE>",
        path.display()
    );
    Ok(())
}

/// Write the finished document to a file or stdout.
fn emit(task: &TaskKind, output: &JobOutput, path: Option<&Path>, opts: &GlobalOpts) -> Result<()> {
    if opts.json {
        let json = serde_json::to_string_pretty(output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    let as_word = opts.word
        || path
            .and_then(|p| p.extension())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("doc"));

    match path {
        Some(path) => {
            let written = if as_word {
                write_word_document(path, task, output)
            } else {
                write_document(path, task, output)
            };
            written.context("Failed to write output")?;
            if !opts.quiet {
                eprintln!(
                    "{}  {} unit(s)  {} attempt(s)  {}ms  →  {}",
                    green("✔"),
                    output.stats.total_units,
                    output.stats.total_attempts,
                    output.stats.total_duration_ms,
                    bold(&path.display().to_string()),
                );
            }
        }
        None => {
            let rendered = if as_word {
                render_word_document(task, output)
            } else {
                render_document(task, output)
            };
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(rendered.as_bytes())
                .context("Failed to write to stdout")?;
            if !rendered.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
        }
    }
    Ok(())
}

/// Map CLI args to `JobConfig`.
fn build_config(opts: &GlobalOpts, progress: Option<ProgressCallback>) -> Result<JobConfig> {
    let mut builder = JobConfig::builder()
        .media_group_size(opts.group_size)
        .api_timeout_secs(opts.api_timeout)
        .download_timeout_secs(opts.download_timeout);

    if let Some(ref model) = opts.model {
        builder = builder.model(model);
    }
    if let Some(ref url) = opts.base_url {
        builder = builder.base_url(url);
    }
    if let Some(n) = opts.max_chars {
        builder = builder.max_chars(n);
    }
    if let Some(ms) = opts.pacing_ms {
        builder = builder.pacing_ms(ms);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn load_pool(opts: &GlobalOpts) -> Result<KeyPool> {
    match opts.keys_file {
        Some(ref path) => KeyPool::from_file(path)
            .with_context(|| format!("Failed to read keys from {}", path.display())),
        None => Ok(KeyPool::from_env()),
    }
}

async fn read_text_input(input: &str, timeout_secs: u64) -> Result<String> {
    if input == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read text from stdin")?;
        return Ok(text);
    }
    load_text(input, timeout_secs)
        .await
        .with_context(|| format!("Failed to read {input}"))
}
