//! End-to-end tests against the live Gemini API.
//!
//! Gated behind `E2E_ENABLED` so they do not run in CI unless explicitly
//! requested. Keys come from `DOC2WORD_API_KEYS` (comma separated) or
//! `GEMINI_API_KEY`.
//!
//! Run with:
//!   E2E_ENABLED=1 GEMINI_API_KEY=... cargo test --test e2e -- --nocapture
//!
//! The OCR test also needs a scanned page at `test_cases/page.png`.

use edgequake_doc2word::{
    extract_text, format_text, format_text_to_file, translate_text, Doc2WordError, JobConfig,
    JobOutcome, JobOutput, KeyPool,
};
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

/// Skip this test unless `E2E_ENABLED` is set and at least one key is
/// configured. Evaluates to the key pool.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let pool = KeyPool::from_env();
        if pool.is_empty() {
            println!("SKIP — set GEMINI_API_KEY or DOC2WORD_API_KEYS");
            return;
        }
        pool
    }};
}

fn config() -> JobConfig {
    // Small units so a short sample still exercises several calls.
    JobConfig::builder()
        .max_chars(400)
        .pacing_ms(1000)
        .build()
        .expect("valid config")
}

fn completed(outcome: JobOutcome, context: &str) -> JobOutput {
    match outcome {
        JobOutcome::Completed(output) => output,
        JobOutcome::Paused(p) => panic!("[{context}] keys exhausted at unit {}", p.next_unit()),
        JobOutcome::Failed { error, .. } => panic!("[{context}] job failed: {error}"),
    }
}

/// Assert the assembled output is usable.
fn assert_output_quality(output: &JobOutput, context: &str) {
    assert!(!output.text.trim().is_empty(), "[{context}] Output is empty");
    assert!(
        !output.text.contains("```"),
        "[{context}] Output still contains code fences"
    );
    assert_eq!(
        output.units.len(),
        output.stats.total_units,
        "[{context}] unit count mismatch"
    );
    println!(
        "[{context}] ✓  {} chars in {} unit(s), {} attempt(s)",
        output.text.chars().count(),
        output.units.len(),
        output.stats.total_attempts
    );
}

const ARABIC_SAMPLE: &str = "\
الفصل الأول: في طلب العلم
إن طلب العلم فريضة على كل مسلم، وقد حث العلماء على الرحلة في طلبه والصبر على مشاقه.
قال بعض السلف: من لم يحتمل ذل التعلم ساعة بقي في ذل الجهل أبداً.
وينبغي لطالب العلم أن يبدأ بالأهم فالأهم، وأن يعتني بالأصول قبل الفروع (1).

الفصل الثاني: في آداب المتعلم
ومن آداب المتعلم أن يوقر شيخه، وأن يحسن الاستماع، وألا يقطع عليه كلامه.
وأن يكتب ما يسمع، فإن الحفظ خوان، والكتابة قيد العلم.
(1) انظر: جامع بيان العلم وفضله.
";

// ── Formatting ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_format_arabic_sample() {
    let pool = e2e_skip_unless_ready!();

    let outcome = format_text(ARABIC_SAMPLE, true, &pool, &config())
        .await
        .expect("job should start");
    let output = completed(outcome, "format");

    assert_output_quality(&output, "format");
    assert!(output.units.len() >= 2, "sample should span several units");
    assert!(
        output.text.contains('<'),
        "formatted output should be HTML"
    );
}

#[tokio::test]
async fn test_format_writes_word_document() {
    let pool = e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("formatted.doc");

    let outcome = format_text_to_file(ARABIC_SAMPLE, false, &path, &pool, &config())
        .await
        .expect("job should start");
    completed(outcome, "format_to_file");

    let doc = std::fs::read_to_string(&path).expect("document written");
    assert!(doc.contains(r#"dir="rtl""#));
    assert!(doc.contains("</html>"));
}

// ── Translation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_translate_to_english() {
    let pool = e2e_skip_unless_ready!();

    let outcome = translate_text(ARABIC_SAMPLE, "English", "Islamic studies", true, &pool, &config())
        .await
        .expect("job should start");
    let output = completed(outcome, "translate");

    assert_output_quality(&output, "translate");
    let lower = output.text.to_lowercase();
    assert!(
        lower.contains("knowledge"),
        "translation should mention 'knowledge'"
    );
}

// ── OCR ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ocr_sample_page() {
    let pool = e2e_skip_unless_ready!();
    let page = test_cases_dir().join("page.png");
    if !page.exists() {
        println!("SKIP — test file not found: {}", page.display());
        return;
    }

    let inputs = vec![page.to_string_lossy().into_owned()];
    let outcome = extract_text(&inputs, &pool, &JobConfig::default())
        .await
        .expect("job should start");
    let output = completed(outcome, "ocr");

    assert_output_quality(&output, "ocr");
    assert_eq!(output.units.len(), 1);
}

// ── Credential handling ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_invalid_key_is_reported() {
    let _ = e2e_skip_unless_ready!();

    let pool = KeyPool::new(["AIzaThisKeyIsNotValid0000000000000000000"]);
    let outcome = format_text("نص قصير", false, &pool, &config())
        .await
        .expect("job should start");

    match outcome {
        JobOutcome::Failed { error, .. } => {
            assert!(
                matches!(error, Doc2WordError::InvalidCredential { .. }),
                "expected InvalidCredential, got {error:?}"
            );
        }
        other => panic!("expected failure, got {other:?}"),
    }
}
