//! Output documents: a Word-compatible HTML envelope and plain text.
//!
//! Word opens an `.doc` file containing HTML with the Office namespaces as a
//! native document, which is how the assembled HTML reaches the user's word
//! processor without a DOCX writer. The body direction follows the target
//! language.

use crate::error::Doc2WordError;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Languages written right-to-left, by ISO 639 code.
const RTL_LANGUAGES: &[&str] = &["ar", "he", "fa", "ur", "yi", "syr"];

const WORD_STYLE: &str = "body { font-family: 'Calibri', 'Traditional Arabic', sans-serif; font-size: 14pt; } \
p { margin: 0 0 10pt 0; text-align: justify; line-height: 1.6; } \
h1, h2 { color: #2563eb; }";

/// Whether `language` (an ISO code such as `ar` or `ar-SA`, or an English
/// name such as `Arabic`) is written right-to-left.
pub fn is_rtl(language: &str) -> bool {
    let lang = language.trim().to_ascii_lowercase();
    let code = lang.split(['-', '_']).next().unwrap_or_default();
    if RTL_LANGUAGES.contains(&code) {
        return true;
    }
    matches!(
        lang.as_str(),
        "arabic" | "hebrew" | "persian" | "farsi" | "urdu" | "yiddish" | "syriac"
    )
}

/// Wrap an HTML fragment in the Word document envelope.
///
/// `language` picks the `lang` and `dir` attributes of `<body>`; Arabic is
/// the default when none is given.
pub fn word_document(body_html: &str, language: Option<&str>) -> String {
    let language = language.unwrap_or("ar");
    let (lang_attr, dir) = if is_rtl(language) {
        (body_lang(language, "AR-SA"), "rtl")
    } else {
        (body_lang(language, "EN-US"), "ltr")
    };
    format!(
        "<html xmlns:o='urn:schemas-microsoft-com:office:office' \
         xmlns:w='urn:schemas-microsoft-com:office:word' \
         xmlns='http://www.w3.org/TR/REC-html40'>\
         <head><meta charset='utf-8'><style>{WORD_STYLE}</style></head>\
         <body lang=\"{lang_attr}\" dir=\"{dir}\">{body_html}</body></html>"
    )
}

/// Use the caller's code when it looks like one (`fr`, `ar-EG`), otherwise
/// the fallback. A bare code matching the fallback's language takes the
/// fallback's region (`ar` becomes `AR-SA`).
fn body_lang(language: &str, fallback: &str) -> String {
    let l = language.trim();
    let alpha = |s: &str| s.chars().all(|c| c.is_ascii_alphabetic());
    let mut segments = l.split('-');
    let looks_like_code = segments
        .next()
        .is_some_and(|primary| (2..=3).contains(&primary.len()) && alpha(primary))
        && segments.all(|s| (2..=4).contains(&s.len()) && alpha(s));
    if !looks_like_code {
        return fallback.to_string();
    }
    let code = l.to_ascii_uppercase();
    match fallback.split_once('-') {
        Some((primary, _)) if primary == code => fallback.to_string(),
        _ => code,
    }
}

/// Plain text as a Word document: HTML-escaped, one `<br />` per line
/// break, in the default right-to-left envelope.
pub fn text_word_document(text: &str) -> String {
    let mut body = String::with_capacity(text.len() + text.len() / 8);
    for c in text.trim_end().chars() {
        match c {
            '&' => body.push_str("&amp;"),
            '<' => body.push_str("&lt;"),
            '>' => body.push_str("&gt;"),
            '\r' => {}
            '\n' => body.push_str("<br />\n"),
            c => body.push(c),
        }
    }
    word_document(&body, None)
}

/// Plain-text document: the text with exactly one trailing newline.
pub fn text_document(text: &str) -> String {
    let trimmed = text.trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}\n")
    }
}

/// Write `contents` to `path` atomically: a temp file in the same directory
/// is written, flushed and renamed over the destination.
pub fn write_output(path: &Path, contents: &str) -> Result<(), Doc2WordError> {
    let to_error = |source: std::io::Error| Doc2WordError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(to_error)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(to_error)?;
    tmp.write_all(contents.as_bytes()).map_err(to_error)?;
    tmp.as_file().sync_all().map_err(to_error)?;
    tmp.persist(path).map_err(|e| to_error(e.error))?;

    info!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}
