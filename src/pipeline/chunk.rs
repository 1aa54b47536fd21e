//! Chunking: split unbounded input into units sized for one remote call.
//!
//! Two shapes of input exist and each gets its own splitter:
//!
//! * **Media** — scanned pages are grouped, in order, into fixed-size
//!   batches that travel together in one multimodal request.
//! * **Text** — long text is cut into spans of at most `max_chars`
//!   characters, preferring to cut at a newline so a paragraph is not torn
//!   in half when a line break is close enough to the limit.
//!
//! Both splitters are pure and lossless: concatenating text spans gives the
//! input back byte for byte, and media groups cover every file exactly once.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Fraction of `max_chars` (in tenths) a newline must reach to be used as
/// the cut point.
const NEWLINE_PREFERENCE_TENTHS: usize = 6;

/// One image or PDF to be sent inline.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaPayload {
    /// Display name (file name or URL), used in logs only.
    pub name: String,
    /// Declared media type, e.g. `image/png` or `application/pdf`.
    pub mime_type: String,
    /// Raw file content. Serialised as base64 to keep saved job state compact.
    #[serde(serialize_with = "bytes_as_base64", deserialize_with = "bytes_from_base64")]
    pub bytes: Vec<u8>,
}

impl MediaPayload {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

impl std::fmt::Debug for MediaPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaPayload")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}

fn bytes_as_base64<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&STANDARD.encode(bytes))
}

fn bytes_from_base64<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
    let encoded = String::deserialize(d)?;
    STANDARD.decode(encoded).map_err(serde::de::Error::custom)
}

/// One bounded piece of input dispatched in a single remote call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkUnit {
    /// A group of pages sent together.
    Media { files: Vec<MediaPayload> },
    /// A span of a longer text.
    Text { text: String },
}

impl WorkUnit {
    /// Number of files (media) or characters (text) in the unit.
    pub fn size(&self) -> usize {
        match self {
            WorkUnit::Media { files } => files.len(),
            WorkUnit::Text { text } => text.chars().count(),
        }
    }
}

/// Partition `files` into consecutive groups of `group_size` (the last group
/// may be smaller). A `group_size` of 0 is treated as 1.
pub fn split_media(files: Vec<MediaPayload>, group_size: usize) -> Vec<WorkUnit> {
    let group_size = group_size.max(1);
    let mut units = Vec::with_capacity(files.len().div_ceil(group_size));
    let mut iter = files.into_iter().peekable();
    while iter.peek().is_some() {
        let group: Vec<MediaPayload> = iter.by_ref().take(group_size).collect();
        units.push(WorkUnit::Media { files: group });
    }
    units
}

/// Split `text` into spans of at most `max_chars` characters.
///
/// From the current position, if the remainder fits it becomes the last
/// span. Otherwise the last newline at or before `pos + max_chars` is used
/// as the cut point when it lies at least 60 % of `max_chars` past `pos`;
/// the newline itself starts the next span. Failing that, the span is cut
/// hard at `max_chars`. Positions count `char`s, so a cut never lands inside
/// a UTF-8 sequence.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let max = max_chars.max(1);
    // Byte offset of every char boundary, including the end of the string.
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let total = bounds.len() - 1;

    let mut spans = Vec::new();
    let mut pos = 0usize;
    while pos < total {
        let end = pos + max;
        if end >= total {
            spans.push(text[bounds[pos]..].to_string());
            break;
        }

        // Window includes the char at `end`.
        let window = &text[bounds[pos]..bounds[end + 1]];
        let cut = window
            .rfind('\n')
            .and_then(|byte| bounds.binary_search(&(bounds[pos] + byte)).ok())
            .filter(|&nl| (nl - pos) * 10 >= max * NEWLINE_PREFERENCE_TENTHS)
            .unwrap_or(end);

        spans.push(text[bounds[pos]..bounds[cut]].to_string());
        pos = cut;
    }
    spans
}

/// Build text units from `text`.
pub fn text_units(text: &str, max_chars: usize) -> Vec<WorkUnit> {
    split_text(text, max_chars)
        .into_iter()
        .map(|text| WorkUnit::Text { text })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(n: usize) -> MediaPayload {
        MediaPayload::new(format!("p{n}.png"), "image/png", vec![n as u8])
    }

    /// Deterministic pseudo-random text with occasional newlines.
    fn sample_text(seed: u64, len: usize) -> String {
        let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
        let alphabet: Vec<char> = "abcdé ضغط\n xyz.\u{064E}".chars().collect();
        (0..len)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                alphabet[(state >> 33) as usize % alphabet.len()]
            })
            .collect()
    }

    #[test]
    fn media_groups_of_six_with_short_tail() {
        let files: Vec<_> = (0..14).map(page).collect();
        let units = split_media(files, 6);
        let sizes: Vec<usize> = units.iter().map(WorkUnit::size).collect();
        assert_eq!(sizes, vec![6, 6, 2]);
    }

    #[test]
    fn media_covers_every_file_once_in_order() {
        let files: Vec<_> = (0..13).map(page).collect();
        let units = split_media(files.clone(), 4);
        let flattened: Vec<MediaPayload> = units
            .into_iter()
            .flat_map(|u| match u {
                WorkUnit::Media { files } => files,
                WorkUnit::Text { .. } => unreachable!(),
            })
            .collect();
        assert_eq!(flattened, files);
    }

    #[test]
    fn media_empty_yields_no_units() {
        assert!(split_media(Vec::new(), 6).is_empty());
    }

    #[test]
    fn media_zero_group_size_is_one() {
        assert_eq!(split_media((0..3).map(page).collect(), 0).len(), 3);
    }

    #[test]
    fn empty_text_yields_zero_spans() {
        assert!(split_text("", 7000).is_empty());
    }

    #[test]
    fn short_text_yields_one_span() {
        assert_eq!(split_text("hello\nworld", 7000), vec!["hello\nworld"]);
    }

    #[test]
    fn exact_fit_is_one_span() {
        let text = "a".repeat(100);
        assert_eq!(split_text(&text, 100), vec![text.clone()]);
    }

    #[test]
    fn prefers_newline_past_sixty_percent() {
        // Newline at offset 65 of a 100-char window, none before 60.
        let text = format!("{}\n{}", "a".repeat(65), "b".repeat(200));
        let spans = split_text(&text, 100);
        assert_eq!(spans[0], "a".repeat(65));
        assert!(spans[1].starts_with('\n'));
    }

    #[test]
    fn newline_exactly_at_sixty_percent_is_used() {
        let text = format!("{}\n{}", "a".repeat(60), "b".repeat(200));
        assert_eq!(split_text(&text, 100)[0].len(), 60);
    }

    #[test]
    fn early_newline_is_ignored() {
        let text = format!("{}\n{}", "a".repeat(30), "b".repeat(200));
        let spans = split_text(&text, 100);
        assert_eq!(spans[0].chars().count(), 100);
    }

    #[test]
    fn hard_cut_without_newline() {
        let text = "x".repeat(250);
        let spans = split_text(&text, 100);
        let sizes: Vec<usize> = spans.iter().map(|s| s.len()).collect();
        assert_eq!(sizes, vec![100, 100, 50]);
    }

    #[test]
    fn multibyte_text_is_counted_in_chars() {
        let text = "ضغط".repeat(50); // 150 chars, 2 bytes each
        let spans = split_text(&text, 100);
        assert_eq!(spans[0].chars().count(), 100);
        assert_eq!(spans[1].chars().count(), 50);
        assert_eq!(spans.concat(), text);
    }

    #[test]
    fn text_coverage_holds_for_varied_inputs() {
        for seed in 0..40u64 {
            let len = (seed as usize * 97) % 3000;
            let text = sample_text(seed, len);
            for max in [1usize, 7, 100, 333, 7000] {
                let spans = split_text(&text, max);
                assert_eq!(spans.concat(), text, "seed {seed} max {max}");
                assert!(
                    spans.iter().all(|s| !s.is_empty() && s.chars().count() <= max),
                    "seed {seed} max {max}"
                );
            }
        }
    }

    #[test]
    fn text_units_wrap_spans() {
        let units = text_units(&"z".repeat(150), 100);
        assert_eq!(units.len(), 2);
        assert!(matches!(&units[1], WorkUnit::Text { text } if text.len() == 50));
    }

    #[test]
    fn media_payload_serialises_bytes_as_base64() {
        let unit = WorkUnit::Media {
            files: vec![MediaPayload::new("a.png", "image/png", b"hi".to_vec())],
        };
        let json = serde_json::to_string(&unit).unwrap();
        assert!(json.contains(r#""bytes":"aGk=""#), "got: {json}");
        let back: WorkUnit = serde_json::from_str(&json).unwrap();
        assert_eq!(back, unit);
    }
}
