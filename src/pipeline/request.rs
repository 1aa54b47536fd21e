//! Request building: one [`WorkUnit`] plus task options → ordered prompt parts.
//!
//! The instruction always comes first, followed by the unit's content. For
//! media units every file becomes its own inline part, in page order.

use crate::config::TaskKind;
use crate::pipeline::chunk::WorkUnit;
use crate::prompts::{format_instruction, translate_instruction, OCR_INSTRUCTION};

/// One element of a multimodal request.
#[derive(Clone, PartialEq, Eq)]
pub enum PromptPart {
    Text(String),
    /// Raw bytes sent inline; the transport base64-encodes them.
    Inline { mime_type: String, data: Vec<u8> },
}

impl std::fmt::Debug for PromptPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PromptPart::Text(t) => f.debug_tuple("Text").field(t).finish(),
            PromptPart::Inline { mime_type, data } => f
                .debug_struct("Inline")
                .field("mime_type", mime_type)
                .field("data", &format_args!("<{} bytes>", data.len()))
                .finish(),
        }
    }
}

/// Signature shared by every request builder passed to the orchestrator.
///
/// Arguments: task, unit, 0-based index, total units.
pub type RequestBuilder = fn(&TaskKind, &WorkUnit, usize, usize) -> Vec<PromptPart>;

/// Build the prompt parts for unit `index` (0-based) of `total`.
pub fn build_request(task: &TaskKind, unit: &WorkUnit, index: usize, total: usize) -> Vec<PromptPart> {
    let instruction = match task {
        TaskKind::Ocr => OCR_INSTRUCTION.to_string(),
        TaskKind::Format { footnotes } => format_instruction(index + 1, total, *footnotes),
        TaskKind::Translate {
            target_language,
            domain,
            footnotes,
        } => translate_instruction(target_language, domain, *footnotes),
    };

    let mut parts = vec![PromptPart::Text(instruction)];
    match unit {
        WorkUnit::Media { files } => {
            parts.extend(files.iter().map(|f| PromptPart::Inline {
                mime_type: f.mime_type.clone(),
                data: f.bytes.clone(),
            }));
        }
        WorkUnit::Text { text } => parts.push(PromptPart::Text(text.clone())),
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::chunk::MediaPayload;

    #[test]
    fn media_unit_has_instruction_then_pages_in_order() {
        let unit = WorkUnit::Media {
            files: vec![
                MediaPayload::new("1.png", "image/png", vec![1]),
                MediaPayload::new("2.pdf", "application/pdf", vec![2]),
            ],
        };
        let parts = build_request(&TaskKind::Ocr, &unit, 0, 1);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], PromptPart::Text(OCR_INSTRUCTION.into()));
        assert!(matches!(&parts[2], PromptPart::Inline { mime_type, data }
            if mime_type == "application/pdf" && data == &vec![2]));
    }

    #[test]
    fn format_unit_carries_one_based_position() {
        let unit = WorkUnit::Text { text: "نص".into() };
        let parts = build_request(&TaskKind::Format { footnotes: false }, &unit, 1, 4);
        match &parts[0] {
            PromptPart::Text(p) => assert!(p.contains("CHUNK 2/4")),
            other => panic!("unexpected part {other:?}"),
        }
        assert_eq!(parts[1], PromptPart::Text("نص".into()));
    }

    #[test]
    fn translate_unit_uses_target_language() {
        let task = TaskKind::Translate {
            target_language: "German".into(),
            domain: "general".into(),
            footnotes: false,
        };
        let parts = build_request(&task, &WorkUnit::Text { text: "x".into() }, 0, 1);
        assert!(matches!(&parts[0], PromptPart::Text(p) if p.contains("TRANSLATE TO German")));
    }
}
