//! Instruction strings sent ahead of each unit.
//!
//! Every prompt lives here so a wording change touches exactly one place and
//! tests can inspect the text without a live model. The instructions are
//! deliberately short: the model is asked to transcribe, format or translate
//! and nothing more.

/// Instruction sent with every group of scanned pages.
pub const OCR_INSTRUCTION: &str =
    "TASK: HIGH-PRECISION ARABIC OCR. EXTRACT ALL TEXT WITH DIACRITICS. PRESERVE EVERY WORD.";

/// Appended when footnotes should be collected at the end of the unit.
const FOOTNOTES_SUFFIX: &str = " COLLECT FOOTNOTES AT THE END OF THE CHUNK.";

/// Instruction for converting one text unit into academic HTML.
///
/// `unit_num` is 1-based; `total` is the number of units in the job.
pub fn format_instruction(unit_num: usize, total: usize, footnotes: bool) -> String {
    let mut s = format!(
        "TASK: CONVERT TEXT CHUNK TO ACADEMIC HTML FOR MS WORD. CHUNK {unit_num}/{total}. \
         PRESERVE DIACRITICS AND FOOTNOTES."
    );
    if footnotes {
        s.push_str(FOOTNOTES_SUFFIX);
    }
    s
}

/// Instruction for translating one text unit.
pub fn translate_instruction(target_language: &str, domain: &str, footnotes: bool) -> String {
    let mut s = format!(
        "TASK: TRANSLATE TO {target_language} ({domain}). OUTPUT HTML ONLY. DO NOT REMOVE CONTENT."
    );
    if footnotes {
        s.push_str(FOOTNOTES_SUFFIX);
    }
    s
}
