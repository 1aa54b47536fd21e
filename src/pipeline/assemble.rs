//! Result assembly: clean each unit's text and join them in order.
//!
//! Models wrap output in ` ```html ... ``` ` fences often enough that every
//! partial is cleaned before joining. Cleaning is deliberately minimal:
//! a fence line (` ``` ` with an optional language tag and nothing else) is
//! blanked, any other ` ``` ` is removed on its own, the result is trimmed,
//! and nothing else about the text is touched.

use once_cell::sync::Lazy;
use regex::Regex;

/// Separator placed between consecutive units.
pub const UNIT_SEPARATOR: &str = "\n\n";

// ── Fence markers ────────────────────────────────────────────────────────

/// A whole line holding only a fence and its tag, e.g. ` ```html `.
static RE_FENCE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*```[A-Za-z0-9_+-]*[ \t\r]*$").unwrap());

/// Remove every code-fence marker and trim. A language tag is only dropped
/// when it stands alone on the fence line.
pub fn clean_unit(raw: &str) -> String {
    let without_lines = RE_FENCE_LINE.replace_all(raw, "");
    without_lines.replace("```", "").trim().to_string()
}

// ── Join ─────────────────────────────────────────────────────────────────

/// Clean every partial and join them with a blank line, preserving order.
pub fn assemble<S: AsRef<str>>(partials: &[S]) -> String {
    partials
        .iter()
        .map(|p| clean_unit(p.as_ref()))
        .collect::<Vec<_>>()
        .join(UNIT_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_html_fences() {
        assert_eq!(clean_unit("```html\n<p>مرحبا</p>\n```"), "<p>مرحبا</p>");
    }

    #[test]
    fn strips_bare_fences() {
        assert_eq!(clean_unit("```\nplain\n```  "), "plain");
    }

    #[test]
    fn text_after_closing_fence_is_kept() {
        assert_eq!(
            assemble(&["<p>end</p>```Appendix follows", "```\nSecond\n```"]),
            "<p>end</p>Appendix follows\n\nSecond"
        );
    }

    #[test]
    fn indented_fence_lines_with_tags() {
        assert_eq!(clean_unit("  ```c++\r\nint x;\r\n```\r\n"), "int x;");
    }

    #[test]
    fn passthrough_without_fences() {
        assert_eq!(clean_unit("  <h1>T</h1>\n<p>x</p>\n"), "<h1>T</h1>\n<p>x</p>");
    }

    #[test]
    fn inner_text_is_untouched() {
        // Single and double backticks are content, not fences.
        assert_eq!(clean_unit("a `b` ``c``"), "a `b` ``c``");
    }

    #[test]
    fn joins_with_blank_line() {
        assert_eq!(assemble(&["```html\nA\n```", " B ", "C"]), "A\n\nB\n\nC");
    }

    #[test]
    fn order_matters() {
        let forward = assemble(&["one", "two"]);
        let reversed = assemble(&["two", "one"]);
        assert_ne!(forward, reversed);
        assert_eq!(reversed, "two\n\none");
    }

    #[test]
    fn empty_input_is_empty_string() {
        assert_eq!(assemble::<&str>(&[]), "");
    }
}
