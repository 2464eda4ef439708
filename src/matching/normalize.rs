//! Canonical form for free-text labels.

use std::sync::LazyLock;

use regex::Regex;

// Non-greedy: "Paddy(Dhan)(Common)" drops both annotations separately.
static PARENTHESIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(.*?\)").expect("valid parenthesis regex"));
static NOT_ALNUM_OR_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s]").expect("valid character class regex"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Normalize a label for comparison.
///
/// Steps:
/// - lower-case
/// - drop parenthesized annotations (e.g. variety names)
/// - replace everything that isn't `[a-z0-9]` or whitespace with a space
/// - collapse whitespace runs and trim
///
/// Removed spans become a single separator so that `"Rice(Basmati)Raw"` still
/// splits into two tokens. The output only ever contains `[a-z0-9 ]` with single
/// inner spaces, which makes the function idempotent.
pub fn normalize(s: &str) -> String {
    let lower = s.to_lowercase();
    let without_notes = PARENTHESIZED.replace_all(&lower, " ");
    let alnum = NOT_ALNUM_OR_SPACE.replace_all(&without_notes, " ");
    WHITESPACE_RUN.replace_all(&alnum, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_annotations_and_punctuation() {
        assert_eq!(normalize("Paddy(Dhan)(Common)"), "paddy");
        assert_eq!(normalize("  Bengal Gram (Gram)(Whole) "), "bengal gram");
        assert_eq!(normalize("Rice(Basmati)Raw"), "rice raw");
        assert_eq!(normalize("Onion - Big"), "onion big");
        assert_eq!(normalize("Lady's Finger"), "lady s finger");
    }

    #[test]
    fn unbalanced_parenthesis_is_plain_punctuation() {
        assert_eq!(normalize("Wheat (Local"), "wheat local");
        assert_eq!(normalize("Wheat) Local"), "wheat local");
    }

    #[test]
    fn blank_input_is_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \t\n "), "");
        assert_eq!(normalize("(only a note)"), "");
        assert_eq!(normalize("--"), "");
    }

    #[test]
    fn non_ascii_letters_become_separators() {
        assert_eq!(normalize("Jowar-ज्वार"), "jowar");
        assert_eq!(normalize("Açaí Berry"), "a a berry");
    }

    #[test]
    fn idempotent_on_awkward_inputs() {
        let samples = [
            "Paddy(Dhan)(Common)",
            "  MAHARASHTRA  ",
            "Chilli (Red) / Dry",
            "a((b)c)d",
            "Tomato\u{212A}ilo",
            "Ürümqi 42 (x",
            "",
            "   (   )   ",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {s:?}");
        }
    }
}
