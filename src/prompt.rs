const STATUS_LIMIT: usize = 2000;
const DIFF_LIMIT: usize = 8000;

/// Build the instruction prompt for a commit message suggestion.
///
/// Pure and deterministic. Oversized inputs are truncated (status to 2000
/// chars, diff to 8000) so a huge working-tree diff cannot exceed request
/// size or context limits.
pub fn build_commit_prompt(status_summary: &str, diff_text: &str) -> String {
    let status = match truncate_chars(status_summary, STATUS_LIMIT) {
        "" => "(none)",
        s => s,
    };
    let diff = match truncate_chars(diff_text, DIFF_LIMIT) {
        "" => "(none)",
        s => s,
    };
    format!(
        "Generate a short git commit message (max 72 chars).\n\
         Use imperative mood. No quotes. No trailing period.\n\n\
         Changed files:\n{}\n\n\
         Diff (truncated):\n{}",
        status, diff
    )
}

fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_prompt_contains_section_markers() {
        let prompt = build_commit_prompt("M src/main.rs", "diff --git a/src/main.rs");
        assert!(prompt.contains("Changed files:"));
        assert!(prompt.contains("Diff (truncated):"));
        assert!(prompt.contains("M src/main.rs"));
    }

    #[test]
    fn test_oversized_inputs_are_truncated() {
        let status = "x".repeat(3000);
        let diff = "y".repeat(9000);
        let prompt = build_commit_prompt(&status, &diff);

        assert!(prompt.contains(&"x".repeat(2000)));
        assert!(!prompt.contains(&"x".repeat(2001)));
        assert!(prompt.contains(&"y".repeat(8000)));
        assert!(!prompt.contains(&"y".repeat(8001)));
        assert!(prompt.len() < 12000);
    }

    #[test]
    fn test_empty_inputs_get_placeholders() {
        let prompt = build_commit_prompt("", "");
        assert!(prompt.contains("Changed files:\n(none)"));
        assert!(prompt.contains("Diff (truncated):\n(none)"));
    }

    #[test]
    fn test_deterministic() {
        let a = build_commit_prompt("M file", "diff body");
        let b = build_commit_prompt("M file", "diff body");
        assert_eq!(a, b);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        // Multi-byte input must not panic on a byte-boundary slice
        let status = "é".repeat(3000);
        let prompt = build_commit_prompt(&status, "");
        assert!(prompt.contains(&"é".repeat(2000)));
        assert!(!prompt.contains(&"é".repeat(2001)));
    }

    #[test]
    fn test_preamble_is_fixed() {
        let prompt = build_commit_prompt("M file", "diff");
        assert!(prompt.starts_with("Generate a short git commit message (max 72 chars)."));
        assert!(prompt.contains("Use imperative mood. No quotes. No trailing period."));
    }
}
