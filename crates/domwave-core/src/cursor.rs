#![forbid(unsafe_code)]

//! Caret line estimation.
//!
//! The host drops a unique marker token at the caret, reads the element's
//! rendered text, and removes the marker again. The line count is computed
//! here from that text so the rule is testable without a browser.

/// Result reported when the document has no selection range.
pub const NO_SELECTION: i32 = -1;

/// Count the lines that precede `marker` in `text`.
///
/// Scanning left to right, a `'\n'` counts unless the previously counted
/// newline sits at the immediately preceding position. A run of two newlines
/// therefore counts once and a run of three counts twice, which matches how
/// block boundaries and explicit breaks double up in rendered text. Scanning
/// stops at the first position where `marker` begins; when the marker never
/// appears every qualifying newline is counted.
#[must_use]
pub fn count_caret_lines(text: &str, marker: &str) -> i32 {
    let mut lines: usize = 0;
    let mut last_newline: Option<usize> = None;
    for (pos, (byte_idx, ch)) in text.char_indices().enumerate() {
        let follows_counted = last_newline.is_some_and(|last| last + 1 == pos);
        if ch == '\n' && !follows_counted {
            lines += 1;
            last_newline = Some(pos);
        } else if text[byte_idx..].starts_with(marker) {
            break;
        }
    }
    i32::try_from(lines).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARK: &str = "caret-7f3a";

    #[test]
    fn caret_on_first_line_is_zero() {
        assert_eq!(count_caret_lines("caret-7f3ahello\nworld", MARK), 0);
        assert_eq!(count_caret_lines("hel caret-7f3alo\nworld", MARK), 0);
    }

    #[test]
    fn counts_single_newlines_before_marker() {
        assert_eq!(count_caret_lines("a\nb\ncaret-7f3ac\nd", MARK), 2);
    }

    #[test]
    fn newline_pairs_count_once() {
        assert_eq!(count_caret_lines("a\n\nb caret-7f3a", MARK), 1);
    }

    #[test]
    fn newline_triples_count_twice() {
        assert_eq!(count_caret_lines("a\n\n\nb caret-7f3a", MARK), 2);
    }

    #[test]
    fn missing_marker_counts_everything() {
        assert_eq!(count_caret_lines("a\nb\nc\n", MARK), 3);
        assert_eq!(count_caret_lines("", MARK), 0);
    }

    #[test]
    fn non_ascii_text_is_scanned_by_character() {
        assert_eq!(count_caret_lines("héllo\n✓\ncaret-7f3a", MARK), 2);
    }
}
