//! Newsletter text cleanup
//!
//! Strips mail boilerplate (links, send timestamps, web banner, unsubscribe
//! footer, housekeeping notices) and normalizes line endings and blank-line
//! runs. Offsets computed by later stages refer to this output.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Housekeeping block framed by asterisk rules. Greedy up to the last rule.
    static ref HOUSEKEEPING_BLOCK: Regex = Regex::new(
        r"(?is)\*{10,}\s*Important Housekeeping Notices.*\*{10,}"
    ).expect("Failed to compile HOUSEKEEPING_BLOCK regex - this is a bug in the hardcoded pattern");

    /// Absolute URL: scheme followed by a non-whitespace run
    static ref URL: Regex = Regex::new(
        r"(?i)\b[a-z][a-z0-9+.\-]*://\S+"
    ).expect("Failed to compile URL regex - this is a bug in the hardcoded pattern");

    /// Send time such as "9:41 PM EST"
    static ref TIMESTAMP: Regex = Regex::new(
        r"\b\d{1,2}:\d{2}[ \t]?(?:AM|PM|am|pm)[ \t]+[A-Z]{2,}\b"
    ).expect("Failed to compile TIMESTAMP regex - this is a bug in the hardcoded pattern");

    /// One-line "View this post on the web at ..." banner
    static ref WEB_BANNER: Regex = Regex::new(
        r"(?im)^[^\n]*view this post on the web at[^\n]*(?:\n|$)"
    ).expect("Failed to compile WEB_BANNER regex - this is a bug in the hardcoded pattern");

    /// "Unsubscribe" line together with the blank lines around it
    static ref UNSUBSCRIBE: Regex = Regex::new(
        r"(?im)(?:^[ \t]*\n)*^[ \t]*Unsubscribe\b[^\n]*(?:\n[ \t]*)*(?:\n|$)"
    ).expect("Failed to compile UNSUBSCRIBE regex - this is a bug in the hardcoded pattern");

    /// Three or more newlines, blank lines possibly holding stray spaces
    static ref BLANK_RUN: Regex = Regex::new(
        r"\n(?:[ \t]*\n){2,}"
    ).expect("Failed to compile BLANK_RUN regex - this is a bug in the hardcoded pattern");
}

/// Normalize line endings to `\n`
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// One cleanup pass. Every replacement strictly shortens the text.
fn clean_pass(text: &str) -> String {
    let text = HOUSEKEEPING_BLOCK.replace_all(text, "");
    let text = URL.replace_all(&text, "");
    let text = TIMESTAMP.replace_all(&text, "");
    let text = WEB_BANNER.replace_all(&text, "");
    let text = UNSUBSCRIBE.replace_all(&text, "\n");
    let text = BLANK_RUN.replace_all(&text, "\n\n");

    text.trim().to_string()
}

/// Clean a raw newsletter body.
///
/// Passes repeat until the text stops changing, so removing one pattern can
/// never expose another that survives: `normalize(normalize(x)) == normalize(x)`.
/// Missing patterns are no-ops; this never fails.
pub fn normalize(raw_text: &str) -> String {
    let mut current = normalize_line_endings(raw_text);

    loop {
        let next = clean_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_urls() {
        let cleaned = normalize("Chart here: https://example.com/chart?id=1 and more");
        assert_eq!(cleaned, "Chart here:  and more");
    }

    #[test]
    fn test_removes_send_timestamp() {
        let cleaned = normalize("Posted 9:41 PM EST by the desk");
        assert_eq!(cleaned, "Posted  by the desk");
    }

    #[test]
    fn test_keeps_time_without_zone() {
        let cleaned = normalize("Open at 9:30 AM sharp");
        assert_eq!(cleaned, "Open at 9:30 AM sharp");
    }

    #[test]
    fn test_removes_web_banner() {
        let cleaned = normalize("View this post on the web at https://x.substack.com/p/plan\n\nKey Levels");
        assert_eq!(cleaned, "Key Levels");
    }

    #[test]
    fn test_removes_unsubscribe_with_blank_lines() {
        let cleaned = normalize("Stay safe.\n\n\nUnsubscribe https://x.com/u\n\n\nFooter");
        assert_eq!(cleaned, "Stay safe.\n\nFooter");
    }

    #[test]
    fn test_keeps_unsubscribed_word_in_prose() {
        let cleaned = normalize("Unsubscribed readers keep access.");
        assert_eq!(cleaned, "Unsubscribed readers keep access.");
    }

    #[test]
    fn test_removes_housekeeping_block() {
        let raw = "Intro\n**********\nImportant Housekeeping Notices\nBilling moved.\nNew discord.\n**********\nKey Levels";
        assert_eq!(normalize(raw), "Intro\n\nKey Levels");
    }

    #[test]
    fn test_collapses_blank_runs() {
        let cleaned = normalize("\n\n\nA\n\n\n\n\nB\n  \n \t\nC\n\nD  \n\n");
        assert_eq!(cleaned, "A\n\nB\n\nC\n\nD");
    }

    #[test]
    fn test_normalizes_crlf() {
        let cleaned = normalize("Key Levels\r\n6050.00: support\r6100.00: resistance");
        assert_eq!(cleaned, "Key Levels\n6050.00: support\n6100.00: resistance");
    }

    #[test]
    fn test_empty_and_plain_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n\n "), "");
        assert_eq!(normalize("nothing to do"), "nothing to do");
    }

    #[test]
    fn test_idempotent_when_removal_exposes_pattern() {
        let raw = "**********http://tracker.example\nImportant Housekeeping Notices\nx\n**********\nDone 5:30 PM https://t.co/a ET";
        let once = normalize(raw);
        assert_eq!(normalize(&once), once);
        assert!(!once.contains("Housekeeping"));
        assert!(!once.contains("PM"));
    }
}
