//! Duplicate gate for freshly fetched newsletters.
//!
//! Runs before any body extraction, so a duplicate is detected from the
//! subject line alone.

/// Exact subject-line equality against the most recently stored subject.
/// No normalization is applied. An empty store never yields a duplicate.
pub fn is_duplicate(new_subject: &str, last_stored_subject: Option<&str>) -> bool {
    match last_stored_subject {
        Some(last) => new_subject == last,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_subject_is_duplicate() {
        assert!(is_duplicate("Weekly Outlook", Some("Weekly Outlook")));
    }

    #[test]
    fn test_different_subject_is_not_duplicate() {
        assert!(!is_duplicate("Weekly Outlook #2", Some("Weekly Outlook")));
    }

    #[test]
    fn test_no_normalization_applied() {
        assert!(!is_duplicate("weekly outlook", Some("Weekly Outlook")));
        assert!(!is_duplicate("Weekly Outlook ", Some("Weekly Outlook")));
    }

    #[test]
    fn test_empty_store_is_not_duplicate() {
        assert!(!is_duplicate("Weekly Outlook", None));
    }
}
