//! Work item identifier extraction.

use regex::Regex;

/// Matches both the bare `#123` and the prefixed `AB#123` reference forms.
pub const DEFAULT_IDENTIFIER_PATTERN: &str = r"#(\d+)|AB#(\d+)";

/// Extracts a work item identifier from free-form text using one
/// configured pattern with alternative capture groups.
pub struct IdentifierExtractor {
    pattern: Regex,
}

impl IdentifierExtractor {
    pub fn new(pattern: Regex) -> Self {
        Self { pattern }
    }

    /// First non-empty capture of the leftmost match. Scanning stops at
    /// the first match; later references in the same text are ignored.
    pub fn extract<'t>(&self, text: &'t str) -> Option<&'t str> {
        let captures = self.pattern.captures(text)?;
        captures
            .iter()
            .skip(1)
            .flatten()
            .map(|m| m.as_str())
            .find(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> IdentifierExtractor {
        IdentifierExtractor::new(Regex::new(DEFAULT_IDENTIFIER_PATTERN).unwrap())
    }

    #[test]
    fn extracts_bare_hash_form() {
        assert_eq!(extractor().extract("Fix bug #123"), Some("123"));
    }

    #[test]
    fn extracts_prefixed_form() {
        assert_eq!(extractor().extract("Update feature AB#456"), Some("456"));
    }

    #[test]
    fn returns_none_without_reference() {
        assert_eq!(extractor().extract("Regular commit message"), None);
    }

    #[test]
    fn leftmost_match_wins_when_multiple_present() {
        assert_eq!(
            extractor().extract("Multiple items #123 and AB#456"),
            Some("123")
        );
    }

    #[test]
    fn custom_pattern_is_honored() {
        let custom = IdentifierExtractor::new(Regex::new(r"JIRA-(\d+)").unwrap());
        assert_eq!(custom.extract("JIRA-987 cleanup"), Some("987"));
        assert_eq!(custom.extract("Fix bug #123"), None);
    }

    #[test]
    fn pattern_without_capture_groups_yields_nothing() {
        let grouped = IdentifierExtractor::new(Regex::new(r"#\d+").unwrap());
        assert_eq!(grouped.extract("Fix bug #123"), None);
    }
}
