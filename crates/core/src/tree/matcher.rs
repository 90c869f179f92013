//! Selector matching
//!
//! A selector is either a literal, compared case-insensitively, or a
//! wildcard pattern where `*` stands for any run of characters.

use regex::Regex;

#[derive(Debug, Clone)]
pub struct NamePattern {
    text: String,
    lowered: String,
    wildcard: Option<Regex>,
}

impl NamePattern {
    pub fn new(text: &str) -> Self {
        let wildcard = if text.contains('*') {
            let body = text
                .split('*')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(".*");
            Regex::new(&format!("(?is)^{body}$")).ok()
        } else {
            None
        };

        Self {
            text: text.to_string(),
            lowered: text.to_lowercase(),
            wildcard,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard.is_some()
    }

    /// Case-insensitive equality
    pub fn matches_exact(&self, candidate: &str) -> bool {
        !candidate.is_empty() && candidate.to_lowercase() == self.lowered
    }

    /// Wildcard match; always false for literal selectors and empty candidates
    pub fn matches_wildcard(&self, candidate: &str) -> bool {
        match &self.wildcard {
            Some(regex) => !candidate.is_empty() && regex.is_match(candidate),
            None => false,
        }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.matches_exact(candidate) || self.matches_wildcard(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_is_case_insensitive() {
        let pattern = NamePattern::new("FooCore");
        assert!(!pattern.is_wildcard());
        assert!(pattern.matches_exact("foocore"));
        assert!(!pattern.matches_exact("FooCore2"));
        assert!(!pattern.matches_wildcard("FooCore"));
    }

    #[test]
    fn test_star_matches_empty_run() {
        let pattern = NamePattern::new("Foo*");
        assert!(pattern.matches_wildcard("Foo"));
        assert!(pattern.matches_wildcard("fooTests"));
        assert!(!pattern.matches_wildcard("BarFoo"));

        let infix = NamePattern::new("*core*");
        assert!(infix.matches_wildcard("Core"));
        assert!(infix.matches_wildcard("App.Core.Tests"));
    }

    #[test]
    fn test_lone_star_matches_any_non_empty() {
        let pattern = NamePattern::new("*");
        assert!(pattern.matches_wildcard("x"));
        assert!(pattern.matches_wildcard(r"C:\src\App\App.csproj"));
        assert!(!pattern.matches_wildcard(""));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let pattern = NamePattern::new("App.(Core)*");
        assert!(pattern.matches_wildcard("app.(core).tests"));
        assert!(!pattern.matches_wildcard("appX(core)"));
    }
}
