//! Matchers: how an extracted value is compared to a configured one.
//!
//! Matchers return `Ok(false)` for a plain mismatch; an `Err` always
//! means broken configuration (bad regex, invalid expected JSON), which
//! the caller must surface rather than treat as "no match".

mod json;

pub use json::JsonObjectMatcher;

use crate::domain::MatcherKind;
use crate::error::ExpectationError;
use regex::Regex;
use std::collections::HashMap;

/// Predicate capability comparing an extracted value against a
/// configured expected value.
pub trait Matcher: Send + Sync {
    fn matches(&self, actual: Option<&str>, expected: &str) -> Result<bool, ExpectationError>;
}

/// Exact string equality.
struct EqualsMatcher;

impl Matcher for EqualsMatcher {
    fn matches(&self, actual: Option<&str>, expected: &str) -> Result<bool, ExpectationError> {
        Ok(actual == Some(expected))
    }
}

/// Equality ignoring case.
struct CaseInsensitiveEqualsMatcher;

impl Matcher for CaseInsensitiveEqualsMatcher {
    fn matches(&self, actual: Option<&str>, expected: &str) -> Result<bool, ExpectationError> {
        Ok(actual.is_some_and(|a| a.to_lowercase() == expected.to_lowercase()))
    }
}

/// Substring test.
struct ContainsMatcher;

impl Matcher for ContainsMatcher {
    fn matches(&self, actual: Option<&str>, expected: &str) -> Result<bool, ExpectationError> {
        Ok(actual.is_some_and(|a| a.contains(expected)))
    }
}

/// Regular-expression test; the expected value is the pattern.
struct RegexMatcher;

impl Matcher for RegexMatcher {
    fn matches(&self, actual: Option<&str>, expected: &str) -> Result<bool, ExpectationError> {
        let regex = Regex::new(expected).map_err(|source| ExpectationError::InvalidPattern {
            pattern: expected.to_string(),
            source,
        })?;
        Ok(actual.is_some_and(|a| regex.is_match(a)))
    }
}

/// Typed registry mapping matcher kinds to implementations, resolved
/// once at startup.
pub struct MatcherRegistry {
    matchers: HashMap<MatcherKind, Box<dyn Matcher>>,
}

impl MatcherRegistry {
    /// Registry populated with all built-in matchers.
    pub fn with_builtin() -> Self {
        let mut matchers: HashMap<MatcherKind, Box<dyn Matcher>> = HashMap::new();
        matchers.insert(MatcherKind::EqualTo, Box::new(EqualsMatcher));
        matchers.insert(
            MatcherKind::SameString,
            Box::new(CaseInsensitiveEqualsMatcher),
        );
        matchers.insert(MatcherKind::Contains, Box::new(ContainsMatcher));
        matchers.insert(MatcherKind::Matches, Box::new(RegexMatcher));
        matchers.insert(MatcherKind::SameJsonObject, Box::new(JsonObjectMatcher));
        Self { matchers }
    }

    pub fn locate(&self, kind: MatcherKind) -> Result<&dyn Matcher, ExpectationError> {
        self.matchers
            .get(&kind)
            .map(|m| m.as_ref())
            .ok_or_else(|| ExpectationError::UnknownMatcher(kind.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locate(kind: MatcherKind) -> &'static dyn Matcher {
        // Leaking is fine in tests; keeps the helpers terse.
        Box::leak(Box::new(MatcherRegistry::with_builtin()))
            .locate(kind)
            .unwrap()
    }

    #[test]
    fn test_equals_matcher() {
        let matcher = locate(MatcherKind::EqualTo);
        assert!(matcher.matches(Some("/users"), "/users").unwrap());
        assert!(!matcher.matches(Some("/Users"), "/users").unwrap());
        assert!(!matcher.matches(None, "/users").unwrap());
    }

    #[test]
    fn test_case_insensitive_equals_matcher() {
        let matcher = locate(MatcherKind::SameString);
        assert!(matcher.matches(Some("POST"), "post").unwrap());
        assert!(!matcher.matches(Some("POST"), "put").unwrap());
        assert!(!matcher.matches(None, "post").unwrap());
    }

    #[test]
    fn test_contains_matcher() {
        let matcher = locate(MatcherKind::Contains);
        assert!(matcher.matches(Some("/api/v1/users"), "v1").unwrap());
        assert!(!matcher.matches(Some("/api/v1/users"), "v2").unwrap());
    }

    #[test]
    fn test_regex_matcher() {
        let matcher = locate(MatcherKind::Matches);
        assert!(matcher.matches(Some("/users/42"), r"^/users/\d+$").unwrap());
        assert!(!matcher.matches(Some("/users/abc"), r"^/users/\d+$").unwrap());
    }

    #[test]
    fn test_regex_matcher_invalid_pattern_is_config_error() {
        let matcher = locate(MatcherKind::Matches);
        assert!(matches!(
            matcher.matches(Some("anything"), "(unclosed"),
            Err(ExpectationError::InvalidPattern { .. })
        ));
    }
}
