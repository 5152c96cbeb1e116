//! Request/expectation comparator: the match decision algorithm.
//!
//! Combines scenario-state gating with per-part AND semantics. Parts are
//! evaluated in the fixed order method, url, body; a failing declared
//! part short-circuits to no match, and an expectation declaring zero
//! conditions never matches.

use crate::domain::{Condition, Expectation, MatcherKind, MockRequest, RequestConditions};
use crate::error::ExpectationError;
use crate::input_source::{InputSourceKind, InputSourceRegistry};
use crate::matchers::MatcherRegistry;
use crate::store::ScenarioStore;
use crate::strategy::BINARY_BODY_MARKER;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::debug;

/// Outcome of evaluating the method/url/body conditions.
enum PartsOutcome {
    /// A declared part failed; the whole comparison fails.
    Failed,
    /// At least one part was declared and every declared part held.
    Checked,
    /// No part was declared at all.
    NoneDeclared,
}

#[derive(Clone)]
pub struct RequestExpectationComparator {
    matchers: Arc<MatcherRegistry>,
    input_sources: Arc<InputSourceRegistry>,
    scenarios: Arc<ScenarioStore>,
}

impl RequestExpectationComparator {
    pub fn new(
        matchers: Arc<MatcherRegistry>,
        input_sources: Arc<InputSourceRegistry>,
        scenarios: Arc<ScenarioStore>,
    ) -> Self {
        Self {
            matchers,
            input_sources,
            scenarios,
        }
    }

    /// Decides whether a request satisfies an expectation. `Ok(false)`
    /// is a plain mismatch; `Err` is a configuration fault that must be
    /// surfaced to the caller.
    pub fn matches(
        &self,
        request: &MockRequest,
        expectation: &Expectation,
    ) -> Result<bool, ExpectationError> {
        debug!("checking whether request matches an expectation");

        if !self.scenario_state_holds(expectation)? {
            return Ok(false);
        }

        let conditions = &expectation.request;
        let parts_checked = match self.compare_request_parts(request, conditions)? {
            PartsOutcome::Failed => return Ok(false),
            PartsOutcome::Checked => true,
            PartsOutcome::NoneDeclared => false,
        };

        if !conditions.headers.is_empty() {
            debug!("checking headers against expectation");
            return self.headers_match(request, conditions);
        }

        debug!("matches? {}", if parts_checked { "yes" } else { "no" });
        Ok(parts_checked)
    }

    /// Scenario gate: a declared required state must equal the current
    /// state of the named scenario. A state requirement without a
    /// scenario name is invalid configuration.
    fn scenario_state_holds(&self, expectation: &Expectation) -> Result<bool, ExpectationError> {
        let Some(required) = expectation.request.scenario_state.as_deref() else {
            return Ok(true);
        };
        let name = expectation
            .scenario_name
            .as_deref()
            .ok_or(ExpectationError::MissingScenarioName)?;
        debug!("checking scenario state against expectation");
        Ok(self.scenarios.state_of(name) == required)
    }

    fn compare_request_parts(
        &self,
        request: &MockRequest,
        conditions: &RequestConditions,
    ) -> Result<PartsOutcome, ExpectationError> {
        let parts: [(InputSourceKind, fn(&RequestConditions) -> Option<&Condition>); 3] = [
            (InputSourceKind::Method, |c| c.method.as_ref()),
            (InputSourceKind::Url, |c| c.url.as_ref()),
            (InputSourceKind::Body, |c| c.body.as_ref()),
        ];

        let mut at_least_one_checked = false;
        for (kind, condition_of) in parts {
            if let Some(condition) = condition_of(conditions) {
                debug!("checking {kind} against expectation");
                if !self.part_matches(request, kind, condition, None)? {
                    return Ok(PartsOutcome::Failed);
                }
                at_least_one_checked = true;
            }
        }

        Ok(if at_least_one_checked {
            PartsOutcome::Checked
        } else {
            PartsOutcome::NoneDeclared
        })
    }

    fn headers_match(
        &self,
        request: &MockRequest,
        conditions: &RequestConditions,
    ) -> Result<bool, ExpectationError> {
        for (name, condition) in &conditions.headers {
            if !self.part_matches(request, InputSourceKind::Header, condition, Some(name))? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn part_matches(
        &self,
        request: &MockRequest,
        kind: InputSourceKind,
        condition: &Condition,
        key: Option<&str>,
    ) -> Result<bool, ExpectationError> {
        let input_source = self.input_sources.locate(kind)?;
        let matcher = self.matchers.locate(condition.matcher)?;
        let actual = input_source.extract(request, key)?;
        // Body conditions may carry the binary marker; the comparison
        // runs against the decoded content.
        let expected = if kind == InputSourceKind::Body {
            body_condition_value(condition)
        } else {
            Cow::Borrowed(condition.value.as_str())
        };
        matcher.matches(actual.as_deref(), &expected)
    }
}

fn body_condition_value(condition: &Condition) -> Cow<'_, str> {
    if condition.value.starts_with(BINARY_BODY_MARKER) {
        let decoded = crate::strategy::decode_body(&condition.value);
        Cow::Owned(String::from_utf8_lossy(&decoded).into_owned())
    } else {
        Cow::Borrowed(condition.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Condition;

    fn comparator() -> (RequestExpectationComparator, Arc<ScenarioStore>) {
        let scenarios = Arc::new(ScenarioStore::new());
        let comparator = RequestExpectationComparator::new(
            Arc::new(MatcherRegistry::with_builtin()),
            Arc::new(InputSourceRegistry::with_builtin()),
            Arc::clone(&scenarios),
        );
        (comparator, scenarios)
    }

    fn request() -> MockRequest {
        MockRequest {
            method: "POST".into(),
            url: "/orders/42".into(),
            headers: [("X-Test".to_string(), "1".to_string())].into_iter().collect(),
            body: r#"{"item":"book"}"#.into(),
        }
    }

    #[test]
    fn test_all_declared_parts_must_hold() {
        let (comparator, _) = comparator();
        let mut expectation = Expectation::default();
        expectation.request.method = Some(Condition::new(MatcherKind::SameString, "post"));
        expectation.request.url = Some(Condition::new(MatcherKind::Matches, r"^/orders/\d+$"));
        expectation.request.body = Some(Condition::new(MatcherKind::Contains, "book"));
        assert!(comparator.matches(&request(), &expectation).unwrap());

        expectation.request.body = Some(Condition::new(MatcherKind::Contains, "pen"));
        assert!(!comparator.matches(&request(), &expectation).unwrap());
    }

    #[test]
    fn test_zero_conditions_never_match() {
        let (comparator, _) = comparator();
        let expectation = Expectation::default();
        assert!(!comparator.matches(&request(), &expectation).unwrap());
    }

    #[test]
    fn test_header_only_expectation_matches() {
        let (comparator, _) = comparator();
        let mut expectation = Expectation::default();
        expectation.request.headers.insert(
            "x-test".to_string(),
            Condition::new(MatcherKind::EqualTo, "1"),
        );
        assert!(comparator.matches(&request(), &expectation).unwrap());

        expectation.request.headers.insert(
            "x-missing".to_string(),
            Condition::new(MatcherKind::EqualTo, "anything"),
        );
        assert!(!comparator.matches(&request(), &expectation).unwrap());
    }

    #[test]
    fn test_failed_part_short_circuits_before_headers() {
        let (comparator, _) = comparator();
        let mut expectation = Expectation::default();
        expectation.request.url = Some(Condition::new(MatcherKind::EqualTo, "/other"));
        expectation.request.headers.insert(
            "X-Test".to_string(),
            Condition::new(MatcherKind::EqualTo, "1"),
        );
        // Headers would match, but the failed url condition already
        // decided the outcome.
        assert!(!comparator.matches(&request(), &expectation).unwrap());
    }

    #[test]
    fn test_scenario_state_gates_the_match() {
        let (comparator, scenarios) = comparator();
        let mut expectation = Expectation::default();
        expectation.scenario_name = Some("checkout".into());
        expectation.request.scenario_state = Some("paid".into());
        expectation.request.url = Some(Condition::new(MatcherKind::EqualTo, "/orders/42"));

        assert!(!comparator.matches(&request(), &expectation).unwrap());

        scenarios.set_state("checkout", "paid");
        assert!(comparator.matches(&request(), &expectation).unwrap());
    }

    #[test]
    fn test_scenario_state_without_name_is_config_error() {
        let (comparator, _) = comparator();
        let mut expectation = Expectation::default();
        expectation.request.scenario_state = Some("paid".into());
        expectation.request.url = Some(Condition::new(MatcherKind::EqualTo, "/orders/42"));

        assert!(matches!(
            comparator.matches(&request(), &expectation),
            Err(ExpectationError::MissingScenarioName)
        ));
    }

    #[test]
    fn test_marked_body_condition_compares_decoded_content() {
        let (comparator, _) = comparator();
        let mut expectation = Expectation::default();
        // base64 of the request body used by the fixture.
        expectation.request.body = Some(Condition::new(
            MatcherKind::EqualTo,
            format!("{BINARY_BODY_MARKER}eyJpdGVtIjoiYm9vayJ9"),
        ));
        assert!(comparator.matches(&request(), &expectation).unwrap());
    }

    #[test]
    fn test_json_body_condition() {
        let (comparator, _) = comparator();
        let mut expectation = Expectation::default();
        expectation.request.body = Some(Condition::new(
            MatcherKind::SameJsonObject,
            r#"{"item":"book","qty":1}"#,
        ));
        assert!(comparator.matches(&request(), &expectation).unwrap());
    }
}
