//! Regex-extraction response strategy.
//!
//! When the winning expectation matched the url or body with a `matches`
//! condition, capture groups from that pattern are available in the
//! configured response body and header values as `${url.N}` / `${body.N}`
//! tokens. Unresolved tokens stay literal.

use super::{static_response::decode_body, MockResponse, ResponseStrategy};
use crate::domain::{Condition, Expectation, MatcherKind, MockRequest};
use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

pub struct RegexResponseStrategy;

#[async_trait]
impl ResponseStrategy for RegexResponseStrategy {
    async fn build(&self, request: &MockRequest, expectation: &Expectation) -> MockResponse {
        let definition = &expectation.response;
        let body = definition
            .body
            .as_deref()
            .map(|b| substitute_captures(b, request, &expectation.request));
        let headers = definition
            .headers
            .iter()
            .map(|(k, v)| {
                (
                    k.clone(),
                    substitute_captures(v, request, &expectation.request),
                )
            })
            .collect();

        MockResponse {
            status: definition.status_code,
            headers,
            body: body.as_deref().map(decode_body).unwrap_or_default(),
        }
    }
}

/// Replaces `${url.N}` and `${body.N}` tokens with capture group N of
/// the corresponding `matches` condition evaluated against the actual
/// input.
fn substitute_captures(
    template: &str,
    request: &MockRequest,
    conditions: &crate::domain::RequestConditions,
) -> String {
    let mut result = template.to_string();
    let sources: [(&str, Option<&Condition>, &str); 2] = [
        ("url", conditions.url.as_ref(), &request.url),
        ("body", conditions.body.as_ref(), &request.body),
    ];

    for (tag, condition, actual) in sources {
        let Some(condition) = condition else { continue };
        if condition.matcher != MatcherKind::Matches {
            continue;
        }
        // The comparator already evaluated this pattern for the match,
        // so compilation only fails if the expectation changed under us.
        let Ok(regex) = Regex::new(&condition.value) else {
            debug!("skipping capture substitution for unparsable pattern on {tag}");
            continue;
        };
        let Some(captures) = regex.captures(actual) else {
            continue;
        };
        for index in 0..captures.len() {
            if let Some(group) = captures.get(index) {
                result = result.replace(&format!("${{{tag}.{index}}}"), group.as_str());
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResponseDefinition;

    fn expectation_with_url_pattern(pattern: &str, body: &str) -> Expectation {
        let mut expectation = Expectation::default();
        expectation.request.url = Some(Condition::new(MatcherKind::Matches, pattern));
        expectation.response = ResponseDefinition {
            body: Some(body.into()),
            ..Default::default()
        };
        expectation
    }

    fn request(url: &str, body: &str) -> MockRequest {
        MockRequest {
            method: "GET".into(),
            url: url.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_url_capture_substitution() {
        let expectation =
            expectation_with_url_pattern(r"^/users/(\d+)$", r#"{"userId": "${url.1}"}"#);
        let response = RegexResponseStrategy
            .build(&request("/users/42", ""), &expectation)
            .await;
        assert_eq!(response.body, bytes::Bytes::from_static(br#"{"userId": "42"}"#));
    }

    #[tokio::test]
    async fn test_body_capture_substitution_in_headers() {
        let mut expectation = Expectation::default();
        expectation.request.body = Some(Condition::new(MatcherKind::Matches, r"token=(\w+)"));
        expectation.response = ResponseDefinition {
            headers: [("X-Token".to_string(), "${body.1}".to_string())].into_iter().collect(),
            ..Default::default()
        };

        let response = RegexResponseStrategy
            .build(&request("/", "token=abc123"), &expectation)
            .await;
        assert!(response
            .headers
            .iter()
            .any(|(k, v)| k == "X-Token" && v == "abc123"));
    }

    #[tokio::test]
    async fn test_unresolved_tokens_stay_literal() {
        let expectation =
            expectation_with_url_pattern(r"^/users/(\d+)$", "first=${url.1} missing=${url.9}");
        let response = RegexResponseStrategy
            .build(&request("/users/7", ""), &expectation)
            .await;
        assert_eq!(
            response.body,
            bytes::Bytes::from_static(b"first=7 missing=${url.9}")
        );
    }
}
