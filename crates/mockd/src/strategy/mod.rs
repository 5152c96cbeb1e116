//! Response strategies: turn a winning expectation (or none) into a
//! concrete response.

mod proxy;
mod regex_response;
mod static_response;

pub use proxy::ProxyResponseStrategy;
pub use regex_response::RegexResponseStrategy;
pub use static_response::{StaticResponseStrategy, BINARY_BODY_MARKER};

pub(crate) use static_response::decode_body;

use crate::domain::{Expectation, MatcherKind, MockRequest};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

/// A fully-materialized response handed back to the I/O layer.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl MockResponse {
    /// Deterministic fallback for mock traffic no expectation matched.
    pub fn not_found() -> Self {
        Self {
            status: 404,
            headers: vec![("Content-Type".into(), "text/plain".into())],
            body: Bytes::from_static(b"No expectation was matched for the request"),
        }
    }

    /// Server error carrying a configuration fault message.
    pub fn server_error(message: &str) -> Self {
        Self {
            status: 500,
            headers: vec![("Content-Type".into(), "application/json".into())],
            body: Bytes::from(
                serde_json::json!({ "error": message }).to_string(),
            ),
        }
    }
}

/// Capability producing a response for a matched expectation. Only the
/// proxy strategy performs I/O; the others complete synchronously.
#[async_trait]
pub trait ResponseStrategy: Send + Sync {
    async fn build(&self, request: &MockRequest, expectation: &Expectation) -> MockResponse;
}

/// Picks the strategy for a winning expectation: proxy when an upstream
/// is declared, regex extraction when a `matches` condition on url or
/// body can feed capture groups, static otherwise.
pub struct StrategySelector {
    static_strategy: StaticResponseStrategy,
    regex_strategy: RegexResponseStrategy,
    proxy_strategy: ProxyResponseStrategy,
}

impl StrategySelector {
    pub fn new(proxy_timeout: Duration) -> Self {
        Self {
            static_strategy: StaticResponseStrategy,
            regex_strategy: RegexResponseStrategy,
            proxy_strategy: ProxyResponseStrategy::new(proxy_timeout),
        }
    }

    pub fn select(&self, expectation: &Expectation) -> &dyn ResponseStrategy {
        if expectation.response.is_proxied() {
            &self.proxy_strategy
        } else if has_regex_condition(expectation) {
            &self.regex_strategy
        } else {
            &self.static_strategy
        }
    }
}

fn has_regex_condition(expectation: &Expectation) -> bool {
    let is_regex = |condition: &Option<crate::domain::Condition>| {
        condition
            .as_ref()
            .is_some_and(|c| c.matcher == MatcherKind::Matches)
    };
    is_regex(&expectation.request.url) || is_regex(&expectation.request.body)
}
