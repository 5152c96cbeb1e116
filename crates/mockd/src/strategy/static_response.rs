//! Static response strategy: replays the configured status, headers and
//! body verbatim.

use super::{MockResponse, ResponseStrategy};
use crate::domain::{Expectation, MockRequest};
use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use tracing::warn;

/// Reserved prefix marking a base64-encoded binary body.
pub const BINARY_BODY_MARKER: &str = "phiremock.base64:";

pub struct StaticResponseStrategy;

#[async_trait]
impl ResponseStrategy for StaticResponseStrategy {
    async fn build(&self, _request: &MockRequest, expectation: &Expectation) -> MockResponse {
        let definition = &expectation.response;
        MockResponse {
            status: definition.status_code,
            headers: definition
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            body: definition
                .body
                .as_deref()
                .map(decode_body)
                .unwrap_or_default(),
        }
    }
}

/// Decodes a configured body, honouring the binary marker. A marked body
/// that fails to decode is sent verbatim with a warning rather than
/// dropped.
pub(crate) fn decode_body(body: &str) -> Bytes {
    match body.strip_prefix(BINARY_BODY_MARKER) {
        Some(encoded) => match base64::engine::general_purpose::STANDARD.decode(encoded) {
            Ok(raw) => Bytes::from(raw),
            Err(e) => {
                warn!("failed to decode base64 response body: {e}");
                Bytes::from(body.to_string())
            }
        },
        None => Bytes::from(body.to_string()),
    }
}
