//! Proxy response strategy: forwards the request to a declared upstream
//! and relays the reply.
//!
//! This is the only strategy that suspends. Shared stores are updated
//! before the outbound call is issued, so nothing here touches them
//! across the await. A per-call timeout bounds hung upstreams; expiry
//! surfaces as a gateway-timeout response instead of holding the
//! request open.

use super::{MockResponse, ResponseStrategy};
use crate::domain::{Expectation, MockRequest};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use tracing::{debug, warn};

pub struct ProxyResponseStrategy {
    client: reqwest::Client,
}

impl ProxyResponseStrategy {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            // Disable connection pooling to avoid stale upstream connections.
            .pool_max_idle_per_host(0)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

#[async_trait]
impl ResponseStrategy for ProxyResponseStrategy {
    async fn build(&self, request: &MockRequest, expectation: &Expectation) -> MockResponse {
        let Some(target) = expectation.response.proxy_to.as_deref() else {
            return MockResponse::server_error(
                "proxy expectation does not declare a proxyTo target",
            );
        };
        debug!("proxying request to {target}");

        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .unwrap_or(reqwest::Method::GET);
        let mut outbound = self.client.request(method, target);

        // The upstream gets its own authority; drop the original host
        // and the stale content-length.
        for (name, value) in &request.headers {
            let lower = name.to_lowercase();
            if lower != "host" && lower != "content-length" {
                outbound = outbound.header(name, value);
            }
        }
        if !request.body.is_empty() {
            outbound = outbound.body(request.body.clone());
        }

        match outbound.send().await {
            Ok(upstream) => relay(upstream).await,
            Err(e) if e.is_timeout() => {
                warn!("proxy request to {target} timed out: {e}");
                gateway_error(504, &format!("upstream call to {target} timed out"))
            }
            Err(e) => {
                warn!("proxy request to {target} failed: {e}");
                gateway_error(502, &format!("upstream call to {target} failed: {e}"))
            }
        }
    }
}

/// Relays the upstream response verbatim, minus hop-by-hop headers.
async fn relay(upstream: reqwest::Response) -> MockResponse {
    let status = upstream.status().as_u16();
    let headers: Vec<(String, String)> = upstream
        .headers()
        .iter()
        .filter(|(name, _)| {
            !matches!(
                name.as_str(),
                "transfer-encoding" | "connection" | "keep-alive"
            )
        })
        .map(|(name, value)| {
            (
                name.to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect();

    match upstream.bytes().await {
        Ok(body) => MockResponse {
            status,
            headers,
            body,
        },
        Err(e) => {
            warn!("failed to read upstream response body: {e}");
            gateway_error(502, &format!("failed to read upstream response body: {e}"))
        }
    }
}

fn gateway_error(status: u16, message: &str) -> MockResponse {
    MockResponse {
        status,
        headers: vec![("Content-Type".into(), "application/json".into())],
        body: Bytes::from(serde_json::json!({ "error": message }).to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResponseDefinition;

    #[tokio::test]
    async fn test_missing_proxy_target_is_server_error() {
        let mut expectation = Expectation::default();
        expectation.response = ResponseDefinition {
            is_proxy: true,
            ..Default::default()
        };
        let strategy = ProxyResponseStrategy::new(Duration::from_millis(100));
        let response = strategy
            .build(&MockRequest::default(), &expectation)
            .await;
        assert_eq!(response.status, 500);
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_gateway_error() {
        let mut expectation = Expectation::default();
        // Reserved TEST-NET-1 address, nothing listens there.
        expectation.response = ResponseDefinition {
            proxy_to: Some("http://192.0.2.1:9/".into()),
            ..Default::default()
        };
        let strategy = ProxyResponseStrategy::new(Duration::from_millis(200));
        let response = strategy
            .build(&MockRequest::default(), &expectation)
            .await;
        assert!(response.status == 502 || response.status == 504);
    }
}
