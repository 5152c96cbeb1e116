//! HTTP front end: one listener serving both admin traffic (under
//! [`ADMIN_PREFIX`](crate::admin::ADMIN_PREFIX)) and mock traffic.

use crate::admin::{AdminApi, ADMIN_PREFIX};
use crate::comparator::RequestExpectationComparator;
use crate::dispatch::Dispatcher;
use crate::domain::MockRequest;
use crate::input_source::InputSourceRegistry;
use crate::matchers::MatcherRegistry;
use crate::store::{ExpectationStore, RequestJournal, ScenarioStore};
use crate::strategy::{MockResponse, StrategySelector};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// Wired-up engine shared by every connection.
pub struct App {
    admin: AdminApi,
    dispatcher: Dispatcher,
}

impl App {
    /// Builds the full engine: registries, stores, comparator,
    /// strategies, dispatcher, and admin layer.
    pub fn build(proxy_timeout: Duration) -> Self {
        let matchers = Arc::new(MatcherRegistry::with_builtin());
        let input_sources = Arc::new(InputSourceRegistry::with_builtin());
        let expectations = Arc::new(ExpectationStore::new());
        let scenarios = Arc::new(ScenarioStore::new());
        let journal = Arc::new(RequestJournal::new());
        let comparator =
            RequestExpectationComparator::new(matchers, input_sources, Arc::clone(&scenarios));

        let admin = AdminApi::new(
            Arc::clone(&expectations),
            Arc::clone(&scenarios),
            Arc::clone(&journal),
            comparator.clone(),
        );
        let dispatcher = Dispatcher::new(
            expectations,
            scenarios,
            journal,
            comparator,
            StrategySelector::new(proxy_timeout),
        );
        Self { admin, dispatcher }
    }

    /// Serves one HTTP exchange. Admin paths are routed synchronously;
    /// everything else goes through the dispatcher.
    pub async fn handle(&self, req: Request<Incoming>) -> Response<Full<Bytes>> {
        let method = req.method().to_string();
        let uri = req.uri().clone();
        let headers = collapse_headers(req.headers());

        let body = match req.into_body().collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                debug!("failed to read request body: {e}");
                return to_http(MockResponse {
                    status: 400,
                    headers: vec![("Content-Type".into(), "text/plain".into())],
                    body: Bytes::from_static(b"Failed to read request body"),
                });
            }
        };

        // The prefix must end at a segment boundary; a path like
        // "/__phiremock-stats" is ordinary mock traffic.
        let admin_path = uri
            .path()
            .strip_prefix(ADMIN_PREFIX)
            .filter(|rest| rest.is_empty() || rest.starts_with('/'));
        let response = if let Some(rest) = admin_path {
            self.admin.route(&method, rest, &body)
        } else {
            let request = MockRequest {
                method,
                url: uri
                    .path_and_query()
                    .map(|pq| pq.to_string())
                    .unwrap_or_else(|| uri.path().to_string()),
                headers,
                body: String::from_utf8_lossy(&body).to_string(),
            };
            self.dispatcher.dispatch(request).await
        };
        to_http(response)
    }
}

/// Flattens an incoming header map; repeated names are joined with a
/// comma so no value is lost for matching or proxy forwarding.
fn collapse_headers(headers: &hyper::HeaderMap) -> HashMap<String, String> {
    let mut collapsed: HashMap<String, String> = HashMap::new();
    for (name, value) in headers {
        let value = value.to_str().unwrap_or_default();
        collapsed
            .entry(name.to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    collapsed
}

fn to_http(response: MockResponse) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(response.status);
    for (name, value) in &response.headers {
        builder = builder.header(name, value);
    }
    builder.body(Full::new(response.body)).unwrap_or_else(|e| {
        warn!("failed to build response from configured parts: {e}");
        let mut fallback = Response::new(Full::new(Bytes::new()));
        *fallback.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
        fallback
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_headers_are_joined() {
        let mut headers = hyper::HeaderMap::new();
        headers.append("set-cookie", "a=1".parse().unwrap());
        headers.append("set-cookie", "b=2".parse().unwrap());
        headers.insert("x-single", "only".parse().unwrap());

        let collapsed = collapse_headers(&headers);
        assert_eq!(collapsed["set-cookie"], "a=1, b=2");
        assert_eq!(collapsed["x-single"], "only");
    }

    #[test]
    fn test_unbuildable_response_falls_back_to_server_error() {
        let response = to_http(MockResponse {
            status: 200,
            headers: vec![("bad header name".into(), "v".into())],
            body: Bytes::from_static(b"ignored"),
        });
        assert_eq!(response.status(), hyper::StatusCode::INTERNAL_SERVER_ERROR);
    }
}

pub struct MockServer {
    addr: SocketAddr,
    app: Arc<App>,
}

impl MockServer {
    pub fn new(addr: SocketAddr, app: Arc<App>) -> Self {
        Self { addr, app }
    }

    pub async fn run(self) -> Result<(), anyhow::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        info!("mockd listening on http://{}", self.addr);
        Self::serve(listener, self.app).await
    }

    /// Accept loop over a pre-bound listener. One task per connection.
    pub async fn serve(listener: TcpListener, app: Arc<App>) -> Result<(), anyhow::Error> {
        loop {
            let (stream, peer) = listener.accept().await?;
            debug!("accepted connection from {peer}");
            let io = TokioIo::new(stream);
            let app = Arc::clone(&app);

            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let app = Arc::clone(&app);
                    async move { Ok::<_, Infallible>(app.handle(req).await) }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    debug!("connection error: {e}");
                }
            });
        }
    }
}
