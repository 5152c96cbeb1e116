//! Administration endpoints, served under `/__phiremock`.
//!
//! Clients use these to program the server: register and list
//! expectations, reset scenario state, and verify how many journaled
//! requests satisfy a set of conditions.

use crate::comparator::RequestExpectationComparator;
use crate::domain::{Expectation, RequestConditions};
use crate::store::{ExpectationStore, RequestJournal, ScenarioStore};
use crate::strategy::MockResponse;
use bytes::Bytes;
use std::sync::Arc;
use tracing::{info, warn};

/// Path prefix reserved for administration. Everything else is mock
/// traffic.
pub const ADMIN_PREFIX: &str = "/__phiremock";

pub struct AdminApi {
    expectations: Arc<ExpectationStore>,
    scenarios: Arc<ScenarioStore>,
    journal: Arc<RequestJournal>,
    comparator: RequestExpectationComparator,
}

impl AdminApi {
    pub fn new(
        expectations: Arc<ExpectationStore>,
        scenarios: Arc<ScenarioStore>,
        journal: Arc<RequestJournal>,
        comparator: RequestExpectationComparator,
    ) -> Self {
        Self {
            expectations,
            scenarios,
            journal,
            comparator,
        }
    }

    /// Routes one admin request. `path` is relative to [`ADMIN_PREFIX`],
    /// with any query string already stripped.
    pub fn route(&self, method: &str, path: &str, body: &Bytes) -> MockResponse {
        match (method, path) {
            ("POST", "/expectations") => self.create_expectation(body),
            ("GET", "/expectations") => self.list_expectations(),
            ("DELETE", "/expectations") => {
                self.expectations.clear();
                info!("cleared all expectations");
                no_content()
            }
            ("DELETE", "/scenarios") => {
                self.scenarios.clear();
                info!("reset all scenarios to their start state");
                no_content()
            }
            ("POST", "/executions") => self.count_executions(body),
            ("DELETE", "/executions") => {
                self.journal.clear();
                info!("cleared the request journal");
                no_content()
            }
            _ => error_response(404, &format!("unknown admin endpoint {method} {path}")),
        }
    }

    fn create_expectation(&self, body: &Bytes) -> MockResponse {
        let expectation: Expectation = match serde_json::from_slice(body) {
            Ok(expectation) => expectation,
            Err(e) => {
                warn!("rejected malformed expectation: {e}");
                return error_response(400, &format!("invalid expectation: {e}"));
            }
        };
        if let Err(e) = validate(&expectation) {
            warn!("rejected invalid expectation: {e}");
            return error_response(400, &e);
        }
        info!("registered expectation for {:?}", expectation.request.url);
        self.expectations.add(expectation);
        created()
    }

    fn list_expectations(&self) -> MockResponse {
        match serde_json::to_vec(&self.expectations.all()) {
            Ok(body) => json_response(200, Bytes::from(body)),
            Err(e) => error_response(500, &format!("failed to serialize expectations: {e}")),
        }
    }

    /// Counts journaled requests that satisfy the posted conditions.
    /// Accepts either a full expectation or its bare `request` block;
    /// scenario gating is evaluated against the current scenario state.
    fn count_executions(&self, body: &Bytes) -> MockResponse {
        let probe = match parse_execution_query(body) {
            Ok(probe) => probe,
            Err(e) => {
                warn!("rejected malformed execution query: {e}");
                return error_response(400, &format!("invalid execution query: {e}"));
            }
        };
        let counted = self
            .journal
            .count_matching(|request| self.comparator.matches(request, &probe));
        match counted {
            Ok(count) => json_response(
                200,
                Bytes::from(serde_json::json!({ "count": count }).to_string()),
            ),
            Err(e) => error_response(500, &e.to_string()),
        }
    }
}

/// Builds the probe expectation for an execution query. A wrapped
/// document keeps its scenario name so gated conditions stay valid;
/// the response policy and any transition are irrelevant to counting
/// and dropped.
fn parse_execution_query(body: &Bytes) -> Result<Expectation, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_slice(body)?;
    if value.get("request").is_some() {
        let expectation: Expectation = serde_json::from_value(value)?;
        Ok(Expectation {
            scenario_name: expectation.scenario_name,
            request: expectation.request,
            ..Default::default()
        })
    } else {
        let request: RequestConditions = serde_json::from_value(value)?;
        Ok(Expectation {
            request,
            ..Default::default()
        })
    }
}

/// Cross-field checks the deserializer cannot express.
fn validate(expectation: &Expectation) -> Result<(), String> {
    if expectation.new_scenario_state.is_some() && expectation.scenario_name.is_none() {
        return Err("newScenarioState requires scenarioName".into());
    }
    if expectation.request.scenario_state.is_some() && expectation.scenario_name.is_none() {
        return Err("scenarioState requires scenarioName".into());
    }
    if expectation.response.proxy_to.is_some() && expectation.response.body.is_some() {
        return Err("a proxied expectation cannot also declare a response body".into());
    }
    Ok(())
}

fn created() -> MockResponse {
    MockResponse {
        status: 201,
        headers: vec![("Content-Type".into(), "application/json".into())],
        body: Bytes::from_static(b"{\"result\":\"OK\"}"),
    }
}

fn no_content() -> MockResponse {
    MockResponse {
        status: 200,
        headers: vec![("Content-Type".into(), "application/json".into())],
        body: Bytes::from_static(b"{\"result\":\"OK\"}"),
    }
}

fn json_response(status: u16, body: Bytes) -> MockResponse {
    MockResponse {
        status,
        headers: vec![("Content-Type".into(), "application/json".into())],
        body,
    }
}

fn error_response(status: u16, message: &str) -> MockResponse {
    MockResponse {
        status,
        headers: vec![("Content-Type".into(), "application/json".into())],
        body: Bytes::from(serde_json::json!({ "error": message }).to_string()),
    }
}
