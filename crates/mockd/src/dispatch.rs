//! Dispatcher for mock traffic: journals the request, finds the winning
//! expectation, advances scenario state, and delegates response
//! construction to a strategy.

use crate::comparator::RequestExpectationComparator;
use crate::domain::{Expectation, MockRequest};
use crate::store::{ExpectationStore, RequestJournal, ScenarioStore};
use crate::strategy::{MockResponse, StrategySelector};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

pub struct Dispatcher {
    expectations: Arc<ExpectationStore>,
    scenarios: Arc<ScenarioStore>,
    journal: Arc<RequestJournal>,
    comparator: RequestExpectationComparator,
    strategies: StrategySelector,
}

impl Dispatcher {
    pub fn new(
        expectations: Arc<ExpectationStore>,
        scenarios: Arc<ScenarioStore>,
        journal: Arc<RequestJournal>,
        comparator: RequestExpectationComparator,
        strategies: StrategySelector,
    ) -> Self {
        Self {
            expectations,
            scenarios,
            journal,
            comparator,
            strategies,
        }
    }

    /// Handles one mock request end to end. Every request is journaled,
    /// matched or not.
    pub async fn dispatch(&self, request: MockRequest) -> MockResponse {
        let number = self.journal.store(request.clone());
        debug!("journaled request #{number}: {} {}", request.method, request.url);

        let winner = match self.find_winner(&request) {
            Ok(winner) => winner,
            Err(e) => {
                error!("expectation configuration fault while matching: {e}");
                return MockResponse::server_error(&e.to_string());
            }
        };

        let Some(expectation) = winner else {
            info!("no expectation matched {} {}", request.method, request.url);
            return MockResponse::not_found();
        };

        self.advance_scenario(&expectation);

        if let Some(millis) = expectation.response.delay_millis {
            debug!("delaying response by {millis}ms");
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }

        self.strategies
            .select(&expectation)
            .build(&request, &expectation)
            .await
    }

    /// Scans registered expectations newest-first and returns the first
    /// match, so the most recently registered expectation wins overlaps.
    fn find_winner(
        &self,
        request: &MockRequest,
    ) -> Result<Option<Expectation>, crate::error::ExpectationError> {
        for expectation in self.expectations.all().into_iter().rev() {
            if self.comparator.matches(request, &expectation)? {
                return Ok(Some(expectation));
            }
        }
        Ok(None)
    }

    /// Moves the scenario forward when the winner declares a transition.
    /// The store is updated before the strategy runs, so a slow (proxied
    /// or delayed) response never holds the state back.
    fn advance_scenario(&self, expectation: &Expectation) {
        if let (Some(name), Some(state)) = (
            expectation.scenario_name.as_deref(),
            expectation.new_scenario_state.as_deref(),
        ) {
            info!("scenario {name} moves to state {state}");
            self.scenarios.set_state(name, state);
        }
    }
}
