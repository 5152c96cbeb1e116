//! Scenario state store.
//!
//! Scenarios are named state machines gating expectations. A scenario is
//! created lazily on first reference; clearing removes every entry, so
//! subsequent lookups behave as "unknown scenario = start state".

use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

/// Well-known start state for every scenario.
pub const INITIAL_SCENARIO_STATE: &str = "Scenario.START";

#[derive(Default)]
pub struct ScenarioStore {
    states: RwLock<HashMap<String, String>>,
}

impl ScenarioStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of a scenario; unseen scenarios are in the start
    /// state.
    pub fn state_of(&self, name: &str) -> String {
        self.states
            .read()
            .get(name)
            .cloned()
            .unwrap_or_else(|| INITIAL_SCENARIO_STATE.to_string())
    }

    pub fn set_state(&self, name: &str, state: &str) {
        debug!("scenario {name} transitions to state {state}");
        self.states
            .write()
            .insert(name.to_string(), state.to_string());
    }

    /// Reverts every scenario to the start state.
    pub fn clear(&self) {
        self.states.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unseen_scenario_is_in_start_state() {
        let store = ScenarioStore::new();
        assert_eq!(store.state_of("checkout"), INITIAL_SCENARIO_STATE);
    }

    #[test]
    fn test_transition_and_clear() {
        let store = ScenarioStore::new();
        store.set_state("checkout", "paid");
        assert_eq!(store.state_of("checkout"), "paid");

        store.clear();
        assert_eq!(store.state_of("checkout"), INITIAL_SCENARIO_STATE);
        // Clearing twice never errors.
        store.clear();
    }
}
