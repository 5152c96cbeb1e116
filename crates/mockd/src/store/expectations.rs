//! Ordered collection of registered expectations.

use crate::domain::Expectation;
use parking_lot::RwLock;

/// Keeps expectations in registration order. The dispatcher scans the
/// snapshot newest-first, so the most recently registered match wins.
#[derive(Default)]
pub struct ExpectationStore {
    items: RwLock<Vec<Expectation>>,
}

impl ExpectationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, expectation: Expectation) {
        self.items.write().push(expectation);
    }

    /// Snapshot in registration order.
    pub fn all(&self) -> Vec<Expectation> {
        self.items.read().clone()
    }

    pub fn clear(&self) {
        self.items.write().clear();
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}
