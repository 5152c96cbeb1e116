//! Append-only journal of received requests, kept for test assertions
//! ("was this request received N times?").

use crate::domain::{MockRequest, RequestRecord};
use crate::error::ExpectationError;
use parking_lot::RwLock;

#[derive(Default)]
pub struct RequestJournal {
    records: RwLock<Vec<RequestRecord>>,
}

impl RequestJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a snapshot of the request and returns its arrival number.
    pub fn store(&self, request: MockRequest) -> u64 {
        let mut records = self.records.write();
        let number = records.len() as u64 + 1;
        records.push(RequestRecord {
            number,
            received_at: chrono::Utc::now(),
            request,
        });
        number
    }

    /// Counts recorded requests satisfying the given predicate. The
    /// predicate may fail with a configuration error, which aborts the
    /// count.
    pub fn count_matching<F>(&self, mut predicate: F) -> Result<usize, ExpectationError>
    where
        F: FnMut(&MockRequest) -> Result<bool, ExpectationError>,
    {
        let records = self.records.read();
        let mut count = 0;
        for record in records.iter() {
            if predicate(&record.request)? {
                count += 1;
            }
        }
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    pub fn clear(&self) {
        self.records.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str) -> MockRequest {
        MockRequest {
            method: "GET".into(),
            url: url.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_arrival_order_counter() {
        let journal = RequestJournal::new();
        assert_eq!(journal.store(request("/a")), 1);
        assert_eq!(journal.store(request("/b")), 2);
        assert_eq!(journal.len(), 2);
    }

    #[test]
    fn test_count_matching() {
        let journal = RequestJournal::new();
        journal.store(request("/a"));
        journal.store(request("/b"));
        journal.store(request("/a"));

        let count = journal
            .count_matching(|r| Ok(r.url == "/a"))
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_count_propagates_config_errors() {
        let journal = RequestJournal::new();
        journal.store(request("/a"));
        let result =
            journal.count_matching(|_| Err(ExpectationError::MissingScenarioName));
        assert!(result.is_err());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let journal = RequestJournal::new();
        journal.store(request("/a"));
        journal.clear();
        journal.clear();
        assert!(journal.is_empty());
    }
}
