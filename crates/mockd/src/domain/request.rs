//! Materialized requests and the records kept for verification.

use serde::Serialize;
use std::collections::HashMap;

/// A fully-materialized inbound request, handed to the engine once the
/// whole body has arrived. The surrounding I/O layer guarantees
/// structural validity; extraction from this type never fails.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MockRequest {
    pub method: String,
    /// Path plus query string, e.g. `/users?page=2`.
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl MockRequest {
    /// Case-insensitive header lookup per HTTP semantics. A missing
    /// header yields `None`, not an error.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Immutable snapshot of a received request, stored for later counting.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRecord {
    /// Arrival order, starting at 1.
    pub number: u64,
    pub received_at: chrono::DateTime<chrono::Utc>,
    #[serde(flatten)]
    pub request: MockRequest,
}
