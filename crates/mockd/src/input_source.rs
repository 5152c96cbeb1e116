//! Input sources: where in a request a value lives.
//!
//! Each source extracts one value from a materialized request. Header
//! extraction is keyed by header name (case-insensitive); the other
//! sources ignore the key. Extraction never fails for a structurally
//! valid request — a missing header is `None`, not an error.

use crate::domain::MockRequest;
use crate::error::ExpectationError;
use std::collections::HashMap;

/// Closed set of input source kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSourceKind {
    Method,
    Url,
    Header,
    Body,
}

impl std::fmt::Display for InputSourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InputSourceKind::Method => "method",
            InputSourceKind::Url => "url",
            InputSourceKind::Header => "header",
            InputSourceKind::Body => "body",
        };
        f.write_str(name)
    }
}

/// Capability extracting a value (optionally keyed) from a request.
pub trait InputSource: Send + Sync {
    fn extract(
        &self,
        request: &MockRequest,
        key: Option<&str>,
    ) -> Result<Option<String>, ExpectationError>;
}

struct MethodSource;

impl InputSource for MethodSource {
    fn extract(
        &self,
        request: &MockRequest,
        _key: Option<&str>,
    ) -> Result<Option<String>, ExpectationError> {
        Ok(Some(request.method.clone()))
    }
}

struct UrlSource;

impl InputSource for UrlSource {
    fn extract(
        &self,
        request: &MockRequest,
        _key: Option<&str>,
    ) -> Result<Option<String>, ExpectationError> {
        Ok(Some(request.url.clone()))
    }
}

struct HeaderSource;

impl InputSource for HeaderSource {
    fn extract(
        &self,
        request: &MockRequest,
        key: Option<&str>,
    ) -> Result<Option<String>, ExpectationError> {
        let name = key.ok_or(ExpectationError::MissingHeaderName)?;
        Ok(request.header(name).map(str::to_string))
    }
}

struct BodySource;

impl InputSource for BodySource {
    fn extract(
        &self,
        request: &MockRequest,
        _key: Option<&str>,
    ) -> Result<Option<String>, ExpectationError> {
        Ok(Some(request.body.clone()))
    }
}

/// Typed registry mapping source kinds to implementations, resolved once
/// at startup.
pub struct InputSourceRegistry {
    sources: HashMap<InputSourceKind, Box<dyn InputSource>>,
}

impl InputSourceRegistry {
    /// Registry populated with all built-in sources.
    pub fn with_builtin() -> Self {
        let mut sources: HashMap<InputSourceKind, Box<dyn InputSource>> = HashMap::new();
        sources.insert(InputSourceKind::Method, Box::new(MethodSource));
        sources.insert(InputSourceKind::Url, Box::new(UrlSource));
        sources.insert(InputSourceKind::Header, Box::new(HeaderSource));
        sources.insert(InputSourceKind::Body, Box::new(BodySource));
        Self { sources }
    }

    pub fn locate(&self, kind: InputSourceKind) -> Result<&dyn InputSource, ExpectationError> {
        self.sources
            .get(&kind)
            .map(|s| s.as_ref())
            .ok_or_else(|| ExpectationError::UnknownInputSource(kind.to_string()))
    }
}
