//! HTTP test double: registers expectations over an admin API and
//! answers matching requests with configured, regex-derived, or proxied
//! responses, with scenario state and a verification journal.

pub mod admin;
pub mod comparator;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod input_source;
pub mod matchers;
pub mod server;
pub mod store;
pub mod strategy;
