//! Domain value objects: expectations, conditions and materialized requests.

mod expectation;
mod request;

pub use expectation::{
    default_status_code, Condition, Expectation, MatcherKind, RequestConditions,
    ResponseDefinition,
};
pub use request::{MockRequest, RequestRecord};
