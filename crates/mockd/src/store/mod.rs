//! Process-wide stores shared by all in-flight requests.
//!
//! Every mutation runs inside a synchronous run-to-completion segment;
//! guards are never held across an await point, so plain locked
//! structures are sufficient.

mod expectations;
mod journal;
mod scenarios;

pub use expectations::ExpectationStore;
pub use journal::RequestJournal;
pub use scenarios::{ScenarioStore, INITIAL_SCENARIO_STATE};
