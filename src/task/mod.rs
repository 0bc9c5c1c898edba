//! Task plans and the executor that runs them

pub mod executor;
pub mod plan;

pub use executor::{CancelToken, Tally, TaskExecutor};
pub use plan::{ActionSpec, TaskGroup, TaskPlan};
