#[allow(clippy::module_inception)]
pub mod error;
pub mod plan;

pub use error::{CliError, RunnerError, WorkflowError};
pub use plan::PlanError;
