mod abort;
mod args;
mod io_pump;
mod runtime;
mod stream;
mod traits;
pub mod types;

pub use args::build_agent_args;
pub use runtime::{AgentInvocation, AgentSupervisor, CANCELLED_EXIT_CODE};
pub use stream::AgentStreamState;
pub use traits::{RunnerPlugin, RunnerSession};
pub use types::{
    AgentProgress, AgentRunResult, ProgressPhase, RunOutcome, RunnerStartArgs, Signal,
};
