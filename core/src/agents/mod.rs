mod registry;
mod types;

pub use registry::{list_agent_names, lookup, merge_scoped};
pub use types::{AgentConfig, AgentDiscoverer, AgentDiscovery, AgentScope, AgentSource};
