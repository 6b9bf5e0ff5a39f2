use std::collections::HashMap;

use super::types::{AgentConfig, AgentScope};

/// Merge user and project agents for `scope`, keyed by name.
///
/// User entries are inserted first and project entries second, so a project agent
/// overwrites a same-named user agent while keeping the position of the first insert.
pub fn merge_scoped(
    user: Vec<AgentConfig>,
    project: Vec<AgentConfig>,
    scope: AgentScope,
) -> Vec<AgentConfig> {
    let mut merged: Vec<AgentConfig> = Vec::new();
    let mut index_by_name: HashMap<String, usize> = HashMap::new();

    let user = if scope.includes_user() { user } else { Vec::new() };
    let project = if scope.includes_project() {
        project
    } else {
        Vec::new()
    };

    for agent in user.into_iter().chain(project) {
        match index_by_name.get(&agent.name) {
            Some(&idx) => merged[idx] = agent,
            None => {
                index_by_name.insert(agent.name.clone(), merged.len());
                merged.push(agent);
            }
        }
    }

    merged
}

pub fn lookup<'a>(agents: &'a [AgentConfig], name: &str) -> Option<&'a AgentConfig> {
    agents.iter().find(|agent| agent.name == name)
}

pub fn list_agent_names(agents: &[AgentConfig]) -> String {
    if agents.is_empty() {
        return "none".to_string();
    }
    agents
        .iter()
        .map(|agent| format!("{} ({})", agent.name, agent.source))
        .collect::<Vec<_>>()
        .join(", ")
}
