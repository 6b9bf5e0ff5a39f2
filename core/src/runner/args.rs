use crate::agents::AgentConfig;

/// Build the agent CLI argument vector for one invocation.
pub fn build_agent_args(
    base_args: &[String],
    agent: &AgentConfig,
    system_prompt_override: Option<&str>,
    prompt: &str,
) -> Vec<String> {
    let mut args: Vec<String> = base_args.to_vec();

    if let Some(model) = agent.model.as_deref().filter(|m| !m.trim().is_empty()) {
        args.push("--model".to_string());
        args.push(model.to_string());
    }

    if let Some(tools) = agent.tools.as_ref().filter(|t| !t.is_empty()) {
        args.push("--tools".to_string());
        args.push(tools.join(","));
    }

    match system_prompt_override.filter(|s| !s.trim().is_empty()) {
        Some(system_prompt) => {
            args.push("--system-prompt".to_string());
            args.push(system_prompt.to_string());
        }
        None if !agent.instructions.is_empty() => {
            args.push("--append-system-prompt".to_string());
            args.push(agent.instructions.clone());
        }
        None => {}
    }

    args.push(prompt.to_string());
    args
}
