use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Where an agent definition was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentSource {
    User,
    Project,
}

impl fmt::Display for AgentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentSource::User => f.write_str("user"),
            AgentSource::Project => f.write_str("project"),
        }
    }
}

/// Which discovery locations a workflow draws agents from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentScope {
    #[default]
    User,
    Project,
    Both,
}

impl AgentScope {
    pub fn includes_user(self) -> bool {
        matches!(self, AgentScope::User | AgentScope::Both)
    }

    pub fn includes_project(self) -> bool {
        matches!(self, AgentScope::Project | AgentScope::Both)
    }
}

impl fmt::Display for AgentScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentScope::User => f.write_str("user"),
            AgentScope::Project => f.write_str("project"),
            AgentScope::Both => f.write_str("both"),
        }
    }
}

/// An agent definition. Read-only for the lifetime of a workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// System prompt text appended to (or following) the composed rules prompt.
    pub instructions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<String>>,
    pub source: AgentSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
}

impl AgentConfig {
    pub fn new(name: impl Into<String>, instructions: impl Into<String>, source: AgentSource) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            instructions: instructions.into(),
            model: None,
            tools: None,
            source,
            file_path: None,
        }
    }
}

/// Result of one discovery pass.
#[derive(Debug, Clone, Default)]
pub struct AgentDiscovery {
    pub agents: Vec<AgentConfig>,
    pub project_agents_dir: Option<PathBuf>,
}

/// Enumerates agent definitions for a working directory and scope.
pub trait AgentDiscoverer: Send + Sync {
    fn discover(&self, cwd: &Path, scope: AgentScope) -> AgentDiscovery;
}
