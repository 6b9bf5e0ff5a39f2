use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use wavecrew_core::agents::{
    merge_scoped, AgentConfig, AgentDiscoverer, AgentDiscovery, AgentScope, AgentSource,
};
use wavecrew_core::config::AgentsConfig;

/// Agent definitions stored as markdown files with a YAML frontmatter block.
///
/// ```text
/// ---
/// name: implementer
/// description: Writes code
/// model: some-model
/// tools: read, bash
/// ---
/// You are a careful engineer...
/// ```
pub struct MarkdownAgentDiscovery {
    user_dir: Option<PathBuf>,
    project_dir: PathBuf,
}

impl MarkdownAgentDiscovery {
    /// `user_dir` of `None` disables user-level agents.
    pub fn new(user_dir: Option<PathBuf>, project_dir: impl Into<PathBuf>) -> Self {
        Self {
            user_dir,
            project_dir: project_dir.into(),
        }
    }

    pub fn from_config(cfg: &AgentsConfig) -> Self {
        let user_dir = match shellexpand::full(&cfg.user_dir) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(e) => {
                tracing::warn!(dir = %cfg.user_dir, error = %e, "cannot expand user agents dir");
                None
            }
        };
        Self::new(user_dir, &cfg.project_dir)
    }

    /// Nearest `<ancestor>/<project_dir>` directory, starting at `cwd`.
    pub fn find_project_dir(&self, cwd: &Path) -> Option<PathBuf> {
        cwd.ancestors()
            .map(|dir| dir.join(&self.project_dir))
            .find(|candidate| candidate.is_dir())
    }
}

impl AgentDiscoverer for MarkdownAgentDiscovery {
    fn discover(&self, cwd: &Path, scope: AgentScope) -> AgentDiscovery {
        let project_agents_dir = self.find_project_dir(cwd);

        let user = match (&self.user_dir, scope.includes_user()) {
            (Some(dir), true) => load_agents_from_dir(dir, AgentSource::User),
            _ => Vec::new(),
        };
        let project = match (&project_agents_dir, scope.includes_project()) {
            (Some(dir), true) => load_agents_from_dir(dir, AgentSource::Project),
            _ => Vec::new(),
        };

        let agents = merge_scoped(user, project, scope);
        tracing::debug!(
            scope = %scope,
            count = agents.len(),
            project_dir = ?project_agents_dir,
            "agents discovered"
        );
        AgentDiscovery {
            agents,
            project_agents_dir,
        }
    }
}

fn load_agents_from_dir(dir: &Path, source: AgentSource) -> Vec<AgentConfig> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .file_type()
                .map(|ft| ft.is_file() || ft.is_symlink())
                .unwrap_or(false)
        })
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "md"))
        .collect();
    paths.sort();

    paths
        .into_iter()
        .filter_map(|path| {
            let agent = read_agent_file(&path, source);
            if agent.is_none() {
                tracing::debug!(path = %path.display(), "skipping agent file");
            }
            agent
        })
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ToolList {
    Csv(String),
    List(Vec<String>),
}

#[derive(Deserialize)]
struct Frontmatter {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    tools: Option<ToolList>,
}

fn read_agent_file(path: &Path, source: AgentSource) -> Option<AgentConfig> {
    let content = fs::read_to_string(path).ok()?;
    let (frontmatter, body) = split_frontmatter(&content)?;
    let fm: Frontmatter = serde_yaml::from_str(frontmatter).ok()?;

    let name = fm.name.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
    let description = fm
        .description
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())?;

    let tools: Vec<String> = match fm.tools {
        Some(ToolList::Csv(csv)) => csv.split(',').map(|t| t.trim().to_string()).collect(),
        Some(ToolList::List(list)) => list.into_iter().map(|t| t.trim().to_string()).collect(),
        None => Vec::new(),
    }
    .into_iter()
    .filter(|t| !t.is_empty())
    .collect();

    Some(AgentConfig {
        name: name.to_string(),
        description: description.to_string(),
        instructions: body.trim().to_string(),
        model: fm
            .model
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty()),
        tools: if tools.is_empty() { None } else { Some(tools) },
        source,
        file_path: Some(path.to_path_buf()),
    })
}

fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let rest = content
        .strip_prefix("---\r\n")
        .or_else(|| content.strip_prefix("---\n"))?;
    if let Some(body) = rest.strip_prefix("---") {
        return Some(("", body));
    }
    let end = rest.find("\n---")?;
    let after = &rest[end + 4..];
    let body = after
        .strip_prefix("\r\n")
        .or_else(|| after.strip_prefix('\n'))
        .unwrap_or(after);
    Some((&rest[..end], body))
}
