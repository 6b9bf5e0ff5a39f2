use std::sync::Arc;

use wavecrew_core::agents::AgentDiscoverer;
use wavecrew_core::config::AppConfig;
use wavecrew_core::executor::OutputRendererPlugin;
use wavecrew_core::runner::RunnerPlugin;

use crate::agents::MarkdownAgentDiscovery;
use crate::renderer::{JsonlRendererPlugin, TextRendererPlugin};
use crate::runner::ProcessRunnerPlugin;

pub fn build_runner(_cfg: &AppConfig) -> Arc<dyn RunnerPlugin> {
    Arc::new(ProcessRunnerPlugin::new())
}

pub fn build_discoverer(cfg: &AppConfig) -> Arc<dyn AgentDiscoverer> {
    Arc::new(MarkdownAgentDiscovery::from_config(&cfg.agents))
}

pub fn build_renderer(format: &str, ascii_only: bool) -> Box<dyn OutputRendererPlugin> {
    match format {
        "jsonl" => Box::new(JsonlRendererPlugin::new(false)),
        // Anything other than jsonl renders as text.
        _ => Box::new(TextRendererPlugin::new(ascii_only)),
    }
}
