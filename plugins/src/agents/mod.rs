mod markdown;

pub use markdown::MarkdownAgentDiscovery;
