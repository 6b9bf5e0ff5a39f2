pub mod agents;
pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod executor;
pub mod report;
pub mod runner;
pub mod usage;
pub mod util;
pub mod workflow;
