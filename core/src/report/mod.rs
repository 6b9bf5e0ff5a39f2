//! Recovery of structured reports from free-form agent output. Every parser returns
//! `Option`: "no JSON found" and "wrong shape" are the same outcome to callers.
mod critic;
mod extract;
mod plan;
mod worker;

pub use critic::{CriticDecision, CriticReport, NO_REVISION_FEEDBACK};
pub use extract::{extract_json_candidate, normalize_string_list};
pub use plan::parse_planned_waves;
pub use worker::{WorkerReport, WorkerStatus};
