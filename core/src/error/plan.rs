use thiserror::Error;

/// Structural problems with a wave/task plan. All of them are raised before any
/// process is spawned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("Plan must contain at least one wave")]
    EmptyPlan,

    #[error("Too many waves ({count}). Maximum is {max}.")]
    TooManyWaves { count: usize, max: usize },

    #[error("Wave {wave} has no tasks")]
    EmptyWave { wave: usize },

    #[error("Wave {wave} has too many tasks ({count}). Maximum is {max}.")]
    TooManyTasksInWave { wave: usize, count: usize, max: usize },

    #[error("Too many tasks ({count}). Maximum is {max}.")]
    TooManyTasks { count: usize, max: usize },

    #[error("Duplicate task id detected: {0}")]
    DuplicateTaskId(String),

    #[error("Task {task} must have at least one acceptance criterion")]
    MissingAcceptanceCriteria { task: String },

    #[error("{field} must be between {min} and {max} characters (got {len})")]
    FieldLength {
        field: String,
        len: usize,
        min: usize,
        max: usize,
    },

    #[error("{field} allows at most {max} entries (got {count})")]
    TooManyEntries {
        field: String,
        count: usize,
        max: usize,
    },

    #[error("Task cwd must stay inside project root: {0}")]
    CwdEscapesRoot(String),

    #[error("invalid plan json: {0}")]
    InvalidJson(String),
}
