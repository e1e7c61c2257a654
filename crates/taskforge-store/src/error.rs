use std::fmt;

/// Result type for taskforge-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the store layer
#[derive(Debug)]
pub enum Error {
    /// Database operation failed
    Database(rusqlite::Error),

    /// JSON column could not be encoded or decoded
    Serde(serde_json::Error),

    /// Query-specific error (malformed row, invalid input)
    Query(String),

    /// Referenced entity does not exist
    NotFound(String),

    /// Required input missing or empty
    Validation(String),

    /// Status transition violates the state machine
    InvalidTransition { from: String, to: String },

    /// Task moved to in_progress while dependencies are incomplete
    DependenciesNotDone { task_id: String, pending: Vec<String> },

    /// Dependency set would create a cycle
    Cycle(String),

    /// Referenced dependency task does not exist
    MissingDependency(String),

    /// Deleting a task other tasks depend on
    HasDependents { task_id: String, dependents: Vec<String> },

    /// Deleting a user story with completed sub-tasks without force
    HasCompletedWork { story_id: String, done_count: usize },

    /// Deleting a user story blocked by tasks outside the story
    ExternalDependents { story_id: String, dependents: Vec<String> },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Database(err) => write!(f, "Database error: {}", err),
            Error::Serde(err) => write!(f, "Serialization error: {}", err),
            Error::Query(msg) => write!(f, "Query error: {}", msg),
            Error::NotFound(what) => write!(f, "Not found: {}", what),
            Error::Validation(msg) => write!(f, "Validation error: {}", msg),
            Error::InvalidTransition { from, to } => {
                write!(f, "Invalid status transition: {} -> {}", from, to)
            }
            Error::DependenciesNotDone { task_id, pending } => write!(
                f,
                "Task {} cannot start: {} dependencies not done ({})",
                task_id,
                pending.len(),
                pending.join(", ")
            ),
            Error::Cycle(msg) => write!(f, "Dependency cycle: {}", msg),
            Error::MissingDependency(id) => {
                write!(f, "Dependency task does not exist: {}", id)
            }
            Error::HasDependents { task_id, dependents } => write!(
                f,
                "Task {} has {} dependent task(s): {}",
                task_id,
                dependents.len(),
                dependents.join(", ")
            ),
            Error::HasCompletedWork { story_id, done_count } => write!(
                f,
                "User story {} has {} completed sub-task(s); pass force to delete",
                story_id, done_count
            ),
            Error::ExternalDependents { story_id, dependents } => write!(
                f,
                "User story {} has external dependents: {}",
                story_id,
                dependents.join(", ")
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Database(err) => Some(err),
            Error::Serde(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err)
    }
}
