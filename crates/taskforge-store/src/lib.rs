// Transactional SQLite store.
// Invariant checks run inside the writing transaction; events ride it.

mod db;
mod error;
mod records;
mod schema;

pub(crate) mod queries;

pub use db::Database;
pub use error::{Error, Result};
pub use records::{
    ChangeSet, ConflictCandidate, DeletedStory, EventStats, LearningFilter, NewLearning,
    NewResourceEdge, NewResourceNode, NewTask, PreservedTask, SafeDeleteOutcome, StoryHealth,
    TaskFilter, TaskPatch, TrendingPattern,
};
pub use schema::SCHEMA_VERSION;
