// Internal modules (not exposed to external crates)
pub(crate) mod cache;

// Public orchestration surface
pub mod config;
pub mod error;
pub mod ops;
pub mod runtime;

pub use config::{CompleterConfig, Config, resolve_workspace_path};
pub use error::{Error, Result};
pub use ops::{
    AgentFile, AgentOps, CreateTaskInput, CreatedTask, DecomposeOps, DecompositionResult,
    DependencyGraph, EventOps, ExecutionPrompt, FeedbackInput, GraphEdge, GraphOps,
    InitializedConfiguration, IntelligentDecomposition, LearningOps, NewMcpToolInput,
    NewSubAgentInput, PreparedTask, ProjectConfiguration, ProjectInfo, ProjectOps,
    RecordedFeedback, RelevantKnowledge, RenderedTemplate, ResourceUsage, ResourceUse,
    SavedAnalysis, SimilarQuery, StoryOps, SuggestionOps, SyncedAgents, TaskContext, TaskOps,
    UpdatedTask, WorkflowOps,
};
pub use runtime::{Taskforge, DB_FILE_NAME};

// Re-exported store input/filter types used in public APIs
pub use taskforge_store::{
    ChangeSet, DeletedStory, EventStats, LearningFilter, NewTask, PreservedTask,
    SafeDeleteOutcome, StoryHealth, TaskFilter, TaskPatch, TrendingPattern,
};
