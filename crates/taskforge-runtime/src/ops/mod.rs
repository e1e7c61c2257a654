mod agents;
mod decompose;
mod events;
mod graph;
mod learnings;
mod project;
mod stories;
mod suggestions;
mod tasks;
mod workflow;

pub use agents::{AgentFile, AgentOps, NewMcpToolInput, NewSubAgentInput, SyncedAgents};
pub use decompose::{DecomposeOps, DecompositionResult, IntelligentDecomposition};
pub use events::EventOps;
pub use graph::{DependencyGraph, GraphEdge, GraphOps, ResourceUsage, ResourceUse, SavedAnalysis};
pub use learnings::{FeedbackInput, LearningOps, RecordedFeedback, RelevantKnowledge, SimilarQuery};
pub use project::{InitializedConfiguration, ProjectConfiguration, ProjectInfo, ProjectOps, RenderedTemplate};
pub use stories::StoryOps;
pub use suggestions::SuggestionOps;
pub use tasks::{CreateTaskInput, CreatedTask, TaskContext, TaskOps, UpdatedTask};
pub use workflow::{ExecutionPrompt, PreparedTask, WorkflowOps};
