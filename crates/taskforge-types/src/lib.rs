// Domain schema only - no persistence, no orchestration.
// Closed-set discriminators live here so every layer shares one definition.

mod agent;
mod event;
mod learning;
mod project;
mod resource;
mod story;
mod task;
mod workflow;

pub use agent::{
    AgentSuggestion, AgentType, McpTool, SubAgent, ToolSuggestion, ToolType, MAX_SUGGESTIONS,
};
pub use event::{EventType, NewEvent, QueuedEvent};
pub use learning::{Learning, LearningType, PatternFrequency, RiskLevel};
pub use project::{CodePattern, Guideline, Project, TechStackEntry, Template};
pub use resource::{
    Conflict, ConflictType, ResourceAction, ResourceEdge, ResourceNode, ResourceType,
};
pub use story::{derive_story_status, StoryStatusCounts, DEFAULT_STORY_DONE_THRESHOLD};
pub use task::{
    AnalysisDependency, AnalysisRisk, Complexity, FileToCreate, FileToModify, Priority,
    RelatedCode, StoryMetadata, Task, TaskAnalysis, TaskCategory, TaskStatus,
};
pub use workflow::{NextSteps, ToolCallHint, WorkflowStage};

/// Round a ratio to a percentage with two decimal places (33.33 for 1/3).
pub fn round_percent(ratio: f64) -> f64 {
    (ratio * 10_000.0).round() / 100.0
}

/// Round a rate to two decimal places (0.75 for 3/4).
pub fn round_rate(rate: f64) -> f64 {
    (rate * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_percent() {
        assert_eq!(round_percent(1.0 / 3.0), 33.33);
        assert_eq!(round_percent(2.0 / 3.0), 66.67);
        assert_eq!(round_percent(1.0), 100.0);
    }

    #[test]
    fn test_round_rate() {
        assert_eq!(round_rate(3.0 / 4.0), 0.75);
        assert_eq!(round_rate(1.0 / 3.0), 0.33);
    }
}
