use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::{AgentSuggestion, ToolSuggestion};
use crate::learning::RiskLevel;
use crate::resource::{ResourceAction, ResourceType};

/// Task lifecycle status.
///
/// Transitions are validated against a fixed edge table; the user-story
/// derived status bypasses it (see `derive_story_status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Backlog,
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Backlog => "backlog",
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "backlog" => Some(TaskStatus::Backlog),
            "todo" => Some(TaskStatus::Todo),
            "in_progress" => Some(TaskStatus::InProgress),
            "done" => Some(TaskStatus::Done),
            _ => None,
        }
    }

    /// Whether a user-driven update may move a task from `self` to `next`.
    ///
    /// Same-status updates are treated as no-ops, not transitions.
    /// Moving into `in_progress` is additionally gated on dependency
    /// completion, which is checked where the dependency edges are visible.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        if self == next {
            return true;
        }
        matches!(
            (self, next),
            (Backlog, Todo)
                | (Todo, Backlog)
                | (Todo, InProgress)
                | (InProgress, Done)
                | (InProgress, Todo)
                | (Done, InProgress)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            "urgent" => Some(Priority::Urgent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    DesignFrontend,
    BackendDatabase,
    TestFix,
}

impl TaskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::DesignFrontend => "design_frontend",
            TaskCategory::BackendDatabase => "backend_database",
            TaskCategory::TestFix => "test_fix",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "design_frontend" => Some(TaskCategory::DesignFrontend),
            "backend_database" => Some(TaskCategory::BackendDatabase),
            "test_fix" => Some(TaskCategory::TestFix),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    Medium,
    Complex,
}

/// Free-form record attached to tasks produced by story decomposition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoryMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<Complexity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_story: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_agent: Option<AgentSuggestion>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggested_tools: Vec<ToolSuggestion>,
}

impl StoryMetadata {
    pub fn is_empty(&self) -> bool {
        self.complexity.is_none()
            && self.estimated_hours.is_none()
            && self.original_story.is_none()
            && self.suggested_agent.is_none()
            && self.suggested_tools.is_empty()
    }
}

/// Unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub project_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<TaskCategory>,
    #[serde(default)]
    pub is_user_story: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_story_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_metadata: Option<StoryMetadata>,
    /// Populated by `save_task_analysis`; gates the execution prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<TaskAnalysis>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What the external assistant found while inspecting source for a task.
/// Stored verbatim; the engine never reads source files itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskAnalysis {
    #[serde(default)]
    pub files_to_modify: Vec<FileToModify>,
    #[serde(default)]
    pub files_to_create: Vec<FileToCreate>,
    #[serde(default)]
    pub dependencies: Vec<AnalysisDependency>,
    #[serde(default)]
    pub risks: Vec<AnalysisRisk>,
    #[serde(default)]
    pub related_code: Vec<RelatedCode>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileToModify {
    pub path: String,
    pub reason: String,
    pub risk: RiskLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileToCreate {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisDependency {
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub action: ResourceAction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRisk {
    pub level: RiskLevel,
    pub description: String,
    #[serde(default)]
    pub mitigation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedCode {
    pub file: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_machine_allowed_edges() {
        use TaskStatus::*;
        assert!(Backlog.can_transition_to(Todo));
        assert!(Todo.can_transition_to(Backlog));
        assert!(Todo.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Done));
        assert!(InProgress.can_transition_to(Todo));
        assert!(Done.can_transition_to(InProgress));
    }

    #[test]
    fn test_status_machine_rejected_edges() {
        use TaskStatus::*;
        assert!(!Backlog.can_transition_to(InProgress));
        assert!(!Backlog.can_transition_to(Done));
        assert!(!Todo.can_transition_to(Done));
        assert!(!Done.can_transition_to(Todo));
        assert!(!Done.can_transition_to(Backlog));
        assert!(!InProgress.can_transition_to(Backlog));
    }

    #[test]
    fn test_same_status_is_noop() {
        for status in [
            TaskStatus::Backlog,
            TaskStatus::Todo,
            TaskStatus::InProgress,
            TaskStatus::Done,
        ] {
            assert!(status.can_transition_to(status));
        }
    }

    #[test]
    fn test_status_serde_names() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        assert_eq!(TaskStatus::parse("in_progress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("bogus"), None);
    }

    #[test]
    fn test_analysis_dependency_uses_type_key() {
        let dep: AnalysisDependency = serde_json::from_str(
            r#"{"type": "file", "name": "auth.ts", "action": "modifies"}"#,
        )
        .unwrap();
        assert_eq!(dep.resource_type, ResourceType::File);
        assert_eq!(dep.action, ResourceAction::Modifies);
        assert!(dep.path.is_none());
    }
}
