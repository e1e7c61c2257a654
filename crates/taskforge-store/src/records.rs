use serde_json::Value;
use taskforge_types::{
    LearningType, Priority, ResourceAction, ResourceType, StoryMetadata, TaskCategory, TaskStatus,
};

/// Input for task creation. The store assigns id and timestamps.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: Option<TaskStatus>,
    pub assignee: Option<String>,
    pub priority: Option<Priority>,
    pub tags: Vec<String>,
    pub category: Option<TaskCategory>,
    pub is_user_story: bool,
    pub user_story_id: Option<String>,
    pub story_metadata: Option<StoryMetadata>,
}

/// Partial update; only provided fields change.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub dependencies: Option<Vec<String>>,
    pub assignee: Option<String>,
    pub priority: Option<Priority>,
    pub tags: Option<Vec<String>>,
    pub category: Option<TaskCategory>,
    pub story_metadata: Option<StoryMetadata>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.dependencies.is_none()
            && self.assignee.is_none()
            && self.priority.is_none()
            && self.tags.is_none()
            && self.category.is_none()
            && self.story_metadata.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub category: Option<TaskCategory>,
    pub is_user_story: Option<bool>,
    pub user_story_id: Option<String>,
}

impl TaskFilter {
    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn category(mut self, category: TaskCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn user_stories(mut self) -> Self {
        self.is_user_story = Some(true);
        self
    }

    pub fn sub_tasks_of(mut self, story_id: impl Into<String>) -> Self {
        self.user_story_id = Some(story_id.into());
        self
    }
}

/// Raw material for conflict classification: another unfinished task holding
/// an edge to a resource this task also touches.
#[derive(Debug, Clone)]
pub struct ConflictCandidate {
    pub other_task_id: String,
    pub other_task_title: String,
    pub resource_id: String,
    pub resource_name: String,
    pub my_action: ResourceAction,
    pub other_action: ResourceAction,
}

/// Per-story row of the health view.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoryHealth {
    pub id: String,
    pub title: String,
    pub current_status: TaskStatus,
    pub suggested_status: TaskStatus,
    pub total_subtasks: usize,
    pub done_count: usize,
    pub in_progress_count: usize,
    pub todo_count: usize,
    pub backlog_count: usize,
    pub completion_percentage: f64,
    pub status_mismatch: bool,
    pub safe_to_delete: bool,
}

/// Result of deleting a user story with its sub-tasks.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DeletedStory {
    pub deleted_story: String,
    pub deleted_subtasks: Vec<String>,
}

/// Outcome of `safe_delete_tasks_by_status`.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct SafeDeleteOutcome {
    pub deleted_ids: Vec<String>,
    pub preserved: Vec<PreservedTask>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PreservedTask {
    pub id: String,
    pub title: String,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done_tasks: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tasks: Option<usize>,
}

/// Input for feedback recording (spec'd shape of `add_feedback`).
#[derive(Debug, Clone)]
pub struct NewLearning {
    pub task_id: Option<String>,
    pub context: String,
    pub action: String,
    pub result: String,
    pub lesson: String,
    pub learning_type: Option<LearningType>,
    pub pattern: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LearningFilter {
    pub contains: Option<String>,
    pub task_id: Option<String>,
    pub learning_type: Option<LearningType>,
    pub pattern: Option<String>,
    pub limit: Option<usize>,
}

/// A pattern's recent activity merged with its lifetime aggregate.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TrendingPattern {
    pub pattern: String,
    pub recent_count: u64,
    pub frequency: u64,
    pub success_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<chrono::DateTime<chrono::Utc>>,
}

/// Upsert input for resource nodes; identity is `(type, name)`.
#[derive(Debug, Clone)]
pub struct NewResourceNode {
    pub resource_type: ResourceType,
    pub name: String,
    pub path: Option<String>,
}

/// Edge to attach during `replace_task_resource_edges`.
#[derive(Debug, Clone)]
pub struct NewResourceEdge {
    pub resource_id: String,
    pub action: ResourceAction,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct EventStats {
    pub total: u64,
    pub unprocessed: u64,
    pub processed: u64,
}

/// Field-level change set recorded on `task_updated` events.
pub type ChangeSet = serde_json::Map<String, Value>;
