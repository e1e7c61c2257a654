//! Argument structs for every tool, one source of truth for the JSON
//! Schemas served by `tools/list`. Closed-set fields arrive as strings and
//! are parsed at the handler boundary so a bad value reports cleanly.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

// --- Task CRUD ---

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateTaskArgs {
    /// Task title (required, non-empty)
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// One of: backlog, todo, in_progress, done (default backlog)
    pub status: Option<String>,
    /// Ids of tasks this task depends on
    #[serde(default)]
    pub dependencies: Vec<String>,
    pub assignee: Option<String>,
    /// One of: low, medium, high, urgent
    pub priority: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// One of: design_frontend, backend_database, test_fix
    pub category: Option<String>,
    #[serde(default)]
    pub is_user_story: bool,
    /// Parent user-story task id
    pub user_story_id: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateTaskArgs {
    pub task_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// One of: backlog, todo, in_progress, done
    pub status: Option<String>,
    /// Replaces the full dependency set
    pub dependencies: Option<Vec<String>>,
    pub assignee: Option<String>,
    pub priority: Option<String>,
    pub tags: Option<Vec<String>>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListTasksArgs {
    /// Filter by status
    pub status: Option<String>,
    /// Filter by category
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TaskIdArgs {
    pub task_id: String,
}

// --- User stories ---

#[derive(Debug, Deserialize, JsonSchema)]
pub struct StoryIdArgs {
    pub story_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteUserStoryArgs {
    pub story_id: String,
    /// Delete even when sub-tasks are done (external dependents still block)
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SafeDeleteArgs {
    /// Status whose tasks should be deleted where safe
    pub status: String,
}

// --- Workflow ---

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DecomposeStoryArgs {
    /// Free-text user story
    pub user_story: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SaveStoryDecompositionArgs {
    /// The original user story text
    pub user_story: String,
    /// Sub-task specs: title, description, complexity?, estimated_hours?,
    /// dependencies (titles), tags
    pub tasks: Value,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SaveTaskAnalysisArgs {
    pub task_id: String,
    /// Analysis record: files_to_modify, files_to_create, dependencies,
    /// risks, related_code, recommendations
    pub analysis: Value,
}

// --- Dependency graph ---

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SaveDependenciesArgs {
    pub task_id: String,
    /// Resource dependencies: {type, name, path?, action}
    pub dependencies: Value,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ResourceIdArgs {
    pub resource_id: String,
}

// --- Knowledge ---

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddFeedbackArgs {
    pub task_id: String,
    /// What happened when the pattern was applied
    pub feedback: String,
    /// One of: success, failure, improvement
    #[serde(rename = "type")]
    pub feedback_type: String,
    /// Pattern tag the feedback is about
    pub pattern: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SimilarLearningsArgs {
    /// Free-text context to match against past learnings
    pub context: String,
    pub task_id: Option<String>,
    /// One of: success, failure, improvement
    #[serde(rename = "type")]
    pub learning_type: Option<String>,
    pub pattern: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LimitArgs {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TrendingPatternsArgs {
    /// Window in days (default 7)
    pub days: Option<i64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PatternArgs {
    pub pattern: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DetectFailurePatternsArgs {
    /// Minimum pattern frequency to consider (default 3)
    pub min_occurrences: Option<u64>,
    /// Failure-rate floor for inclusion (default 0.5)
    pub failure_threshold: Option<f64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RenderTemplateArgs {
    /// Template name
    pub name: String,
    /// Values for {{variable}} placeholders
    #[serde(default)]
    pub variables: Value,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RelevantKnowledgeArgs {
    /// Free-text query
    pub query: String,
}

// --- Suggestions / agents ---

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SyncAgentsArgs {
    /// Directory containing one markdown file per agent (defaults to
    /// .claude/agents under the current directory)
    pub directory: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddSubAgentArgs {
    pub name: String,
    /// One of: architecture-guardian, database-guardian, test-maintainer,
    /// api-guardian, production-ready-code-reviewer, general-purpose, custom
    pub agent_type: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub triggers: Vec<String>,
    pub custom_prompt: Option<String>,
    #[serde(default)]
    pub priority: i64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateSubAgentArgs {
    pub name: String,
    pub enabled: Option<bool>,
    pub triggers: Option<Vec<String>>,
    pub custom_prompt: Option<String>,
    pub priority: Option<i64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddMcpToolArgs {
    pub name: String,
    /// One of: mcp, cli, api, library, custom
    pub tool_type: String,
    #[serde(default)]
    pub command: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub when_to_use: Vec<String>,
    #[serde(default)]
    pub priority: i64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateMcpToolArgs {
    pub name: String,
    pub enabled: Option<bool>,
    pub command: Option<String>,
    pub when_to_use: Option<Vec<String>>,
    pub priority: Option<i64>,
}

// --- Configuration ---

#[derive(Debug, Deserialize, JsonSchema)]
pub struct InitializeProjectArgs {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddTechStackArgs {
    /// e.g. frontend, backend, database, testing
    pub category: String,
    pub name: String,
    pub version: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateTechStackArgs {
    pub id: String,
    pub category: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RemoveTechStackArgs {
    pub id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddGuidelineArgs {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub guideline_type: Option<String>,
    #[serde(default)]
    pub priority: i64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddCodePatternArgs {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub example_code: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_true() -> bool {
    true
}
