//! Tool handlers, grouped by the component they dispatch to.

pub mod agents;
pub mod config;
pub mod graph;
pub mod knowledge;
pub mod stories;
pub mod tasks;
pub mod workflow;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use taskforge_runtime::Taskforge;
use taskforge_types::{
    AgentType, LearningType, Priority, TaskCategory, TaskStatus, ToolType,
};

/// Error leaving a tool handler. Domain kinds become structured
/// `{success: false, error, details}` results; the two protocol kinds map
/// to JSON-RPC errors in the server.
#[derive(Debug)]
pub struct ToolError {
    pub kind: &'static str,
    pub message: String,
}

impl ToolError {
    pub fn unknown_tool(name: &str) -> Self {
        Self {
            kind: "UnknownTool",
            message: format!("Unknown tool: {}", name),
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            kind: "InvalidParams",
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: "ValidationError",
            message: message.into(),
        }
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self.kind, "UnknownTool" | "InvalidParams")
    }

    /// Structured error record crossing the tool boundary.
    pub fn to_result_value(&self) -> Value {
        json!({
            "success": false,
            "error": self.kind,
            "details": { "message": self.message },
        })
    }
}

impl From<taskforge_runtime::Error> for ToolError {
    fn from(err: taskforge_runtime::Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

pub(crate) fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|e| {
        let message = e.to_string();
        // Surface the missing field by name when serde tells us.
        if let Some(field) = message
            .strip_prefix("missing field `")
            .and_then(|rest| rest.split('`').next())
        {
            ToolError::invalid_params(format!(
                "Invalid params for {}: missing required field \"{}\"",
                tool, field
            ))
        } else {
            ToolError::invalid_params(format!("Invalid params for {}: {}", tool, message))
        }
    })
}

pub(crate) fn parse_status(raw: &str) -> Result<TaskStatus, ToolError> {
    TaskStatus::parse(raw).ok_or_else(|| {
        ToolError::validation(format!(
            "Unknown status '{}' (expected backlog|todo|in_progress|done)",
            raw
        ))
    })
}

pub(crate) fn parse_category(raw: &str) -> Result<TaskCategory, ToolError> {
    TaskCategory::parse(raw).ok_or_else(|| {
        ToolError::validation(format!(
            "Unknown category '{}' (expected design_frontend|backend_database|test_fix)",
            raw
        ))
    })
}

pub(crate) fn parse_priority(raw: &str) -> Result<Priority, ToolError> {
    Priority::parse(raw).ok_or_else(|| {
        ToolError::validation(format!(
            "Unknown priority '{}' (expected low|medium|high|urgent)",
            raw
        ))
    })
}

pub(crate) fn parse_learning_type(raw: &str) -> Result<LearningType, ToolError> {
    LearningType::parse(raw).ok_or_else(|| {
        ToolError::validation(format!(
            "Unknown feedback type '{}' (expected success|failure|improvement)",
            raw
        ))
    })
}

pub(crate) fn parse_agent_type(raw: &str) -> Result<AgentType, ToolError> {
    AgentType::parse(raw)
        .ok_or_else(|| ToolError::validation(format!("Unknown agent type '{}'", raw)))
}

pub(crate) fn parse_tool_type(raw: &str) -> Result<ToolType, ToolError> {
    ToolType::parse(raw)
        .ok_or_else(|| ToolError::validation(format!("Unknown tool type '{}'", raw)))
}

pub(crate) fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value).map_err(|e| ToolError {
        kind: "InternalError",
        message: format!("Serialization error: {}", e),
    })
}

/// Route one tool call to its handler.
pub async fn dispatch(rt: &Taskforge, tool: &str, args: Value) -> Result<Value, ToolError> {
    match tool {
        // Task CRUD
        "create_task" => tasks::create_task(rt, args),
        "update_task" => tasks::update_task(rt, args),
        "list_tasks" => tasks::list_tasks(rt, args),
        "get_task" => tasks::get_task(rt, args),
        "delete_task" => tasks::delete_task(rt, args),
        "get_task_context" => tasks::get_task_context(rt, args),

        // User stories
        "get_user_stories" => stories::get_user_stories(rt),
        "get_tasks_by_user_story" => stories::get_tasks_by_user_story(rt, args),
        "delete_user_story" => stories::delete_user_story(rt, args),
        "safe_delete_tasks_by_status" => stories::safe_delete_tasks_by_status(rt, args),
        "get_user_story_health" => stories::get_user_story_health(rt),

        // Workflow
        "decompose_story" => workflow::decompose_story(rt, args).await,
        "intelligent_decompose_story" => workflow::intelligent_decompose_story(rt, args),
        "save_story_decomposition" => workflow::save_story_decomposition(rt, args),
        "prepare_task_for_execution" => workflow::prepare_task_for_execution(rt, args),
        "save_task_analysis" => graph::save_task_analysis(rt, args),
        "get_execution_prompt" => workflow::get_execution_prompt(rt, args),

        // Dependency graph
        "save_dependencies" => graph::save_dependencies(rt, args),
        "get_task_dependency_graph" => graph::get_task_dependency_graph(rt, args),
        "get_resource_usage" => graph::get_resource_usage(rt, args),
        "get_task_conflicts" => graph::get_task_conflicts(rt, args),

        // Knowledge
        "list_templates" => knowledge::list_templates(rt),
        "list_patterns" => knowledge::list_patterns(rt),
        "list_learnings" => knowledge::list_learnings(rt, args),
        "render_template" => knowledge::render_template(rt, args),
        "get_relevant_knowledge" => knowledge::get_relevant_knowledge(rt, args),
        "add_feedback" => knowledge::add_feedback(rt, args),
        "get_similar_learnings" => knowledge::get_similar_learnings(rt, args),
        "get_top_patterns" => knowledge::get_top_patterns(rt, args),
        "get_trending_patterns" => knowledge::get_trending_patterns(rt, args),
        "get_pattern_stats" => knowledge::get_pattern_stats(rt, args),
        "detect_failure_patterns" => knowledge::detect_failure_patterns(rt, args),
        "check_pattern_risk" => knowledge::check_pattern_risk(rt, args),

        // Suggestions and agents
        "suggest_agents_for_task" => agents::suggest_agents_for_task(rt, args),
        "suggest_tools_for_task" => agents::suggest_tools_for_task(rt, args),
        "sync_claude_code_agents" => agents::sync_claude_code_agents(rt, args),
        "read_claude_code_agents" => agents::read_claude_code_agents(rt, args),
        "update_agent_prompt_templates" => agents::update_agent_prompt_templates(rt),

        // Configuration
        "get_project_info" => config::get_project_info(rt),
        "get_project_configuration" => config::get_project_configuration(rt),
        "initialize_project_configuration" => config::initialize_project_configuration(rt, args),
        "add_tech_stack" => config::add_tech_stack(rt, args),
        "update_tech_stack" => config::update_tech_stack(rt, args),
        "remove_tech_stack" => config::remove_tech_stack(rt, args),
        "add_sub_agent" => agents::add_sub_agent(rt, args),
        "update_sub_agent" => agents::update_sub_agent(rt, args),
        "add_mcp_tool" => agents::add_mcp_tool(rt, args),
        "update_mcp_tool" => agents::update_mcp_tool(rt, args),
        "add_guideline" => config::add_guideline(rt, args),
        "add_code_pattern" => config::add_code_pattern(rt, args),

        _ => Err(ToolError::unknown_tool(tool)),
    }
}
