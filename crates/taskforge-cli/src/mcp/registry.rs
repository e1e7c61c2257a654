//! Tool registry served by `tools/list`. JSON Schemas are generated from
//! the argument structs - single source of truth.

use schemars::{schema_for, JsonSchema};
use serde_json::{json, Value};

use super::requests::*;

fn schema<T: JsonSchema>() -> Value {
    serde_json::to_value(schema_for!(T)).unwrap_or_else(|_| json!({ "type": "object" }))
}

fn no_args() -> Value {
    json!({ "type": "object", "properties": {} })
}

fn tool(name: &str, description: &str, input_schema: Value) -> Value {
    json!({ "name": name, "description": description, "inputSchema": input_schema })
}

pub fn tool_list() -> Value {
    json!({ "tools": [
        // Task CRUD
        tool(
            "create_task",
            "Create a task, optionally with dependency edges (atomic: a cycle or missing dependency leaves nothing behind). Returns the task plus next_steps.",
            schema::<CreateTaskArgs>(),
        ),
        tool(
            "update_task",
            "Update any subset of a task's fields. Status changes are validated against the workflow state machine; moving to in_progress requires all dependencies done.",
            schema::<UpdateTaskArgs>(),
        ),
        tool(
            "list_tasks",
            "List tasks, optionally filtered by status and/or category.",
            schema::<ListTasksArgs>(),
        ),
        tool("get_task", "Fetch one task by id.", schema::<TaskIdArgs>()),
        tool(
            "delete_task",
            "Delete a task. Fails with HasDependents while other tasks depend on it.",
            schema::<TaskIdArgs>(),
        ),
        tool(
            "get_task_context",
            "Task plus its dependencies, dependents, resource edges and learnings.",
            schema::<TaskIdArgs>(),
        ),

        // User stories
        tool("get_user_stories", "List all user-story tasks.", no_args()),
        tool(
            "get_tasks_by_user_story",
            "List the sub-tasks of one user story.",
            schema::<StoryIdArgs>(),
        ),
        tool(
            "delete_user_story",
            "Delete a user story with its sub-tasks. Completed work requires force; external dependents always block.",
            schema::<DeleteUserStoryArgs>(),
        ),
        tool(
            "safe_delete_tasks_by_status",
            "Bulk-delete tasks in a status, preserving stories with completed work and tasks with dependents. Returns deleted ids and preserved entries with reasons.",
            schema::<SafeDeleteArgs>(),
        ),
        tool(
            "get_user_story_health",
            "Per-story status/completion report with suggested status and safe-to-delete flag.",
            no_args(),
        ),

        // Workflow
        tool(
            "decompose_story",
            "Decompose a free-text user story into dependency-linked sub-tasks using the configured completer (30s bound). WORKFLOW: then analyze each task with prepare_task_for_execution.",
            schema::<DecomposeStoryArgs>(),
        ),
        tool(
            "intelligent_decompose_story",
            "Variant of decompose_story that returns a prompt for YOU to perform the decomposition; submit the result via save_story_decomposition.",
            schema::<DecomposeStoryArgs>(),
        ),
        tool(
            "save_story_decomposition",
            "Materialize a decomposition you produced: creates the user story and its sub-tasks, resolves title dependencies, attaches agent/tool suggestions.",
            schema::<SaveStoryDecompositionArgs>(),
        ),
        tool(
            "prepare_task_for_execution",
            "Produce the structured codebase-analysis prompt for a task. WORKFLOW: run the analysis with your own Read/Grep/Glob, then call save_task_analysis.",
            schema::<TaskIdArgs>(),
        ),
        tool(
            "save_task_analysis",
            "Store your analysis on the task and rebuild its resource edges; detects conflicts with other unfinished tasks. WORKFLOW: then call get_execution_prompt.",
            schema::<SaveTaskAnalysisArgs>(),
        ),
        tool(
            "get_execution_prompt",
            "Assemble the enriched implementation prompt from the stored analysis, resource graph, learnings and guidelines. Fails with NotAnalyzed before save_task_analysis.",
            schema::<TaskIdArgs>(),
        ),

        // Dependency graph
        tool(
            "save_dependencies",
            "Replace a task's resource dependency edges ({type, name, path?, action} entries).",
            schema::<SaveDependenciesArgs>(),
        ),
        tool(
            "get_task_dependency_graph",
            "Resource nodes and edges for one task.",
            schema::<TaskIdArgs>(),
        ),
        tool(
            "get_resource_usage",
            "Tasks touching one resource, with their actions.",
            schema::<ResourceIdArgs>(),
        ),
        tool(
            "get_task_conflicts",
            "Conflicts between this task and other unfinished tasks sharing resources, classified by severity.",
            schema::<TaskIdArgs>(),
        ),

        // Knowledge
        tool("list_templates", "List prompt templates.", no_args()),
        tool("list_patterns", "List the code pattern library.", no_args()),
        tool("list_learnings", "List recent learnings.", schema::<LimitArgs>()),
        tool(
            "render_template",
            "Render a template, substituting {{variable}} placeholders; reports unresolved variables.",
            schema::<RenderTemplateArgs>(),
        ),
        tool(
            "get_relevant_knowledge",
            "Templates, code patterns and learnings keyword-matched to a query.",
            schema::<RelevantKnowledgeArgs>(),
        ),
        tool(
            "add_feedback",
            "Record success/failure/improvement feedback for a task's pattern; updates the pattern frequency aggregate in the same transaction.",
            schema::<AddFeedbackArgs>(),
        ),
        tool(
            "get_similar_learnings",
            "Learnings whose context/action/lesson matches a free-text query, newest first.",
            schema::<SimilarLearningsArgs>(),
        ),
        tool(
            "get_top_patterns",
            "Patterns by lifetime frequency.",
            schema::<LimitArgs>(),
        ),
        tool(
            "get_trending_patterns",
            "Patterns by recent-window activity, merged with lifetime success rate.",
            schema::<TrendingPatternsArgs>(),
        ),
        tool(
            "get_pattern_stats",
            "Lifetime counters for one pattern.",
            schema::<PatternArgs>(),
        ),
        tool(
            "detect_failure_patterns",
            "Patterns whose failure rate crossed the threshold (default 0.5) with at least min_occurrences (default 3) uses, worst first.",
            schema::<DetectFailurePatternsArgs>(),
        ),
        tool(
            "check_pattern_risk",
            "Failure-risk classification for one pattern with a recommendation.",
            schema::<PatternArgs>(),
        ),

        // Suggestions
        tool(
            "suggest_agents_for_task",
            "Top 3 agents for a task by keyword/category match; confidence in [0.2, 0.95].",
            schema::<TaskIdArgs>(),
        ),
        tool(
            "suggest_tools_for_task",
            "Top 3 tools for a task by keyword match.",
            schema::<TaskIdArgs>(),
        ),
        tool(
            "sync_claude_code_agents",
            "Import agent markdown files (YAML front-matter + prompt body) as sub-agents.",
            schema::<SyncAgentsArgs>(),
        ),
        tool(
            "read_claude_code_agents",
            "Parse agent markdown files without persisting them.",
            schema::<SyncAgentsArgs>(),
        ),
        tool(
            "update_agent_prompt_templates",
            "Refresh non-custom sub-agent prompts from the built-in template set.",
            no_args(),
        ),

        // Configuration
        tool("get_project_info", "Project record with entity counts.", no_args()),
        tool(
            "get_project_configuration",
            "Full configuration: tech stack, guidelines, agents, tools, patterns, templates.",
            no_args(),
        ),
        tool(
            "initialize_project_configuration",
            "Seed default guidelines, agents, tools and templates for a fresh project. Idempotent.",
            schema::<InitializeProjectArgs>(),
        ),
        tool("add_tech_stack", "Add a tech stack entry.", schema::<AddTechStackArgs>()),
        tool(
            "update_tech_stack",
            "Update a tech stack entry by id.",
            schema::<UpdateTechStackArgs>(),
        ),
        tool(
            "remove_tech_stack",
            "Remove a tech stack entry by id.",
            schema::<RemoveTechStackArgs>(),
        ),
        tool("add_sub_agent", "Register a sub-agent.", schema::<AddSubAgentArgs>()),
        tool(
            "update_sub_agent",
            "Update a sub-agent by name.",
            schema::<UpdateSubAgentArgs>(),
        ),
        tool("add_mcp_tool", "Register an MCP tool.", schema::<AddMcpToolArgs>()),
        tool(
            "update_mcp_tool",
            "Update an MCP tool by name.",
            schema::<UpdateMcpToolArgs>(),
        ),
        tool("add_guideline", "Add a project guideline.", schema::<AddGuidelineArgs>()),
        tool(
            "add_code_pattern",
            "Add a code pattern to the library.",
            schema::<AddCodePatternArgs>(),
        ),
    ]})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_tool_has_name_and_schema() {
        let list = tool_list();
        let tools = list["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 50);
        for t in tools {
            assert!(t["name"].is_string());
            assert!(!t["description"].as_str().unwrap().is_empty());
            assert!(t["inputSchema"].is_object());
        }
    }

    #[test]
    fn test_tool_names_are_unique() {
        let list = tool_list();
        let tools = list["tools"].as_array().unwrap();
        let mut names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        let before = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), before);
    }
}
