use serde_json::{json, Value};
use taskforge_runtime::Taskforge;
use taskforge_types::{AnalysisDependency, TaskAnalysis};

use super::{parse_args, to_value, ToolError};
use crate::mcp::requests::{ResourceIdArgs, SaveDependenciesArgs, SaveTaskAnalysisArgs, TaskIdArgs};

pub fn save_task_analysis(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: SaveTaskAnalysisArgs = parse_args("save_task_analysis", args)?;
    let analysis: TaskAnalysis = serde_json::from_value(args.analysis)
        .map_err(|e| ToolError::validation(format!("analysis record did not parse: {}", e)))?;

    let saved = rt.graph().save_analysis(&args.task_id, analysis)?;
    let mut result = to_value(&saved)?;
    result["success"] = json!(true);
    Ok(result)
}

/// Replace a task's resource edges without touching the stored analysis
/// record.
pub fn save_dependencies(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: SaveDependenciesArgs = parse_args("save_dependencies", args)?;
    let dependencies: Vec<AnalysisDependency> = serde_json::from_value(args.dependencies)
        .map_err(|e| ToolError::validation(format!("dependencies did not parse: {}", e)))?;

    // Reuse the analysis path with only the dependency section filled in,
    // preserving whatever analysis the task already carries.
    let existing = rt.tasks().get(&args.task_id)?.analysis.unwrap_or_default();
    let analysis = TaskAnalysis {
        dependencies,
        ..existing
    };
    let saved = rt.graph().save_analysis(&args.task_id, analysis)?;
    Ok(json!({
        "success": true,
        "task_id": args.task_id,
        "message": saved.message,
        "conflicts": saved.conflicts,
    }))
}

pub fn get_task_dependency_graph(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: TaskIdArgs = parse_args("get_task_dependency_graph", args)?;
    let graph = rt.graph().dependency_graph(&args.task_id)?;
    let mut result = to_value(&graph)?;
    result["success"] = json!(true);
    Ok(result)
}

pub fn get_resource_usage(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: ResourceIdArgs = parse_args("get_resource_usage", args)?;
    let usage = rt.graph().resource_usage(&args.resource_id)?;
    let mut result = to_value(&usage)?;
    result["success"] = json!(true);
    Ok(result)
}

pub fn get_task_conflicts(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: TaskIdArgs = parse_args("get_task_conflicts", args)?;
    let conflicts = rt.graph().conflicts(&args.task_id)?;
    Ok(json!({
        "success": true,
        "task_id": args.task_id,
        "count": conflicts.len(),
        "conflicts": conflicts,
    }))
}
