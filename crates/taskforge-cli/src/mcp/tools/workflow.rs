use serde_json::{json, Value};
use taskforge_engine::SubTaskSpec;
use taskforge_runtime::Taskforge;

use super::{parse_args, to_value, ToolError};
use crate::mcp::requests::{
    DecomposeStoryArgs, SaveStoryDecompositionArgs, TaskIdArgs,
};

/// Decompose via the configured completer. Installs without one are told
/// to use the intelligent variant instead of getting a cryptic failure.
pub async fn decompose_story(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: DecomposeStoryArgs = parse_args("decompose_story", args)?;
    let Some(completer) = rt.completer_from_config() else {
        return Err(ToolError {
            kind: "UpstreamError",
            message: "No completer configured in config.toml; use \
                      intelligent_decompose_story and save_story_decomposition instead"
                .to_string(),
        });
    };

    let result = rt.decomposer().decompose(&args.user_story, &completer).await?;
    to_value(&result)
}

pub fn intelligent_decompose_story(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: DecomposeStoryArgs = parse_args("intelligent_decompose_story", args)?;
    let result = rt.decomposer().intelligent_prompt(&args.user_story)?;
    let mut value = to_value(&result)?;
    value["success"] = json!(true);
    Ok(value)
}

pub fn save_story_decomposition(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: SaveStoryDecompositionArgs = parse_args("save_story_decomposition", args)?;
    let specs: Vec<SubTaskSpec> = serde_json::from_value(args.tasks)
        .map_err(|e| ToolError::validation(format!("tasks array did not parse: {}", e)))?;
    let result = rt.decomposer().save_decomposition(&args.user_story, &specs)?;
    to_value(&result)
}

pub fn prepare_task_for_execution(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: TaskIdArgs = parse_args("prepare_task_for_execution", args)?;
    let prepared = rt.workflow().prepare_task(&args.task_id)?;
    let mut result = to_value(&prepared)?;
    result["success"] = json!(true);
    Ok(result)
}

pub fn get_execution_prompt(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: TaskIdArgs = parse_args("get_execution_prompt", args)?;
    let prompt = rt.workflow().execution_prompt(&args.task_id)?;
    let mut result = to_value(&prompt)?;
    result["success"] = json!(true);
    Ok(result)
}
