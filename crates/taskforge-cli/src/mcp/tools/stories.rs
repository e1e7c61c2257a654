use serde_json::{json, Value};
use taskforge_runtime::Taskforge;

use super::{parse_args, parse_status, to_value, ToolError};
use crate::mcp::requests::{DeleteUserStoryArgs, SafeDeleteArgs, StoryIdArgs};

pub fn get_user_stories(rt: &Taskforge) -> Result<Value, ToolError> {
    let stories = rt.stories().list()?;
    Ok(json!({ "success": true, "count": stories.len(), "user_stories": stories }))
}

pub fn get_tasks_by_user_story(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: StoryIdArgs = parse_args("get_tasks_by_user_story", args)?;
    let tasks = rt.stories().tasks_of(&args.story_id)?;
    Ok(json!({
        "success": true,
        "story_id": args.story_id,
        "count": tasks.len(),
        "tasks": tasks,
    }))
}

pub fn delete_user_story(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: DeleteUserStoryArgs = parse_args("delete_user_story", args)?;
    let deleted = rt.stories().delete(&args.story_id, args.force)?;
    let mut result = to_value(&deleted)?;
    result["success"] = json!(true);
    Ok(result)
}

pub fn safe_delete_tasks_by_status(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: SafeDeleteArgs = parse_args("safe_delete_tasks_by_status", args)?;
    let status = parse_status(&args.status)?;
    let outcome = rt.stories().safe_delete_by_status(status)?;
    let mut result = to_value(&outcome)?;
    result["success"] = json!(true);
    Ok(result)
}

pub fn get_user_story_health(rt: &Taskforge) -> Result<Value, ToolError> {
    let health = rt.stories().health()?;
    Ok(json!({ "success": true, "count": health.len(), "stories": health }))
}
