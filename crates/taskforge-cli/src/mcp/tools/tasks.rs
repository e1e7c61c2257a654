use serde_json::{json, Value};
use taskforge_runtime::{CreateTaskInput, TaskFilter, TaskPatch, Taskforge};

use super::{
    parse_args, parse_category, parse_priority, parse_status, to_value, ToolError,
};
use crate::mcp::requests::{CreateTaskArgs, ListTasksArgs, TaskIdArgs, UpdateTaskArgs};

pub fn create_task(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: CreateTaskArgs = parse_args("create_task", args)?;

    let input = CreateTaskInput {
        title: args.title,
        description: args.description,
        status: args.status.as_deref().map(parse_status).transpose()?,
        dependencies: args.dependencies,
        assignee: args.assignee,
        priority: args.priority.as_deref().map(parse_priority).transpose()?,
        tags: args.tags,
        category: args.category.as_deref().map(parse_category).transpose()?,
        is_user_story: args.is_user_story,
        user_story_id: args.user_story_id,
        story_metadata: None,
    };
    let created = rt.tasks().create(input)?;
    let mut result = to_value(&created)?;
    result["success"] = json!(true);
    Ok(result)
}

pub fn update_task(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: UpdateTaskArgs = parse_args("update_task", args)?;

    let patch = TaskPatch {
        title: args.title,
        description: args.description,
        status: args.status.as_deref().map(parse_status).transpose()?,
        dependencies: args.dependencies,
        assignee: args.assignee,
        priority: args.priority.as_deref().map(parse_priority).transpose()?,
        tags: args.tags,
        category: args.category.as_deref().map(parse_category).transpose()?,
        story_metadata: None,
    };
    if patch.is_empty() {
        return Err(ToolError::validation("update_task received no fields to change"));
    }
    let updated = rt.tasks().update(&args.task_id, &patch)?;
    let mut result = to_value(&updated)?;
    result["success"] = json!(true);
    Ok(result)
}

pub fn list_tasks(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: ListTasksArgs = parse_args("list_tasks", args)?;
    let mut filter = TaskFilter::default();
    if let Some(status) = args.status.as_deref() {
        filter = filter.status(parse_status(status)?);
    }
    if let Some(category) = args.category.as_deref() {
        filter = filter.category(parse_category(category)?);
    }
    let tasks = rt.tasks().list(&filter)?;
    Ok(json!({ "success": true, "count": tasks.len(), "tasks": tasks }))
}

pub fn get_task(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: TaskIdArgs = parse_args("get_task", args)?;
    let task = rt.tasks().get(&args.task_id)?;
    Ok(json!({ "success": true, "task": task }))
}

pub fn delete_task(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: TaskIdArgs = parse_args("delete_task", args)?;
    let task = rt.tasks().delete(&args.task_id)?;
    Ok(json!({
        "success": true,
        "deleted": { "task_id": task.id, "title": task.title },
    }))
}

pub fn get_task_context(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: TaskIdArgs = parse_args("get_task_context", args)?;
    let context = rt.tasks().context(&args.task_id)?;
    let mut result = to_value(&context)?;
    result["success"] = json!(true);
    Ok(result)
}
