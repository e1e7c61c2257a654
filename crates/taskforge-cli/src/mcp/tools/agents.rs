use std::path::PathBuf;

use serde_json::{json, Value};
use taskforge_runtime::{NewMcpToolInput, NewSubAgentInput, Taskforge};

use super::{parse_agent_type, parse_args, parse_tool_type, to_value, ToolError};
use crate::mcp::requests::{
    AddMcpToolArgs, AddSubAgentArgs, SyncAgentsArgs, TaskIdArgs, UpdateMcpToolArgs,
    UpdateSubAgentArgs,
};

pub fn suggest_agents_for_task(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: TaskIdArgs = parse_args("suggest_agents_for_task", args)?;
    let suggestions = rt.suggestions().agents_for_task(&args.task_id)?;
    Ok(json!({
        "success": true,
        "task_id": args.task_id,
        "suggestions": suggestions,
    }))
}

pub fn suggest_tools_for_task(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: TaskIdArgs = parse_args("suggest_tools_for_task", args)?;
    let suggestions = rt.suggestions().tools_for_task(&args.task_id)?;
    Ok(json!({
        "success": true,
        "task_id": args.task_id,
        "suggestions": suggestions,
    }))
}

fn agent_dir(args: &SyncAgentsArgs) -> PathBuf {
    match &args.directory {
        Some(dir) => PathBuf::from(dir),
        None => PathBuf::from(".claude/agents"),
    }
}

pub fn sync_claude_code_agents(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: SyncAgentsArgs = parse_args("sync_claude_code_agents", args)?;
    let synced = rt.agents().sync_agent_files(&agent_dir(&args))?;
    let mut result = to_value(&synced)?;
    result["success"] = json!(true);
    Ok(result)
}

pub fn read_claude_code_agents(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: SyncAgentsArgs = parse_args("read_claude_code_agents", args)?;
    let files = rt.agents().read_agent_files(&agent_dir(&args))?;
    Ok(json!({ "success": true, "count": files.len(), "agents": files }))
}

pub fn update_agent_prompt_templates(rt: &Taskforge) -> Result<Value, ToolError> {
    let updated = rt.agents().update_prompt_templates()?;
    Ok(json!({ "success": true, "updated": updated }))
}

pub fn add_sub_agent(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: AddSubAgentArgs = parse_args("add_sub_agent", args)?;
    let agent = rt.agents().add_sub_agent(NewSubAgentInput {
        name: args.name,
        agent_type: parse_agent_type(&args.agent_type)?,
        enabled: args.enabled,
        triggers: args.triggers,
        custom_prompt: args.custom_prompt,
        priority: args.priority,
    })?;
    Ok(json!({ "success": true, "agent": agent }))
}

pub fn update_sub_agent(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: UpdateSubAgentArgs = parse_args("update_sub_agent", args)?;
    let agent = rt.agents().update_sub_agent(
        &args.name,
        args.enabled,
        args.triggers,
        args.custom_prompt,
        args.priority,
    )?;
    Ok(json!({ "success": true, "agent": agent }))
}

pub fn add_mcp_tool(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: AddMcpToolArgs = parse_args("add_mcp_tool", args)?;
    let tool = rt.agents().add_mcp_tool(NewMcpToolInput {
        name: args.name,
        tool_type: parse_tool_type(&args.tool_type)?,
        command: args.command,
        enabled: args.enabled,
        when_to_use: args.when_to_use,
        priority: args.priority,
    })?;
    Ok(json!({ "success": true, "tool": tool }))
}

pub fn update_mcp_tool(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: UpdateMcpToolArgs = parse_args("update_mcp_tool", args)?;
    let tool = rt.agents().update_mcp_tool(
        &args.name,
        args.enabled,
        args.command,
        args.when_to_use,
        args.priority,
    )?;
    Ok(json!({ "success": true, "tool": tool }))
}
