use serde_json::{json, Value};
use taskforge_runtime::Taskforge;

use super::{parse_args, to_value, ToolError};
use crate::mcp::requests::{
    AddCodePatternArgs, AddGuidelineArgs, AddTechStackArgs, InitializeProjectArgs,
    RemoveTechStackArgs, UpdateTechStackArgs,
};

pub fn get_project_info(rt: &Taskforge) -> Result<Value, ToolError> {
    let info = rt.project().info()?;
    let mut result = to_value(&info)?;
    result["success"] = json!(true);
    Ok(result)
}

pub fn get_project_configuration(rt: &Taskforge) -> Result<Value, ToolError> {
    let configuration = rt.project().configuration()?;
    let mut result = to_value(&configuration)?;
    result["success"] = json!(true);
    Ok(result)
}

pub fn initialize_project_configuration(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: InitializeProjectArgs = parse_args("initialize_project_configuration", args)?;
    let initialized = rt
        .project()
        .initialize_configuration(args.name.as_deref(), args.description.as_deref())?;
    let mut result = to_value(&initialized)?;
    result["success"] = json!(true);
    Ok(result)
}

pub fn add_tech_stack(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: AddTechStackArgs = parse_args("add_tech_stack", args)?;
    let entry = rt
        .project()
        .add_tech_stack(&args.category, &args.name, args.version.as_deref())?;
    Ok(json!({ "success": true, "entry": entry }))
}

pub fn update_tech_stack(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: UpdateTechStackArgs = parse_args("update_tech_stack", args)?;
    rt.project().update_tech_stack(
        &args.id,
        args.category.as_deref(),
        args.name.as_deref(),
        args.version.as_deref(),
    )?;
    Ok(json!({ "success": true, "id": args.id }))
}

pub fn remove_tech_stack(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: RemoveTechStackArgs = parse_args("remove_tech_stack", args)?;
    rt.project().remove_tech_stack(&args.id)?;
    Ok(json!({ "success": true, "removed": args.id }))
}

pub fn add_guideline(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: AddGuidelineArgs = parse_args("add_guideline", args)?;
    let guideline = rt.project().add_guideline(
        args.guideline_type.as_deref(),
        &args.title,
        &args.description,
        args.priority,
    )?;
    Ok(json!({ "success": true, "guideline": guideline }))
}

pub fn add_code_pattern(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: AddCodePatternArgs = parse_args("add_code_pattern", args)?;
    let pattern = rt.project().add_code_pattern(
        &args.name,
        &args.description,
        args.example_code.as_deref(),
        &args.tags,
    )?;
    Ok(json!({ "success": true, "pattern": pattern }))
}
