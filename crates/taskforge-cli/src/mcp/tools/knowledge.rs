use serde_json::{json, Value};
use taskforge_engine::risk::{DEFAULT_FAILURE_THRESHOLD, DEFAULT_MIN_OCCURRENCES};
use taskforge_runtime::{FeedbackInput, SimilarQuery, Taskforge};

use super::{parse_args, parse_learning_type, to_value, ToolError};
use crate::mcp::requests::{
    AddFeedbackArgs, DetectFailurePatternsArgs, LimitArgs, PatternArgs, RelevantKnowledgeArgs,
    RenderTemplateArgs, SimilarLearningsArgs, TrendingPatternsArgs,
};

const DEFAULT_LIST_LIMIT: usize = 20;
const DEFAULT_TRENDING_DAYS: i64 = 7;

pub fn list_templates(rt: &Taskforge) -> Result<Value, ToolError> {
    let templates = rt.project().list_templates()?;
    Ok(json!({ "success": true, "count": templates.len(), "templates": templates }))
}

pub fn list_patterns(rt: &Taskforge) -> Result<Value, ToolError> {
    let patterns = rt.project().list_code_patterns()?;
    Ok(json!({ "success": true, "count": patterns.len(), "patterns": patterns }))
}

pub fn list_learnings(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: LimitArgs = parse_args("list_learnings", args)?;
    let learnings = rt
        .learnings()
        .list(Some(args.limit.unwrap_or(DEFAULT_LIST_LIMIT)))?;
    Ok(json!({ "success": true, "count": learnings.len(), "learnings": learnings }))
}

pub fn render_template(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: RenderTemplateArgs = parse_args("render_template", args)?;
    let rendered = rt.project().render_template(&args.name, &args.variables)?;
    let mut result = to_value(&rendered)?;
    result["success"] = json!(true);
    Ok(result)
}

pub fn get_relevant_knowledge(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: RelevantKnowledgeArgs = parse_args("get_relevant_knowledge", args)?;
    let knowledge = rt.learnings().relevant_knowledge(&args.query)?;
    let mut result = to_value(&knowledge)?;
    result["success"] = json!(true);
    Ok(result)
}

pub fn add_feedback(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: AddFeedbackArgs = parse_args("add_feedback", args)?;
    let recorded = rt.learnings().add_feedback(FeedbackInput {
        task_id: args.task_id,
        feedback: args.feedback,
        learning_type: parse_learning_type(&args.feedback_type)?,
        pattern: args.pattern,
        tags: args.tags,
    })?;
    let mut result = to_value(&recorded)?;
    result["success"] = json!(true);
    Ok(result)
}

pub fn get_similar_learnings(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: SimilarLearningsArgs = parse_args("get_similar_learnings", args)?;
    let learnings = rt.learnings().similar(SimilarQuery {
        context: args.context,
        task_id: args.task_id,
        learning_type: args
            .learning_type
            .as_deref()
            .map(parse_learning_type)
            .transpose()?,
        pattern: args.pattern,
    })?;
    Ok(json!({ "success": true, "count": learnings.len(), "learnings": learnings }))
}

pub fn get_top_patterns(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: LimitArgs = parse_args("get_top_patterns", args)?;
    let patterns = rt
        .learnings()
        .top_patterns(args.limit.unwrap_or(DEFAULT_LIST_LIMIT))?;
    Ok(json!({ "success": true, "count": patterns.len(), "patterns": patterns }))
}

pub fn get_trending_patterns(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: TrendingPatternsArgs = parse_args("get_trending_patterns", args)?;
    let trending = rt.learnings().trending_patterns(
        args.days.unwrap_or(DEFAULT_TRENDING_DAYS),
        args.limit.unwrap_or(DEFAULT_LIST_LIMIT),
    )?;
    Ok(json!({ "success": true, "count": trending.len(), "patterns": trending }))
}

pub fn get_pattern_stats(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: PatternArgs = parse_args("get_pattern_stats", args)?;
    let stats = rt.learnings().pattern_stats(&args.pattern)?;
    Ok(json!({ "success": true, "pattern": args.pattern, "stats": stats }))
}

pub fn detect_failure_patterns(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: DetectFailurePatternsArgs = parse_args("detect_failure_patterns", args)?;
    let detected = rt.learnings().detect_failure_patterns(
        args.min_occurrences.unwrap_or(DEFAULT_MIN_OCCURRENCES),
        args.failure_threshold.unwrap_or(DEFAULT_FAILURE_THRESHOLD),
    )?;
    Ok(json!({ "success": true, "count": detected.len(), "failure_patterns": detected }))
}

pub fn check_pattern_risk(rt: &Taskforge, args: Value) -> Result<Value, ToolError> {
    let args: PatternArgs = parse_args("check_pattern_risk", args)?;
    let risk = rt.learnings().check_pattern_risk(&args.pattern)?;
    let mut result = to_value(&risk)?;
    result["success"] = json!(true);
    Ok(result)
}
