use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use taskforge_types::{CodePattern, Complexity, TechStackEntry};

/// Sub-task spec produced by the completer (or the caller, for the
/// intelligent variant). Dependencies are titles; ids are resolved after
/// all tasks exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubTaskSpec {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<Complexity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug)]
pub enum DecomposeError {
    /// Output was not a JSON array of sub-task specs
    Parse(String),
    /// Array parsed but contained no usable sub-tasks
    Empty,
}

impl fmt::Display for DecomposeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecomposeError::Parse(msg) => write!(f, "Decomposition parse error: {}", msg),
            DecomposeError::Empty => write!(f, "Decomposition produced no sub-tasks"),
        }
    }
}

impl std::error::Error for DecomposeError {}

static FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)```").expect("fence regex"));

/// Parse completer output into sub-task specs, tolerating fenced code
/// blocks and surrounding prose.
pub fn parse_decomposition(raw: &str) -> Result<Vec<SubTaskSpec>, DecomposeError> {
    let candidate = if let Some(captures) = FENCE_RE.captures(raw) {
        captures.get(1).map(|m| m.as_str()).unwrap_or(raw)
    } else {
        raw
    };

    // Models pad JSON with commentary; cut to the outermost array.
    let trimmed = match (candidate.find('['), candidate.rfind(']')) {
        (Some(start), Some(end)) if start < end => &candidate[start..=end],
        _ => candidate.trim(),
    };

    let specs: Vec<SubTaskSpec> = serde_json::from_str(trimmed)
        .map_err(|e| DecomposeError::Parse(e.to_string()))?;

    let specs: Vec<SubTaskSpec> = specs
        .into_iter()
        .filter(|s| !s.title.trim().is_empty())
        .collect();
    if specs.is_empty() {
        return Err(DecomposeError::Empty);
    }
    Ok(specs)
}

/// Dependency map keyed by title, as returned to the caller.
pub fn dependency_map(specs: &[SubTaskSpec]) -> HashMap<String, Vec<String>> {
    specs
        .iter()
        .map(|s| (s.title.clone(), s.dependencies.clone()))
        .collect()
}

pub fn total_estimated_hours(specs: &[SubTaskSpec]) -> f64 {
    specs.iter().filter_map(|s| s.estimated_hours).sum()
}

/// Order for analysis: dependency-free tasks first, then by how much they
/// wait on.
pub fn analysis_order(specs: &[SubTaskSpec]) -> Vec<String> {
    let mut indexed: Vec<(usize, &SubTaskSpec)> = specs.iter().enumerate().collect();
    indexed.sort_by_key(|(i, s)| (s.dependencies.len(), *i));
    indexed.into_iter().map(|(_, s)| s.title.clone()).collect()
}

/// Prompt asking a completer to break a story into implementable sub-tasks.
pub fn build_decomposition_prompt(
    story: &str,
    tech_stack: &[TechStackEntry],
    patterns: &[CodePattern],
) -> String {
    let mut prompt = String::new();
    prompt.push_str("Decompose the following user story into concrete technical tasks.\n\n");
    prompt.push_str("## User story\n");
    prompt.push_str(story);
    prompt.push_str("\n\n");

    if !tech_stack.is_empty() {
        prompt.push_str("## Project tech stack\n");
        for entry in tech_stack {
            match &entry.version {
                Some(v) => prompt.push_str(&format!("- {} ({}): {}\n", entry.name, entry.category, v)),
                None => prompt.push_str(&format!("- {} ({})\n", entry.name, entry.category)),
            }
        }
        prompt.push('\n');
    }

    if !patterns.is_empty() {
        prompt.push_str("## Established code patterns\n");
        for pattern in patterns {
            prompt.push_str(&format!("- {}: {}\n", pattern.name, pattern.description));
        }
        prompt.push('\n');
    }

    prompt.push_str(
        "## Output format\n\
         Respond with a JSON array only. Each element:\n\
         {\n\
           \"title\": \"short imperative title\",\n\
           \"description\": \"what to build and how to verify it\",\n\
           \"complexity\": \"simple\" | \"medium\" | \"complex\",\n\
           \"estimated_hours\": number,\n\
           \"dependencies\": [\"titles of tasks this depends on\"],\n\
           \"tags\": [\"keyword\"]\n\
         }\n\
         Order tasks so dependencies come before dependents. \
         Use 3 to 8 tasks; every dependency must name another task's title.\n",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"title": "Add reset endpoint", "description": "POST /reset", "complexity": "medium",
         "estimated_hours": 3, "dependencies": [], "tags": ["api"]},
        {"title": "Send reset email", "description": "SMTP", "dependencies": ["Add reset endpoint"]}
    ]"#;

    #[test]
    fn test_parse_plain_array() {
        let specs = parse_decomposition(SAMPLE).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].title, "Add reset endpoint");
        assert_eq!(specs[0].complexity, Some(Complexity::Medium));
        assert_eq!(specs[1].dependencies, vec!["Add reset endpoint"]);
    }

    #[test]
    fn test_parse_fenced_block() {
        let raw = format!("Here is the plan:\n```json\n{}\n```\nDone.", SAMPLE);
        let specs = parse_decomposition(&raw).unwrap();
        assert_eq!(specs.len(), 2);
    }

    #[test]
    fn test_parse_with_prose_around_array() {
        let raw = format!("Sure! {} Hope that helps.", SAMPLE);
        let specs = parse_decomposition(&raw).unwrap();
        assert_eq!(specs.len(), 2);
    }

    #[test]
    fn test_reject_non_array() {
        assert!(matches!(
            parse_decomposition(r#"{"title": "x"}"#),
            Err(DecomposeError::Parse(_))
        ));
    }

    #[test]
    fn test_reject_empty_array() {
        assert!(matches!(
            parse_decomposition("[]"),
            Err(DecomposeError::Empty)
        ));
        assert!(matches!(
            parse_decomposition(r#"[{"title": "  "}]"#),
            Err(DecomposeError::Empty)
        ));
    }

    #[test]
    fn test_analysis_order_puts_free_tasks_first() {
        let specs = parse_decomposition(SAMPLE).unwrap();
        let order = analysis_order(&specs);
        assert_eq!(order[0], "Add reset endpoint");
    }

    #[test]
    fn test_total_hours() {
        let specs = parse_decomposition(SAMPLE).unwrap();
        assert_eq!(total_estimated_hours(&specs), 3.0);
    }

    #[test]
    fn test_prompt_includes_stack_and_story() {
        let stack = vec![TechStackEntry {
            id: "1".to_string(),
            project_id: "p".to_string(),
            category: "backend".to_string(),
            name: "axum".to_string(),
            version: Some("0.7".to_string()),
        }];
        let prompt = build_decomposition_prompt("Reset password via email", &stack, &[]);
        assert!(prompt.contains("Reset password via email"));
        assert!(prompt.contains("axum"));
        assert!(prompt.contains("JSON array"));
    }
}
