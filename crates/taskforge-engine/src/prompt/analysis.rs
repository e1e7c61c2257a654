use serde::Serialize;
use taskforge_types::{Learning, Task, TaskCategory, TechStackEntry};

use crate::keywords::extract_keywords;

const MAX_SEARCH_PATTERNS: usize = 8;

/// Structured analysis prompt for one task.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisPreparation {
    pub prompt: String,
    pub search_patterns: Vec<String>,
    pub files_to_check: Vec<String>,
    pub risks_to_identify: Vec<String>,
}

/// Globs worth scanning for a given stack entry. Coarse on purpose: the
/// assistant narrows them with its own search tools.
fn globs_for_stack(entry: &TechStackEntry) -> Vec<String> {
    let name = entry.name.to_lowercase();
    match entry.category.to_lowercase().as_str() {
        "frontend" => vec![
            "src/**/*.tsx".to_string(),
            "src/**/*.jsx".to_string(),
            "src/**/*.css".to_string(),
        ],
        "backend" => {
            if name.contains("rust") {
                vec!["src/**/*.rs".to_string(), "crates/**/*.rs".to_string()]
            } else if name.contains("python") || name.contains("django") || name.contains("flask") {
                vec!["**/*.py".to_string()]
            } else {
                vec!["src/**/*.ts".to_string(), "src/**/*.js".to_string()]
            }
        }
        "database" => vec![
            "migrations/**/*".to_string(),
            "**/schema.sql".to_string(),
            "src/**/models/**/*".to_string(),
        ],
        "testing" => vec![
            "tests/**/*".to_string(),
            "**/*.test.*".to_string(),
            "**/*.spec.*".to_string(),
        ],
        _ => vec!["src/**/*".to_string()],
    }
}

fn risks_for(task: &Task) -> Vec<String> {
    let mut risks = match task.category {
        Some(TaskCategory::BackendDatabase) => vec![
            "Schema or migration changes breaking existing data".to_string(),
            "Query performance regressions on large tables".to_string(),
            "API contract changes affecting existing consumers".to_string(),
        ],
        Some(TaskCategory::DesignFrontend) => vec![
            "Shared component changes leaking into other views".to_string(),
            "State management regressions".to_string(),
            "Accessibility or responsive-layout breakage".to_string(),
        ],
        Some(TaskCategory::TestFix) => vec![
            "Masking a real defect by loosening assertions".to_string(),
            "Flaky timing-dependent behavior".to_string(),
        ],
        None => vec!["Unreviewed coupling to modules outside the task scope".to_string()],
    };

    let tag_text = task.tags.join(" ").to_lowercase();
    if tag_text.contains("auth") || tag_text.contains("security") {
        risks.push("Authentication/authorization bypass paths".to_string());
    }
    if tag_text.contains("payment") || tag_text.contains("billing") {
        risks.push("Money-moving logic without idempotency".to_string());
    }
    risks
}

/// Build the analysis prompt from task text, configured tech stack and
/// similar past learnings. The prompt instructs the assistant to inspect
/// the codebase itself and submit findings via `save_task_analysis`.
pub fn build_analysis_preparation(
    task: &Task,
    tech_stack: &[TechStackEntry],
    similar_learnings: &[Learning],
) -> AnalysisPreparation {
    let text = format!("{} {}", task.title, task.description);
    let search_patterns = extract_keywords(&text, MAX_SEARCH_PATTERNS);

    let mut files_to_check: Vec<String> = Vec::new();
    for entry in tech_stack {
        for glob in globs_for_stack(entry) {
            if !files_to_check.contains(&glob) {
                files_to_check.push(glob);
            }
        }
    }
    if files_to_check.is_empty() {
        files_to_check.push("src/**/*".to_string());
    }

    let risks_to_identify = risks_for(task);

    let mut prompt = String::new();
    prompt.push_str(&format!(
        "# Codebase analysis for task: {}\n\n{}\n\n",
        task.title, task.description
    ));
    prompt.push_str(
        "Analyze the codebase for this task using your own Read/Grep/Glob capabilities. \
         Do not implement anything yet.\n\n",
    );
    if !search_patterns.is_empty() {
        prompt.push_str("## Search for\n");
        for pattern in &search_patterns {
            prompt.push_str(&format!("- {}\n", pattern));
        }
        prompt.push('\n');
    }
    prompt.push_str("## Files to check\n");
    for glob in &files_to_check {
        prompt.push_str(&format!("- {}\n", glob));
    }
    prompt.push_str("\n## Risks to identify\n");
    for risk in &risks_to_identify {
        prompt.push_str(&format!("- {}\n", risk));
    }
    if !similar_learnings.is_empty() {
        prompt.push_str("\n## Lessons from similar past work\n");
        for learning in similar_learnings.iter().take(3) {
            prompt.push_str(&format!("- {}\n", learning.lesson));
        }
    }
    prompt.push_str(
        "\n## Report back\n\
         When finished, call save_task_analysis with: files_to_modify (path, reason, risk), \
         files_to_create (path, reason), dependencies (type, name, action), risks (level, \
         description, mitigation), related_code (file, description, lines) and \
         recommendations.\n",
    );

    AnalysisPreparation {
        prompt,
        search_patterns,
        files_to_check,
        risks_to_identify,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use taskforge_types::TaskStatus;

    fn task(title: &str, description: &str, category: Option<TaskCategory>) -> Task {
        Task {
            id: "t1".to_string(),
            project_id: "p1".to_string(),
            title: title.to_string(),
            description: description.to_string(),
            status: TaskStatus::Backlog,
            assignee: None,
            priority: None,
            tags: vec![],
            category,
            is_user_story: false,
            user_story_id: None,
            story_metadata: None,
            analysis: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_search_patterns_from_task_text() {
        let prep = build_analysis_preparation(
            &task("Reset password", "Send reset email with token", None),
            &[],
            &[],
        );
        assert!(prep.search_patterns.contains(&"reset".to_string()));
        assert!(prep.search_patterns.contains(&"password".to_string()));
        assert!(prep.prompt.contains("save_task_analysis"));
    }

    #[test]
    fn test_stack_seeds_globs() {
        let stack = vec![TechStackEntry {
            id: "1".to_string(),
            project_id: "p".to_string(),
            category: "database".to_string(),
            name: "postgres".to_string(),
            version: None,
        }];
        let prep = build_analysis_preparation(&task("t", "d", None), &stack, &[]);
        assert!(prep.files_to_check.iter().any(|g| g.contains("migrations")));
    }

    #[test]
    fn test_category_drives_risks() {
        let prep = build_analysis_preparation(
            &task("t", "d", Some(TaskCategory::BackendDatabase)),
            &[],
            &[],
        );
        assert!(prep
            .risks_to_identify
            .iter()
            .any(|r| r.to_lowercase().contains("migration")));
    }

    #[test]
    fn test_empty_stack_falls_back() {
        let prep = build_analysis_preparation(&task("t", "d", None), &[], &[]);
        assert_eq!(prep.files_to_check, vec!["src/**/*".to_string()]);
    }
}
