use std::collections::{HashMap, HashSet};
use std::time::Duration;

use serde::Serialize;
use serde_json::json;
use taskforge_engine::decompose::{
    analysis_order, build_decomposition_prompt, dependency_map, total_estimated_hours,
};
use taskforge_engine::{next_steps_for, parse_decomposition, suggest_agents, suggest_tools, SubTaskSpec};
use taskforge_providers::TextCompleter;
use taskforge_store::NewTask;
use taskforge_types::{
    EventType, NewEvent, NextSteps, StoryMetadata, Task, TaskStatus, WorkflowStage,
};

use crate::runtime::Taskforge;
use crate::{Error, Result};

const STORY_TITLE_MAX: usize = 80;

#[derive(Debug, Clone, Serialize)]
pub struct DecompositionResult {
    pub success: bool,
    pub original_story: String,
    pub story_task: Task,
    pub tasks: Vec<Task>,
    /// Sub-task title -> titles it depends on.
    pub dependency_map: HashMap<String, Vec<String>>,
    pub total_estimated_hours: f64,
    /// Task ids, dependency-free tasks first.
    pub recommended_analysis_order: Vec<String>,
    pub next_steps: NextSteps,
}

/// Prompt handed back by the intelligent variant: the caller performs the
/// decomposition itself and submits it via `save_story_decomposition`.
#[derive(Debug, Clone, Serialize)]
pub struct IntelligentDecomposition {
    pub original_story: String,
    pub prompt: String,
    pub next_steps: NextSteps,
}

pub struct DecomposeOps<'a> {
    pub(crate) rt: &'a Taskforge,
}

impl DecomposeOps<'_> {
    /// Decompose a free-text story with the injected completer, bounded by
    /// the configured timeout (30s default). Nothing is written and no
    /// event is emitted when the completer fails or times out.
    pub async fn decompose(
        &self,
        story: &str,
        completer: &dyn TextCompleter,
    ) -> Result<DecompositionResult> {
        if story.trim().is_empty() {
            return Err(Error::Validation("user story must not be empty".into()));
        }

        let prompt = {
            let db = self.rt.db();
            let tech_stack = db.list_tech_stack()?;
            let patterns = db.list_code_patterns()?;
            build_decomposition_prompt(story, &tech_stack, &patterns)
        };

        let timeout_secs = self.rt.config().completer_timeout_secs;
        let raw = tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            completer.complete(&prompt),
        )
        .await
        .map_err(|_| Error::CompleterTimeout {
            seconds: timeout_secs,
        })??;

        let specs = parse_decomposition(&raw)?;
        self.materialize(story, &specs)
    }

    /// Intelligent variant: skip the completer and ask the caller to do
    /// the decomposition, returning it via `save_story_decomposition`.
    pub fn intelligent_prompt(&self, story: &str) -> Result<IntelligentDecomposition> {
        if story.trim().is_empty() {
            return Err(Error::Validation("user story must not be empty".into()));
        }
        let db = self.rt.db();
        let tech_stack = db.list_tech_stack()?;
        let patterns = db.list_code_patterns()?;
        drop(db);

        let mut prompt = build_decomposition_prompt(story, &tech_stack, &patterns);
        prompt.push_str(
            "\nPerform this decomposition yourself using your knowledge of the codebase, then \
             submit the JSON array via save_story_decomposition together with the original \
             story.\n",
        );
        Ok(IntelligentDecomposition {
            original_story: story.to_string(),
            prompt,
            next_steps: NextSteps {
                step: 1,
                action: "decompose".to_string(),
                instructions: "Produce the sub-task array described in the prompt, then call \
                               save_story_decomposition with it."
                    .to_string(),
                next_tool: "save_story_decomposition".to_string(),
                tools_to_call: None,
            },
        })
    }

    /// Materialize an externally produced decomposition (steps shared with
    /// the completer path).
    pub fn save_decomposition(
        &self,
        story: &str,
        specs: &[SubTaskSpec],
    ) -> Result<DecompositionResult> {
        if story.trim().is_empty() {
            return Err(Error::Validation("user story must not be empty".into()));
        }
        if specs.is_empty() {
            return Err(Error::Decompose(taskforge_engine::DecomposeError::Empty));
        }
        self.materialize(story, specs)
    }

    fn materialize(&self, story: &str, specs: &[SubTaskSpec]) -> Result<DecompositionResult> {
        validate_specs(specs)?;

        // Suggestion registries are read up front so the creation pass
        // below holds the database lock without re-entering ops.
        let agent_specs = self.rt.suggestions().agent_specs()?;
        let tool_specs = self.rt.suggestions().tool_specs()?;

        let mut db = self.rt.db();

        let story_task = db.insert_task_quiet(
            &NewTask {
                title: story_title(story),
                description: story.to_string(),
                status: Some(TaskStatus::Backlog),
                is_user_story: true,
                story_metadata: Some(StoryMetadata {
                    original_story: Some(story.to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            },
            &[],
        )?;

        // Pass 1: create all sub-tasks so titles can resolve to ids.
        let mut ids_by_title: HashMap<String, String> = HashMap::new();
        let mut tasks = Vec::with_capacity(specs.len());
        for spec in specs {
            let text = format!("{} {}", spec.title, spec.description);
            let agents = suggest_agents(&text, None, &agent_specs);
            let tools = suggest_tools(&text, None, &tool_specs);

            let task = db.insert_task_with_deps(
                &NewTask {
                    title: spec.title.clone(),
                    description: spec.description.clone(),
                    status: Some(TaskStatus::Backlog),
                    tags: spec.tags.clone(),
                    user_story_id: Some(story_task.id.clone()),
                    story_metadata: Some(StoryMetadata {
                        complexity: spec.complexity,
                        estimated_hours: spec.estimated_hours,
                        original_story: None,
                        suggested_agent: agents.into_iter().next(),
                        suggested_tools: tools,
                    }),
                    ..Default::default()
                },
                &[],
            )?;
            ids_by_title.insert(spec.title.clone(), task.id.clone());
            tasks.push(task);
        }

        // Pass 2: resolve title dependencies to ids.
        for spec in specs {
            if spec.dependencies.is_empty() {
                continue;
            }
            let dep_ids: Vec<String> = spec
                .dependencies
                .iter()
                .map(|title| ids_by_title[title].clone())
                .collect();
            let id = &ids_by_title[&spec.title];
            let (updated, _) = db.update_task(
                id,
                &taskforge_store::TaskPatch {
                    dependencies: Some(dep_ids),
                    ..Default::default()
                },
            )?;
            if let Some(slot) = tasks.iter_mut().find(|t| t.id == updated.id) {
                *slot = updated;
            }
        }

        db.append_event(&NewEvent::new(
            EventType::UserStoryCreated,
            json!({
                "story_id": story_task.id,
                "title": story_task.title,
                "task_count": tasks.len(),
            }),
        ))?;
        drop(db);

        self.rt.cache().invalidate_pattern("tasks:*");

        let recommended_analysis_order = analysis_order(specs)
            .iter()
            .filter_map(|title| ids_by_title.get(title).cloned())
            .collect();

        Ok(DecompositionResult {
            success: true,
            original_story: story.to_string(),
            story_task,
            dependency_map: dependency_map(specs),
            total_estimated_hours: total_estimated_hours(specs),
            recommended_analysis_order,
            tasks,
            next_steps: next_steps_for(WorkflowStage::StoryDecomposed, None),
        })
    }
}

fn story_title(story: &str) -> String {
    let first_line = story.lines().next().unwrap_or(story).trim();
    if first_line.chars().count() <= STORY_TITLE_MAX {
        first_line.to_string()
    } else {
        let truncated: String = first_line.chars().take(STORY_TITLE_MAX - 3).collect();
        format!("{}...", truncated)
    }
}

/// Titles must be unique, dependencies must name other sub-tasks, and the
/// title graph must be acyclic - checked before anything is written so a
/// rejected decomposition leaves no tasks behind.
fn validate_specs(specs: &[SubTaskSpec]) -> Result<()> {
    let mut titles = HashSet::new();
    for spec in specs {
        if !titles.insert(spec.title.as_str()) {
            return Err(Error::Validation(format!(
                "duplicate sub-task title '{}'",
                spec.title
            )));
        }
    }
    for spec in specs {
        for dep in &spec.dependencies {
            if dep == &spec.title {
                return Err(Error::Validation(format!(
                    "sub-task '{}' depends on itself",
                    spec.title
                )));
            }
            if !titles.contains(dep.as_str()) {
                return Err(Error::Validation(format!(
                    "sub-task '{}' depends on unknown title '{}'",
                    spec.title, dep
                )));
            }
        }
    }

    // Cycle check over the title graph.
    let deps_of: HashMap<&str, &Vec<String>> = specs
        .iter()
        .map(|s| (s.title.as_str(), &s.dependencies))
        .collect();
    for spec in specs {
        let mut stack: Vec<&str> = spec.dependencies.iter().map(String::as_str).collect();
        let mut visited: HashSet<&str> = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == spec.title {
                return Err(Error::Validation(format!(
                    "sub-task dependencies form a cycle through '{}'",
                    spec.title
                )));
            }
            if visited.insert(current)
                && let Some(deps) = deps_of.get(current)
            {
                stack.extend(deps.iter().map(String::as_str));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(title: &str, deps: &[&str]) -> SubTaskSpec {
        SubTaskSpec {
            title: title.to_string(),
            description: String::new(),
            complexity: None,
            estimated_hours: None,
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
            tags: vec![],
        }
    }

    #[test]
    fn test_validate_rejects_unknown_dep() {
        let specs = vec![spec("a", &["ghost"])];
        assert!(validate_specs(&specs).is_err());
    }

    #[test]
    fn test_validate_rejects_cycle() {
        let specs = vec![spec("a", &["b"]), spec("b", &["a"])];
        assert!(validate_specs(&specs).is_err());
    }

    #[test]
    fn test_validate_accepts_chain() {
        let specs = vec![spec("a", &[]), spec("b", &["a"]), spec("c", &["a", "b"])];
        assert!(validate_specs(&specs).is_ok());
    }

    #[test]
    fn test_story_title_truncation() {
        let long = "x".repeat(200);
        let title = story_title(&long);
        assert!(title.chars().count() <= STORY_TITLE_MAX);
        assert!(title.ends_with("..."));
        assert_eq!(story_title("short story"), "short story");
    }
}
