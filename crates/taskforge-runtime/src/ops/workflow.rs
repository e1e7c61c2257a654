use serde::Serialize;
use serde_json::json;
use taskforge_engine::next_steps_for;
use taskforge_engine::prompt::{build_analysis_preparation, build_execution_prompt, ExecutionContext};
use taskforge_store::LearningFilter;
use taskforge_types::{EventType, NewEvent, NextSteps, WorkflowStage};

use crate::runtime::Taskforge;
use crate::{Error, Result};

const SIMILAR_LEARNING_LIMIT: usize = 3;

/// Result of `prepare_task_for_execution`: a structured analysis prompt
/// the assistant executes with its own read/search capabilities.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedTask {
    pub task_id: String,
    pub task_title: String,
    pub task_description: String,
    pub prompt: String,
    pub search_patterns: Vec<String>,
    pub files_to_check: Vec<String>,
    pub risks_to_identify: Vec<String>,
    pub next_steps: NextSteps,
}

/// Result of `get_execution_prompt`: the enriched implementation prompt
/// plus the structured context it was assembled from.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionPrompt {
    pub task_id: String,
    pub prompt: String,
    pub context: ExecutionContext,
    pub next_steps: NextSteps,
}

pub struct WorkflowOps<'a> {
    pub(crate) rt: &'a Taskforge,
}

impl WorkflowOps<'_> {
    pub fn prepare_task(&self, task_id: &str) -> Result<PreparedTask> {
        let db = self.rt.db();
        let task = db.require_task(task_id)?;
        let tech_stack = db.list_tech_stack()?;
        let learnings = db.list_learnings(&LearningFilter {
            contains: Some(task.title.clone()),
            limit: Some(SIMILAR_LEARNING_LIMIT),
            ..Default::default()
        })?;

        let preparation = build_analysis_preparation(&task, &tech_stack, &learnings);
        db.append_event(&NewEvent::new(
            EventType::TaskAnalysisPrepared,
            json!({ "task_id": task_id, "title": task.title }),
        ))?;

        Ok(PreparedTask {
            task_id: task.id.clone(),
            task_title: task.title,
            task_description: task.description,
            prompt: preparation.prompt,
            search_patterns: preparation.search_patterns,
            files_to_check: preparation.files_to_check,
            risks_to_identify: preparation.risks_to_identify,
            next_steps: next_steps_for(WorkflowStage::AnalysisPrepared, Some(task_id)),
        })
    }

    /// Precondition: `save_task_analysis` ran for this task.
    pub fn execution_prompt(&self, task_id: &str) -> Result<ExecutionPrompt> {
        let db = self.rt.db();
        let task = db.require_task(task_id)?;
        let Some(analysis) = task.analysis.clone() else {
            return Err(Error::NotAnalyzed(task_id.to_string()));
        };

        let graph = db.resource_edges_for_task(task_id)?;
        let learnings = db.list_learnings(&LearningFilter {
            contains: Some(task.title.clone()),
            limit: Some(SIMILAR_LEARNING_LIMIT),
            ..Default::default()
        })?;
        let guidelines = db.list_guidelines()?;

        let (prompt, context) =
            build_execution_prompt(&task, &analysis, &graph, &learnings, &guidelines);
        Ok(ExecutionPrompt {
            task_id: task_id.to_string(),
            prompt,
            context,
            next_steps: next_steps_for(WorkflowStage::ReadyToImplement, Some(task_id)),
        })
    }
}
