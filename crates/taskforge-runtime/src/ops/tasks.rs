use serde::Serialize;
use taskforge_engine::next_steps_for;
use taskforge_store::{ChangeSet, LearningFilter, NewTask, TaskFilter, TaskPatch};
use taskforge_types::{
    Learning, NextSteps, Priority, ResourceAction, ResourceNode, StoryMetadata, Task,
    TaskCategory, TaskStatus, WorkflowStage,
};

use crate::runtime::Taskforge;
use crate::Result;

#[derive(Debug, Clone, Default)]
pub struct CreateTaskInput {
    pub title: String,
    pub description: String,
    pub status: Option<TaskStatus>,
    pub dependencies: Vec<String>,
    pub assignee: Option<String>,
    pub priority: Option<Priority>,
    pub tags: Vec<String>,
    pub category: Option<TaskCategory>,
    pub is_user_story: bool,
    pub user_story_id: Option<String>,
    pub story_metadata: Option<StoryMetadata>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedTask {
    pub task: Task,
    pub next_steps: NextSteps,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdatedTask {
    pub task: Task,
    pub changes: ChangeSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_steps: Option<NextSteps>,
}

/// Task with everything hanging off it, for `get_task_context`.
#[derive(Debug, Clone, Serialize)]
pub struct TaskContext {
    pub task: Task,
    pub dependencies: Vec<Task>,
    pub dependents: Vec<String>,
    pub resources: Vec<(ResourceNode, ResourceAction)>,
    pub learnings: Vec<Learning>,
}

pub struct TaskOps<'a> {
    pub(crate) rt: &'a Taskforge,
}

impl TaskOps<'_> {
    pub fn create(&self, input: CreateTaskInput) -> Result<CreatedTask> {
        let new = NewTask {
            title: input.title,
            description: input.description,
            status: input.status,
            assignee: input.assignee,
            priority: input.priority,
            tags: input.tags,
            category: input.category,
            is_user_story: input.is_user_story,
            user_story_id: input.user_story_id,
            story_metadata: input.story_metadata,
        };
        let task = self
            .rt
            .db()
            .insert_task_with_deps(&new, &input.dependencies)?;

        self.rt.cache().invalidate_pattern("tasks:*");
        // Inserting a sub-task refreshes the parent story's derived status.
        if let Some(parent_id) = &task.user_story_id {
            self.rt.cache().invalidate(&format!("task:{}", parent_id));
        }
        if let Ok(value) = serde_json::to_value(&task) {
            self.rt.cache().set(format!("task:{}", task.id), value, None);
        }
        let next_steps = next_steps_for(WorkflowStage::TaskCreated, Some(&task.id));
        Ok(CreatedTask { task, next_steps })
    }

    pub fn get(&self, id: &str) -> Result<Task> {
        let key = format!("task:{}", id);
        if let Some(hit) = self.rt.cache().get(&key) {
            if let Ok(task) = serde_json::from_value::<Task>(hit) {
                return Ok(task);
            }
        }
        let task = self.rt.db().require_task(id)?;
        if let Ok(value) = serde_json::to_value(&task) {
            self.rt.cache().set(key, value, None);
        }
        Ok(task)
    }

    pub fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let key = format!(
            "tasks:{}:{}",
            filter.status.map(|s| s.as_str()).unwrap_or("any"),
            filter.category.map(|c| c.as_str()).unwrap_or("any"),
        );
        // Only plain status/category listings are cached; scoped listings
        // (per-story) go straight through.
        let cacheable = filter.is_user_story.is_none() && filter.user_story_id.is_none();
        if cacheable {
            if let Some(hit) = self.rt.cache().get(&key) {
                if let Ok(tasks) = serde_json::from_value::<Vec<Task>>(hit) {
                    return Ok(tasks);
                }
            }
        }
        let tasks = self.rt.db().list_tasks(filter)?;
        if cacheable {
            if let Ok(value) = serde_json::to_value(&tasks) {
                self.rt.cache().set(key, value, None);
            }
        }
        Ok(tasks)
    }

    /// Update any subset of the task's fields. A move to `done` advances
    /// the workflow to feedback collection.
    pub fn update(&self, id: &str, patch: &TaskPatch) -> Result<UpdatedTask> {
        let (task, changes) = self.rt.db().update_task(id, patch)?;

        self.rt.cache().invalidate(&format!("task:{}", id));
        self.rt.cache().invalidate_pattern("tasks:*");
        if let Some(parent_id) = &task.user_story_id {
            self.rt.cache().invalidate(&format!("task:{}", parent_id));
        }

        let next_steps = if task.status == TaskStatus::Done && changes.contains_key("status") {
            Some(next_steps_for(
                WorkflowStage::ImplementationComplete,
                Some(id),
            ))
        } else {
            None
        };
        Ok(UpdatedTask {
            task,
            changes,
            next_steps,
        })
    }

    pub fn delete(&self, id: &str) -> Result<Task> {
        let task = self.rt.db().delete_task(id)?;
        self.rt.cache().invalidate(&format!("task:{}", id));
        self.rt.cache().invalidate_pattern("tasks:*");
        self.rt.cache().invalidate_pattern("learnings:*");
        if let Some(parent_id) = &task.user_story_id {
            self.rt.cache().invalidate(&format!("task:{}", parent_id));
        }
        Ok(task)
    }

    pub fn context(&self, id: &str) -> Result<TaskContext> {
        let db = self.rt.db();
        let task = db.require_task(id)?;
        let dep_ids = db.task_dependencies(id)?;
        let mut dependencies = Vec::with_capacity(dep_ids.len());
        for dep_id in &dep_ids {
            dependencies.push(db.require_task(dep_id)?);
        }
        let dependents = db.task_dependents(id)?;
        let resources = db.resource_edges_for_task(id)?;
        let learnings = db.list_learnings(&LearningFilter {
            task_id: Some(id.to_string()),
            limit: Some(10),
            ..Default::default()
        })?;
        Ok(TaskContext {
            task,
            dependencies,
            dependents,
            resources,
            learnings,
        })
    }
}
