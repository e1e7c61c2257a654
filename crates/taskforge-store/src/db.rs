use chrono::Duration;
use rusqlite::Connection;
use std::path::Path;
use taskforge_types::{
    CodePattern, Guideline, Learning, McpTool, NewEvent, PatternFrequency, Project, QueuedEvent,
    ResourceAction, ResourceNode, StoryStatusCounts, SubAgent, Task, TaskAnalysis, TaskStatus,
    TechStackEntry, Template, DEFAULT_STORY_DONE_THRESHOLD,
};

use crate::error::{Error, Result};
use crate::queries::{agent, config, dependency, event, learning, resource, story, task};
use crate::records::{
    ChangeSet, ConflictCandidate, DeletedStory, EventStats, LearningFilter, NewLearning,
    NewResourceNode, NewTask, SafeDeleteOutcome, StoryHealth, TaskFilter, TaskPatch,
    TrendingPattern,
};
use crate::schema;

/// Typed access to the taskforge database.
///
/// Every multi-write operation runs in a transaction that also performs the
/// invariant checks (acyclicity, transition legality, dependency gating) and
/// appends the operation's events, so a committed write is never visible
/// without them.
pub struct Database {
    conn: Connection,
    project_id: String,
    story_done_threshold: f64,
}

impl Database {
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path).map_err(|e| {
            Error::Query(format!(
                "Failed to open database {}: {}",
                db_path.display(),
                e
            ))
        })?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        schema::init_schema(&conn)?;
        let project = config::ensure_default_project(&conn)?;
        Ok(Self {
            conn,
            project_id: project.id,
            story_done_threshold: DEFAULT_STORY_DONE_THRESHOLD,
        })
    }

    pub fn set_story_done_threshold(&mut self, threshold: f64) {
        self.story_done_threshold = threshold.clamp(0.0, 1.0);
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    // --- Tasks ---

    /// Atomic task + dependency insert; rolls back wholly on cycle or
    /// missing dependency. Emits `task_created` / `user_story_created`.
    pub fn insert_task_with_deps(&mut self, new: &NewTask, deps: &[String]) -> Result<Task> {
        let project_id = self.project_id.clone();
        task::insert_with_deps(
            &mut self.conn,
            &project_id,
            new,
            deps,
            self.story_done_threshold,
            true,
        )
    }

    /// Same insert without the creation event; the story decomposer emits a
    /// single counted `user_story_created` itself.
    pub fn insert_task_quiet(&mut self, new: &NewTask, deps: &[String]) -> Result<Task> {
        let project_id = self.project_id.clone();
        task::insert_with_deps(
            &mut self.conn,
            &project_id,
            new,
            deps,
            self.story_done_threshold,
            false,
        )
    }

    pub fn get_task(&self, id: &str) -> Result<Option<Task>> {
        task::get(&self.conn, id)
    }

    pub fn require_task(&self, id: &str) -> Result<Task> {
        task::require(&self.conn, id)
    }

    pub fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        task::list(&self.conn, filter)
    }

    pub fn update_task(&mut self, id: &str, patch: &TaskPatch) -> Result<(Task, ChangeSet)> {
        task::update(&mut self.conn, id, patch, self.story_done_threshold)
    }

    pub fn delete_task(&mut self, id: &str) -> Result<Task> {
        task::delete(&mut self.conn, id, self.story_done_threshold)
    }

    pub fn task_dependencies(&self, id: &str) -> Result<Vec<String>> {
        dependency::deps_of(&self.conn, id)
    }

    pub fn task_dependents(&self, id: &str) -> Result<Vec<String>> {
        dependency::dependents_of(&self.conn, id)
    }

    // --- User stories ---

    pub fn sub_tasks(&self, story_id: &str) -> Result<Vec<Task>> {
        story::sub_tasks(&self.conn, story_id)
    }

    pub fn story_counts(&self, story_id: &str) -> Result<StoryStatusCounts> {
        story::counts(&self.conn, story_id)
    }

    pub fn delete_user_story(&mut self, id: &str, force: bool) -> Result<DeletedStory> {
        story::delete_user_story(&mut self.conn, id, force)
    }

    pub fn safe_delete_tasks_by_status(&mut self, status: TaskStatus) -> Result<SafeDeleteOutcome> {
        story::safe_delete_by_status(&mut self.conn, status, self.story_done_threshold)
    }

    pub fn user_story_health(&self) -> Result<Vec<StoryHealth>> {
        story::health(&self.conn, self.story_done_threshold)
    }

    // --- Resource graph ---

    pub fn save_task_analysis(
        &mut self,
        task_id: &str,
        analysis: &TaskAnalysis,
    ) -> Result<Vec<ResourceNode>> {
        resource::save_task_analysis(&mut self.conn, task_id, analysis)
    }

    pub fn upsert_resource_node(&self, new: &NewResourceNode) -> Result<ResourceNode> {
        resource::upsert_node(&self.conn, new)
    }

    pub fn get_resource_node(&self, id: &str) -> Result<Option<ResourceNode>> {
        resource::get_node(&self.conn, id)
    }

    pub fn resource_edges_for_task(
        &self,
        task_id: &str,
    ) -> Result<Vec<(ResourceNode, ResourceAction)>> {
        resource::edges_for_task(&self.conn, task_id)
    }

    pub fn resource_usage(
        &self,
        resource_id: &str,
    ) -> Result<(ResourceNode, Vec<(String, String, ResourceAction)>)> {
        let node = resource::get_node(&self.conn, resource_id)?
            .ok_or_else(|| Error::NotFound(format!("Resource {}", resource_id)))?;
        let tasks = resource::usage(&self.conn, resource_id)?;
        Ok((node, tasks))
    }

    pub fn conflict_candidates(&self, task_id: &str) -> Result<Vec<ConflictCandidate>> {
        resource::conflict_candidates(&self.conn, task_id)
    }

    // --- Learnings ---

    pub fn add_learning(&mut self, new: &NewLearning) -> Result<Learning> {
        learning::add(&mut self.conn, new)
    }

    pub fn list_learnings(&self, filter: &LearningFilter) -> Result<Vec<Learning>> {
        learning::list(&self.conn, filter)
    }

    pub fn pattern_frequency(&self, pattern: &str) -> Result<Option<PatternFrequency>> {
        learning::get_pattern(&self.conn, pattern)
    }

    pub fn top_patterns(&self, limit: usize) -> Result<Vec<PatternFrequency>> {
        learning::top_patterns(&self.conn, limit)
    }

    pub fn patterns_with_min_frequency(&self, min: u64) -> Result<Vec<PatternFrequency>> {
        learning::patterns_with_min_frequency(&self.conn, min)
    }

    pub fn trending_patterns(&self, days: i64, limit: usize) -> Result<Vec<TrendingPattern>> {
        learning::trending(&self.conn, days, limit)
    }

    // --- Event queue ---

    pub fn append_event(&self, event: &NewEvent) -> Result<i64> {
        event::append(&self.conn, event)
    }

    pub fn fetch_unprocessed_events(&self, limit: usize) -> Result<Vec<QueuedEvent>> {
        event::fetch_unprocessed(&self.conn, limit)
    }

    pub fn mark_event_processed(&self, id: i64) -> Result<bool> {
        event::mark_processed(&self.conn, id)
    }

    pub fn purge_old_processed_events(&self, age: Duration) -> Result<usize> {
        event::purge_old_processed(&self.conn, age)
    }

    pub fn event_stats(&self) -> Result<EventStats> {
        event::stats(&self.conn)
    }

    // --- Configuration ---

    pub fn project(&self) -> Result<Project> {
        config::get_default_project(&self.conn)?
            .ok_or_else(|| Error::NotFound("Default project".to_string()))
    }

    pub fn update_project(&self, name: &str, description: &str) -> Result<()> {
        let id = self.project_id.clone();
        config::update_project(&self.conn, &id, name, description)
    }

    pub fn add_tech_stack(
        &self,
        category: &str,
        name: &str,
        version: Option<&str>,
    ) -> Result<TechStackEntry> {
        config::add_tech_stack(&self.conn, &self.project_id, category, name, version)
    }

    pub fn update_tech_stack(
        &self,
        id: &str,
        category: Option<&str>,
        name: Option<&str>,
        version: Option<&str>,
    ) -> Result<()> {
        config::update_tech_stack(&self.conn, id, category, name, version)
    }

    pub fn remove_tech_stack(&self, id: &str) -> Result<()> {
        config::remove_tech_stack(&self.conn, id)
    }

    pub fn list_tech_stack(&self) -> Result<Vec<TechStackEntry>> {
        config::list_tech_stack(&self.conn, &self.project_id)
    }

    pub fn add_guideline(
        &self,
        guideline_type: Option<&str>,
        title: &str,
        description: &str,
        priority: i64,
    ) -> Result<Guideline> {
        config::add_guideline(
            &self.conn,
            &self.project_id,
            guideline_type,
            title,
            description,
            priority,
        )
    }

    pub fn list_guidelines(&self) -> Result<Vec<Guideline>> {
        config::list_guidelines(&self.conn, &self.project_id)
    }

    pub fn add_code_pattern(
        &self,
        name: &str,
        description: &str,
        example_code: Option<&str>,
        tags: &[String],
    ) -> Result<CodePattern> {
        config::add_code_pattern(
            &self.conn,
            &self.project_id,
            name,
            description,
            example_code,
            tags,
        )
    }

    pub fn list_code_patterns(&self) -> Result<Vec<CodePattern>> {
        config::list_code_patterns(&self.conn, &self.project_id)
    }

    pub fn add_template(
        &self,
        name: &str,
        template_type: Option<&str>,
        content: &str,
        variables: &[String],
    ) -> Result<Template> {
        config::add_template(
            &self.conn,
            &self.project_id,
            name,
            template_type,
            content,
            variables,
        )
    }

    pub fn list_templates(&self) -> Result<Vec<Template>> {
        config::list_templates(&self.conn, &self.project_id)
    }

    pub fn find_template_by_name(&self, name: &str) -> Result<Option<Template>> {
        config::find_template_by_name(&self.conn, &self.project_id, name)
    }

    // --- Agents and tools ---

    pub fn upsert_sub_agent(&self, sub_agent: &SubAgent) -> Result<SubAgent> {
        agent::upsert_sub_agent(&self.conn, sub_agent)
    }

    pub fn get_sub_agent(&self, id: &str) -> Result<Option<SubAgent>> {
        agent::get_sub_agent(&self.conn, id)
    }

    pub fn find_sub_agent_by_name(&self, name: &str) -> Result<Option<SubAgent>> {
        agent::find_sub_agent_by_name(&self.conn, &self.project_id, name)
    }

    pub fn list_sub_agents(&self) -> Result<Vec<SubAgent>> {
        agent::list_sub_agents(&self.conn, &self.project_id)
    }

    pub fn set_agent_prompt(&self, id: &str, prompt: &str) -> Result<()> {
        agent::set_agent_prompt(&self.conn, id, prompt)
    }

    pub fn upsert_mcp_tool(&self, tool: &McpTool) -> Result<McpTool> {
        agent::upsert_mcp_tool(&self.conn, tool)
    }

    pub fn list_mcp_tools(&self) -> Result<Vec<McpTool>> {
        agent::list_mcp_tools(&self.conn, &self.project_id)
    }

    // --- Learnings owned by a task ---

    pub fn learnings_for_task(&self, task_id: &str) -> Result<Vec<Learning>> {
        learning::list(
            &self.conn,
            &LearningFilter {
                task_id: Some(task_id.to_string()),
                ..Default::default()
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use taskforge_types::EventType;

    fn new_task(title: &str) -> NewTask {
        NewTask {
            title: title.to_string(),
            ..Default::default()
        }
    }

    fn story_task(title: &str) -> NewTask {
        NewTask {
            title: title.to_string(),
            is_user_story: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_create_and_round_trip() {
        let mut db = Database::open_in_memory().unwrap();
        let task = db
            .insert_task_with_deps(
                &NewTask {
                    title: "Add login".to_string(),
                    description: "OAuth flow".to_string(),
                    tags: vec!["auth".to_string()],
                    ..Default::default()
                },
                &[],
            )
            .unwrap();

        let fetched = db.get_task(&task.id).unwrap().unwrap();
        assert_eq!(fetched.title, "Add login");
        assert_eq!(fetched.description, "OAuth flow");
        assert_eq!(fetched.status, TaskStatus::Backlog);
        assert_eq!(fetched.tags, vec!["auth".to_string()]);
        assert!(!fetched.is_user_story);
    }

    #[test]
    fn test_empty_title_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        let err = db.insert_task_with_deps(&new_task("  "), &[]).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_missing_dependency_rolls_back() {
        let mut db = Database::open_in_memory().unwrap();
        let err = db
            .insert_task_with_deps(&new_task("Orphan"), &["no-such-id".to_string()])
            .unwrap_err();
        assert!(matches!(err, Error::MissingDependency(_)));
        assert!(db.list_tasks(&TaskFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn test_cycle_rolls_back_new_task() {
        let mut db = Database::open_in_memory().unwrap();
        let a = db.insert_task_with_deps(&new_task("a"), &[]).unwrap();
        let b = db
            .insert_task_with_deps(&new_task("b"), &[a.id.clone()])
            .unwrap();

        // Making a depend on b closes a -> b -> a.
        let err = db
            .update_task(
                &a.id,
                &TaskPatch {
                    dependencies: Some(vec![b.id.clone()]),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::Cycle(_)));

        // And the rejected edge set is fully rolled back.
        assert!(db.task_dependencies(&a.id).unwrap().is_empty());
    }

    #[test]
    fn test_self_dependency_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        let a = db.insert_task_with_deps(&new_task("a"), &[]).unwrap();
        let err = db
            .update_task(
                &a.id,
                &TaskPatch {
                    dependencies: Some(vec![a.id.clone()]),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::Cycle(_)));
    }

    #[test]
    fn test_status_gating_on_incomplete_deps() {
        let mut db = Database::open_in_memory().unwrap();
        let dep = db.insert_task_with_deps(&new_task("dep"), &[]).unwrap();
        let task = db
            .insert_task_with_deps(
                &NewTask {
                    title: "blocked".to_string(),
                    status: Some(TaskStatus::Todo),
                    ..Default::default()
                },
                &[dep.id.clone()],
            )
            .unwrap();

        let err = db
            .update_task(
                &task.id,
                &TaskPatch {
                    status: Some(TaskStatus::InProgress),
                    ..Default::default()
                },
            )
            .unwrap_err();
        match err {
            Error::DependenciesNotDone { pending, .. } => assert_eq!(pending, vec![dep.id.clone()]),
            other => panic!("expected DependenciesNotDone, got {:?}", other),
        }

        // Complete the dependency; the gate opens.
        db.update_task(
            &dep.id,
            &TaskPatch {
                status: Some(TaskStatus::Todo),
                ..Default::default()
            },
        )
        .unwrap();
        db.update_task(
            &dep.id,
            &TaskPatch {
                status: Some(TaskStatus::InProgress),
                ..Default::default()
            },
        )
        .unwrap();
        db.update_task(
            &dep.id,
            &TaskPatch {
                status: Some(TaskStatus::Done),
                ..Default::default()
            },
        )
        .unwrap();
        let (task, _) = db
            .update_task(
                &task.id,
                &TaskPatch {
                    status: Some(TaskStatus::InProgress),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
    }

    #[test]
    fn test_invalid_transition() {
        let mut db = Database::open_in_memory().unwrap();
        let task = db.insert_task_with_deps(&new_task("t"), &[]).unwrap();
        let err = db
            .update_task(
                &task.id,
                &TaskPatch {
                    status: Some(TaskStatus::Done),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
    }

    #[test]
    fn test_delete_blocked_by_dependents() {
        let mut db = Database::open_in_memory().unwrap();
        let a = db.insert_task_with_deps(&new_task("a"), &[]).unwrap();
        let _b = db
            .insert_task_with_deps(&new_task("b"), &[a.id.clone()])
            .unwrap();

        let err = db.delete_task(&a.id).unwrap_err();
        assert!(matches!(err, Error::HasDependents { .. }));
        assert!(db.get_task(&a.id).unwrap().is_some());
    }

    #[test]
    fn test_update_emits_changes_record() {
        let mut db = Database::open_in_memory().unwrap();
        let task = db.insert_task_with_deps(&new_task("t"), &[]).unwrap();
        let (_, changes) = db
            .update_task(
                &task.id,
                &TaskPatch {
                    status: Some(TaskStatus::Todo),
                    title: Some("renamed".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(changes.contains_key("status"));
        assert!(changes.contains_key("title"));
        assert_eq!(changes.len(), 2);
    }

    #[test]
    fn test_story_status_derivation_flow() {
        let mut db = Database::open_in_memory().unwrap();
        let story = db.insert_task_with_deps(&story_task("story"), &[]).unwrap();
        let mut subs = Vec::new();
        for i in 0..3 {
            let sub = db
                .insert_task_with_deps(
                    &NewTask {
                        title: format!("sub {}", i),
                        user_story_id: Some(story.id.clone()),
                        ..Default::default()
                    },
                    &[],
                )
                .unwrap();
            subs.push(sub);
        }
        assert_eq!(
            db.require_task(&story.id).unwrap().status,
            TaskStatus::Backlog
        );

        // One sub-task starts: story follows.
        db.update_task(
            &subs[0].id,
            &TaskPatch {
                status: Some(TaskStatus::Todo),
                ..Default::default()
            },
        )
        .unwrap();
        db.update_task(
            &subs[0].id,
            &TaskPatch {
                status: Some(TaskStatus::InProgress),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(
            db.require_task(&story.id).unwrap().status,
            TaskStatus::InProgress
        );

        // That sub-task completes; the others are untouched backlog, so the
        // derived status falls back to backlog (1/3 done < 80%).
        db.update_task(
            &subs[0].id,
            &TaskPatch {
                status: Some(TaskStatus::Done),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(
            db.require_task(&story.id).unwrap().status,
            TaskStatus::Backlog
        );

        // Reverting the done sub-task re-derives without an
        // InvalidTransition on the story.
        db.update_task(
            &subs[0].id,
            &TaskPatch {
                status: Some(TaskStatus::InProgress),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(
            db.require_task(&story.id).unwrap().status,
            TaskStatus::InProgress
        );
    }

    #[test]
    fn test_delete_user_story_rules() {
        let mut db = Database::open_in_memory().unwrap();
        let story = db.insert_task_with_deps(&story_task("story"), &[]).unwrap();
        let sub = db
            .insert_task_with_deps(
                &NewTask {
                    title: "sub".to_string(),
                    user_story_id: Some(story.id.clone()),
                    ..Default::default()
                },
                &[],
            )
            .unwrap();
        let external = db
            .insert_task_with_deps(&new_task("external"), &[sub.id.clone()])
            .unwrap();

        // External dependents block even with force.
        let err = db.delete_user_story(&story.id, true).unwrap_err();
        match err {
            Error::ExternalDependents { dependents, .. } => {
                assert_eq!(dependents, vec![external.id.clone()])
            }
            other => panic!("expected ExternalDependents, got {:?}", other),
        }

        db.delete_task(&external.id).unwrap();

        // All-backlog story deletes without force.
        let deleted = db.delete_user_story(&story.id, false).unwrap();
        assert_eq!(deleted.deleted_story, story.id);
        assert_eq!(deleted.deleted_subtasks, vec![sub.id.clone()]);
        assert!(db.get_task(&story.id).unwrap().is_none());
        assert!(db.get_task(&sub.id).unwrap().is_none());
    }

    #[test]
    fn test_delete_user_story_completed_work_needs_force() {
        let mut db = Database::open_in_memory().unwrap();
        let story = db.insert_task_with_deps(&story_task("story"), &[]).unwrap();
        let sub = db
            .insert_task_with_deps(
                &NewTask {
                    title: "sub".to_string(),
                    status: Some(TaskStatus::Todo),
                    user_story_id: Some(story.id.clone()),
                    ..Default::default()
                },
                &[],
            )
            .unwrap();
        db.update_task(
            &sub.id,
            &TaskPatch {
                status: Some(TaskStatus::InProgress),
                ..Default::default()
            },
        )
        .unwrap();
        db.update_task(
            &sub.id,
            &TaskPatch {
                status: Some(TaskStatus::Done),
                ..Default::default()
            },
        )
        .unwrap();

        let err = db.delete_user_story(&story.id, false).unwrap_err();
        assert!(matches!(err, Error::HasCompletedWork { done_count: 1, .. }));

        db.delete_user_story(&story.id, true).unwrap();
        assert!(db.get_task(&story.id).unwrap().is_none());
    }

    #[test]
    fn test_safe_delete_by_status() {
        let mut db = Database::open_in_memory().unwrap();
        let story = db.insert_task_with_deps(&story_task("US"), &[]).unwrap();
        let mut subs = Vec::new();
        for i in 0..3 {
            subs.push(
                db.insert_task_with_deps(
                    &NewTask {
                        title: format!("sub {}", i),
                        status: Some(TaskStatus::Todo),
                        user_story_id: Some(story.id.clone()),
                        ..Default::default()
                    },
                    &[],
                )
                .unwrap(),
            );
        }
        // Complete one sub-task.
        db.update_task(
            &subs[0].id,
            &TaskPatch {
                status: Some(TaskStatus::InProgress),
                ..Default::default()
            },
        )
        .unwrap();
        db.update_task(
            &subs[0].id,
            &TaskPatch {
                status: Some(TaskStatus::Done),
                ..Default::default()
            },
        )
        .unwrap();
        // Park the others in backlog, like the story itself.
        for sub in &subs[1..] {
            db.update_task(
                &sub.id,
                &TaskPatch {
                    status: Some(TaskStatus::Backlog),
                    ..Default::default()
                },
            )
            .unwrap();
        }
        // Force the story row itself back to backlog for the filter.
        let b = db.insert_task_with_deps(&new_task("B"), &[]).unwrap();
        let story_row = db.require_task(&story.id).unwrap();
        assert_eq!(story_row.status, TaskStatus::Backlog);
        assert_eq!(b.status, TaskStatus::Backlog);

        let outcome = db.safe_delete_tasks_by_status(TaskStatus::Backlog).unwrap();

        assert!(outcome.deleted_ids.contains(&b.id));
        assert!(!outcome.deleted_ids.contains(&story.id));
        let preserved_story = outcome
            .preserved
            .iter()
            .find(|p| p.id == story.id)
            .expect("story preserved");
        assert_eq!(preserved_story.reason, "has completed work");
        assert_eq!(preserved_story.completion_percentage, Some(33.33));
        assert_eq!(preserved_story.done_tasks, Some(1));
        assert_eq!(preserved_story.total_tasks, Some(3));
        // The story's backlog sub-tasks survive with it.
        assert!(db.get_task(&subs[1].id).unwrap().is_some());
    }

    #[test]
    fn test_user_story_health() {
        let mut db = Database::open_in_memory().unwrap();
        let story = db.insert_task_with_deps(&story_task("US"), &[]).unwrap();
        for status in [TaskStatus::Todo, TaskStatus::Backlog] {
            db.insert_task_with_deps(
                &NewTask {
                    title: format!("sub {}", status.as_str()),
                    status: Some(status),
                    user_story_id: Some(story.id.clone()),
                    ..Default::default()
                },
                &[],
            )
            .unwrap();
        }

        let health = db.user_story_health().unwrap();
        assert_eq!(health.len(), 1);
        let row = &health[0];
        assert_eq!(row.total_subtasks, 2);
        assert_eq!(row.todo_count, 1);
        assert_eq!(row.backlog_count, 1);
        assert_eq!(row.suggested_status, TaskStatus::Todo);
        assert!(!row.status_mismatch); // insertion refresh already applied it
        assert!(row.safe_to_delete);
    }

    #[test]
    fn test_event_queue_contract() {
        let db = Database::open_in_memory().unwrap();
        db.append_event(&NewEvent::new(EventType::DecisionMade, json!({"n": 1})))
            .unwrap();
        db.append_event(&NewEvent::new(EventType::DecisionMade, json!({"n": 2})))
            .unwrap();

        let events = db.fetch_unprocessed_events(10).unwrap();
        assert_eq!(events.len(), 2);
        assert!(events[0].created_at <= events[1].created_at);

        // mark_processed is idempotent.
        assert!(db.mark_event_processed(events[0].id).unwrap());
        assert!(!db.mark_event_processed(events[0].id).unwrap());

        let remaining = db.fetch_unprocessed_events(10).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, events[1].id);

        // Purge with a zero threshold removes processed rows; twice is the
        // same as once.
        let purged = db.purge_old_processed_events(Duration::zero()).unwrap();
        assert_eq!(purged, 1);
        let purged_again = db.purge_old_processed_events(Duration::zero()).unwrap();
        assert_eq!(purged_again, 0);
    }

    #[test]
    fn test_learning_updates_pattern_frequency() {
        let mut db = Database::open_in_memory().unwrap();
        for learning_type in [
            taskforge_types::LearningType::Failure,
            taskforge_types::LearningType::Failure,
            taskforge_types::LearningType::Failure,
            taskforge_types::LearningType::Success,
        ] {
            db.add_learning(&NewLearning {
                task_id: None,
                context: "Task execution".to_string(),
                action: "Applied pattern: regex-parser".to_string(),
                result: "feedback".to_string(),
                lesson: "feedback".to_string(),
                learning_type: Some(learning_type),
                pattern: Some("regex-parser".to_string()),
                tags: vec![],
            })
            .unwrap();
        }

        let pf = db.pattern_frequency("regex-parser").unwrap().unwrap();
        assert_eq!(pf.frequency, 4);
        assert_eq!(pf.failure_count, 3);
        assert_eq!(pf.success_count, 1);
        assert_eq!(pf.improvement_count, 0);
        assert!(pf.first_seen.is_some());
        assert_eq!(pf.failure_rate(), 0.75);
    }

    #[test]
    fn test_resource_node_identity() {
        let db = Database::open_in_memory().unwrap();
        let first = db
            .upsert_resource_node(&NewResourceNode {
                resource_type: taskforge_types::ResourceType::File,
                name: "a.ts".to_string(),
                path: None,
            })
            .unwrap();
        let second = db
            .upsert_resource_node(&NewResourceNode {
                resource_type: taskforge_types::ResourceType::File,
                name: "a.ts".to_string(),
                path: Some("src/a.ts".to_string()),
            })
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.path.as_deref(), Some("src/a.ts"));
    }

    #[test]
    fn test_save_analysis_builds_graph() {
        let mut db = Database::open_in_memory().unwrap();
        let task = db.insert_task_with_deps(&new_task("t"), &[]).unwrap();

        let analysis: TaskAnalysis = serde_json::from_value(json!({
            "files_to_modify": [{"path": "src/auth.ts", "reason": "add reset", "risk": "medium"}],
            "files_to_create": [],
            "dependencies": [{"type": "file", "name": "a.ts", "action": "modifies"}],
            "risks": [],
            "related_code": [],
            "recommendations": ["keep functions small"]
        }))
        .unwrap();

        let nodes = db.save_task_analysis(&task.id, &analysis).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].name, "a.ts");

        let edges = db.resource_edges_for_task(&task.id).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].1, ResourceAction::Modifies);

        let stored = db.require_task(&task.id).unwrap();
        let stored_analysis = stored.analysis.expect("analysis stored");
        assert_eq!(stored_analysis.files_to_modify.len(), 1);
        assert_eq!(stored_analysis.recommendations.len(), 1);
    }

    #[test]
    fn test_deleting_task_cascades_edges_and_learnings() {
        let mut db = Database::open_in_memory().unwrap();
        let task = db.insert_task_with_deps(&new_task("t"), &[]).unwrap();
        let analysis: TaskAnalysis = serde_json::from_value(json!({
            "dependencies": [{"type": "file", "name": "a.ts", "action": "uses"}]
        }))
        .unwrap();
        db.save_task_analysis(&task.id, &analysis).unwrap();
        db.add_learning(&NewLearning {
            task_id: Some(task.id.clone()),
            context: "ctx".to_string(),
            action: "act".to_string(),
            result: "res".to_string(),
            lesson: "les".to_string(),
            learning_type: None,
            pattern: None,
            tags: vec![],
        })
        .unwrap();

        db.delete_task(&task.id).unwrap();
        assert!(db.resource_edges_for_task(&task.id).unwrap().is_empty());
        assert!(db.learnings_for_task(&task.id).unwrap().is_empty());
    }
}
