use std::time::Duration;

use serde_json::json;
use taskforge_providers::MockCompleter;
use taskforge_runtime::{CreateTaskInput, FeedbackInput, TaskPatch, Taskforge};
use taskforge_types::{EventType, LearningType, RiskLevel, TaskStatus};

fn create_task(rt: &Taskforge, title: &str) -> String {
    rt.tasks()
        .create(CreateTaskInput {
            title: title.to_string(),
            description: format!("{} description", title),
            ..Default::default()
        })
        .unwrap()
        .task
        .id
}

fn analysis_touching(file: &str, action: &str) -> taskforge_types::TaskAnalysis {
    serde_json::from_value(json!({
        "files_to_modify": [{"path": file, "reason": "edit", "risk": "medium"}],
        "dependencies": [{"type": "file", "name": file, "action": action}],
    }))
    .unwrap()
}

#[test]
fn test_analysis_to_execution_flow() {
    let rt = Taskforge::open_in_memory().unwrap();
    let task_id = create_task(&rt, "Add reset endpoint");

    // Execution prompt before analysis is a NotAnalyzed error.
    let err = rt.workflow().execution_prompt(&task_id).unwrap_err();
    assert_eq!(err.kind(), "NotAnalyzed");

    let prepared = rt.workflow().prepare_task(&task_id).unwrap();
    assert_eq!(prepared.next_steps.next_tool, "save_task_analysis");
    assert!(!prepared.prompt.is_empty());
    assert!(!prepared.search_patterns.is_empty());

    let saved = rt
        .graph()
        .save_analysis(&task_id, analysis_touching("a.ts", "modifies"))
        .unwrap();
    assert_eq!(saved.next_steps.next_tool, "get_execution_prompt");

    // One resource node with identity (file, a.ts), one modifies edge.
    let graph = rt.graph().dependency_graph(&task_id).unwrap();
    assert_eq!(graph.nodes.len(), 1);
    assert_eq!(graph.nodes[0].name, "a.ts");
    assert_eq!(graph.edges.len(), 1);

    let execution = rt.workflow().execution_prompt(&task_id).unwrap();
    assert!(execution.prompt.contains("a.ts"));
    assert_eq!(execution.next_steps.next_tool, "update_task");
    assert_eq!(execution.context.files_to_modify, 1);
}

#[test]
fn test_conflict_detection_clears_when_other_task_done() {
    let rt = Taskforge::open_in_memory().unwrap();
    let t1 = create_task(&rt, "Task one");
    let t2 = create_task(&rt, "Task two");

    rt.graph()
        .save_analysis(&t1, analysis_touching("auth.ts", "modifies"))
        .unwrap();
    rt.graph()
        .save_analysis(&t2, analysis_touching("auth.ts", "modifies"))
        .unwrap();

    let conflicts = rt.graph().conflicts(&t1).unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].severity, RiskLevel::High);
    assert_eq!(conflicts[0].resource_name, "auth.ts");

    // Completing the other task clears the conflict.
    for status in [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done] {
        rt.tasks()
            .update(
                &t2,
                &TaskPatch {
                    status: Some(status),
                    ..Default::default()
                },
            )
            .unwrap();
    }
    assert!(rt.graph().conflicts(&t1).unwrap().is_empty());
}

#[test]
fn test_high_conflict_emits_guardian_intervention() {
    let rt = Taskforge::open_in_memory().unwrap();
    let t1 = create_task(&rt, "Task one");
    let t2 = create_task(&rt, "Task two");

    rt.graph()
        .save_analysis(&t1, analysis_touching("auth.ts", "modifies"))
        .unwrap();
    rt.graph()
        .save_analysis(&t2, analysis_touching("auth.ts", "modifies"))
        .unwrap();

    let events = rt.events().fetch_unprocessed(100).unwrap();
    let guardian: Vec<_> = events
        .iter()
        .filter(|e| e.event_type == EventType::GuardianIntervention)
        .collect();
    assert_eq!(guardian.len(), 1);
    assert_eq!(guardian[0].payload["task_id"], t2);
}

#[test]
fn test_feedback_risk_classification() {
    let rt = Taskforge::open_in_memory().unwrap();
    let task_id = create_task(&rt, "Parse config");

    for (learning_type, feedback) in [
        (LearningType::Failure, "broke on nested groups"),
        (LearningType::Failure, "catastrophic backtracking"),
        (LearningType::Failure, "missed unicode case"),
        (LearningType::Success, "worked for the simple case"),
    ] {
        rt.learnings()
            .add_feedback(FeedbackInput {
                task_id: task_id.clone(),
                feedback: feedback.to_string(),
                learning_type,
                pattern: "regex-parser".to_string(),
                tags: vec![],
            })
            .unwrap();
    }

    let risk = rt.learnings().check_pattern_risk("regex-parser").unwrap();
    assert_eq!(risk.failure_rate, 0.75);
    assert_eq!(risk.risk_level, Some(RiskLevel::High));
    assert!(risk.is_risky);

    let detected = rt.learnings().detect_failure_patterns(3, 0.5).unwrap();
    assert_eq!(detected.len(), 1);
    assert_eq!(detected[0].pattern, "regex-parser");

    // Below the occurrence floor nothing is reported.
    assert!(rt.learnings().detect_failure_patterns(5, 0.5).unwrap().is_empty());
}

const DECOMPOSITION_JSON: &str = r#"[
    {"title": "Add reset request endpoint", "description": "POST /api/password-reset with rate limiting",
     "complexity": "medium", "estimated_hours": 3, "dependencies": [], "tags": ["api", "backend"]},
    {"title": "Create reset token model", "description": "Database table and expiry for reset tokens",
     "complexity": "simple", "estimated_hours": 2, "dependencies": [], "tags": ["database"]},
    {"title": "Send reset email", "description": "Email template and delivery via the mailer",
     "complexity": "medium", "estimated_hours": 2,
     "dependencies": ["Add reset request endpoint", "Create reset token model"], "tags": ["email"]}
]"#;

#[tokio::test]
async fn test_story_decomposition_with_suggestions() {
    let rt = Taskforge::open_in_memory().unwrap();
    let completer = MockCompleter::single(format!("```json\n{}\n```", DECOMPOSITION_JSON));

    let result = rt
        .decomposer()
        .decompose("User should be able to reset password via email", &completer)
        .await
        .unwrap();

    assert!(result.success);
    assert!(result.tasks.len() >= 3);
    assert!(result.story_task.is_user_story);
    assert_eq!(result.story_task.user_story_id, None);
    assert_eq!(result.total_estimated_hours, 7.0);

    // Every sub-task links back and carries a bounded-confidence agent.
    for task in &result.tasks {
        assert_eq!(task.user_story_id.as_deref(), Some(result.story_task.id.as_str()));
        let meta = task.story_metadata.as_ref().expect("story metadata");
        let agent = meta.suggested_agent.as_ref().expect("suggested agent");
        assert!(agent.confidence <= 0.95);
        assert!(agent.confidence >= 0.2);
    }

    // The recommended order starts with a dependency-free task.
    let first = rt
        .tasks()
        .get(&result.recommended_analysis_order[0])
        .unwrap();
    let first_deps = rt.tasks().context(&first.id).unwrap().dependencies;
    assert!(first_deps.is_empty());

    // Exactly one counted user_story_created event.
    let events = rt.events().fetch_unprocessed(100).unwrap();
    let story_events: Vec<_> = events
        .iter()
        .filter(|e| e.event_type == EventType::UserStoryCreated)
        .collect();
    assert_eq!(story_events.len(), 1);
    assert_eq!(story_events[0].payload["task_count"], 3);
}

#[tokio::test(start_paused = true)]
async fn test_decompose_timeout() {
    let rt = Taskforge::open_in_memory().unwrap();
    let completer =
        MockCompleter::single("[]".to_string()).with_delay(Duration::from_secs(3600));

    let err = rt
        .decomposer()
        .decompose("Some story", &completer)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "UpstreamTimeout");

    // Nothing was written.
    assert!(rt.stories().list().unwrap().is_empty());
}

#[tokio::test]
async fn test_decompose_upstream_error() {
    let rt = Taskforge::open_in_memory().unwrap();
    let completer = MockCompleter::failing("api unavailable");
    let err = rt
        .decomposer()
        .decompose("Some story", &completer)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "UpstreamError");
}

#[tokio::test]
async fn test_decompose_rejects_garbage_output() {
    let rt = Taskforge::open_in_memory().unwrap();
    let completer = MockCompleter::single("I could not produce JSON, sorry.");
    let err = rt
        .decomposer()
        .decompose("Some story", &completer)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "ParseError");
}

#[test]
fn test_intelligent_decomposition_round_trip() {
    let rt = Taskforge::open_in_memory().unwrap();
    let intelligent = rt
        .decomposer()
        .intelligent_prompt("Reset password via email")
        .unwrap();
    assert_eq!(intelligent.next_steps.next_tool, "save_story_decomposition");
    assert!(intelligent.prompt.contains("JSON array"));

    let specs = taskforge_engine::parse_decomposition(DECOMPOSITION_JSON).unwrap();
    let result = rt
        .decomposer()
        .save_decomposition("Reset password via email", &specs)
        .unwrap();
    assert_eq!(result.tasks.len(), 3);
    assert_eq!(
        result.dependency_map["Send reset email"],
        vec!["Add reset request endpoint", "Create reset token model"]
    );
}

#[test]
fn test_suggestions_deterministic_and_bounded() {
    let rt = Taskforge::open_in_memory().unwrap();
    let task_id = create_task(&rt, "Write schema migration for users table");

    let first = rt.suggestions().agents_for_task(&task_id).unwrap();
    let second = rt.suggestions().agents_for_task(&task_id).unwrap();
    assert_eq!(first.len(), second.len());
    assert_eq!(first[0].name, second[0].name);
    assert!(first.iter().all(|s| s.confidence <= 0.95 && s.confidence >= 0.2));

    let tools = rt.suggestions().tools_for_task(&task_id).unwrap();
    assert!(tools.len() <= 3);
}

#[test]
fn test_event_poller_contract() {
    let rt = Taskforge::open_in_memory().unwrap();
    create_task(&rt, "Some task");

    let events = rt.events().fetch_unprocessed(10).unwrap();
    assert!(!events.is_empty());
    let first = events[0].id;

    assert!(rt.events().mark_processed(first).unwrap());
    assert!(!rt.events().mark_processed(first).unwrap());

    let stats = rt.events().stats().unwrap();
    assert_eq!(stats.processed, 1);

    // Purge with zero age removes the processed event; a second purge is a
    // no-op.
    assert_eq!(rt.events().purge(Some(0)).unwrap(), 1);
    assert_eq!(rt.events().purge(Some(0)).unwrap(), 0);
}

#[test]
fn test_project_initialize_is_idempotent() {
    let rt = Taskforge::open_in_memory().unwrap();
    let initialized = rt
        .project()
        .initialize_configuration(Some("demo"), None)
        .unwrap();
    assert!(initialized.guidelines_added > 0);
    assert!(initialized.agents_added > 0);
    assert!(initialized.templates_added > 0);

    let again = rt.project().initialize_configuration(None, None).unwrap();
    assert_eq!(again.guidelines_added, 0);
    assert_eq!(again.agents_added, 0);
    assert_eq!(again.templates_added, 0);

    let info = rt.project().info().unwrap();
    assert_eq!(info.project.name, "demo");
    assert!(info.sub_agents > 0);
}

#[test]
fn test_render_template() {
    let rt = Taskforge::open_in_memory().unwrap();
    rt.project()
        .add_template(
            "greeting",
            None,
            "Implement {{feature}} for {{audience}}",
            &[],
        )
        .unwrap();

    let rendered = rt
        .project()
        .render_template("greeting", &json!({"feature": "reset"}))
        .unwrap();
    assert_eq!(rendered.rendered, "Implement reset for {{audience}}");
    assert_eq!(rendered.unresolved_variables, vec!["audience"]);

    let err = rt
        .project()
        .render_template("missing", &json!({}))
        .unwrap_err();
    assert_eq!(err.kind(), "NotFound");
}

#[test]
fn test_knowledge_caches_invalidate_on_write() {
    let rt = Taskforge::open_in_memory().unwrap();

    // Each read populates its cache; the write must invalidate it, so the
    // follow-up read sees the new row instead of the cached empty list.
    assert!(rt.project().list_templates().unwrap().is_empty());
    rt.project()
        .add_template("cache-check", None, "body {{x}}", &[])
        .unwrap();
    assert_eq!(rt.project().list_templates().unwrap().len(), 1);

    assert!(rt.project().list_code_patterns().unwrap().is_empty());
    rt.project()
        .add_code_pattern("cache-check", "pattern body", None, &[])
        .unwrap();
    assert_eq!(rt.project().list_code_patterns().unwrap().len(), 1);

    let task_id = create_task(&rt, "Cache check task");
    assert!(rt.learnings().list(Some(10)).unwrap().is_empty());
    rt.learnings()
        .add_feedback(FeedbackInput {
            task_id,
            feedback: "went fine".to_string(),
            learning_type: LearningType::Success,
            pattern: "cache-check".to_string(),
            tags: vec![],
        })
        .unwrap();
    assert_eq!(rt.learnings().list(Some(10)).unwrap().len(), 1);
}

#[test]
fn test_get_relevant_knowledge_merges_sources() {
    let rt = Taskforge::open_in_memory().unwrap();
    rt.project()
        .add_template("migration-plan", None, "Plan the database migration", &[])
        .unwrap();
    rt.project()
        .add_code_pattern("repo-pattern", "Repository pattern for database access", None, &[])
        .unwrap();
    let task_id = create_task(&rt, "Tune database indexes");
    rt.learnings()
        .add_feedback(FeedbackInput {
            task_id,
            feedback: "database index rebuild locked the table".to_string(),
            learning_type: LearningType::Failure,
            pattern: "index-rebuild".to_string(),
            tags: vec![],
        })
        .unwrap();

    let knowledge = rt.learnings().relevant_knowledge("database migration").unwrap();
    assert_eq!(knowledge.templates.len(), 1);
    assert_eq!(knowledge.patterns.len(), 1);
    assert_eq!(knowledge.learnings.len(), 1);
}

#[test]
fn test_sync_agent_files() {
    let rt = Taskforge::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("database-guardian.md"),
        "---\nname: database-guardian\ndescription: Reviews schema migration changes\nmodel: sonnet\ntools:\n  - Read\ncolor: blue\n---\nReview all database changes.\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not an agent file").unwrap();

    let synced = rt.agents().sync_agent_files(dir.path()).unwrap();
    assert_eq!(synced.synced, 1);
    let agent = &synced.agents[0];
    assert_eq!(agent.name, "database-guardian");
    assert_eq!(agent.custom_prompt.as_deref(), Some("Review all database changes.\n"));
    assert_eq!(agent.configuration["yaml_config"]["color"], "blue");
    assert!(agent.triggers.contains(&"schema".to_string()));
}
