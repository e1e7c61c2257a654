use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::json;
use taskforge_types::{
    EventType, NewEvent, Priority, StoryMetadata, Task, TaskAnalysis, TaskCategory, TaskStatus,
};
use uuid::Uuid;

use super::{dependency, event, from_json, now_ts, parse_ts, story, to_json};
use crate::records::{ChangeSet, NewTask, TaskFilter, TaskPatch};
use crate::{Error, Result};

pub(crate) const TASK_COLUMNS: &str = "id, project_id, title, description, status, assignee, \
     priority, tags, category, is_user_story, user_story_id, story_metadata, analysis, \
     created_at, updated_at";

struct RawTask {
    id: String,
    project_id: String,
    title: String,
    description: String,
    status: String,
    assignee: Option<String>,
    priority: Option<String>,
    tags: String,
    category: Option<String>,
    is_user_story: bool,
    user_story_id: Option<String>,
    story_metadata: Option<String>,
    analysis: Option<String>,
    created_at: String,
    updated_at: String,
}

fn raw_from_row(row: &Row) -> rusqlite::Result<RawTask> {
    Ok(RawTask {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        status: row.get(4)?,
        assignee: row.get(5)?,
        priority: row.get(6)?,
        tags: row.get(7)?,
        category: row.get(8)?,
        is_user_story: row.get(9)?,
        user_story_id: row.get(10)?,
        story_metadata: row.get(11)?,
        analysis: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

fn task_from_raw(raw: RawTask) -> Result<Task> {
    let status = TaskStatus::parse(&raw.status)
        .ok_or_else(|| Error::Query(format!("Unknown task status '{}'", raw.status)))?;
    let priority = match raw.priority {
        Some(p) => Some(
            Priority::parse(&p).ok_or_else(|| Error::Query(format!("Unknown priority '{}'", p)))?,
        ),
        None => None,
    };
    let category = match raw.category {
        Some(c) => Some(
            TaskCategory::parse(&c)
                .ok_or_else(|| Error::Query(format!("Unknown category '{}'", c)))?,
        ),
        None => None,
    };
    let story_metadata: Option<StoryMetadata> =
        raw.story_metadata.as_deref().map(from_json).transpose()?;
    let analysis: Option<TaskAnalysis> = raw.analysis.as_deref().map(from_json).transpose()?;

    Ok(Task {
        id: raw.id,
        project_id: raw.project_id,
        title: raw.title,
        description: raw.description,
        status,
        assignee: raw.assignee,
        priority,
        tags: from_json(&raw.tags)?,
        category,
        is_user_story: raw.is_user_story,
        user_story_id: raw.user_story_id,
        story_metadata,
        analysis,
        created_at: parse_ts(&raw.created_at)?,
        updated_at: parse_ts(&raw.updated_at)?,
    })
}

pub fn get(conn: &Connection, id: &str) -> Result<Option<Task>> {
    let raw = conn
        .query_row(
            &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
            [id],
            raw_from_row,
        )
        .optional()?;
    raw.map(task_from_raw).transpose()
}

pub fn require(conn: &Connection, id: &str) -> Result<Task> {
    get(conn, id)?.ok_or_else(|| Error::NotFound(format!("Task {}", id)))
}

pub fn list(conn: &Connection, filter: &TaskFilter) -> Result<Vec<Task>> {
    let mut where_clauses: Vec<String> = Vec::new();
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(status) = filter.status {
        where_clauses.push("status = ?".to_string());
        params_vec.push(Box::new(status.as_str().to_string()));
    }
    if let Some(category) = filter.category {
        where_clauses.push("category = ?".to_string());
        params_vec.push(Box::new(category.as_str().to_string()));
    }
    if let Some(is_story) = filter.is_user_story {
        where_clauses.push("is_user_story = ?".to_string());
        params_vec.push(Box::new(is_story));
    }
    if let Some(ref story_id) = filter.user_story_id {
        where_clauses.push("user_story_id = ?".to_string());
        params_vec.push(Box::new(story_id.clone()));
    }

    let where_clause = if where_clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", where_clauses.join(" AND "))
    };

    let query = format!(
        "SELECT {} FROM tasks {} ORDER BY created_at ASC, id ASC",
        TASK_COLUMNS, where_clause
    );

    let mut stmt = conn.prepare(&query)?;
    let param_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let raws = stmt
        .query_map(param_refs.as_slice(), raw_from_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    raws.into_iter().map(task_from_raw).collect()
}

/// Atomic task insert with optional dependency edges. Rolls back whole on
/// any failure, so a cycle or missing dependency leaves no partial task.
pub fn insert_with_deps(
    conn: &mut Connection,
    project_id: &str,
    new: &NewTask,
    deps: &[String],
    done_threshold: f64,
    emit_created_event: bool,
) -> Result<Task> {
    if new.title.trim().is_empty() {
        return Err(Error::Validation("Task title must not be empty".into()));
    }
    if new.is_user_story && new.user_story_id.is_some() {
        return Err(Error::Validation(
            "A user story cannot itself belong to a user story".into(),
        ));
    }

    let tx = conn.transaction()?;

    if let Some(parent_id) = &new.user_story_id {
        let parent = require(&tx, parent_id)?;
        if !parent.is_user_story {
            return Err(Error::Validation(format!(
                "Task {} is not a user story",
                parent_id
            )));
        }
    }

    let id = Uuid::new_v4().to_string();
    let now = now_ts();
    let status = new.status.unwrap_or(TaskStatus::Backlog);

    tx.execute(
        r#"
        INSERT INTO tasks (id, project_id, title, description, status, assignee, priority,
                           tags, category, is_user_story, user_story_id, story_metadata,
                           created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
        "#,
        params![
            id,
            project_id,
            new.title,
            new.description,
            status.as_str(),
            new.assignee,
            new.priority.map(|p| p.as_str()),
            to_json(&new.tags)?,
            new.category.map(|c| c.as_str()),
            new.is_user_story,
            new.user_story_id,
            new.story_metadata.as_ref().map(to_json).transpose()?,
            now,
        ],
    )?;

    if !deps.is_empty() {
        dependency::insert_edges(&tx, &id, deps)?;
        if dependency::creates_cycle(&tx, &id)? {
            return Err(Error::Cycle(format!(
                "Dependencies of new task '{}' close a cycle",
                new.title
            )));
        }
    }

    if let Some(parent_id) = &new.user_story_id {
        story::refresh(&tx, parent_id, done_threshold)?;
    }

    if emit_created_event {
        let event_type = if new.is_user_story {
            EventType::UserStoryCreated
        } else {
            EventType::TaskCreated
        };
        event::append(
            &tx,
            &NewEvent::new(
                event_type,
                json!({
                    "task_id": id,
                    "title": new.title,
                    "status": status.as_str(),
                }),
            ),
        )?;
    }

    let task = require(&tx, &id)?;
    tx.commit()?;
    Ok(task)
}

/// Apply a partial update. Status changes run through the transition table
/// and the dependency gate; dependency replacement re-checks acyclicity.
/// Returns the updated task and the set of fields that actually changed.
pub fn update(
    conn: &mut Connection,
    id: &str,
    patch: &TaskPatch,
    done_threshold: f64,
) -> Result<(Task, ChangeSet)> {
    let tx = conn.transaction()?;
    let before = require(&tx, id)?;
    let mut changes = ChangeSet::new();

    if let Some(deps) = &patch.dependencies {
        let (added, removed) = dependency::replace_edges(&tx, id, deps)?;
        for dep in &added {
            event::append(
                &tx,
                &NewEvent::new(
                    EventType::DependencyAdded,
                    json!({ "task_id": id, "depends_on": dep }),
                ),
            )?;
        }
        for dep in &removed {
            event::append(
                &tx,
                &NewEvent::new(
                    EventType::DependencyRemoved,
                    json!({ "task_id": id, "depends_on": dep }),
                ),
            )?;
        }
        if !added.is_empty() || !removed.is_empty() {
            changes.insert(
                "dependencies".to_string(),
                json!({ "added": added, "removed": removed }),
            );
        }
    }

    if let Some(next_status) = patch.status {
        if !before.status.can_transition_to(next_status) {
            return Err(Error::InvalidTransition {
                from: before.status.as_str().to_string(),
                to: next_status.as_str().to_string(),
            });
        }
        if next_status == TaskStatus::InProgress && before.status != TaskStatus::InProgress {
            let pending = dependency::pending_deps(&tx, id)?;
            if !pending.is_empty() {
                return Err(Error::DependenciesNotDone {
                    task_id: id.to_string(),
                    pending,
                });
            }
        }
        if next_status != before.status {
            changes.insert(
                "status".to_string(),
                json!({ "from": before.status.as_str(), "to": next_status.as_str() }),
            );
        }
    }

    if let Some(title) = &patch.title {
        if title.trim().is_empty() {
            return Err(Error::Validation("Task title must not be empty".into()));
        }
        if *title != before.title {
            changes.insert(
                "title".to_string(),
                json!({ "from": before.title, "to": title }),
            );
        }
    }
    if let Some(description) = &patch.description {
        if *description != before.description {
            changes.insert("description".to_string(), json!({ "to": description }));
        }
    }
    if let Some(assignee) = &patch.assignee {
        if Some(assignee) != before.assignee.as_ref() {
            changes.insert(
                "assignee".to_string(),
                json!({ "from": before.assignee, "to": assignee }),
            );
        }
    }
    if let Some(priority) = patch.priority {
        if Some(priority) != before.priority {
            changes.insert(
                "priority".to_string(),
                json!({ "from": before.priority.map(|p| p.as_str()), "to": priority.as_str() }),
            );
        }
    }
    if let Some(tags) = &patch.tags {
        if *tags != before.tags {
            changes.insert("tags".to_string(), json!({ "to": tags }));
        }
    }
    if let Some(category) = patch.category {
        if Some(category) != before.category {
            changes.insert(
                "category".to_string(),
                json!({ "from": before.category.map(|c| c.as_str()), "to": category.as_str() }),
            );
        }
    }
    if patch.story_metadata.is_some() {
        changes.insert("story_metadata".to_string(), json!({ "replaced": true }));
    }

    let status = patch.status.unwrap_or(before.status);
    tx.execute(
        r#"
        UPDATE tasks
        SET title = ?2, description = ?3, status = ?4, assignee = ?5, priority = ?6,
            tags = ?7, category = ?8, story_metadata = ?9, updated_at = ?10
        WHERE id = ?1
        "#,
        params![
            id,
            patch.title.as_ref().unwrap_or(&before.title),
            patch.description.as_ref().unwrap_or(&before.description),
            status.as_str(),
            patch.assignee.as_ref().or(before.assignee.as_ref()),
            patch.priority.or(before.priority).map(|p| p.as_str()),
            to_json(patch.tags.as_ref().unwrap_or(&before.tags))?,
            patch.category.or(before.category).map(|c| c.as_str()),
            patch
                .story_metadata
                .as_ref()
                .or(before.story_metadata.as_ref())
                .map(to_json)
                .transpose()?,
            now_ts(),
        ],
    )?;

    if !changes.is_empty() {
        event::append(
            &tx,
            &NewEvent::new(
                EventType::TaskUpdated,
                json!({ "task_id": id, "changes": changes }),
            ),
        )?;
    }
    if let Some(change) = changes.get("status") {
        event::append(
            &tx,
            &NewEvent::new(
                EventType::StatusTransition,
                json!({ "task_id": id, "from": change["from"], "to": change["to"] }),
            ),
        )?;
        if let Some(parent_id) = &before.user_story_id {
            story::refresh(&tx, parent_id, done_threshold)?;
        }
    }

    let task = require(&tx, id)?;
    tx.commit()?;
    Ok((task, changes))
}

/// Delete a task. Fails when other tasks depend on it (or, for a user
/// story, when sub-tasks still reference it - use `delete_user_story`).
/// Resource edges, dependency edges and learnings cascade.
pub fn delete(conn: &mut Connection, id: &str, done_threshold: f64) -> Result<Task> {
    let tx = conn.transaction()?;
    let task = require(&tx, id)?;

    let mut dependents = dependency::dependents_of(&tx, id)?;
    if task.is_user_story {
        let mut stmt = tx.prepare("SELECT id FROM tasks WHERE user_story_id = ?1")?;
        let subs: Vec<String> = stmt
            .query_map([id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        dependents.extend(subs);
    }
    if !dependents.is_empty() {
        return Err(Error::HasDependents {
            task_id: id.to_string(),
            dependents,
        });
    }

    tx.execute("DELETE FROM tasks WHERE id = ?1", [id])?;

    if let Some(parent_id) = &task.user_story_id {
        story::refresh(&tx, parent_id, done_threshold)?;
    }

    event::append(
        &tx,
        &NewEvent::new(
            EventType::TaskDeleted,
            json!({ "task_id": id, "title": task.title }),
        ),
    )?;

    tx.commit()?;
    Ok(task)
}

/// Store the analysis record verbatim on the task.
pub(crate) fn set_analysis(conn: &Connection, id: &str, analysis: &TaskAnalysis) -> Result<()> {
    let changed = conn.execute(
        "UPDATE tasks SET analysis = ?2, updated_at = ?3 WHERE id = ?1",
        params![id, to_json(analysis)?, now_ts()],
    )?;
    if changed == 0 {
        return Err(Error::NotFound(format!("Task {}", id)));
    }
    Ok(())
}
