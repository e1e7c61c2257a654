use rusqlite::{params, Connection};
use serde_json::json;
use taskforge_types::{
    derive_story_status, EventType, NewEvent, StoryStatusCounts, Task, TaskStatus,
};

use super::{event, now_ts, task};
use crate::records::{DeletedStory, PreservedTask, SafeDeleteOutcome, StoryHealth, TaskFilter};
use crate::{Error, Result};

pub fn sub_task_ids(conn: &Connection, story_id: &str) -> Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT id FROM tasks WHERE user_story_id = ?1 ORDER BY created_at ASC")?;
    let ids = stmt
        .query_map([story_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    Ok(ids)
}

pub fn sub_tasks(conn: &Connection, story_id: &str) -> Result<Vec<Task>> {
    task::list(
        conn,
        &TaskFilter::default().sub_tasks_of(story_id.to_string()),
    )
}

pub fn counts(conn: &Connection, story_id: &str) -> Result<StoryStatusCounts> {
    let mut stmt = conn.prepare("SELECT status FROM tasks WHERE user_story_id = ?1")?;
    let statuses: Vec<String> = stmt
        .query_map([story_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    let mut counts = StoryStatusCounts::default();
    for s in statuses {
        let status = TaskStatus::parse(&s)
            .ok_or_else(|| Error::Query(format!("Unknown task status '{}'", s)))?;
        counts.add(status);
    }
    Ok(counts)
}

/// Re-derive a user story's status from its sub-tasks.
///
/// Applied as a derived-field refresh: writes the status column directly,
/// bypassing the transition table, so sub-task reverts can pull a story out
/// of `done`. Idempotent; does not recurse.
pub(crate) fn refresh(
    conn: &Connection,
    story_id: &str,
    done_threshold: f64,
) -> Result<Option<(TaskStatus, TaskStatus)>> {
    let story = task::require(conn, story_id)?;
    if !story.is_user_story {
        return Ok(None);
    }

    let counts = counts(conn, story_id)?;
    let Some(derived) = derive_story_status(&counts, done_threshold) else {
        return Ok(None);
    };
    if derived == story.status {
        return Ok(None);
    }

    conn.execute(
        "UPDATE tasks SET status = ?2, updated_at = ?3 WHERE id = ?1",
        params![story_id, derived.as_str(), now_ts()],
    )?;
    event::append(
        conn,
        &NewEvent::new(
            EventType::StatusTransition,
            json!({
                "task_id": story_id,
                "from": story.status.as_str(),
                "to": derived.as_str(),
                "trigger": "subtask_refresh",
            }),
        ),
    )?;
    Ok(Some((story.status, derived)))
}

/// Tasks outside the story (and not the story itself) depending on the
/// story or any of its sub-tasks.
fn external_dependents(conn: &Connection, story_id: &str, subs: &[String]) -> Result<Vec<String>> {
    let mut protected: Vec<String> = subs.to_vec();
    protected.push(story_id.to_string());

    let mut dependents = Vec::new();
    for target in &protected {
        let mut stmt = conn.prepare(
            "SELECT task_id FROM task_dependencies WHERE depends_on_task_id = ?1",
        )?;
        let rows: Vec<String> = stmt
            .query_map([target], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        for dep in rows {
            if !protected.contains(&dep) && !dependents.contains(&dep) {
                dependents.push(dep);
            }
        }
    }
    dependents.sort();
    Ok(dependents)
}

/// Delete a user story together with its sub-tasks.
///
/// Completed work blocks deletion unless forced; external dependents block
/// it unconditionally.
pub fn delete_user_story(conn: &mut Connection, id: &str, force: bool) -> Result<DeletedStory> {
    let tx = conn.transaction()?;
    let story = task::require(&tx, id)?;
    if !story.is_user_story {
        return Err(Error::Validation(format!("Task {} is not a user story", id)));
    }

    let subs = sub_tasks(&tx, id)?;
    let done_count = subs
        .iter()
        .filter(|t| t.status == TaskStatus::Done)
        .count();
    if done_count > 0 && !force {
        return Err(Error::HasCompletedWork {
            story_id: id.to_string(),
            done_count,
        });
    }

    let sub_ids: Vec<String> = subs.iter().map(|t| t.id.clone()).collect();
    let dependents = external_dependents(&tx, id, &sub_ids)?;
    if !dependents.is_empty() {
        return Err(Error::ExternalDependents {
            story_id: id.to_string(),
            dependents,
        });
    }

    // Internal dependency edges onto the doomed tasks must go first; the
    // cascade only covers edges owned by a deleted task.
    for target in sub_ids.iter().chain(std::iter::once(&id.to_string())) {
        tx.execute(
            "DELETE FROM task_dependencies WHERE depends_on_task_id = ?1",
            [target],
        )?;
    }
    for sub_id in &sub_ids {
        tx.execute("DELETE FROM tasks WHERE id = ?1", [sub_id])?;
    }
    tx.execute("DELETE FROM tasks WHERE id = ?1", [id])?;

    event::append(
        &tx,
        &NewEvent::new(
            EventType::UserStoryDeleted,
            json!({
                "story_id": id,
                "title": story.title,
                "deleted_subtasks": sub_ids,
            }),
        ),
    )?;

    tx.commit()?;
    Ok(DeletedStory {
        deleted_story: id.to_string(),
        deleted_subtasks: sub_ids,
    })
}

/// Per-row safe deletion of every task in the given status.
///
/// User stories keeping completed work and tasks with dependents are
/// preserved with a reason; everything else is deleted with its edges and
/// learnings. Decisions are made row by row in creation order.
pub fn safe_delete_by_status(
    conn: &mut Connection,
    status: TaskStatus,
    done_threshold: f64,
) -> Result<SafeDeleteOutcome> {
    let tx = conn.transaction()?;
    let candidates = task::list(&tx, &TaskFilter::default().status(status))?;
    let mut outcome = SafeDeleteOutcome::default();

    for candidate in candidates {
        // A sub-task deleted alongside its parent story earlier this pass.
        if task::get(&tx, &candidate.id)?.is_none() {
            continue;
        }

        if candidate.is_user_story {
            let story_counts = counts(&tx, &candidate.id)?;
            if story_counts.done > 0 {
                outcome.preserved.push(PreservedTask {
                    id: candidate.id.clone(),
                    title: candidate.title.clone(),
                    reason: "has completed work".to_string(),
                    completion_percentage: Some(story_counts.completion_percentage()),
                    done_tasks: Some(story_counts.done),
                    total_tasks: Some(story_counts.total),
                });
                continue;
            }
            let sub_ids = sub_task_ids(&tx, &candidate.id)?;
            let dependents = external_dependents(&tx, &candidate.id, &sub_ids)?;
            if !dependents.is_empty() {
                outcome.preserved.push(PreservedTask {
                    id: candidate.id.clone(),
                    title: candidate.title.clone(),
                    reason: "has external dependents".to_string(),
                    completion_percentage: None,
                    done_tasks: None,
                    total_tasks: None,
                });
                continue;
            }
            for target in sub_ids.iter().chain(std::iter::once(&candidate.id)) {
                tx.execute(
                    "DELETE FROM task_dependencies WHERE depends_on_task_id = ?1",
                    [target],
                )?;
            }
            for sub_id in &sub_ids {
                tx.execute("DELETE FROM tasks WHERE id = ?1", [sub_id])?;
                outcome.deleted_ids.push(sub_id.clone());
            }
            tx.execute("DELETE FROM tasks WHERE id = ?1", [&candidate.id])?;
            outcome.deleted_ids.push(candidate.id.clone());
            continue;
        }

        // Sub-tasks ride with their story: while the parent is kept for its
        // completed work, its remaining sub-tasks stay too (and are not
        // listed individually).
        if let Some(parent_id) = &candidate.user_story_id {
            let parent_counts = counts(&tx, parent_id)?;
            if parent_counts.done > 0 {
                continue;
            }
        }

        let dependents = super::dependency::dependents_of(&tx, &candidate.id)?;
        if !dependents.is_empty() {
            outcome.preserved.push(PreservedTask {
                id: candidate.id.clone(),
                title: candidate.title.clone(),
                reason: "has external dependents".to_string(),
                completion_percentage: None,
                done_tasks: None,
                total_tasks: None,
            });
            continue;
        }

        tx.execute("DELETE FROM tasks WHERE id = ?1", [&candidate.id])?;
        outcome.deleted_ids.push(candidate.id.clone());
        if let Some(parent_id) = &candidate.user_story_id {
            refresh(&tx, parent_id, done_threshold)?;
        }
    }

    if !outcome.deleted_ids.is_empty() {
        event::append(
            &tx,
            &NewEvent::new(
                EventType::TaskDeleted,
                json!({
                    "bulk": true,
                    "status": status.as_str(),
                    "deleted_ids": outcome.deleted_ids,
                }),
            ),
        )?;
    }

    tx.commit()?;
    Ok(outcome)
}

/// Health view across every user story.
pub fn health(conn: &Connection, done_threshold: f64) -> Result<Vec<StoryHealth>> {
    let stories = task::list(conn, &TaskFilter::default().user_stories())?;
    let mut rows = Vec::with_capacity(stories.len());

    for story in stories {
        let story_counts = counts(conn, &story.id)?;
        let suggested =
            derive_story_status(&story_counts, done_threshold).unwrap_or(story.status);
        let sub_ids = sub_task_ids(conn, &story.id)?;
        let externals = external_dependents(conn, &story.id, &sub_ids)?;

        rows.push(StoryHealth {
            id: story.id,
            title: story.title,
            current_status: story.status,
            suggested_status: suggested,
            total_subtasks: story_counts.total,
            done_count: story_counts.done,
            in_progress_count: story_counts.in_progress,
            todo_count: story_counts.todo,
            backlog_count: story_counts.backlog,
            completion_percentage: story_counts.completion_percentage(),
            status_mismatch: suggested != story.status,
            safe_to_delete: story_counts.done == 0 && externals.is_empty(),
        });
    }
    Ok(rows)
}
