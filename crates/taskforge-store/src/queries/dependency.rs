use std::collections::HashSet;

use rusqlite::{params, Connection, OptionalExtension};

use crate::{Error, Result};

pub fn deps_of(conn: &Connection, task_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT depends_on_task_id
        FROM task_dependencies
        WHERE task_id = ?1
        ORDER BY depends_on_task_id
        "#,
    )?;
    let deps = stmt
        .query_map([task_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    Ok(deps)
}

pub fn dependents_of(conn: &Connection, task_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT task_id
        FROM task_dependencies
        WHERE depends_on_task_id = ?1
        ORDER BY task_id
        "#,
    )?;
    let dependents = stmt
        .query_map([task_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    Ok(dependents)
}

/// Dependency ids whose task is not yet done (gate for `in_progress`).
pub fn pending_deps(conn: &Connection, task_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT d.depends_on_task_id
        FROM task_dependencies d
        JOIN tasks t ON t.id = d.depends_on_task_id
        WHERE d.task_id = ?1 AND t.status != 'done'
        ORDER BY d.depends_on_task_id
        "#,
    )?;
    let pending = stmt
        .query_map([task_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    Ok(pending)
}

/// Walk the dependency closure from `start`; a path back to `start` means
/// the edges just written form a cycle. The graph was acyclic before the
/// current transaction touched only `start`'s outgoing edges, so any new
/// cycle must pass through `start`.
pub fn creates_cycle(conn: &Connection, start: &str) -> Result<bool> {
    let mut visited: HashSet<String> = HashSet::new();
    let mut stack = deps_of(conn, start)?;

    while let Some(current) = stack.pop() {
        if current == start {
            return Ok(true);
        }
        if visited.insert(current.clone()) {
            stack.extend(deps_of(conn, &current)?);
        }
    }
    Ok(false)
}

/// Insert dependency edges for a task, validating that every target exists
/// and no self-edge sneaks in. Call `creates_cycle` afterwards, inside the
/// same transaction.
pub fn insert_edges(conn: &Connection, task_id: &str, deps: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    for dep in deps {
        if dep == task_id {
            return Err(Error::Cycle(format!(
                "Task {} cannot depend on itself",
                task_id
            )));
        }
        if !seen.insert(dep.clone()) {
            continue;
        }
        let exists = conn
            .query_row("SELECT 1 FROM tasks WHERE id = ?1", [dep], |_| Ok(()))
            .optional()?
            .is_some();
        if !exists {
            return Err(Error::MissingDependency(dep.clone()));
        }
        conn.execute(
            r#"
            INSERT INTO task_dependencies (task_id, depends_on_task_id)
            VALUES (?1, ?2)
            "#,
            params![task_id, dep],
        )?;
    }
    Ok(())
}

/// Delete-then-insert a task's dependency set. Returns `(added, removed)`
/// edge targets for event emission.
pub fn replace_edges(
    conn: &Connection,
    task_id: &str,
    deps: &[String],
) -> Result<(Vec<String>, Vec<String>)> {
    let before: HashSet<String> = deps_of(conn, task_id)?.into_iter().collect();

    conn.execute(
        "DELETE FROM task_dependencies WHERE task_id = ?1",
        [task_id],
    )?;
    insert_edges(conn, task_id, deps)?;

    if creates_cycle(conn, task_id)? {
        return Err(Error::Cycle(format!(
            "Dependency set of task {} closes a cycle",
            task_id
        )));
    }

    let after: HashSet<String> = deps_of(conn, task_id)?.into_iter().collect();
    let added = after.difference(&before).cloned().collect();
    let removed = before.difference(&after).cloned().collect();
    Ok((added, removed))
}
