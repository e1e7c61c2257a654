use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use taskforge_types::{
    EventType, NewEvent, ResourceAction, ResourceNode, ResourceType, TaskAnalysis,
};
use uuid::Uuid;

use super::{event, task};
use crate::records::{ConflictCandidate, NewResourceEdge, NewResourceNode};
use crate::{Error, Result};

fn node_from_parts(
    id: String,
    resource_type: String,
    name: String,
    path: Option<String>,
) -> Result<ResourceNode> {
    Ok(ResourceNode {
        id,
        resource_type: ResourceType::parse(&resource_type)
            .ok_or_else(|| Error::Query(format!("Unknown resource type '{}'", resource_type)))?,
        name,
        path,
    })
}

fn parse_action(raw: &str) -> Result<ResourceAction> {
    ResourceAction::parse(raw)
        .ok_or_else(|| Error::Query(format!("Unknown resource action '{}'", raw)))
}

/// Upsert by `(type, name)` identity. A later upsert may fill in a missing
/// path but never clears one.
pub fn upsert_node(conn: &Connection, new: &NewResourceNode) -> Result<ResourceNode> {
    conn.execute(
        r#"
        INSERT INTO resource_nodes (id, resource_type, name, path)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(resource_type, name) DO UPDATE SET
            path = COALESCE(?4, path)
        "#,
        params![
            Uuid::new_v4().to_string(),
            new.resource_type.as_str(),
            new.name,
            new.path
        ],
    )?;

    let (id, resource_type, name, path) = conn.query_row(
        r#"
        SELECT id, resource_type, name, path
        FROM resource_nodes
        WHERE resource_type = ?1 AND name = ?2
        "#,
        params![new.resource_type.as_str(), new.name],
        |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
            ))
        },
    )?;
    node_from_parts(id, resource_type, name, path)
}

pub fn get_node(conn: &Connection, id: &str) -> Result<Option<ResourceNode>> {
    let raw = conn
        .query_row(
            "SELECT id, resource_type, name, path FROM resource_nodes WHERE id = ?1",
            [id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            },
        )
        .optional()?;
    raw.map(|(id, t, n, p)| node_from_parts(id, t, n, p)).transpose()
}

/// Atomic delete-then-insert of a task's resource edges.
pub fn replace_task_edges(
    conn: &Connection,
    task_id: &str,
    edges: &[NewResourceEdge],
) -> Result<()> {
    conn.execute("DELETE FROM resource_edges WHERE task_id = ?1", [task_id])?;
    for edge in edges {
        conn.execute(
            r#"
            INSERT OR IGNORE INTO resource_edges (task_id, resource_id, action)
            VALUES (?1, ?2, ?3)
            "#,
            params![task_id, edge.resource_id, edge.action.as_str()],
        )?;
    }
    Ok(())
}

/// A task's resource graph: the nodes it touches with the touching action.
pub fn edges_for_task(
    conn: &Connection,
    task_id: &str,
) -> Result<Vec<(ResourceNode, ResourceAction)>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT n.id, n.resource_type, n.name, n.path, e.action
        FROM resource_edges e
        JOIN resource_nodes n ON n.id = e.resource_id
        WHERE e.task_id = ?1
        ORDER BY n.resource_type, n.name, e.action
        "#,
    )?;
    let raw: Vec<(String, String, String, Option<String>, String)> = stmt
        .query_map([task_id], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    raw.into_iter()
        .map(|(id, t, n, p, a)| Ok((node_from_parts(id, t, n, p)?, parse_action(&a)?)))
        .collect()
}

/// Tasks touching a resource, with their action.
pub fn usage(
    conn: &Connection,
    resource_id: &str,
) -> Result<Vec<(String, String, ResourceAction)>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT t.id, t.title, e.action
        FROM resource_edges e
        JOIN tasks t ON t.id = e.task_id
        WHERE e.resource_id = ?1
        ORDER BY t.created_at ASC
        "#,
    )?;
    let raw: Vec<(String, String, String)> = stmt
        .query_map([resource_id], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    raw.into_iter()
        .map(|(id, title, action)| Ok((id, title, parse_action(&action)?)))
        .collect()
}

/// For each resource this task touches, every edge held by another task
/// that is not yet done. Classification happens in the engine.
pub fn conflict_candidates(conn: &Connection, task_id: &str) -> Result<Vec<ConflictCandidate>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT other_t.id, other_t.title, n.id, n.name, mine.action, other.action
        FROM resource_edges mine
        JOIN resource_edges other
            ON other.resource_id = mine.resource_id AND other.task_id != mine.task_id
        JOIN tasks other_t ON other_t.id = other.task_id
        JOIN resource_nodes n ON n.id = mine.resource_id
        WHERE mine.task_id = ?1 AND other_t.status != 'done'
        ORDER BY n.name, other_t.created_at
        "#,
    )?;
    let raw: Vec<(String, String, String, String, String, String)> = stmt
        .query_map([task_id], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    raw.into_iter()
        .map(
            |(other_task_id, other_task_title, resource_id, resource_name, mine, other)| {
                Ok(ConflictCandidate {
                    other_task_id,
                    other_task_title,
                    resource_id,
                    resource_name,
                    my_action: parse_action(&mine)?,
                    other_action: parse_action(&other)?,
                })
            },
        )
        .collect()
}

/// Persist an analysis: upsert the referenced resource nodes, replace the
/// task's edges, and store the record verbatim on the task - one
/// transaction, one `task_updated` event.
pub fn save_task_analysis(
    conn: &mut Connection,
    task_id: &str,
    analysis: &TaskAnalysis,
) -> Result<Vec<ResourceNode>> {
    let tx = conn.transaction()?;
    task::require(&tx, task_id)?;

    let mut nodes = Vec::with_capacity(analysis.dependencies.len());
    let mut edges = Vec::with_capacity(analysis.dependencies.len());
    for dep in &analysis.dependencies {
        let node = upsert_node(
            &tx,
            &NewResourceNode {
                resource_type: dep.resource_type,
                name: dep.name.clone(),
                path: dep.path.clone(),
            },
        )?;
        edges.push(NewResourceEdge {
            resource_id: node.id.clone(),
            action: dep.action,
        });
        nodes.push(node);
    }
    replace_task_edges(&tx, task_id, &edges)?;
    task::set_analysis(&tx, task_id, analysis)?;

    event::append(
        &tx,
        &NewEvent::new(
            EventType::TaskUpdated,
            json!({
                "task_id": task_id,
                "update_type": "analysis_completed",
                "files_to_modify": analysis.files_to_modify.len(),
                "files_to_create": analysis.files_to_create.len(),
                "dependencies": analysis.dependencies.len(),
                "risks": analysis.risks.len(),
            }),
        ),
    )?;

    tx.commit()?;
    Ok(nodes)
}
