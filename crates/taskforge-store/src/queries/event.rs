use chrono::{Duration, Utc};
use rusqlite::{params, Connection};
use taskforge_types::{EventType, NewEvent, QueuedEvent};

use super::{from_json, now_ts, parse_opt_ts, parse_ts, to_json};
use crate::records::EventStats;
use crate::{Error, Result};

/// Append an event row. Called from inside entity transactions so the event
/// commits with the write it describes.
pub fn append(conn: &Connection, event: &NewEvent) -> Result<i64> {
    conn.execute(
        r#"
        INSERT INTO event_queue (event_type, payload, processed, created_at)
        VALUES (?1, ?2, 0, ?3)
        "#,
        params![
            event.event_type.as_str(),
            to_json(&event.payload)?,
            now_ts()
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Oldest unprocessed events, `created_at` ascending.
pub fn fetch_unprocessed(conn: &Connection, limit: usize) -> Result<Vec<QueuedEvent>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, event_type, payload, processed, created_at, processed_at
        FROM event_queue
        WHERE processed = 0
        ORDER BY created_at ASC, id ASC
        LIMIT ?1
        "#,
    )?;

    let raw: Vec<(i64, String, String, bool, String, Option<String>)> = stmt
        .query_map([limit as i64], |row| {
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
        .map(|(id, event_type, payload, processed, created_at, processed_at)| {
            Ok(QueuedEvent {
                id,
                event_type: EventType::parse(&event_type)
                    .ok_or_else(|| Error::Query(format!("Unknown event type '{}'", event_type)))?,
                payload: from_json(&payload)?,
                processed,
                created_at: parse_ts(&created_at)?,
                processed_at: parse_opt_ts(processed_at)?,
            })
        })
        .collect()
}

/// Idempotent: marking an already-processed event is a no-op. The flag only
/// ever flips false -> true.
pub fn mark_processed(conn: &Connection, id: i64) -> Result<bool> {
    let changed = conn.execute(
        r#"
        UPDATE event_queue
        SET processed = 1, processed_at = ?2
        WHERE id = ?1 AND processed = 0
        "#,
        params![id, now_ts()],
    )?;
    Ok(changed > 0)
}

/// Remove processed events older than the threshold. Idempotent.
pub fn purge_old_processed(conn: &Connection, age: Duration) -> Result<usize> {
    let cutoff = (Utc::now() - age).to_rfc3339();
    let removed = conn.execute(
        r#"
        DELETE FROM event_queue
        WHERE processed = 1 AND created_at < ?1
        "#,
        [cutoff],
    )?;
    Ok(removed)
}

pub fn stats(conn: &Connection) -> Result<EventStats> {
    let (total, unprocessed): (u64, u64) = conn.query_row(
        r#"
        SELECT COUNT(*), COALESCE(SUM(CASE WHEN processed = 0 THEN 1 ELSE 0 END), 0)
        FROM event_queue
        "#,
        [],
        |row| {
            Ok((
                row.get::<_, i64>(0)? as u64,
                row.get::<_, i64>(1)? as u64,
            ))
        },
    )?;
    Ok(EventStats {
        total,
        unprocessed,
        processed: total - unprocessed,
    })
}
