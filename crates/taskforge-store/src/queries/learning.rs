use chrono::{Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::json;
use taskforge_types::{EventType, Learning, LearningType, NewEvent, PatternFrequency};
use uuid::Uuid;

use super::{event, from_json, like_escape, now_ts, parse_opt_ts, parse_ts, to_json};
use crate::records::{LearningFilter, NewLearning, TrendingPattern};
use crate::{Error, Result};

/// Substring queries longer than this are truncated before matching.
const MAX_QUERY_LEN: usize = 100;

const LEARNING_COLUMNS: &str =
    "id, task_id, context, action, result, lesson, learning_type, pattern, tags, created_at";

fn raw_from_row(
    row: &Row,
) -> rusqlite::Result<(
    String,
    Option<String>,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    String,
    String,
)> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
    ))
}

#[allow(clippy::type_complexity)]
fn learning_from_raw(
    raw: (
        String,
        Option<String>,
        String,
        String,
        String,
        String,
        Option<String>,
        Option<String>,
        String,
        String,
    ),
) -> Result<Learning> {
    let (id, task_id, context, action, result, lesson, learning_type, pattern, tags, created_at) =
        raw;
    let learning_type = match learning_type {
        Some(t) => Some(
            LearningType::parse(&t)
                .ok_or_else(|| Error::Query(format!("Unknown learning type '{}'", t)))?,
        ),
        None => None,
    };
    Ok(Learning {
        id,
        task_id,
        context,
        action,
        result,
        lesson,
        learning_type,
        pattern,
        tags: from_json(&tags)?,
        created_at: parse_ts(&created_at)?,
    })
}

/// Insert a learning and bump its pattern aggregate in one transaction.
/// Exactly one of the per-type counters moves per call.
pub fn add(conn: &mut Connection, new: &NewLearning) -> Result<Learning> {
    let tx = conn.transaction()?;
    let id = Uuid::new_v4().to_string();
    let now = now_ts();

    tx.execute(
        &format!(
            "INSERT INTO learnings ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            LEARNING_COLUMNS
        ),
        params![
            id,
            new.task_id,
            new.context,
            new.action,
            new.result,
            new.lesson,
            new.learning_type.map(|t| t.as_str()),
            new.pattern,
            to_json(&new.tags)?,
            now,
        ],
    )?;

    if let Some(pattern) = &new.pattern {
        let (success, failure, improvement) = match new.learning_type {
            Some(LearningType::Success) => (1, 0, 0),
            Some(LearningType::Failure) => (0, 1, 0),
            Some(LearningType::Improvement) => (0, 0, 1),
            None => (0, 0, 0),
        };
        tx.execute(
            r#"
            INSERT INTO pattern_frequency
                (pattern, frequency, success_count, failure_count, improvement_count,
                 first_seen, last_seen)
            VALUES (?1, 1, ?2, ?3, ?4, ?5, ?5)
            ON CONFLICT(pattern) DO UPDATE SET
                frequency = frequency + 1,
                success_count = success_count + ?2,
                failure_count = failure_count + ?3,
                improvement_count = improvement_count + ?4,
                first_seen = COALESCE(first_seen, ?5),
                last_seen = ?5
            "#,
            params![pattern, success, failure, improvement, now],
        )?;
    }

    event::append(
        &tx,
        &NewEvent::new(
            EventType::FeedbackReceived,
            json!({
                "learning_id": id,
                "task_id": new.task_id,
                "pattern": new.pattern,
                "type": new.learning_type.map(|t| t.as_str()),
            }),
        ),
    )?;

    let learning = tx
        .query_row(
            &format!("SELECT {} FROM learnings WHERE id = ?1", LEARNING_COLUMNS),
            [&id],
            raw_from_row,
        )
        .map_err(Error::from)
        .and_then(learning_from_raw)?;

    tx.commit()?;
    Ok(learning)
}

/// Filtered search, newest first. The free-text query substring-matches
/// context, action and lesson, sanitised and truncated.
pub fn list(conn: &Connection, filter: &LearningFilter) -> Result<Vec<Learning>> {
    let mut where_clauses: Vec<String> = Vec::new();
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(ref contains) = filter.contains {
        let truncated: String = contains.chars().take(MAX_QUERY_LEN).collect();
        let pattern = format!("%{}%", like_escape(truncated.trim()));
        where_clauses.push(
            "(context LIKE ? ESCAPE '\\' OR action LIKE ? ESCAPE '\\' OR lesson LIKE ? ESCAPE '\\')"
                .to_string(),
        );
        params_vec.push(Box::new(pattern.clone()));
        params_vec.push(Box::new(pattern.clone()));
        params_vec.push(Box::new(pattern));
    }
    if let Some(ref task_id) = filter.task_id {
        where_clauses.push("task_id = ?".to_string());
        params_vec.push(Box::new(task_id.clone()));
    }
    if let Some(learning_type) = filter.learning_type {
        where_clauses.push("learning_type = ?".to_string());
        params_vec.push(Box::new(learning_type.as_str().to_string()));
    }
    if let Some(ref pattern) = filter.pattern {
        where_clauses.push("pattern = ?".to_string());
        params_vec.push(Box::new(pattern.clone()));
    }

    let where_clause = if where_clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", where_clauses.join(" AND "))
    };
    let limit_clause = filter
        .limit
        .map(|l| format!("LIMIT {}", l))
        .unwrap_or_default();

    let query = format!(
        "SELECT {} FROM learnings {} ORDER BY created_at DESC, id DESC {}",
        LEARNING_COLUMNS, where_clause, limit_clause
    );

    let mut stmt = conn.prepare(&query)?;
    let param_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let raws = stmt
        .query_map(param_refs.as_slice(), raw_from_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    raws.into_iter().map(learning_from_raw).collect()
}

fn frequency_from_row(row: &Row) -> rusqlite::Result<(String, u64, u64, u64, u64, Option<String>, Option<String>)> {
    Ok((
        row.get(0)?,
        row.get::<_, i64>(1)? as u64,
        row.get::<_, i64>(2)? as u64,
        row.get::<_, i64>(3)? as u64,
        row.get::<_, i64>(4)? as u64,
        row.get(5)?,
        row.get(6)?,
    ))
}

#[allow(clippy::type_complexity)]
fn frequency_from_raw(
    raw: (String, u64, u64, u64, u64, Option<String>, Option<String>),
) -> Result<PatternFrequency> {
    let (pattern, frequency, success_count, failure_count, improvement_count, first, last) = raw;
    Ok(PatternFrequency {
        pattern,
        frequency,
        success_count,
        failure_count,
        improvement_count,
        first_seen: parse_opt_ts(first)?,
        last_seen: parse_opt_ts(last)?,
    })
}

const FREQUENCY_COLUMNS: &str =
    "pattern, frequency, success_count, failure_count, improvement_count, first_seen, last_seen";

pub fn get_pattern(conn: &Connection, pattern: &str) -> Result<Option<PatternFrequency>> {
    let raw = conn
        .query_row(
            &format!(
                "SELECT {} FROM pattern_frequency WHERE pattern = ?1",
                FREQUENCY_COLUMNS
            ),
            [pattern],
            frequency_from_row,
        )
        .optional()?;
    raw.map(frequency_from_raw).transpose()
}

pub fn top_patterns(conn: &Connection, limit: usize) -> Result<Vec<PatternFrequency>> {
    let mut stmt = conn.prepare(&format!(
        r#"
        SELECT {}
        FROM pattern_frequency
        ORDER BY frequency DESC, last_seen DESC
        LIMIT ?1
        "#,
        FREQUENCY_COLUMNS
    ))?;
    let raws = stmt
        .query_map([limit as i64], frequency_from_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    raws.into_iter().map(frequency_from_raw).collect()
}

/// Aggregates at or above a frequency floor (input to failure detection).
pub fn patterns_with_min_frequency(
    conn: &Connection,
    min_occurrences: u64,
) -> Result<Vec<PatternFrequency>> {
    let mut stmt = conn.prepare(&format!(
        r#"
        SELECT {}
        FROM pattern_frequency
        WHERE frequency >= ?1
        ORDER BY frequency DESC
        "#,
        FREQUENCY_COLUMNS
    ))?;
    let raws = stmt
        .query_map([min_occurrences as i64], frequency_from_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    raws.into_iter().map(frequency_from_raw).collect()
}

/// Patterns ranked by learning count inside the recent window, merged with
/// their lifetime aggregate for the success rate.
pub fn trending(conn: &Connection, days: i64, limit: usize) -> Result<Vec<TrendingPattern>> {
    let cutoff = (Utc::now() - Duration::days(days)).to_rfc3339();
    let mut stmt = conn.prepare(
        r#"
        SELECT l.pattern, COUNT(*) AS recent_count
        FROM learnings l
        WHERE l.pattern IS NOT NULL AND l.created_at >= ?1
        GROUP BY l.pattern
        ORDER BY recent_count DESC
        LIMIT ?2
        "#,
    )?;
    let recent: Vec<(String, u64)> = stmt
        .query_map(params![cutoff, limit as i64], |row| {
            Ok((row.get(0)?, row.get::<_, i64>(1)? as u64))
        })?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    let mut trending = Vec::with_capacity(recent.len());
    for (pattern, recent_count) in recent {
        let aggregate = get_pattern(conn, &pattern)?;
        let (frequency, success_rate, last_seen) = match aggregate {
            Some(pf) => (
                pf.frequency,
                taskforge_types::round_rate(pf.success_rate()),
                pf.last_seen,
            ),
            None => (0, 0.0, None),
        };
        trending.push(TrendingPattern {
            pattern,
            recent_count,
            frequency,
            success_rate,
            last_seen,
        });
    }

    trending.sort_by(|a, b| {
        b.recent_count
            .cmp(&a.recent_count)
            .then_with(|| b.last_seen.cmp(&a.last_seen))
    });
    Ok(trending)
}
