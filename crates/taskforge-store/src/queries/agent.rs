use rusqlite::{params, Connection, OptionalExtension, Row};
use taskforge_types::{AgentType, McpTool, SubAgent, ToolType};
use uuid::Uuid;

use super::{from_json, to_json};
use crate::{Error, Result};

const AGENT_COLUMNS: &str =
    "id, project_id, name, agent_type, enabled, triggers, custom_prompt, configuration, priority";

fn agent_from_row(row: &Row) -> rusqlite::Result<(
    String,
    String,
    String,
    String,
    bool,
    String,
    Option<String>,
    String,
    i64,
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
    ))
}

#[allow(clippy::type_complexity)]
fn agent_from_raw(
    raw: (
        String,
        String,
        String,
        String,
        bool,
        String,
        Option<String>,
        String,
        i64,
    ),
) -> Result<SubAgent> {
    let (id, project_id, name, agent_type, enabled, triggers, custom_prompt, configuration, priority) =
        raw;
    Ok(SubAgent {
        id,
        project_id,
        name,
        agent_type: AgentType::parse(&agent_type)
            .ok_or_else(|| Error::Query(format!("Unknown agent type '{}'", agent_type)))?,
        enabled,
        triggers: from_json(&triggers)?,
        custom_prompt,
        configuration: from_json(&configuration)?,
        priority,
    })
}

/// Upsert by `(project_id, name, agent_type)` identity.
pub fn upsert_sub_agent(conn: &Connection, agent: &SubAgent) -> Result<SubAgent> {
    conn.execute(
        r#"
        INSERT INTO sub_agents (id, project_id, name, agent_type, enabled, triggers,
                                custom_prompt, configuration, priority)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(project_id, name, agent_type) DO UPDATE SET
            enabled = ?5,
            triggers = ?6,
            custom_prompt = COALESCE(?7, custom_prompt),
            configuration = ?8,
            priority = ?9
        "#,
        params![
            if agent.id.is_empty() {
                Uuid::new_v4().to_string()
            } else {
                agent.id.clone()
            },
            agent.project_id,
            agent.name,
            agent.agent_type.as_str(),
            agent.enabled,
            to_json(&agent.triggers)?,
            agent.custom_prompt,
            to_json(&agent.configuration)?,
            agent.priority,
        ],
    )?;

    let raw = conn.query_row(
        &format!(
            "SELECT {} FROM sub_agents WHERE project_id = ?1 AND name = ?2 AND agent_type = ?3",
            AGENT_COLUMNS
        ),
        params![agent.project_id, agent.name, agent.agent_type.as_str()],
        agent_from_row,
    )?;
    agent_from_raw(raw)
}

pub fn get_sub_agent(conn: &Connection, id: &str) -> Result<Option<SubAgent>> {
    let raw = conn
        .query_row(
            &format!("SELECT {} FROM sub_agents WHERE id = ?1", AGENT_COLUMNS),
            [id],
            agent_from_row,
        )
        .optional()?;
    raw.map(agent_from_raw).transpose()
}

pub fn find_sub_agent_by_name(
    conn: &Connection,
    project_id: &str,
    name: &str,
) -> Result<Option<SubAgent>> {
    let raw = conn
        .query_row(
            &format!(
                "SELECT {} FROM sub_agents WHERE project_id = ?1 AND name = ?2",
                AGENT_COLUMNS
            ),
            params![project_id, name],
            agent_from_row,
        )
        .optional()?;
    raw.map(agent_from_raw).transpose()
}

pub fn list_sub_agents(conn: &Connection, project_id: &str) -> Result<Vec<SubAgent>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM sub_agents WHERE project_id = ?1 ORDER BY priority DESC, name ASC",
        AGENT_COLUMNS
    ))?;
    let raws = stmt
        .query_map([project_id], agent_from_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    raws.into_iter().map(agent_from_raw).collect()
}

pub fn set_agent_prompt(conn: &Connection, id: &str, prompt: &str) -> Result<()> {
    let changed = conn.execute(
        "UPDATE sub_agents SET custom_prompt = ?2 WHERE id = ?1",
        params![id, prompt],
    )?;
    if changed == 0 {
        return Err(Error::NotFound(format!("Sub-agent {}", id)));
    }
    Ok(())
}

const TOOL_COLUMNS: &str = "id, project_id, name, tool_type, command, enabled, when_to_use, \
     priority, usage_count, success_count";

fn tool_from_row(row: &Row) -> rusqlite::Result<(
    String,
    String,
    String,
    String,
    String,
    bool,
    String,
    i64,
    u64,
    u64,
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
        row.get::<_, i64>(8)? as u64,
        row.get::<_, i64>(9)? as u64,
    ))
}

#[allow(clippy::type_complexity)]
fn tool_from_raw(
    raw: (
        String,
        String,
        String,
        String,
        String,
        bool,
        String,
        i64,
        u64,
        u64,
    ),
) -> Result<McpTool> {
    let (id, project_id, name, tool_type, command, enabled, when_to_use, priority, usage_count, success_count) =
        raw;
    Ok(McpTool {
        id,
        project_id,
        name,
        tool_type: ToolType::parse(&tool_type)
            .ok_or_else(|| Error::Query(format!("Unknown tool type '{}'", tool_type)))?,
        command,
        enabled,
        when_to_use: from_json(&when_to_use)?,
        priority,
        usage_count,
        success_count,
    })
}

/// Upsert by `(project_id, name)` identity.
pub fn upsert_mcp_tool(conn: &Connection, tool: &McpTool) -> Result<McpTool> {
    conn.execute(
        r#"
        INSERT INTO mcp_tools (id, project_id, name, tool_type, command, enabled,
                               when_to_use, priority, usage_count, success_count)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ON CONFLICT(project_id, name) DO UPDATE SET
            tool_type = ?4,
            command = ?5,
            enabled = ?6,
            when_to_use = ?7,
            priority = ?8
        "#,
        params![
            if tool.id.is_empty() {
                Uuid::new_v4().to_string()
            } else {
                tool.id.clone()
            },
            tool.project_id,
            tool.name,
            tool.tool_type.as_str(),
            tool.command,
            tool.enabled,
            to_json(&tool.when_to_use)?,
            tool.priority,
            tool.usage_count as i64,
            tool.success_count as i64,
        ],
    )?;

    let raw = conn.query_row(
        &format!(
            "SELECT {} FROM mcp_tools WHERE project_id = ?1 AND name = ?2",
            TOOL_COLUMNS
        ),
        params![tool.project_id, tool.name],
        tool_from_row,
    )?;
    tool_from_raw(raw)
}

pub fn list_mcp_tools(conn: &Connection, project_id: &str) -> Result<Vec<McpTool>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM mcp_tools WHERE project_id = ?1 ORDER BY priority DESC, name ASC",
        TOOL_COLUMNS
    ))?;
    let raws = stmt
        .query_map([project_id], tool_from_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    raws.into_iter().map(tool_from_raw).collect()
}
