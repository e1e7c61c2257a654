use rusqlite::Connection;

use crate::Result;

// Schema version (increment when changing table definitions)
pub const SCHEMA_VERSION: i32 = 3;

// NOTE: Storage Design Rationale
//
// Why JSON columns for tags/metadata/analysis?
// - The analysis record is stored verbatim and never queried field-by-field
// - Tag sets are small and only ever read whole
// - Keeps the row layout stable while the analysis shape evolves
//
// Why an event_queue table in the same database?
// - Events ride the entity transaction, so a committed write can never
//   be observed without its event (transactional outbox)
// - Pollers mark rows processed; a purge job bounds table growth
//
// Why in-engine invariant checks instead of triggers?
// - Cycle detection and transition legality need graph reads SQLite
//   triggers cannot express cleanly
// - Checks run inside the same transaction as the write, which gives the
//   same guarantee

pub fn init_schema(conn: &Connection) -> Result<()> {
    let current_version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if current_version != SCHEMA_VERSION {
        drop_all_tables(conn)?;
    }

    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL REFERENCES projects(id),
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL,
            assignee TEXT,
            priority TEXT,
            tags TEXT NOT NULL DEFAULT '[]',
            category TEXT,
            is_user_story INTEGER NOT NULL DEFAULT 0,
            user_story_id TEXT REFERENCES tasks(id),
            story_metadata TEXT,
            analysis TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS task_dependencies (
            task_id TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
            depends_on_task_id TEXT NOT NULL REFERENCES tasks(id),
            PRIMARY KEY (task_id, depends_on_task_id)
        );

        CREATE TABLE IF NOT EXISTS resource_nodes (
            id TEXT PRIMARY KEY,
            resource_type TEXT NOT NULL,
            name TEXT NOT NULL,
            path TEXT,
            UNIQUE (resource_type, name)
        );

        CREATE TABLE IF NOT EXISTS resource_edges (
            task_id TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
            resource_id TEXT NOT NULL REFERENCES resource_nodes(id),
            action TEXT NOT NULL,
            PRIMARY KEY (task_id, resource_id, action)
        );

        CREATE TABLE IF NOT EXISTS learnings (
            id TEXT PRIMARY KEY,
            task_id TEXT REFERENCES tasks(id) ON DELETE CASCADE,
            context TEXT NOT NULL,
            action TEXT NOT NULL,
            result TEXT NOT NULL,
            lesson TEXT NOT NULL,
            learning_type TEXT,
            pattern TEXT,
            tags TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS pattern_frequency (
            pattern TEXT PRIMARY KEY,
            frequency INTEGER NOT NULL DEFAULT 0,
            success_count INTEGER NOT NULL DEFAULT 0,
            failure_count INTEGER NOT NULL DEFAULT 0,
            improvement_count INTEGER NOT NULL DEFAULT 0,
            first_seen TEXT,
            last_seen TEXT
        );

        CREATE TABLE IF NOT EXISTS event_queue (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_type TEXT NOT NULL,
            payload TEXT NOT NULL,
            processed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            processed_at TEXT
        );

        CREATE TABLE IF NOT EXISTS sub_agents (
            id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL REFERENCES projects(id),
            name TEXT NOT NULL,
            agent_type TEXT NOT NULL,
            enabled INTEGER NOT NULL DEFAULT 1,
            triggers TEXT NOT NULL DEFAULT '[]',
            custom_prompt TEXT,
            configuration TEXT NOT NULL DEFAULT '{}',
            priority INTEGER NOT NULL DEFAULT 0,
            UNIQUE (project_id, name, agent_type)
        );

        CREATE TABLE IF NOT EXISTS mcp_tools (
            id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL REFERENCES projects(id),
            name TEXT NOT NULL,
            tool_type TEXT NOT NULL,
            command TEXT NOT NULL DEFAULT '',
            enabled INTEGER NOT NULL DEFAULT 1,
            when_to_use TEXT NOT NULL DEFAULT '[]',
            priority INTEGER NOT NULL DEFAULT 0,
            usage_count INTEGER NOT NULL DEFAULT 0,
            success_count INTEGER NOT NULL DEFAULT 0,
            UNIQUE (project_id, name)
        );

        CREATE TABLE IF NOT EXISTS tech_stack (
            id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL REFERENCES projects(id),
            category TEXT NOT NULL,
            name TEXT NOT NULL,
            version TEXT
        );

        CREATE TABLE IF NOT EXISTS project_guidelines (
            id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL REFERENCES projects(id),
            guideline_type TEXT,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            priority INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS code_patterns_library (
            id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL REFERENCES projects(id),
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            example_code TEXT,
            tags TEXT NOT NULL DEFAULT '[]'
        );

        CREATE TABLE IF NOT EXISTS templates (
            id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL REFERENCES projects(id),
            name TEXT NOT NULL,
            template_type TEXT,
            content TEXT NOT NULL,
            variables TEXT NOT NULL DEFAULT '[]'
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
        CREATE INDEX IF NOT EXISTS idx_tasks_story ON tasks(user_story_id);
        CREATE INDEX IF NOT EXISTS idx_deps_target ON task_dependencies(depends_on_task_id);
        CREATE INDEX IF NOT EXISTS idx_edges_resource ON resource_edges(resource_id);
        CREATE INDEX IF NOT EXISTS idx_learnings_pattern ON learnings(pattern);
        CREATE INDEX IF NOT EXISTS idx_learnings_task ON learnings(task_id);
        CREATE INDEX IF NOT EXISTS idx_events_unprocessed ON event_queue(processed, created_at);
        "#,
    )?;

    conn.execute(&format!("PRAGMA user_version = {}", SCHEMA_VERSION), [])?;

    Ok(())
}

fn drop_all_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DROP TABLE IF EXISTS templates;
        DROP TABLE IF EXISTS code_patterns_library;
        DROP TABLE IF EXISTS project_guidelines;
        DROP TABLE IF EXISTS tech_stack;
        DROP TABLE IF EXISTS mcp_tools;
        DROP TABLE IF EXISTS sub_agents;
        DROP TABLE IF EXISTS event_queue;
        DROP TABLE IF EXISTS pattern_frequency;
        DROP TABLE IF EXISTS learnings;
        DROP TABLE IF EXISTS resource_edges;
        DROP TABLE IF EXISTS resource_nodes;
        DROP TABLE IF EXISTS task_dependencies;
        DROP TABLE IF EXISTS tasks;
        DROP TABLE IF EXISTS projects;
        "#,
    )?;
    Ok(())
}
