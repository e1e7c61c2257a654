use rusqlite::{params, Connection, OptionalExtension};
use taskforge_types::{CodePattern, Guideline, Project, TechStackEntry, Template};
use uuid::Uuid;

use super::{from_json, now_ts, parse_ts, to_json};
use crate::{Error, Result};

pub const DEFAULT_PROJECT_NAME: &str = "default";

/// Single-deployment installs hang everything off one default project,
/// created on first open.
pub fn ensure_default_project(conn: &Connection) -> Result<Project> {
    if let Some(project) = get_default_project(conn)? {
        return Ok(project);
    }
    let project = Project {
        id: Uuid::new_v4().to_string(),
        name: DEFAULT_PROJECT_NAME.to_string(),
        description: String::new(),
        created_at: chrono::Utc::now(),
    };
    conn.execute(
        "INSERT INTO projects (id, name, description, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            project.id,
            project.name,
            project.description,
            now_ts()
        ],
    )?;
    Ok(project)
}

pub fn get_default_project(conn: &Connection) -> Result<Option<Project>> {
    let raw = conn
        .query_row(
            "SELECT id, name, description, created_at FROM projects ORDER BY created_at ASC LIMIT 1",
            [],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;
    raw.map(|(id, name, description, created_at)| {
        Ok(Project {
            id,
            name,
            description,
            created_at: parse_ts(&created_at)?,
        })
    })
    .transpose()
}

pub fn update_project(conn: &Connection, id: &str, name: &str, description: &str) -> Result<()> {
    let changed = conn.execute(
        "UPDATE projects SET name = ?2, description = ?3 WHERE id = ?1",
        params![id, name, description],
    )?;
    if changed == 0 {
        return Err(Error::NotFound(format!("Project {}", id)));
    }
    Ok(())
}

// --- Tech stack ---

pub fn add_tech_stack(
    conn: &Connection,
    project_id: &str,
    category: &str,
    name: &str,
    version: Option<&str>,
) -> Result<TechStackEntry> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO tech_stack (id, project_id, category, name, version) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, project_id, category, name, version],
    )?;
    Ok(TechStackEntry {
        id,
        project_id: project_id.to_string(),
        category: category.to_string(),
        name: name.to_string(),
        version: version.map(String::from),
    })
}

pub fn update_tech_stack(
    conn: &Connection,
    id: &str,
    category: Option<&str>,
    name: Option<&str>,
    version: Option<&str>,
) -> Result<()> {
    let changed = conn.execute(
        r#"
        UPDATE tech_stack
        SET category = COALESCE(?2, category),
            name = COALESCE(?3, name),
            version = COALESCE(?4, version)
        WHERE id = ?1
        "#,
        params![id, category, name, version],
    )?;
    if changed == 0 {
        return Err(Error::NotFound(format!("Tech stack entry {}", id)));
    }
    Ok(())
}

pub fn remove_tech_stack(conn: &Connection, id: &str) -> Result<()> {
    let changed = conn.execute("DELETE FROM tech_stack WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(Error::NotFound(format!("Tech stack entry {}", id)));
    }
    Ok(())
}

pub fn list_tech_stack(conn: &Connection, project_id: &str) -> Result<Vec<TechStackEntry>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, project_id, category, name, version
        FROM tech_stack
        WHERE project_id = ?1
        ORDER BY category, name
        "#,
    )?;
    let entries = stmt
        .query_map([project_id], |row| {
            Ok(TechStackEntry {
                id: row.get(0)?,
                project_id: row.get(1)?,
                category: row.get(2)?,
                name: row.get(3)?,
                version: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    Ok(entries)
}

// --- Guidelines ---

pub fn add_guideline(
    conn: &Connection,
    project_id: &str,
    guideline_type: Option<&str>,
    title: &str,
    description: &str,
    priority: i64,
) -> Result<Guideline> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        r#"
        INSERT INTO project_guidelines (id, project_id, guideline_type, title, description, priority)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![id, project_id, guideline_type, title, description, priority],
    )?;
    Ok(Guideline {
        id,
        project_id: project_id.to_string(),
        guideline_type: guideline_type.map(String::from),
        title: title.to_string(),
        description: description.to_string(),
        priority,
    })
}

pub fn list_guidelines(conn: &Connection, project_id: &str) -> Result<Vec<Guideline>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, project_id, guideline_type, title, description, priority
        FROM project_guidelines
        WHERE project_id = ?1
        ORDER BY priority DESC, title
        "#,
    )?;
    let guidelines = stmt
        .query_map([project_id], |row| {
            Ok(Guideline {
                id: row.get(0)?,
                project_id: row.get(1)?,
                guideline_type: row.get(2)?,
                title: row.get(3)?,
                description: row.get(4)?,
                priority: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    Ok(guidelines)
}

// --- Code patterns ---

pub fn add_code_pattern(
    conn: &Connection,
    project_id: &str,
    name: &str,
    description: &str,
    example_code: Option<&str>,
    tags: &[String],
) -> Result<CodePattern> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        r#"
        INSERT INTO code_patterns_library (id, project_id, name, description, example_code, tags)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![id, project_id, name, description, example_code, to_json(&tags.to_vec())?],
    )?;
    Ok(CodePattern {
        id,
        project_id: project_id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        example_code: example_code.map(String::from),
        tags: tags.to_vec(),
    })
}

pub fn list_code_patterns(conn: &Connection, project_id: &str) -> Result<Vec<CodePattern>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, project_id, name, description, example_code, tags
        FROM code_patterns_library
        WHERE project_id = ?1
        ORDER BY name
        "#,
    )?;
    let raws: Vec<(String, String, String, String, Option<String>, String)> = stmt
        .query_map([project_id], |row| {
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

    raws.into_iter()
        .map(|(id, project_id, name, description, example_code, tags)| {
            Ok(CodePattern {
                id,
                project_id,
                name,
                description,
                example_code,
                tags: from_json(&tags)?,
            })
        })
        .collect()
}

// --- Templates ---

pub fn add_template(
    conn: &Connection,
    project_id: &str,
    name: &str,
    template_type: Option<&str>,
    content: &str,
    variables: &[String],
) -> Result<Template> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        r#"
        INSERT INTO templates (id, project_id, name, template_type, content, variables)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            id,
            project_id,
            name,
            template_type,
            content,
            to_json(&variables.to_vec())?
        ],
    )?;
    Ok(Template {
        id,
        project_id: project_id.to_string(),
        name: name.to_string(),
        template_type: template_type.map(String::from),
        content: content.to_string(),
        variables: variables.to_vec(),
    })
}

pub fn list_templates(conn: &Connection, project_id: &str) -> Result<Vec<Template>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, project_id, name, template_type, content, variables
        FROM templates
        WHERE project_id = ?1
        ORDER BY name
        "#,
    )?;
    let raws: Vec<(String, String, String, Option<String>, String, String)> = stmt
        .query_map([project_id], |row| {
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

    raws.into_iter()
        .map(|(id, project_id, name, template_type, content, variables)| {
            Ok(Template {
                id,
                project_id,
                name,
                template_type,
                content,
                variables: from_json(&variables)?,
            })
        })
        .collect()
}

pub fn find_template_by_name(
    conn: &Connection,
    project_id: &str,
    name: &str,
) -> Result<Option<Template>> {
    let templates = list_templates(conn, project_id)?;
    Ok(templates.into_iter().find(|t| t.name == name))
}
