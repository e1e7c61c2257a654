use std::path::Path;

use serde::Serialize;
use serde_json::{json, Value};
use taskforge_engine::extract_keywords;
use taskforge_types::{AgentType, McpTool, SubAgent, ToolType};
use walkdir::WalkDir;

use crate::runtime::Taskforge;
use crate::{Error, Result};

const TRIGGER_KEYWORDS: usize = 8;

/// One agent definition file: YAML front-matter plus prompt body.
#[derive(Debug, Clone, Serialize)]
pub struct AgentFile {
    pub path: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub tools: Vec<String>,
    pub prompt: String,
    /// Front-matter keys beyond name/description/model/tools, preserved
    /// verbatim.
    pub extra: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncedAgents {
    pub synced: usize,
    pub agents: Vec<SubAgent>,
}

#[derive(Debug, Clone)]
pub struct NewSubAgentInput {
    pub name: String,
    pub agent_type: AgentType,
    pub enabled: bool,
    pub triggers: Vec<String>,
    pub custom_prompt: Option<String>,
    pub priority: i64,
}

#[derive(Debug, Clone)]
pub struct NewMcpToolInput {
    pub name: String,
    pub tool_type: ToolType,
    pub command: String,
    pub enabled: bool,
    pub when_to_use: Vec<String>,
    pub priority: i64,
}

pub struct AgentOps<'a> {
    pub(crate) rt: &'a Taskforge,
}

impl AgentOps<'_> {
    /// Parse every `*.md` agent file under `dir` without persisting.
    pub fn read_agent_files(&self, dir: &Path) -> Result<Vec<AgentFile>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(dir)
            .max_depth(2)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file()
                || entry.path().extension().and_then(|e| e.to_str()) != Some("md")
            {
                continue;
            }
            let content = std::fs::read_to_string(entry.path())?;
            match parse_agent_file(&content) {
                Ok(mut file) => {
                    file.path = entry.path().display().to_string();
                    files.push(file);
                }
                Err(e) => {
                    tracing::warn!(path = %entry.path().display(), error = %e, "skipping malformed agent file")
                }
            }
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    /// Import agent files as sub-agents: known names map to their agent
    /// type, everything else registers as custom. Triggers are seeded from
    /// the description's keywords.
    pub fn sync_agent_files(&self, dir: &Path) -> Result<SyncedAgents> {
        let files = self.read_agent_files(dir)?;
        let db = self.rt.db();
        let project_id = db.project_id().to_string();

        let mut agents = Vec::with_capacity(files.len());
        for file in &files {
            let agent_type = AgentType::parse(&file.name).unwrap_or(AgentType::Custom);
            let agent = db.upsert_sub_agent(&SubAgent {
                id: String::new(),
                project_id: project_id.clone(),
                name: file.name.clone(),
                agent_type,
                enabled: true,
                triggers: extract_keywords(&file.description, TRIGGER_KEYWORDS),
                custom_prompt: Some(file.prompt.clone()),
                configuration: json!({
                    "model": file.model,
                    "tools": file.tools,
                    "yaml_config": file.extra,
                }),
                priority: 0,
            })?;
            agents.push(agent);
        }
        Ok(SyncedAgents {
            synced: agents.len(),
            agents,
        })
    }

    pub fn add_sub_agent(&self, input: NewSubAgentInput) -> Result<SubAgent> {
        if input.name.trim().is_empty() {
            return Err(Error::Validation("agent name must not be empty".into()));
        }
        let db = self.rt.db();
        let project_id = db.project_id().to_string();
        db.upsert_sub_agent(&SubAgent {
            id: String::new(),
            project_id,
            name: input.name,
            agent_type: input.agent_type,
            enabled: input.enabled,
            triggers: input.triggers,
            custom_prompt: input.custom_prompt,
            configuration: json!({}),
            priority: input.priority,
        })
        .map_err(Into::into)
    }

    /// Update by name; only provided fields change.
    pub fn update_sub_agent(
        &self,
        name: &str,
        enabled: Option<bool>,
        triggers: Option<Vec<String>>,
        custom_prompt: Option<String>,
        priority: Option<i64>,
    ) -> Result<SubAgent> {
        let db = self.rt.db();
        let mut agent = db
            .find_sub_agent_by_name(name)?
            .ok_or_else(|| taskforge_store::Error::NotFound(format!("Sub-agent {}", name)))?;
        if let Some(enabled) = enabled {
            agent.enabled = enabled;
        }
        if let Some(triggers) = triggers {
            agent.triggers = triggers;
        }
        if let Some(prompt) = custom_prompt {
            agent.custom_prompt = Some(prompt);
        }
        if let Some(priority) = priority {
            agent.priority = priority;
        }
        db.upsert_sub_agent(&agent).map_err(Into::into)
    }

    pub fn list_sub_agents(&self) -> Result<Vec<SubAgent>> {
        self.rt.db().list_sub_agents().map_err(Into::into)
    }

    pub fn add_mcp_tool(&self, input: NewMcpToolInput) -> Result<McpTool> {
        if input.name.trim().is_empty() {
            return Err(Error::Validation("tool name must not be empty".into()));
        }
        let db = self.rt.db();
        let project_id = db.project_id().to_string();
        db.upsert_mcp_tool(&McpTool {
            id: String::new(),
            project_id,
            name: input.name,
            tool_type: input.tool_type,
            command: input.command,
            enabled: input.enabled,
            when_to_use: input.when_to_use,
            priority: input.priority,
            usage_count: 0,
            success_count: 0,
        })
        .map_err(Into::into)
    }

    pub fn update_mcp_tool(
        &self,
        name: &str,
        enabled: Option<bool>,
        command: Option<String>,
        when_to_use: Option<Vec<String>>,
        priority: Option<i64>,
    ) -> Result<McpTool> {
        let db = self.rt.db();
        let mut tool = db
            .list_mcp_tools()?
            .into_iter()
            .find(|t| t.name == name)
            .ok_or_else(|| taskforge_store::Error::NotFound(format!("MCP tool {}", name)))?;
        if let Some(enabled) = enabled {
            tool.enabled = enabled;
        }
        if let Some(command) = command {
            tool.command = command;
        }
        if let Some(when) = when_to_use {
            tool.when_to_use = when;
        }
        if let Some(priority) = priority {
            tool.priority = priority;
        }
        db.upsert_mcp_tool(&tool).map_err(Into::into)
    }

    pub fn list_mcp_tools(&self) -> Result<Vec<McpTool>> {
        self.rt.db().list_mcp_tools().map_err(Into::into)
    }

    /// Refresh the custom prompts of non-custom agents from the built-in
    /// template set. Returns how many were rewritten.
    pub fn update_prompt_templates(&self) -> Result<usize> {
        let db = self.rt.db();
        let mut updated = 0;
        for agent in db.list_sub_agents()? {
            let Some(template) = prompt_template(agent.agent_type) else {
                continue;
            };
            db.set_agent_prompt(&agent.id, template)?;
            updated += 1;
        }
        Ok(updated)
    }
}

fn prompt_template(agent_type: AgentType) -> Option<&'static str> {
    match agent_type {
        AgentType::ArchitectureGuardian => Some(
            "You guard architectural boundaries. Review the change for layering violations, \
             cyclic module dependencies and leaked abstractions before approving.",
        ),
        AgentType::DatabaseGuardian => Some(
            "You guard the database. Review schema changes for destructive migrations, missing \
             indexes and N+1 query patterns before approving.",
        ),
        AgentType::TestMaintainer => Some(
            "You maintain the test suite. Ensure every behavior change lands with tests and \
             that no assertion is weakened to make a failure pass.",
        ),
        AgentType::ApiGuardian => Some(
            "You guard the public API. Flag breaking contract changes, missing versioning and \
             undocumented endpoints.",
        ),
        AgentType::ProductionReadyCodeReviewer => Some(
            "You review for production readiness: error handling, logging, resource cleanup \
             and input validation.",
        ),
        AgentType::GeneralPurpose | AgentType::Custom => None,
    }
}

/// Split a markdown agent file into YAML front-matter and prompt body.
/// Front-matter is delimited by `---` lines; unknown keys are preserved.
pub fn parse_agent_file(content: &str) -> Result<AgentFile> {
    let rest = content
        .strip_prefix("---")
        .ok_or_else(|| Error::Validation("agent file has no front-matter".into()))?;
    let end = rest
        .find("\n---")
        .ok_or_else(|| Error::Validation("unterminated front-matter block".into()))?;
    let front_matter = &rest[..end];
    let body = rest[end + 4..].trim_start_matches('\n');

    let mapping: serde_yaml::Mapping = serde_yaml::from_str(front_matter)
        .map_err(|e| Error::Validation(format!("invalid front-matter: {}", e)))?;

    let mut name = None;
    let mut description = String::new();
    let mut model = None;
    let mut tools = Vec::new();
    let mut extra = serde_json::Map::new();

    for (key, value) in mapping {
        let Some(key) = key.as_str().map(String::from) else {
            continue;
        };
        match key.as_str() {
            "name" => name = value.as_str().map(String::from),
            "description" => description = value.as_str().unwrap_or_default().to_string(),
            "model" => model = value.as_str().map(String::from),
            "tools" => {
                if let Some(seq) = value.as_sequence() {
                    tools = seq
                        .iter()
                        .filter_map(|v| v.as_str().map(String::from))
                        .collect();
                }
            }
            _ => {
                let json_value = serde_json::to_value(&value)
                    .map_err(|e| Error::Validation(format!("front-matter key '{}': {}", key, e)))?;
                extra.insert(key, json_value);
            }
        }
    }

    Ok(AgentFile {
        path: String::new(),
        name: name.ok_or_else(|| Error::Validation("front-matter missing 'name'".into()))?,
        description,
        model,
        tools,
        prompt: body.to_string(),
        extra: Value::Object(extra),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "---\nname: database-guardian\ndescription: Reviews schema and migration changes\nmodel: sonnet\ntools:\n  - Read\n  - Grep\ncolor: blue\n---\nYou review database changes.\n";

    #[test]
    fn test_parse_agent_file() {
        let file = parse_agent_file(SAMPLE).unwrap();
        assert_eq!(file.name, "database-guardian");
        assert_eq!(file.model.as_deref(), Some("sonnet"));
        assert_eq!(file.tools, vec!["Read", "Grep"]);
        assert_eq!(file.prompt.trim(), "You review database changes.");
        assert_eq!(file.extra["color"], "blue");
    }

    #[test]
    fn test_parse_requires_front_matter() {
        assert!(parse_agent_file("no front matter here").is_err());
        assert!(parse_agent_file("---\nname: x").is_err());
    }

    #[test]
    fn test_parse_requires_name() {
        let err = parse_agent_file("---\ndescription: d\n---\nbody").unwrap_err();
        assert!(err.to_string().contains("name"));
    }
}
