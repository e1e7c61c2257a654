use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Suggestions returned per task are capped at the top three.
pub const MAX_SUGGESTIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentType {
    ArchitectureGuardian,
    DatabaseGuardian,
    TestMaintainer,
    ApiGuardian,
    ProductionReadyCodeReviewer,
    GeneralPurpose,
    Custom,
}

impl AgentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::ArchitectureGuardian => "architecture-guardian",
            AgentType::DatabaseGuardian => "database-guardian",
            AgentType::TestMaintainer => "test-maintainer",
            AgentType::ApiGuardian => "api-guardian",
            AgentType::ProductionReadyCodeReviewer => "production-ready-code-reviewer",
            AgentType::GeneralPurpose => "general-purpose",
            AgentType::Custom => "custom",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "architecture-guardian" => Some(AgentType::ArchitectureGuardian),
            "database-guardian" => Some(AgentType::DatabaseGuardian),
            "test-maintainer" => Some(AgentType::TestMaintainer),
            "api-guardian" => Some(AgentType::ApiGuardian),
            "production-ready-code-reviewer" => Some(AgentType::ProductionReadyCodeReviewer),
            "general-purpose" => Some(AgentType::GeneralPurpose),
            "custom" => Some(AgentType::Custom),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolType {
    Mcp,
    Cli,
    Api,
    Library,
    Custom,
}

impl ToolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::Mcp => "mcp",
            ToolType::Cli => "cli",
            ToolType::Api => "api",
            ToolType::Library => "library",
            ToolType::Custom => "custom",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "mcp" => Some(ToolType::Mcp),
            "cli" => Some(ToolType::Cli),
            "api" => Some(ToolType::Api),
            "library" => Some(ToolType::Library),
            "custom" => Some(ToolType::Custom),
            _ => None,
        }
    }
}

/// Registered sub-agent. Identity is `(project_id, name, agent_type)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubAgent {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub agent_type: AgentType,
    pub enabled: bool,
    /// Keywords that activate this agent during suggestion matching.
    #[serde(default)]
    pub triggers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
    #[serde(default)]
    pub configuration: Value,
    #[serde(default)]
    pub priority: i64,
}

/// Registered MCP tool available to the assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpTool {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub tool_type: ToolType,
    pub command: String,
    pub enabled: bool,
    #[serde(default)]
    pub when_to_use: Vec<String>,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub usage_count: u64,
    #[serde(default)]
    pub success_count: u64,
}

/// Ranked agent suggestion for a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSuggestion {
    pub name: String,
    pub agent_type: AgentType,
    pub confidence: f64,
    pub reason: String,
}

/// Ranked tool suggestion for a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSuggestion {
    pub name: String,
    pub tool_type: ToolType,
    pub confidence: f64,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_type_kebab_names() {
        let json = serde_json::to_string(&AgentType::DatabaseGuardian).unwrap();
        assert_eq!(json, "\"database-guardian\"");
        assert_eq!(
            AgentType::parse("production-ready-code-reviewer"),
            Some(AgentType::ProductionReadyCodeReviewer)
        );
    }

    #[test]
    fn test_tool_type_round_trip() {
        for name in ["mcp", "cli", "api", "library", "custom"] {
            assert_eq!(ToolType::parse(name).unwrap().as_str(), name);
        }
    }
}
