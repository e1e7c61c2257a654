use taskforge_engine::suggest::{default_agent_specs, default_tool_specs};
use taskforge_engine::{suggest_agents, suggest_tools, AgentSpec, ToolSpec};
use taskforge_types::{AgentSuggestion, TaskCategory, ToolSuggestion};

use crate::runtime::Taskforge;
use crate::Result;

pub struct SuggestionOps<'a> {
    pub(crate) rt: &'a Taskforge,
}

impl SuggestionOps<'_> {
    /// Registry of agent candidates: configured sub-agents when present,
    /// built-in defaults otherwise.
    pub(crate) fn agent_specs(&self) -> Result<Vec<AgentSpec>> {
        let configured = self.rt.db().list_sub_agents()?;
        let specs: Vec<AgentSpec> = configured
            .into_iter()
            .filter(|a| a.enabled && !a.triggers.is_empty())
            .map(|a| AgentSpec {
                name: a.name,
                agent_type: a.agent_type,
                keywords: a.triggers,
                category: None,
            })
            .collect();
        if specs.is_empty() {
            Ok(default_agent_specs())
        } else {
            Ok(specs)
        }
    }

    pub(crate) fn tool_specs(&self) -> Result<Vec<ToolSpec>> {
        let configured = self.rt.db().list_mcp_tools()?;
        let specs: Vec<ToolSpec> = configured
            .into_iter()
            .filter(|t| t.enabled && !t.when_to_use.is_empty())
            .map(|t| ToolSpec {
                name: t.name,
                tool_type: t.tool_type,
                keywords: t.when_to_use,
                category: None,
            })
            .collect();
        if specs.is_empty() {
            Ok(default_tool_specs())
        } else {
            Ok(specs)
        }
    }

    pub fn agents_for_task(&self, task_id: &str) -> Result<Vec<AgentSuggestion>> {
        let task = self.rt.db().require_task(task_id)?;
        let text = format!("{} {}", task.title, task.description);
        self.agents_for_text(&text, task.category)
    }

    pub fn tools_for_task(&self, task_id: &str) -> Result<Vec<ToolSuggestion>> {
        let task = self.rt.db().require_task(task_id)?;
        let text = format!("{} {}", task.title, task.description);
        self.tools_for_text(&text, task.category)
    }

    pub fn agents_for_text(
        &self,
        text: &str,
        category: Option<TaskCategory>,
    ) -> Result<Vec<AgentSuggestion>> {
        Ok(suggest_agents(text, category, &self.agent_specs()?))
    }

    pub fn tools_for_text(
        &self,
        text: &str,
        category: Option<TaskCategory>,
    ) -> Result<Vec<ToolSuggestion>> {
        Ok(suggest_tools(text, category, &self.tool_specs()?))
    }
}
