use serde::Serialize;
use serde_json::Value;
use taskforge_engine::prompt::DEFAULT_GUIDELINES;
use taskforge_engine::suggest::{default_agent_specs, default_tool_specs};
use taskforge_store::TaskFilter;
use taskforge_types::{
    CodePattern, Guideline, McpTool, Project, SubAgent, TechStackEntry, Template,
};

use crate::runtime::Taskforge;
use crate::{Error, Result};

#[derive(Debug, Clone, Serialize)]
pub struct ProjectInfo {
    pub project: Project,
    pub total_tasks: usize,
    pub user_stories: usize,
    pub tech_stack_entries: usize,
    pub sub_agents: usize,
    pub mcp_tools: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectConfiguration {
    pub project: Project,
    pub tech_stack: Vec<TechStackEntry>,
    pub guidelines: Vec<Guideline>,
    pub sub_agents: Vec<SubAgent>,
    pub mcp_tools: Vec<McpTool>,
    pub code_patterns: Vec<CodePattern>,
    pub templates: Vec<Template>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InitializedConfiguration {
    pub guidelines_added: usize,
    pub agents_added: usize,
    pub tools_added: usize,
    pub templates_added: usize,
}

/// Seeded on initialize so `render_template` works out of the box.
const DEFAULT_TEMPLATES: &[(&str, &str, &str)] = &[
    (
        "bug-fix",
        "workflow",
        "Fix the bug in {{file}}: {{symptom}}. Reproduce it with a failing test first, then \
         make the test pass without changing unrelated behavior.",
    ),
    (
        "feature",
        "workflow",
        "Implement {{feature}}. Start from the analysis in the task, follow the project \
         guidelines, and keep the change reviewable.",
    ),
];

#[derive(Debug, Clone, Serialize)]
pub struct RenderedTemplate {
    pub name: String,
    pub rendered: String,
    pub unresolved_variables: Vec<String>,
}

pub struct ProjectOps<'a> {
    pub(crate) rt: &'a Taskforge,
}

impl ProjectOps<'_> {
    pub fn info(&self) -> Result<ProjectInfo> {
        let db = self.rt.db();
        let project = db.project()?;
        let tasks = db.list_tasks(&TaskFilter::default())?;
        let user_stories = tasks.iter().filter(|t| t.is_user_story).count();
        Ok(ProjectInfo {
            project,
            total_tasks: tasks.len(),
            user_stories,
            tech_stack_entries: db.list_tech_stack()?.len(),
            sub_agents: db.list_sub_agents()?.len(),
            mcp_tools: db.list_mcp_tools()?.len(),
        })
    }

    pub fn configuration(&self) -> Result<ProjectConfiguration> {
        let db = self.rt.db();
        Ok(ProjectConfiguration {
            project: db.project()?,
            tech_stack: db.list_tech_stack()?,
            guidelines: db.list_guidelines()?,
            sub_agents: db.list_sub_agents()?,
            mcp_tools: db.list_mcp_tools()?,
            code_patterns: db.list_code_patterns()?,
            templates: db.list_templates()?,
        })
    }

    /// Seed defaults for a fresh project: built-in guidelines plus the
    /// default agent/tool registries. Idempotent - existing rows are kept.
    pub fn initialize_configuration(
        &self,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<InitializedConfiguration> {
        let db = self.rt.db();
        if name.is_some() || description.is_some() {
            let project = db.project()?;
            db.update_project(
                name.unwrap_or(&project.name),
                description.unwrap_or(&project.description),
            )?;
        }

        let mut guidelines_added = 0;
        if db.list_guidelines()?.is_empty() {
            for (i, guideline) in DEFAULT_GUIDELINES.iter().enumerate() {
                db.add_guideline(
                    Some("general"),
                    guideline,
                    "",
                    (DEFAULT_GUIDELINES.len() - i) as i64,
                )?;
                guidelines_added += 1;
            }
        }

        let mut agents_added = 0;
        if db.list_sub_agents()?.is_empty() {
            let project_id = db.project_id().to_string();
            for spec in default_agent_specs() {
                db.upsert_sub_agent(&taskforge_types::SubAgent {
                    id: String::new(),
                    project_id: project_id.clone(),
                    name: spec.name,
                    agent_type: spec.agent_type,
                    enabled: true,
                    triggers: spec.keywords,
                    custom_prompt: None,
                    configuration: serde_json::json!({}),
                    priority: 0,
                })?;
                agents_added += 1;
            }
        }

        let mut tools_added = 0;
        if db.list_mcp_tools()?.is_empty() {
            let project_id = db.project_id().to_string();
            for spec in default_tool_specs() {
                db.upsert_mcp_tool(&taskforge_types::McpTool {
                    id: String::new(),
                    project_id: project_id.clone(),
                    name: spec.name,
                    tool_type: spec.tool_type,
                    command: String::new(),
                    enabled: true,
                    when_to_use: spec.keywords,
                    priority: 0,
                    usage_count: 0,
                    success_count: 0,
                })?;
                tools_added += 1;
            }
        }

        let mut templates_added = 0;
        if db.list_templates()?.is_empty() {
            for &(name, template_type, content) in DEFAULT_TEMPLATES {
                db.add_template(name, Some(template_type), content, &[])?;
                templates_added += 1;
            }
        }
        if templates_added > 0 {
            self.rt.cache().invalidate_pattern("templates:*");
        }

        Ok(InitializedConfiguration {
            guidelines_added,
            agents_added,
            tools_added,
            templates_added,
        })
    }

    // --- Tech stack ---

    pub fn add_tech_stack(
        &self,
        category: &str,
        name: &str,
        version: Option<&str>,
    ) -> Result<TechStackEntry> {
        if category.trim().is_empty() || name.trim().is_empty() {
            return Err(Error::Validation(
                "tech stack category and name must not be empty".into(),
            ));
        }
        self.rt
            .db()
            .add_tech_stack(category, name, version)
            .map_err(Into::into)
    }

    pub fn update_tech_stack(
        &self,
        id: &str,
        category: Option<&str>,
        name: Option<&str>,
        version: Option<&str>,
    ) -> Result<()> {
        self.rt
            .db()
            .update_tech_stack(id, category, name, version)
            .map_err(Into::into)
    }

    pub fn remove_tech_stack(&self, id: &str) -> Result<()> {
        self.rt.db().remove_tech_stack(id).map_err(Into::into)
    }

    pub fn list_tech_stack(&self) -> Result<Vec<TechStackEntry>> {
        self.rt.db().list_tech_stack().map_err(Into::into)
    }

    // --- Guidelines / patterns / templates ---

    pub fn add_guideline(
        &self,
        guideline_type: Option<&str>,
        title: &str,
        description: &str,
        priority: i64,
    ) -> Result<Guideline> {
        if title.trim().is_empty() {
            return Err(Error::Validation("guideline title must not be empty".into()));
        }
        self.rt
            .db()
            .add_guideline(guideline_type, title, description, priority)
            .map_err(Into::into)
    }

    pub fn add_code_pattern(
        &self,
        name: &str,
        description: &str,
        example_code: Option<&str>,
        tags: &[String],
    ) -> Result<CodePattern> {
        if name.trim().is_empty() {
            return Err(Error::Validation(
                "code pattern name must not be empty".into(),
            ));
        }
        let pattern = self
            .rt
            .db()
            .add_code_pattern(name, description, example_code, tags)?;
        self.rt.cache().invalidate_pattern("patterns:*");
        Ok(pattern)
    }

    pub fn list_code_patterns(&self) -> Result<Vec<CodePattern>> {
        self.rt.cached_code_patterns()
    }

    pub fn list_templates(&self) -> Result<Vec<Template>> {
        self.rt.cached_templates()
    }

    pub fn add_template(
        &self,
        name: &str,
        template_type: Option<&str>,
        content: &str,
        variables: &[String],
    ) -> Result<Template> {
        if name.trim().is_empty() {
            return Err(Error::Validation("template name must not be empty".into()));
        }
        let template = self
            .rt
            .db()
            .add_template(name, template_type, content, variables)?;
        self.rt.cache().invalidate_pattern("templates:*");
        Ok(template)
    }

    pub fn render_template(&self, name: &str, variables: &Value) -> Result<RenderedTemplate> {
        let template = self
            .rt
            .cached_templates()?
            .into_iter()
            .find(|t| t.name == name)
            .ok_or_else(|| taskforge_store::Error::NotFound(format!("Template {}", name)))?;
        let (rendered, unresolved_variables) = template.render(variables);
        Ok(RenderedTemplate {
            name: name.to_string(),
            rendered,
            unresolved_variables,
        })
    }
}
