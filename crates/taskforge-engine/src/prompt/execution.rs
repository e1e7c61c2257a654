use serde::Serialize;
use taskforge_types::{
    Guideline, Learning, ResourceAction, ResourceNode, RiskLevel, Task, TaskAnalysis,
};

/// Guidelines applied when the project has none configured.
pub const DEFAULT_GUIDELINES: &[&str] = &[
    "Follow the existing code style of each touched file",
    "Keep changes scoped to the task; no drive-by refactors",
    "Add or update tests for every behavior change",
    "Propagate errors instead of swallowing them",
];

const MAX_LEARNINGS: usize = 3;

/// Structured data the execution prompt was assembled from, returned
/// alongside the prompt text.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionContext {
    pub task_id: String,
    pub task_title: String,
    pub files_to_modify: usize,
    pub files_to_create: usize,
    pub resource_dependencies: usize,
    pub risks: usize,
    pub guidelines: Vec<String>,
    pub similar_learnings: Vec<String>,
}

fn risk_marker(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "[low risk]",
        RiskLevel::Medium => "[MEDIUM RISK]",
        RiskLevel::High => "[HIGH RISK]",
    }
}

/// Assemble the enriched implementation prompt from the stored analysis,
/// the resource graph, past learnings and project guidelines.
///
/// The resource dependency section reads from the graph, not from the
/// analysis mirror, so later edge rewrites are reflected.
pub fn build_execution_prompt(
    task: &Task,
    analysis: &TaskAnalysis,
    graph: &[(ResourceNode, ResourceAction)],
    learnings: &[Learning],
    guidelines: &[Guideline],
) -> (String, ExecutionContext) {
    let mut prompt = String::new();

    // 1. Task overview
    prompt.push_str(&format!("# Implement: {}\n\n{}\n\n", task.title, task.description));
    if let Some(priority) = task.priority {
        prompt.push_str(&format!("Priority: {}\n\n", priority.as_str()));
    }

    // 2. Suggested agent and tools
    if let Some(meta) = &task.story_metadata {
        if let Some(agent) = &meta.suggested_agent {
            prompt.push_str(&format!(
                "## Suggested agent\n{} ({}, confidence {:.2}) - {}\n\n",
                agent.name,
                agent.agent_type.as_str(),
                agent.confidence,
                agent.reason
            ));
        }
        if !meta.suggested_tools.is_empty() {
            prompt.push_str("## Suggested tools\n");
            for tool in &meta.suggested_tools {
                prompt.push_str(&format!(
                    "- {} (confidence {:.2}) - {}\n",
                    tool.name, tool.confidence, tool.reason
                ));
            }
            prompt.push('\n');
        }
    }

    // 3. Files to modify
    if !analysis.files_to_modify.is_empty() {
        prompt.push_str("## Files to modify\n");
        for file in &analysis.files_to_modify {
            prompt.push_str(&format!(
                "- {} {} - {}\n",
                file.path,
                risk_marker(file.risk),
                file.reason
            ));
        }
        prompt.push('\n');
    }

    // 4. Files to create
    if !analysis.files_to_create.is_empty() {
        prompt.push_str("## Files to create\n");
        for file in &analysis.files_to_create {
            prompt.push_str(&format!("- {} - {}\n", file.path, file.reason));
        }
        prompt.push('\n');
    }

    // 5. Resource dependencies from the graph
    if !graph.is_empty() {
        prompt.push_str("## Resource dependencies\n");
        for (node, action) in graph {
            match &node.path {
                Some(path) => prompt.push_str(&format!(
                    "- {} {} ({}, {})\n",
                    action.as_str(),
                    node.name,
                    node.resource_type.as_str(),
                    path
                )),
                None => prompt.push_str(&format!(
                    "- {} {} ({})\n",
                    action.as_str(),
                    node.name,
                    node.resource_type.as_str()
                )),
            }
        }
        prompt.push('\n');
    }

    // 6. Risks grouped by level
    if !analysis.risks.is_empty() {
        prompt.push_str("## Risks\n");
        for level in [RiskLevel::High, RiskLevel::Medium, RiskLevel::Low] {
            let at_level: Vec<_> = analysis.risks.iter().filter(|r| r.level == level).collect();
            if at_level.is_empty() {
                continue;
            }
            prompt.push_str(&format!("### {}\n", level.as_str()));
            for risk in at_level {
                if risk.mitigation.is_empty() {
                    prompt.push_str(&format!("- {}\n", risk.description));
                } else {
                    prompt.push_str(&format!(
                        "- {} (mitigation: {})\n",
                        risk.description, risk.mitigation
                    ));
                }
            }
        }
        prompt.push('\n');
    }

    // 7. Related code
    if !analysis.related_code.is_empty() {
        prompt.push_str("## Related code\n");
        for related in &analysis.related_code {
            match &related.lines {
                Some(lines) => prompt.push_str(&format!(
                    "- {} ({}) - {}\n",
                    related.file, lines, related.description
                )),
                None => {
                    prompt.push_str(&format!("- {} - {}\n", related.file, related.description))
                }
            }
        }
        prompt.push('\n');
    }

    // 8. Recommendations
    if !analysis.recommendations.is_empty() {
        prompt.push_str("## Recommendations\n");
        for recommendation in &analysis.recommendations {
            prompt.push_str(&format!("- {}\n", recommendation));
        }
        prompt.push('\n');
    }

    // 9. Similar past learnings
    let similar: Vec<String> = learnings
        .iter()
        .take(MAX_LEARNINGS)
        .map(|l| l.lesson.clone())
        .collect();
    if !similar.is_empty() {
        prompt.push_str("## Lessons from similar past work\n");
        for lesson in &similar {
            prompt.push_str(&format!("- {}\n", lesson));
        }
        prompt.push('\n');
    }

    // 10. Project guidelines (defaults when none configured)
    let guideline_lines: Vec<String> = if guidelines.is_empty() {
        DEFAULT_GUIDELINES.iter().map(|g| g.to_string()).collect()
    } else {
        guidelines
            .iter()
            .map(|g| {
                if g.description.is_empty() {
                    g.title.clone()
                } else {
                    format!("{}: {}", g.title, g.description)
                }
            })
            .collect()
    };
    prompt.push_str("## Project guidelines\n");
    for line in &guideline_lines {
        prompt.push_str(&format!("- {}\n", line));
    }
    prompt.push('\n');

    // 11. Fixed tail
    prompt.push_str(
        "## After implementing\n\
         1. Set the task status to done via update_task.\n\
         2. Record what worked and what failed via add_feedback, naming the pattern you \
         applied.\n",
    );

    let context = ExecutionContext {
        task_id: task.id.clone(),
        task_title: task.title.clone(),
        files_to_modify: analysis.files_to_modify.len(),
        files_to_create: analysis.files_to_create.len(),
        resource_dependencies: graph.len(),
        risks: analysis.risks.len(),
        guidelines: guideline_lines,
        similar_learnings: similar,
    };
    (prompt, context)
}
