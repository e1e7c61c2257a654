use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use taskforge_engine::conflict::build_conflict;
use taskforge_engine::next_steps_for;
use taskforge_types::{
    Conflict, EventType, NewEvent, NextSteps, ResourceAction, ResourceNode, RiskLevel,
    TaskAnalysis, WorkflowStage,
};

use crate::runtime::Taskforge;
use crate::Result;

#[derive(Debug, Clone, Serialize)]
pub struct GraphEdge {
    pub task_id: String,
    pub resource_id: String,
    pub action: ResourceAction,
}

#[derive(Debug, Clone, Serialize)]
pub struct DependencyGraph {
    pub nodes: Vec<ResourceNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceUse {
    pub task_id: String,
    pub title: String,
    pub action: ResourceAction,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceUsage {
    pub resource: ResourceNode,
    pub tasks: Vec<ResourceUse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SavedAnalysis {
    pub task_id: String,
    pub message: String,
    pub conflicts: Vec<Conflict>,
    pub next_steps: NextSteps,
}

pub struct GraphOps<'a> {
    pub(crate) rt: &'a Taskforge,
}

impl GraphOps<'_> {
    /// Persist an analysis record: upsert resource nodes, replace the
    /// task's edges, store the record on the task, then check the new
    /// edges for cross-task conflicts. High-severity conflicts raise a
    /// `guardian_intervention` event before the result returns.
    pub fn save_analysis(&self, task_id: &str, mut analysis: TaskAnalysis) -> Result<SavedAnalysis> {
        analysis.analyzed_at = Some(Utc::now());

        let conflicts = {
            let mut db = self.rt.db();
            db.save_task_analysis(task_id, &analysis)?;
            let candidates = db.conflict_candidates(task_id)?;
            let conflicts: Vec<Conflict> = candidates
                .iter()
                .filter_map(|c| {
                    build_conflict(
                        &c.other_task_id,
                        &c.other_task_title,
                        &c.resource_id,
                        &c.resource_name,
                        c.my_action,
                        c.other_action,
                    )
                })
                .collect();

            let high: Vec<&Conflict> = conflicts
                .iter()
                .filter(|c| c.severity == RiskLevel::High)
                .collect();
            if !high.is_empty() {
                db.append_event(&NewEvent::new(
                    EventType::GuardianIntervention,
                    json!({
                        "task_id": task_id,
                        "reason": "high severity resource conflicts",
                        "conflicts": high,
                    }),
                ))?;
            }
            conflicts
        };

        self.rt.cache().invalidate(&format!("task:{}", task_id));
        self.rt.cache().invalidate_pattern("tasks:*");

        let message = format!(
            "Analysis saved: {} file(s) to modify, {} to create, {} resource dependencies, {} conflict(s) detected",
            analysis.files_to_modify.len(),
            analysis.files_to_create.len(),
            analysis.dependencies.len(),
            conflicts.len(),
        );
        Ok(SavedAnalysis {
            task_id: task_id.to_string(),
            message,
            conflicts,
            next_steps: next_steps_for(WorkflowStage::AnalysisSaved, Some(task_id)),
        })
    }

    pub fn dependency_graph(&self, task_id: &str) -> Result<DependencyGraph> {
        let db = self.rt.db();
        db.require_task(task_id)?;
        let edges = db.resource_edges_for_task(task_id)?;

        let mut nodes: Vec<ResourceNode> = Vec::new();
        let mut graph_edges = Vec::with_capacity(edges.len());
        for (node, action) in edges {
            graph_edges.push(GraphEdge {
                task_id: task_id.to_string(),
                resource_id: node.id.clone(),
                action,
            });
            if !nodes.iter().any(|n| n.id == node.id) {
                nodes.push(node);
            }
        }
        Ok(DependencyGraph {
            nodes,
            edges: graph_edges,
        })
    }

    pub fn resource_usage(&self, resource_id: &str) -> Result<ResourceUsage> {
        let (resource, uses) = self.rt.db().resource_usage(resource_id)?;
        Ok(ResourceUsage {
            resource,
            tasks: uses
                .into_iter()
                .map(|(task_id, title, action)| ResourceUse {
                    task_id,
                    title,
                    action,
                })
                .collect(),
        })
    }

    pub fn conflicts(&self, task_id: &str) -> Result<Vec<Conflict>> {
        let db = self.rt.db();
        db.require_task(task_id)?;
        let candidates = db.conflict_candidates(task_id)?;
        Ok(candidates
            .iter()
            .filter_map(|c| {
                build_conflict(
                    &c.other_task_id,
                    &c.other_task_title,
                    &c.resource_id,
                    &c.resource_name,
                    c.my_action,
                    c.other_action,
                )
            })
            .collect())
    }
}
