use serde::{Deserialize, Serialize};

use crate::learning::RiskLevel;

/// Kind of artifact a task can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    File,
    Component,
    Api,
    Model,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::File => "file",
            ResourceType::Component => "component",
            ResourceType::Api => "api",
            ResourceType::Model => "model",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "file" => Some(ResourceType::File),
            "component" => Some(ResourceType::Component),
            "api" => Some(ResourceType::Api),
            "model" => Some(ResourceType::Model),
            _ => None,
        }
    }
}

/// How a task touches a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceAction {
    Uses,
    Modifies,
    Creates,
}

impl ResourceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceAction::Uses => "uses",
            ResourceAction::Modifies => "modifies",
            ResourceAction::Creates => "creates",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "uses" => Some(ResourceAction::Uses),
            "modifies" => Some(ResourceAction::Modifies),
            "creates" => Some(ResourceAction::Creates),
            _ => None,
        }
    }
}

/// Nameable artifact shared across tasks. Identity is `(type, name)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceNode {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Directed edge task -> resource. Identity is `(task, resource, action)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceEdge {
    pub task_id: String,
    pub resource_id: String,
    pub action: ResourceAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    ConcurrentModify,
    ConcurrentWrite,
    PotentialCollision,
}

impl ConflictType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictType::ConcurrentModify => "concurrent_modify",
            ConflictType::ConcurrentWrite => "concurrent_write",
            ConflictType::PotentialCollision => "potential_collision",
        }
    }
}

/// Two unfinished tasks whose actions on a shared resource can interfere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conflict {
    pub task_id: String,
    pub task_title: String,
    pub resource_id: String,
    pub resource_name: String,
    pub conflict_type: ConflictType,
    pub severity: RiskLevel,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_type_round_trip() {
        for (s, t) in [
            ("file", ResourceType::File),
            ("component", ResourceType::Component),
            ("api", ResourceType::Api),
            ("model", ResourceType::Model),
        ] {
            assert_eq!(ResourceType::parse(s), Some(t));
            assert_eq!(t.as_str(), s);
        }
        assert_eq!(ResourceType::parse("database"), None);
    }

    #[test]
    fn test_node_serde_uses_type_key() {
        let node = ResourceNode {
            id: "r1".to_string(),
            resource_type: ResourceType::File,
            name: "auth.ts".to_string(),
            path: None,
        };
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "file");
    }
}
