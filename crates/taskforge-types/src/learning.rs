use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningType {
    Success,
    Failure,
    Improvement,
}

impl LearningType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LearningType::Success => "success",
            LearningType::Failure => "failure",
            LearningType::Improvement => "improvement",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(LearningType::Success),
            "failure" => Some(LearningType::Failure),
            "improvement" => Some(LearningType::Improvement),
            _ => None,
        }
    }
}

/// Classification bucket shared by pattern risk, file risk and conflict
/// severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(RiskLevel::Low),
            "medium" => Some(RiskLevel::Medium),
            "high" => Some(RiskLevel::High),
            _ => None,
        }
    }
}

/// A feedback record, optionally tied to a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Learning {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub context: String,
    pub action: String,
    pub result: String,
    pub lesson: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub learning_type: Option<LearningType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Aggregate counters per pattern, maintained in the same transaction that
/// inserts the corresponding learning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternFrequency {
    pub pattern: String,
    pub frequency: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub improvement_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_seen: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
}

impl PatternFrequency {
    pub fn failure_rate(&self) -> f64 {
        if self.frequency == 0 {
            0.0
        } else {
            self.failure_count as f64 / self.frequency as f64
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.frequency == 0 {
            0.0
        } else {
            self.success_count as f64 / self.frequency as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates_on_empty_aggregate() {
        let pf = PatternFrequency {
            pattern: "p".to_string(),
            frequency: 0,
            success_count: 0,
            failure_count: 0,
            improvement_count: 0,
            first_seen: None,
            last_seen: None,
        };
        assert_eq!(pf.failure_rate(), 0.0);
        assert_eq!(pf.success_rate(), 0.0);
    }

    #[test]
    fn test_learning_type_serde_key() {
        let learning = Learning {
            id: "l1".to_string(),
            task_id: None,
            context: "c".to_string(),
            action: "a".to_string(),
            result: "r".to_string(),
            lesson: "l".to_string(),
            learning_type: Some(LearningType::Failure),
            pattern: Some("regex-parser".to_string()),
            tags: vec![],
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&learning).unwrap();
        assert_eq!(json["type"], "failure");
    }

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
    }
}
