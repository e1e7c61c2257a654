use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Closed set of event types published on the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    TaskCreated,
    TaskUpdated,
    TaskDeleted,
    FeedbackReceived,
    CodebaseAnalyzed,
    DecisionMade,
    GuardianIntervention,
    CodeChanged,
    StatusTransition,
    UserStoryCreated,
    UserStoryDeleted,
    DependencyAdded,
    DependencyRemoved,
    ExecutionOrderChanged,
    AutoAnalysisStarted,
    TaskAnalysisPrepared,
    AutoAnalysisCompleted,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::TaskCreated => "task_created",
            EventType::TaskUpdated => "task_updated",
            EventType::TaskDeleted => "task_deleted",
            EventType::FeedbackReceived => "feedback_received",
            EventType::CodebaseAnalyzed => "codebase_analyzed",
            EventType::DecisionMade => "decision_made",
            EventType::GuardianIntervention => "guardian_intervention",
            EventType::CodeChanged => "code_changed",
            EventType::StatusTransition => "status_transition",
            EventType::UserStoryCreated => "user_story_created",
            EventType::UserStoryDeleted => "user_story_deleted",
            EventType::DependencyAdded => "dependency_added",
            EventType::DependencyRemoved => "dependency_removed",
            EventType::ExecutionOrderChanged => "execution_order_changed",
            EventType::AutoAnalysisStarted => "auto_analysis_started",
            EventType::TaskAnalysisPrepared => "task_analysis_prepared",
            EventType::AutoAnalysisCompleted => "auto_analysis_completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "task_created" => Some(EventType::TaskCreated),
            "task_updated" => Some(EventType::TaskUpdated),
            "task_deleted" => Some(EventType::TaskDeleted),
            "feedback_received" => Some(EventType::FeedbackReceived),
            "codebase_analyzed" => Some(EventType::CodebaseAnalyzed),
            "decision_made" => Some(EventType::DecisionMade),
            "guardian_intervention" => Some(EventType::GuardianIntervention),
            "code_changed" => Some(EventType::CodeChanged),
            "status_transition" => Some(EventType::StatusTransition),
            "user_story_created" => Some(EventType::UserStoryCreated),
            "user_story_deleted" => Some(EventType::UserStoryDeleted),
            "dependency_added" => Some(EventType::DependencyAdded),
            "dependency_removed" => Some(EventType::DependencyRemoved),
            "execution_order_changed" => Some(EventType::ExecutionOrderChanged),
            "auto_analysis_started" => Some(EventType::AutoAnalysisStarted),
            "task_analysis_prepared" => Some(EventType::TaskAnalysisPrepared),
            "auto_analysis_completed" => Some(EventType::AutoAnalysisCompleted),
            _ => None,
        }
    }
}

/// Row in the persistent event queue. Immutable after insert except for the
/// `processed` flag, which only flips false -> true.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedEvent {
    pub id: i64,
    pub event_type: EventType,
    pub payload: Value,
    pub processed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
}

/// Event to append; the store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub event_type: EventType,
    pub payload: Value,
}

impl NewEvent {
    pub fn new(event_type: EventType, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_round_trip() {
        for name in [
            "task_created",
            "task_updated",
            "task_deleted",
            "feedback_received",
            "codebase_analyzed",
            "decision_made",
            "guardian_intervention",
            "code_changed",
            "status_transition",
            "user_story_created",
            "user_story_deleted",
            "dependency_added",
            "dependency_removed",
            "execution_order_changed",
            "auto_analysis_started",
            "task_analysis_prepared",
            "auto_analysis_completed",
        ] {
            let parsed = EventType::parse(name).expect(name);
            assert_eq!(parsed.as_str(), name);
        }
        assert_eq!(EventType::parse("nope"), None);
    }
}
