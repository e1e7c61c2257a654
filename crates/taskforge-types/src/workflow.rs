use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stages of the analysis -> implementation workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    TaskCreated,
    AnalysisPrepared,
    AnalysisSaved,
    ReadyToImplement,
    ImplementationComplete,
    StoryDecomposed,
}

/// Next-step hint attached to every workflow-advancing tool result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextSteps {
    pub step: u32,
    pub action: String,
    pub instructions: String,
    pub next_tool: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_to_call: Option<Vec<ToolCallHint>>,
}

/// Machine-usable hint the assistant may follow literally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallHint {
    pub tool: String,
    pub params: Value,
}
