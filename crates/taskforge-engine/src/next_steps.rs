use serde_json::json;
use taskforge_types::{NextSteps, ToolCallHint, WorkflowStage};

/// Fixed stage -> next-tool mapping. Every workflow-advancing tool result
/// carries one of these so the caller always knows what to invoke next.
pub fn next_steps_for(stage: WorkflowStage, task_id: Option<&str>) -> NextSteps {
    let hint = |tool: &str| {
        task_id.map(|id| {
            vec![ToolCallHint {
                tool: tool.to_string(),
                params: json!({ "task_id": id }),
            }]
        })
    };

    match stage {
        WorkflowStage::TaskCreated => NextSteps {
            step: 1,
            action: "prepare_analysis".to_string(),
            instructions: "Task created. Call prepare_task_for_execution to receive the \
                           codebase analysis prompt before implementing."
                .to_string(),
            next_tool: "prepare_task_for_execution".to_string(),
            tools_to_call: hint("prepare_task_for_execution"),
        },
        WorkflowStage::AnalysisPrepared => NextSteps {
            step: 2,
            action: "analyze_codebase".to_string(),
            instructions: "Use your own read/search/glob capabilities to analyze the codebase \
                           as instructed by the prompt, then submit the findings via \
                           save_task_analysis."
                .to_string(),
            next_tool: "save_task_analysis".to_string(),
            tools_to_call: hint("save_task_analysis"),
        },
        WorkflowStage::AnalysisSaved => NextSteps {
            step: 3,
            action: "fetch_execution_prompt".to_string(),
            instructions: "Analysis stored. Call get_execution_prompt to receive the enriched \
                           implementation prompt."
                .to_string(),
            next_tool: "get_execution_prompt".to_string(),
            tools_to_call: hint("get_execution_prompt"),
        },
        WorkflowStage::ReadyToImplement => NextSteps {
            step: 4,
            action: "implement".to_string(),
            instructions: "Set the task status to in_progress via update_task, implement the \
                           changes, then set it to done."
                .to_string(),
            next_tool: "update_task".to_string(),
            tools_to_call: task_id.map(|id| {
                vec![ToolCallHint {
                    tool: "update_task".to_string(),
                    params: json!({ "task_id": id, "status": "in_progress" }),
                }]
            }),
        },
        WorkflowStage::ImplementationComplete => NextSteps {
            step: 5,
            action: "record_feedback".to_string(),
            instructions: "Implementation finished. Record what worked and what failed via \
                           add_feedback so future tasks benefit."
                .to_string(),
            next_tool: "add_feedback".to_string(),
            tools_to_call: hint("add_feedback"),
        },
        WorkflowStage::StoryDecomposed => NextSteps {
            step: 1,
            action: "analyze_subtasks".to_string(),
            instructions: "Story decomposed. Analyze each sub-task with \
                           prepare_task_for_execution, starting with tasks that have no \
                           dependencies."
                .to_string(),
            next_tool: "prepare_task_for_execution".to_string(),
            tools_to_call: hint("prepare_task_for_execution"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_tool_mapping_is_fixed() {
        let cases = [
            (WorkflowStage::TaskCreated, "prepare_task_for_execution"),
            (WorkflowStage::AnalysisPrepared, "save_task_analysis"),
            (WorkflowStage::AnalysisSaved, "get_execution_prompt"),
            (WorkflowStage::ReadyToImplement, "update_task"),
            (WorkflowStage::ImplementationComplete, "add_feedback"),
            (WorkflowStage::StoryDecomposed, "prepare_task_for_execution"),
        ];
        for (stage, tool) in cases {
            assert_eq!(next_steps_for(stage, Some("t1")).next_tool, tool);
        }
    }

    #[test]
    fn test_hint_carries_task_id() {
        let steps = next_steps_for(WorkflowStage::ReadyToImplement, Some("abc"));
        let hints = steps.tools_to_call.unwrap();
        assert_eq!(hints[0].params["task_id"], "abc");
        assert_eq!(hints[0].params["status"], "in_progress");
    }

    #[test]
    fn test_no_task_id_no_hints() {
        assert!(next_steps_for(WorkflowStage::TaskCreated, None)
            .tools_to_call
            .is_none());
    }
}
