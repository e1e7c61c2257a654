//! End-to-end test of the stdio transport: spawn the real binary, speak
//! line-delimited JSON-RPC, walk a task through the workflow.

use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use taskforge_testing::{fixtures, TestWorld};

struct ServerHandle {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
    next_id: i64,
}

impl ServerHandle {
    fn spawn(world: &TestWorld) -> Self {
        let mut child = Command::new(env!("CARGO_BIN_EXE_taskforge"))
            .arg("--data-dir")
            .arg(world.data_dir())
            .arg("serve")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("failed to spawn taskforge serve");
        let stdin = child.stdin.take().expect("stdin");
        let reader = BufReader::new(child.stdout.take().expect("stdout"));
        Self {
            child,
            stdin,
            reader,
            next_id: 1,
        }
    }

    fn request(&mut self, method: &str, params: Value) -> Value {
        let id = self.next_id;
        self.next_id += 1;
        let request = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });
        writeln!(self.stdin, "{}", request).expect("write request");
        self.stdin.flush().expect("flush");

        let mut line = String::new();
        self.reader.read_line(&mut line).expect("read response");
        serde_json::from_str(&line).expect("parse response")
    }

    fn call_tool(&mut self, name: &str, arguments: Value) -> Value {
        let response = self.request(
            "tools/call",
            json!({ "name": name, "arguments": arguments }),
        );
        assert!(
            response.get("error").is_none(),
            "tool {} returned protocol error: {}",
            name,
            response["error"]
        );
        let text = response["result"]["content"][0]["text"]
            .as_str()
            .expect("content text");
        serde_json::from_str(text).expect("parse tool payload")
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[test]
fn test_full_workflow_over_stdio() {
    let world = TestWorld::new();
    world.run(&["init"]).unwrap();
    let mut server = ServerHandle::spawn(&world);

    // Handshake.
    let init = server.request("initialize", json!({}));
    assert_eq!(init["result"]["serverInfo"]["name"], "taskforge");

    let tools = server.request("tools/list", json!({}));
    let tool_names: Vec<&str> = tools["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert!(tool_names.contains(&"create_task"));
    assert!(tool_names.contains(&"decompose_story"));
    assert!(tool_names.contains(&"check_pattern_risk"));

    // Create -> prepare -> save analysis -> execution prompt.
    let created = server.call_tool(
        "create_task",
        json!({ "title": "Add password reset", "description": "Reset via email link" }),
    );
    assert_eq!(created["success"], true);
    assert_eq!(created["next_steps"]["next_tool"], "prepare_task_for_execution");
    let task_id = created["task"]["id"].as_str().unwrap().to_string();

    let prepared = server.call_tool(
        "prepare_task_for_execution",
        json!({ "task_id": task_id }),
    );
    assert_eq!(prepared["next_steps"]["next_tool"], "save_task_analysis");
    assert!(prepared["prompt"].as_str().unwrap().contains("analysis"));

    let saved = server.call_tool(
        "save_task_analysis",
        json!({ "task_id": task_id, "analysis": fixtures::sample_analysis() }),
    );
    assert_eq!(saved["success"], true);
    assert_eq!(saved["next_steps"]["next_tool"], "get_execution_prompt");

    let prompt = server.call_tool("get_execution_prompt", json!({ "task_id": task_id }));
    assert_eq!(prompt["success"], true);
    assert!(prompt["prompt"].as_str().unwrap().contains("login.ts"));
    assert_eq!(prompt["next_steps"]["next_tool"], "update_task");

    // Move through the state machine and record feedback.
    for status in ["todo", "in_progress", "done"] {
        let updated = server.call_tool(
            "update_task",
            json!({ "task_id": task_id, "status": status }),
        );
        assert_eq!(updated["success"], true, "status {}: {:?}", status, updated);
    }

    let feedback = server.call_tool(
        "add_feedback",
        json!({
            "task_id": task_id,
            "feedback": "mailer abstraction made this trivial",
            "type": "success",
            "pattern": "mailer-reuse",
        }),
    );
    assert_eq!(feedback["success"], true);

    let risk = server.call_tool("check_pattern_risk", json!({ "pattern": "mailer-reuse" }));
    assert_eq!(risk["is_risky"], false);

    // Domain error crosses as a structured record.
    let missing = server.call_tool("get_task", json!({ "task_id": "does-not-exist" }));
    assert_eq!(missing["success"], false);
    assert_eq!(missing["error"], "NotFound");
}

#[test]
fn test_story_decomposition_over_stdio() {
    let world = TestWorld::new();
    world.run(&["init"]).unwrap();
    let mut server = ServerHandle::spawn(&world);

    let intelligent = server.call_tool(
        "intelligent_decompose_story",
        json!({ "user_story": "User should be able to reset password via email" }),
    );
    assert_eq!(intelligent["success"], true);
    assert_eq!(
        intelligent["next_steps"]["next_tool"],
        "save_story_decomposition"
    );

    let saved = server.call_tool(
        "save_story_decomposition",
        json!({
            "user_story": "User should be able to reset password via email",
            "tasks": fixtures::sample_decomposition(),
        }),
    );
    assert_eq!(saved["success"], true);
    assert_eq!(saved["tasks"].as_array().unwrap().len(), 3);
    assert_eq!(saved["story_task"]["is_user_story"], true);

    let stories = server.call_tool("get_user_stories", json!({}));
    assert_eq!(stories["count"], 1);

    let health = server.call_tool("get_user_story_health", json!({}));
    assert_eq!(health["count"], 1);
    assert_eq!(health["stories"][0]["total_subtasks"], 3);
}
