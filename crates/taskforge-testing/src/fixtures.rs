//! Canned inputs shared across integration tests.

use serde_json::{json, Value};

/// A realistic analysis record as the assistant would submit it.
pub fn sample_analysis() -> Value {
    json!({
        "files_to_modify": [
            {"path": "src/auth/login.ts", "reason": "add reset entry point", "risk": "medium"},
            {"path": "src/mail/templates.ts", "reason": "new reset template", "risk": "low"}
        ],
        "files_to_create": [
            {"path": "src/auth/reset.ts", "reason": "reset flow module"}
        ],
        "dependencies": [
            {"type": "file", "name": "login.ts", "path": "src/auth/login.ts", "action": "modifies"},
            {"type": "component", "name": "Mailer", "action": "uses"},
            {"type": "model", "name": "User", "action": "uses"}
        ],
        "risks": [
            {"level": "high", "description": "reset tokens must expire", "mitigation": "15 minute TTL"},
            {"level": "low", "description": "email copy drift", "mitigation": ""}
        ],
        "related_code": [
            {"file": "src/auth/login.ts", "description": "existing credential flow", "lines": "40-90"}
        ],
        "recommendations": ["reuse the existing mailer abstraction"]
    })
}

/// A three-task decomposition with one dependent task.
pub fn sample_decomposition() -> Value {
    json!([
        {
            "title": "Add reset request endpoint",
            "description": "POST /api/password-reset with rate limiting",
            "complexity": "medium",
            "estimated_hours": 3.0,
            "dependencies": [],
            "tags": ["api", "backend"]
        },
        {
            "title": "Create reset token model",
            "description": "Table with token hash and expiry",
            "complexity": "simple",
            "estimated_hours": 2.0,
            "dependencies": [],
            "tags": ["database"]
        },
        {
            "title": "Send reset email",
            "description": "Template and delivery through the mailer",
            "complexity": "medium",
            "estimated_hours": 2.0,
            "dependencies": ["Add reset request endpoint", "Create reset token model"],
            "tags": ["email"]
        }
    ])
}

/// Agent definition file in the markdown + YAML front-matter layout.
pub const SAMPLE_AGENT_FILE: &str = "---\n\
name: database-guardian\n\
description: Reviews schema changes, migrations and query plans\n\
model: sonnet\n\
tools:\n\
  - Read\n\
  - Grep\n\
color: blue\n\
---\n\
You review every database change for destructive migrations and missing\n\
indexes before it ships.\n";
