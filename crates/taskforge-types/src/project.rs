use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Project container. Single-deployment installs carry one default project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechStackEntry {
    pub id: String,
    pub project_id: String,
    /// e.g. "frontend", "backend", "database", "testing"
    pub category: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guideline {
    pub id: String,
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guideline_type: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodePattern {
    pub id: String,
    pub project_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_code: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub project_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_type: Option<String>,
    pub content: String,
    /// Declared `{{variable}}` names; informational, rendering scans content.
    #[serde(default)]
    pub variables: Vec<String>,
}

impl Template {
    /// Substitute `{{name}}` placeholders from a JSON object. Returns the
    /// rendered text and any placeholder names left unresolved.
    pub fn render(&self, vars: &Value) -> (String, Vec<String>) {
        let mut out = String::with_capacity(self.content.len());
        let mut unresolved = Vec::new();
        let mut rest = self.content.as_str();

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => {
                    let name = after[..end].trim();
                    match vars.get(name) {
                        Some(Value::String(s)) => out.push_str(s),
                        Some(v) => out.push_str(&v.to_string()),
                        None => {
                            out.push_str(&rest[start..start + 2 + end + 2]);
                            if !unresolved.contains(&name.to_string()) {
                                unresolved.push(name.to_string());
                            }
                        }
                    }
                    rest = &after[end + 2..];
                }
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        (out, unresolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template(content: &str) -> Template {
        Template {
            id: "t1".to_string(),
            project_id: "p1".to_string(),
            name: "test".to_string(),
            template_type: None,
            content: content.to_string(),
            variables: vec![],
        }
    }

    #[test]
    fn test_render_substitutes_strings() {
        let t = template("Implement {{feature}} in {{file}}");
        let (out, unresolved) = t.render(&json!({"feature": "login", "file": "auth.ts"}));
        assert_eq!(out, "Implement login in auth.ts");
        assert!(unresolved.is_empty());
    }

    #[test]
    fn test_render_reports_unresolved() {
        let t = template("Hello {{name}}, {{missing}}");
        let (out, unresolved) = t.render(&json!({"name": "world"}));
        assert_eq!(out, "Hello world, {{missing}}");
        assert_eq!(unresolved, vec!["missing".to_string()]);
    }

    #[test]
    fn test_render_non_string_values() {
        let t = template("retries = {{count}}");
        let (out, _) = t.render(&json!({"count": 3}));
        assert_eq!(out, "retries = 3");
    }

    #[test]
    fn test_render_unterminated_placeholder() {
        let t = template("broken {{tail");
        let (out, unresolved) = t.render(&json!({}));
        assert_eq!(out, "broken {{tail");
        assert!(unresolved.is_empty());
    }
}
