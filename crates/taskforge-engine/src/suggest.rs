use regex::RegexBuilder;
use taskforge_types::{
    AgentSuggestion, AgentType, TaskCategory, ToolSuggestion, ToolType, MAX_SUGGESTIONS,
};

/// Confidence floor added to every scored candidate.
const BASE_CONFIDENCE: f64 = 0.2;
/// Confidence is capped below certainty.
const MAX_CONFIDENCE: f64 = 0.95;
/// A matching category weighs like two extra keyword hits.
const CATEGORY_BONUS: usize = 2;

/// Agent candidate for keyword matching.
#[derive(Debug, Clone)]
pub struct AgentSpec {
    pub name: String,
    pub agent_type: AgentType,
    pub keywords: Vec<String>,
    pub category: Option<TaskCategory>,
}

/// Tool candidate for keyword matching.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub tool_type: ToolType,
    pub keywords: Vec<String>,
    pub category: Option<TaskCategory>,
}

/// Built-in agent registry used when the project has no configured
/// sub-agents (keywords mirror the registered defaults).
pub fn default_agent_specs() -> Vec<AgentSpec> {
    let spec = |name: &str, agent_type, keywords: &[&str], category| AgentSpec {
        name: name.to_string(),
        agent_type,
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        category,
    };
    vec![
        spec(
            "database-guardian",
            AgentType::DatabaseGuardian,
            &["database", "schema", "migration", "sql", "table"],
            Some(TaskCategory::BackendDatabase),
        ),
        spec(
            "api-guardian",
            AgentType::ApiGuardian,
            &["api", "endpoint", "rest", "graphql", "route"],
            Some(TaskCategory::BackendDatabase),
        ),
        spec(
            "test-maintainer",
            AgentType::TestMaintainer,
            &["test", "tests", "coverage", "regression", "spec"],
            Some(TaskCategory::TestFix),
        ),
        spec(
            "architecture-guardian",
            AgentType::ArchitectureGuardian,
            &["architecture", "refactor", "structure", "module", "design"],
            None,
        ),
        spec(
            "production-ready-code-reviewer",
            AgentType::ProductionReadyCodeReviewer,
            &["review", "quality", "security", "performance", "production"],
            None,
        ),
    ]
}

/// Built-in tool registry for installs without configured MCP tools.
pub fn default_tool_specs() -> Vec<ToolSpec> {
    let spec = |name: &str, keywords: &[&str]| ToolSpec {
        name: name.to_string(),
        tool_type: ToolType::Mcp,
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        category: None,
    };
    vec![
        spec(
            "sequential-thinking",
            &["complex", "design", "architecture", "planning", "analysis"],
        ),
        spec(
            "context7",
            &["library", "documentation", "docs", "framework", "api"],
        ),
        spec("memory-bank", &["context", "history", "previous", "recall"]),
        spec(
            "database-tools",
            &["database", "sql", "schema", "migration", "query"],
        ),
        spec(
            "browser-automation",
            &["browser", "e2e", "screenshot", "frontend", "ui"],
        ),
    ]
}

struct Scored {
    match_count: usize,
    matched: Vec<String>,
    confidence: f64,
}

/// Count distinct keyword hits in the task text (case-insensitive whole
/// words) and fold in the category bonus.
///
/// `confidence = min(0.95, match_count / total_keywords + 0.2)`; the result
/// is a pure function of the inputs.
fn score_keywords(
    text: &str,
    keywords: &[String],
    category_matches: bool,
) -> Option<Scored> {
    let mut matched = Vec::new();
    for keyword in keywords {
        let pattern = format!(r"\b{}\b", regex::escape(keyword));
        let re = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .ok()?;
        if re.is_match(text) {
            matched.push(keyword.clone());
        }
    }

    let mut match_count = matched.len();
    if category_matches {
        match_count += CATEGORY_BONUS;
    }
    if match_count == 0 {
        return None;
    }

    let total = keywords.len().max(1);
    let confidence =
        (match_count as f64 / total as f64 + BASE_CONFIDENCE).min(MAX_CONFIDENCE);
    Some(Scored {
        match_count,
        matched,
        confidence,
    })
}

fn reason(matched: &[String], category_matches: bool) -> String {
    let mut parts = Vec::new();
    if !matched.is_empty() {
        parts.push(format!("matched keywords: {}", matched.join(", ")));
    }
    if category_matches {
        parts.push("category match".to_string());
    }
    parts.join("; ")
}

/// Rank agents against a task description; top 3 by confidence. Falls back
/// to a general-purpose agent when nothing matches, so every task gets an
/// assignment hint.
pub fn suggest_agents(
    text: &str,
    category: Option<TaskCategory>,
    specs: &[AgentSpec],
) -> Vec<AgentSuggestion> {
    let mut scored: Vec<(usize, AgentSuggestion)> = specs
        .iter()
        .filter_map(|spec| {
            let category_matches = category.is_some() && category == spec.category;
            let s = score_keywords(text, &spec.keywords, category_matches)?;
            Some((
                s.match_count,
                AgentSuggestion {
                    name: spec.name.clone(),
                    agent_type: spec.agent_type,
                    confidence: s.confidence,
                    reason: reason(&s.matched, category_matches),
                },
            ))
        })
        .collect();

    scored.sort_by(|a, b| {
        b.1.confidence
            .partial_cmp(&a.1.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.0.cmp(&a.0))
            .then_with(|| a.1.name.cmp(&b.1.name))
    });

    let mut suggestions: Vec<AgentSuggestion> =
        scored.into_iter().take(MAX_SUGGESTIONS).map(|(_, s)| s).collect();

    if suggestions.is_empty() {
        suggestions.push(AgentSuggestion {
            name: "general-purpose".to_string(),
            agent_type: AgentType::GeneralPurpose,
            confidence: BASE_CONFIDENCE,
            reason: "no keyword match; general-purpose fallback".to_string(),
        });
    }
    suggestions
}

/// Rank tools against a task description; top 3 by confidence. Unlike
/// agents there is no fallback - a task may warrant no special tooling.
pub fn suggest_tools(
    text: &str,
    category: Option<TaskCategory>,
    specs: &[ToolSpec],
) -> Vec<ToolSuggestion> {
    let mut scored: Vec<(usize, ToolSuggestion)> = specs
        .iter()
        .filter_map(|spec| {
            let category_matches = category.is_some() && category == spec.category;
            let s = score_keywords(text, &spec.keywords, category_matches)?;
            Some((
                s.match_count,
                ToolSuggestion {
                    name: spec.name.clone(),
                    tool_type: spec.tool_type,
                    confidence: s.confidence,
                    reason: reason(&s.matched, category_matches),
                },
            ))
        })
        .collect();

    scored.sort_by(|a, b| {
        b.1.confidence
            .partial_cmp(&a.1.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.0.cmp(&a.0))
            .then_with(|| a.1.name.cmp(&b.1.name))
    });

    scored.into_iter().take(MAX_SUGGESTIONS).map(|(_, s)| s).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_task_picks_database_guardian() {
        let suggestions = suggest_agents(
            "Add a schema migration for the users table",
            None,
            &default_agent_specs(),
        );
        assert_eq!(suggestions[0].name, "database-guardian");
        assert!(suggestions[0].reason.contains("schema"));
        assert!(suggestions[0].reason.contains("migration"));
    }

    #[test]
    fn test_confidence_bounds() {
        let text = "database schema migration sql table api endpoint rest graphql route \
                    test coverage review quality security architecture refactor";
        for s in suggest_agents(text, Some(TaskCategory::BackendDatabase), &default_agent_specs()) {
            assert!(s.confidence <= 0.95, "confidence {} > cap", s.confidence);
            assert!(s.confidence >= 0.2, "confidence {} < floor", s.confidence);
        }
    }

    #[test]
    fn test_category_bonus_breaks_ties() {
        let specs = vec![
            AgentSpec {
                name: "with-category".to_string(),
                agent_type: AgentType::TestMaintainer,
                keywords: vec!["flaky".to_string(), "unrelated".to_string()],
                category: Some(TaskCategory::TestFix),
            },
            AgentSpec {
                name: "without-category".to_string(),
                agent_type: AgentType::GeneralPurpose,
                keywords: vec!["flaky".to_string(), "unrelated".to_string()],
                category: None,
            },
        ];
        let suggestions = suggest_agents("fix flaky suite", Some(TaskCategory::TestFix), &specs);
        assert_eq!(suggestions[0].name, "with-category");
        assert!(suggestions[0].confidence > suggestions[1].confidence);
    }

    #[test]
    fn test_no_match_falls_back_to_general_purpose() {
        let suggestions = suggest_agents("polish the changelog wording", None, &default_agent_specs());
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].agent_type, AgentType::GeneralPurpose);
        assert_eq!(suggestions[0].confidence, 0.2);
    }

    #[test]
    fn test_deterministic_for_fixed_registry() {
        let text = "Add api endpoint tests for the database layer";
        let first = suggest_agents(text, None, &default_agent_specs());
        let second = suggest_agents(text, None, &default_agent_specs());
        let names: Vec<_> = first.iter().map(|s| &s.name).collect();
        let names2: Vec<_> = second.iter().map(|s| &s.name).collect();
        assert_eq!(names, names2);
    }

    #[test]
    fn test_whole_word_matching() {
        // "testing" must not satisfy the keyword "test" as a substring hit
        // unless the word boundary matches.
        let specs = vec![ToolSpec {
            name: "t".to_string(),
            tool_type: ToolType::Mcp,
            keywords: vec!["est".to_string()],
            category: None,
        }];
        assert!(suggest_tools("testing things", None, &specs).is_empty());
    }

    #[test]
    fn test_tools_capped_at_three() {
        let text = "complex design docs library database sql browser ui context history";
        let suggestions = suggest_tools(text, None, &default_tool_specs());
        assert!(suggestions.len() <= 3);
        assert!(!suggestions.is_empty());
    }
}
