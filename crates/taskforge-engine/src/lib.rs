// Pure domain logic. No database access, no IO; every function here is a
// deterministic map from typed inputs to typed outputs.

pub mod conflict;
pub mod decompose;
pub mod keywords;
pub mod next_steps;
pub mod prompt;
pub mod risk;
pub mod suggest;

pub use conflict::classify_actions;
pub use decompose::{parse_decomposition, DecomposeError, SubTaskSpec};
pub use keywords::extract_keywords;
pub use next_steps::next_steps_for;
pub use risk::{check_pattern_risk, detect_failure_patterns, FailurePattern, PatternRisk};
pub use suggest::{suggest_agents, suggest_tools, AgentSpec, ToolSpec};
