use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Resolve the workspace data directory path based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. TASKFORGE_PATH environment variable (with tilde expansion)
/// 3. XDG data directory (recommended default)
/// 4. ~/.taskforge (fallback for systems without XDG)
pub fn resolve_workspace_path(explicit_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }

    if let Ok(env_path) = std::env::var("TASKFORGE_PATH") {
        return Ok(expand_tilde(&env_path));
    }

    if let Some(data_dir) = dirs::data_dir() {
        return Ok(data_dir.join("taskforge"));
    }

    if let Some(home) = std::env::var_os("HOME") {
        return Ok(PathBuf::from(home).join(".taskforge"));
    }

    Err(Error::Config(
        "Could not determine workspace path: no HOME directory or XDG data directory found"
            .to_string(),
    ))
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return PathBuf::from(home).join(stripped);
    }
    PathBuf::from(path)
}

fn default_story_done_threshold() -> f64 {
    taskforge_types::DEFAULT_STORY_DONE_THRESHOLD
}

fn default_purge_max_age_hours() -> u64 {
    24
}

fn default_purge_interval_minutes() -> u64 {
    60
}

fn default_completer_timeout_secs() -> u64 {
    30
}

fn default_cache_ttl_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleterConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Fraction of done sub-tasks at which a user story is derived done.
    #[serde(default = "default_story_done_threshold")]
    pub story_done_threshold: f64,

    /// Processed events older than this are purged.
    #[serde(default = "default_purge_max_age_hours")]
    pub purge_max_age_hours: u64,

    /// Cadence of the background purge job.
    #[serde(default = "default_purge_interval_minutes")]
    pub purge_interval_minutes: u64,

    /// Upper bound for one completer call.
    #[serde(default = "default_completer_timeout_secs")]
    pub completer_timeout_secs: u64,

    /// Default cache entry lifetime.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// External completion command for story decomposition.
    #[serde(default)]
    pub completer: Option<CompleterConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            story_done_threshold: default_story_done_threshold(),
            purge_max_age_hours: default_purge_max_age_hours(),
            purge_interval_minutes: default_purge_interval_minutes(),
            completer_timeout_secs: default_completer_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            completer: None,
        }
    }
}

impl Config {
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path(data_dir: &std::path::Path) -> PathBuf {
        data_dir.join("config.toml")
    }
}
