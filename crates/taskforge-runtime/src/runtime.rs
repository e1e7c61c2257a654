use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use taskforge_providers::CommandCompleter;
use taskforge_store::{Database, LearningFilter};
use taskforge_types::{CodePattern, Learning, Template};

use crate::cache::{Cache, CODE_PATTERNS_TTL, LEARNINGS_TTL, TEMPLATES_TTL};
use crate::config::Config;
use crate::ops::{
    AgentOps, DecomposeOps, EventOps, GraphOps, LearningOps, ProjectOps, StoryOps, SuggestionOps,
    TaskOps, WorkflowOps,
};
use crate::Result;

pub const DB_FILE_NAME: &str = "taskforge.db";

/// Workspace facade: configuration, database and cache behind one handle.
///
/// Tool dispatch is sequential, so a mutex around the connection is enough;
/// background jobs (purge, cache sweep) take the same lock per step.
pub struct Taskforge {
    db: Mutex<Database>,
    cache: Cache,
    config: Config,
    data_dir: Option<PathBuf>,
}

impl Taskforge {
    /// Open (creating if needed) the workspace at `data_dir`.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;

        let config = Config::load_from(&Config::config_path(&data_dir))?;
        let mut db = Database::open(&data_dir.join(DB_FILE_NAME))?;
        db.set_story_done_threshold(config.story_done_threshold);

        let cache = Cache::new(Duration::from_secs(config.cache_ttl_secs));
        Ok(Self {
            db: Mutex::new(db),
            cache,
            config,
            data_dir: Some(data_dir),
        })
    }

    /// In-memory workspace for tests.
    pub fn open_in_memory() -> Result<Self> {
        let config = Config::default();
        let mut db = Database::open_in_memory()?;
        db.set_story_done_threshold(config.story_done_threshold);
        let cache = Cache::new(Duration::from_secs(config.cache_ttl_secs));
        Ok(Self {
            db: Mutex::new(db),
            cache,
            config,
            data_dir: None,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn data_dir(&self) -> Option<&PathBuf> {
        self.data_dir.as_ref()
    }

    pub(crate) fn db(&self) -> MutexGuard<'_, Database> {
        // A poisoned lock only means another operation panicked mid-write;
        // the transaction it held already rolled back.
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn cache(&self) -> &Cache {
        &self.cache
    }

    // --- Cached store reads (per-kind TTLs) ---
    //
    // Writers invalidate the matching prefix (`templates:*`, `patterns:*`,
    // `learnings:*`) before returning, so a hit is never stale past the
    // last committed write.

    fn read_through<T, F>(&self, key: &str, ttl: Duration, load: F) -> Result<T>
    where
        T: serde::Serialize + serde::de::DeserializeOwned,
        F: FnOnce() -> Result<T>,
    {
        if let Some(hit) = self.cache.get(key)
            && let Ok(value) = serde_json::from_value::<T>(hit)
        {
            return Ok(value);
        }
        let value = load()?;
        if let Ok(json) = serde_json::to_value(&value) {
            self.cache.set(key.to_string(), json, Some(ttl));
        }
        Ok(value)
    }

    pub(crate) fn cached_templates(&self) -> Result<Vec<Template>> {
        self.read_through("templates:all", TEMPLATES_TTL, || {
            self.db().list_templates().map_err(Into::into)
        })
    }

    pub(crate) fn cached_code_patterns(&self) -> Result<Vec<CodePattern>> {
        self.read_through("patterns:all", CODE_PATTERNS_TTL, || {
            self.db().list_code_patterns().map_err(Into::into)
        })
    }

    pub(crate) fn cached_learnings(&self, limit: Option<usize>) -> Result<Vec<Learning>> {
        let key = match limit {
            Some(limit) => format!("learnings:list:{}", limit),
            None => "learnings:list:all".to_string(),
        };
        self.read_through(&key, LEARNINGS_TTL, || {
            self.db()
                .list_learnings(&LearningFilter {
                    limit,
                    ..Default::default()
                })
                .map_err(Into::into)
        })
    }

    /// Completer configured in config.toml, if any.
    pub fn completer_from_config(&self) -> Option<CommandCompleter> {
        self.config
            .completer
            .as_ref()
            .map(|c| CommandCompleter::new(c.program.clone(), c.args.clone()))
    }

    // --- Ops groups ---

    pub fn tasks(&self) -> TaskOps<'_> {
        TaskOps { rt: self }
    }

    pub fn stories(&self) -> StoryOps<'_> {
        StoryOps { rt: self }
    }

    pub fn graph(&self) -> GraphOps<'_> {
        GraphOps { rt: self }
    }

    pub fn learnings(&self) -> LearningOps<'_> {
        LearningOps { rt: self }
    }

    pub fn suggestions(&self) -> SuggestionOps<'_> {
        SuggestionOps { rt: self }
    }

    pub fn workflow(&self) -> WorkflowOps<'_> {
        WorkflowOps { rt: self }
    }

    pub fn decomposer(&self) -> DecomposeOps<'_> {
        DecomposeOps { rt: self }
    }

    pub fn agents(&self) -> AgentOps<'_> {
        AgentOps { rt: self }
    }

    pub fn project(&self) -> ProjectOps<'_> {
        ProjectOps { rt: self }
    }

    pub fn events(&self) -> EventOps<'_> {
        EventOps { rt: self }
    }

    /// Hourly-by-default maintenance: purge old processed events and sweep
    /// expired cache entries. Runs until the handle is dropped/aborted.
    pub fn spawn_maintenance(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let rt = self;
        let period = Duration::from_secs(rt.config.purge_interval_minutes * 60);
        let max_age = chrono::Duration::hours(rt.config.purge_max_age_hours as i64);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick fires immediately; skip it so startup stays quiet.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match rt.db().purge_old_processed_events(max_age) {
                    Ok(purged) if purged > 0 => {
                        tracing::info!(purged, "purged old processed events")
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!(error = %e, "event purge failed"),
                }
                let swept = rt.cache.sweep_expired();
                if swept > 0 {
                    tracing::debug!(swept, "swept expired cache entries");
                }
            }
        })
    }
}
