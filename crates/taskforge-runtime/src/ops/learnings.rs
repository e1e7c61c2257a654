use serde::Serialize;
use taskforge_engine::{
    check_pattern_risk, detect_failure_patterns, extract_keywords, FailurePattern, PatternRisk,
};
use taskforge_store::{LearningFilter, NewLearning, TrendingPattern};
use taskforge_types::{CodePattern, Learning, LearningType, PatternFrequency, Template};

use crate::runtime::Taskforge;
use crate::{Error, Result};

const SIMILAR_LIMIT: usize = 10;

#[derive(Debug, Clone)]
pub struct FeedbackInput {
    pub task_id: String,
    pub feedback: String,
    pub learning_type: LearningType,
    pub pattern: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordedFeedback {
    pub learning: Learning,
    pub pattern_frequency: Option<PatternFrequency>,
}

#[derive(Debug, Clone, Default)]
pub struct SimilarQuery {
    pub context: String,
    pub task_id: Option<String>,
    pub learning_type: Option<LearningType>,
    pub pattern: Option<String>,
}

/// Keyword-matched knowledge for a free-text query.
#[derive(Debug, Clone, Serialize)]
pub struct RelevantKnowledge {
    pub templates: Vec<Template>,
    pub patterns: Vec<CodePattern>,
    pub learnings: Vec<Learning>,
}

pub struct LearningOps<'a> {
    pub(crate) rt: &'a Taskforge,
}

impl LearningOps<'_> {
    /// Record feedback on a task and bump the pattern aggregate (same
    /// transaction, store-side).
    pub fn add_feedback(&self, input: FeedbackInput) -> Result<RecordedFeedback> {
        if input.task_id.trim().is_empty() {
            return Err(Error::Validation("task_id must not be empty".into()));
        }
        if input.feedback.trim().is_empty() {
            return Err(Error::Validation("feedback must not be empty".into()));
        }
        if input.pattern.trim().is_empty() {
            return Err(Error::Validation("pattern must not be empty".into()));
        }

        let mut tags = input.tags.clone();
        for extra in [input.learning_type.as_str(), "feedback"] {
            if !tags.iter().any(|t| t == extra) {
                tags.push(extra.to_string());
            }
        }

        let learning = {
            let mut db = self.rt.db();
            db.require_task(&input.task_id)?;
            db.add_learning(&NewLearning {
                task_id: Some(input.task_id.clone()),
                context: format!("Task {} execution", input.task_id),
                action: format!("Applied pattern: {}", input.pattern),
                result: input.feedback.clone(),
                lesson: input.feedback,
                learning_type: Some(input.learning_type),
                pattern: Some(input.pattern.clone()),
                tags,
            })?
        };
        self.rt.cache().invalidate_pattern("learnings:*");

        let pattern_frequency = self.rt.db().pattern_frequency(&input.pattern)?;
        Ok(RecordedFeedback {
            learning,
            pattern_frequency,
        })
    }

    pub fn similar(&self, query: SimilarQuery) -> Result<Vec<Learning>> {
        self.rt
            .db()
            .list_learnings(&LearningFilter {
                contains: Some(query.context),
                task_id: query.task_id,
                learning_type: query.learning_type,
                pattern: query.pattern,
                limit: Some(SIMILAR_LIMIT),
            })
            .map_err(Into::into)
    }

    pub fn list(&self, limit: Option<usize>) -> Result<Vec<Learning>> {
        self.rt.cached_learnings(limit)
    }

    pub fn top_patterns(&self, limit: usize) -> Result<Vec<PatternFrequency>> {
        self.rt.db().top_patterns(limit).map_err(Into::into)
    }

    pub fn trending_patterns(&self, days: i64, limit: usize) -> Result<Vec<TrendingPattern>> {
        self.rt
            .db()
            .trending_patterns(days, limit)
            .map_err(Into::into)
    }

    pub fn pattern_stats(&self, pattern: &str) -> Result<Option<PatternFrequency>> {
        self.rt.db().pattern_frequency(pattern).map_err(Into::into)
    }

    pub fn detect_failure_patterns(
        &self,
        min_occurrences: u64,
        failure_threshold: f64,
    ) -> Result<Vec<FailurePattern>> {
        let aggregates = self.rt.db().patterns_with_min_frequency(min_occurrences)?;
        Ok(detect_failure_patterns(
            &aggregates,
            min_occurrences,
            failure_threshold,
        ))
    }

    pub fn check_pattern_risk(&self, pattern: &str) -> Result<PatternRisk> {
        let aggregate = self.rt.db().pattern_frequency(pattern)?;
        Ok(check_pattern_risk(pattern, aggregate.as_ref()))
    }

    /// Templates, code patterns and learnings whose text overlaps the
    /// query's keywords. The template and pattern pools come through the
    /// cache; the learning search is free-text and always hits the store.
    pub fn relevant_knowledge(&self, query: &str) -> Result<RelevantKnowledge> {
        let keywords = extract_keywords(query, 8);

        let matches = |text: &str| {
            let lower = text.to_lowercase();
            keywords.iter().any(|k| lower.contains(k.as_str()))
        };

        let templates = self
            .rt
            .cached_templates()?
            .into_iter()
            .filter(|t| matches(&t.name) || matches(&t.content))
            .collect();
        let patterns = self
            .rt
            .cached_code_patterns()?
            .into_iter()
            .filter(|p| matches(&p.name) || matches(&p.description))
            .collect();
        let learnings = self.rt.db().list_learnings(&LearningFilter {
            contains: Some(query.to_string()),
            limit: Some(SIMILAR_LIMIT),
            ..Default::default()
        })?;

        Ok(RelevantKnowledge {
            templates,
            patterns,
            learnings,
        })
    }
}
