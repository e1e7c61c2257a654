use serde::{Deserialize, Serialize};

use crate::task::TaskStatus;

/// Fraction of done sub-tasks at which a user story counts as done.
pub const DEFAULT_STORY_DONE_THRESHOLD: f64 = 0.80;

/// Multiset of sub-task statuses for one user story.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryStatusCounts {
    pub total: usize,
    pub done: usize,
    pub in_progress: usize,
    pub todo: usize,
    pub backlog: usize,
}

impl StoryStatusCounts {
    pub fn add(&mut self, status: TaskStatus) {
        self.total += 1;
        match status {
            TaskStatus::Done => self.done += 1,
            TaskStatus::InProgress => self.in_progress += 1,
            TaskStatus::Todo => self.todo += 1,
            TaskStatus::Backlog => self.backlog += 1,
        }
    }

    pub fn completion_percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            crate::round_percent(self.done as f64 / self.total as f64)
        }
    }
}

impl FromIterator<TaskStatus> for StoryStatusCounts {
    fn from_iter<I: IntoIterator<Item = TaskStatus>>(iter: I) -> Self {
        let mut counts = StoryStatusCounts::default();
        for status in iter {
            counts.add(status);
        }
        counts
    }
}

/// Derive a user story's status from its sub-task statuses.
///
/// This is a derived-field refresh, not a transition: callers apply the
/// result directly, bypassing the edge table, so sub-task reverts can pull a
/// story back from `done` without tripping transition validation.
///
/// Returns `None` when the story has no sub-tasks (keep current status).
pub fn derive_story_status(counts: &StoryStatusCounts, done_threshold: f64) -> Option<TaskStatus> {
    if counts.total == 0 {
        return None;
    }
    let done_fraction = counts.done as f64 / counts.total as f64;
    if done_fraction >= done_threshold {
        Some(TaskStatus::Done)
    } else if counts.in_progress > 0 {
        Some(TaskStatus::InProgress)
    } else if counts.todo > 0 {
        Some(TaskStatus::Todo)
    } else {
        Some(TaskStatus::Backlog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TaskStatus::*;

    fn derive(statuses: &[TaskStatus]) -> Option<TaskStatus> {
        let counts: StoryStatusCounts = statuses.iter().copied().collect();
        derive_story_status(&counts, DEFAULT_STORY_DONE_THRESHOLD)
    }

    #[test]
    fn test_no_subtasks_keeps_current() {
        assert_eq!(derive(&[]), None);
    }

    #[test]
    fn test_all_backlog() {
        assert_eq!(derive(&[Backlog, Backlog, Backlog]), Some(Backlog));
    }

    #[test]
    fn test_any_in_progress_wins_below_threshold() {
        assert_eq!(derive(&[Backlog, InProgress, Backlog]), Some(InProgress));
        assert_eq!(derive(&[Done, InProgress, Todo]), Some(InProgress));
    }

    #[test]
    fn test_todo_without_in_progress() {
        assert_eq!(derive(&[Backlog, Todo, Backlog]), Some(Todo));
    }

    #[test]
    fn test_done_subtask_alone_does_not_promote_to_todo() {
        // One done, two backlog: 33% < 80%, nothing running, nothing queued.
        assert_eq!(derive(&[Done, Backlog, Backlog]), Some(Backlog));
    }

    #[test]
    fn test_done_threshold() {
        assert_eq!(derive(&[Done, Done, Done, Done, Backlog]), Some(Done)); // 80%
        assert_eq!(derive(&[Done, Done, Done, Backlog, Backlog]), Some(Backlog)); // 60%
        assert_eq!(derive(&[Done, Done, Done, Todo, Backlog]), Some(Todo));
    }

    #[test]
    fn test_custom_threshold() {
        let counts: StoryStatusCounts = [Done, Backlog].iter().copied().collect();
        assert_eq!(derive_story_status(&counts, 0.5), Some(Done));
        assert_eq!(derive_story_status(&counts, 0.8), Some(Backlog));
    }

    #[test]
    fn test_completion_percentage_rounding() {
        let counts: StoryStatusCounts = [Done, Backlog, Backlog].iter().copied().collect();
        assert_eq!(counts.completion_percentage(), 33.33);
    }
}
