use taskforge_store::{DeletedStory, SafeDeleteOutcome, StoryHealth, TaskFilter};
use taskforge_types::{Task, TaskStatus};

use crate::runtime::Taskforge;
use crate::Result;

pub struct StoryOps<'a> {
    pub(crate) rt: &'a Taskforge,
}

impl StoryOps<'_> {
    pub fn list(&self) -> Result<Vec<Task>> {
        self.rt
            .db()
            .list_tasks(&TaskFilter::default().user_stories())
            .map_err(Into::into)
    }

    pub fn tasks_of(&self, story_id: &str) -> Result<Vec<Task>> {
        let db = self.rt.db();
        // Surface NotFound for a bogus story id instead of an empty list.
        db.require_task(story_id)?;
        db.sub_tasks(story_id).map_err(Into::into)
    }

    pub fn delete(&self, story_id: &str, force: bool) -> Result<DeletedStory> {
        let deleted = self.rt.db().delete_user_story(story_id, force)?;
        self.rt.cache().invalidate_pattern("tasks:*");
        self.rt.cache().invalidate_pattern("task:*");
        // Learnings owned by the deleted sub-tasks cascade with them.
        self.rt.cache().invalidate_pattern("learnings:*");
        Ok(deleted)
    }

    pub fn safe_delete_by_status(&self, status: TaskStatus) -> Result<SafeDeleteOutcome> {
        let outcome = self.rt.db().safe_delete_tasks_by_status(status)?;
        if !outcome.deleted_ids.is_empty() {
            self.rt.cache().invalidate_pattern("tasks:*");
            self.rt.cache().invalidate_pattern("task:*");
            self.rt.cache().invalidate_pattern("learnings:*");
        }
        Ok(outcome)
    }

    pub fn health(&self) -> Result<Vec<StoryHealth>> {
        self.rt.db().user_story_health().map_err(Into::into)
    }
}
