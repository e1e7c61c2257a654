use chrono::Duration;
use taskforge_store::EventStats;
use taskforge_types::QueuedEvent;

use crate::runtime::Taskforge;
use crate::Result;

pub struct EventOps<'a> {
    pub(crate) rt: &'a Taskforge,
}

impl EventOps<'_> {
    /// Oldest unprocessed events for pollers (dashboard and friends).
    pub fn fetch_unprocessed(&self, limit: usize) -> Result<Vec<QueuedEvent>> {
        self.rt
            .db()
            .fetch_unprocessed_events(limit)
            .map_err(Into::into)
    }

    /// Idempotent; returns whether this call flipped the flag.
    pub fn mark_processed(&self, id: i64) -> Result<bool> {
        self.rt.db().mark_event_processed(id).map_err(Into::into)
    }

    /// Remove processed events older than `hours` (config default when
    /// `None`).
    pub fn purge(&self, hours: Option<u64>) -> Result<usize> {
        let hours = hours.unwrap_or(self.rt.config().purge_max_age_hours);
        self.rt
            .db()
            .purge_old_processed_events(Duration::hours(hours as i64))
            .map_err(Into::into)
    }

    pub fn stats(&self) -> Result<EventStats> {
        self.rt.db().event_stats().map_err(Into::into)
    }
}
