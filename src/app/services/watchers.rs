use anyhow::Result;

use crate::infra::db::Database;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    Subscribed,
    AlreadySubscribed,
}

/// Subscribe a staff member to be pinged on the ticket owner's next
/// reply. Repeat subscriptions are reported, not duplicated.
pub async fn notify_me(db: &Database, channel_id: i64, mod_id: i64) -> Result<WatchOutcome> {
    if db.add_watcher(channel_id, mod_id).await? {
        Ok(WatchOutcome::Subscribed)
    } else {
        Ok(WatchOutcome::AlreadySubscribed)
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/app_watchers.rs"]
mod tests;
