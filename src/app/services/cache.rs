use std::sync::Arc;

use anyhow::Result;
use dashmap::DashMap;

use crate::infra::db::{types::Ticket, Database};

/// Write-through cache over open ticket rows. The database is the single
/// source of truth: every mutation lands there first, then updates this
/// map; a miss here always falls back to the store. Rebuilt from the
/// store at startup so a restart cannot leave it stale.
#[derive(Clone, Default)]
pub struct TicketCache {
    by_channel: Arc<DashMap<i64, Ticket>>,
    channel_by_user: Arc<DashMap<i64, i64>>,
}

impl TicketCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn rebuild(&self, db: &Database) -> Result<usize> {
        self.by_channel.clear();
        self.channel_by_user.clear();
        let open = db.get_open_tickets().await?;
        let count = open.len();
        for ticket in open {
            self.insert(ticket);
        }
        Ok(count)
    }

    pub fn insert(&self, ticket: Ticket) {
        self.channel_by_user
            .insert(ticket.user_id, ticket.channel_id);
        self.by_channel.insert(ticket.channel_id, ticket);
    }

    pub fn get(&self, channel_id: i64) -> Option<Ticket> {
        self.by_channel.get(&channel_id).map(|t| t.clone())
    }

    pub fn open_channel_for_user(&self, user_id: i64) -> Option<i64> {
        self.channel_by_user.get(&user_id).map(|c| *c)
    }

    pub fn invalidate_channel(&self, channel_id: i64) {
        if let Some((_, ticket)) = self.by_channel.remove(&channel_id) {
            self.channel_by_user.remove(&ticket.user_id);
        }
    }

    /// Open-ticket lookup that consults the cache first and falls back to
    /// the store, repopulating on a hit.
    pub async fn open_ticket_for_user(
        &self,
        db: &Database,
        user_id: i64,
    ) -> Result<Option<i64>> {
        if let Some(channel_id) = self.open_channel_for_user(user_id) {
            return Ok(Some(channel_id));
        }
        let channel_id = db.get_open_ticket_channel_id(user_id).await?;
        if let Some(id) = channel_id {
            if let Some(ticket) = db.get_open_ticket_by_channel(id).await? {
                self.insert(ticket);
            }
        }
        Ok(channel_id)
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/app_cache.rs"]
mod tests;
