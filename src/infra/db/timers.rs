use anyhow::Result;
use chrono::NaiveDateTime;

use crate::core::types::TimerAction;

use super::{types::TicketTimer, Database};

impl Database {
    /// Insert a pending timer row. The store enforces no uniqueness:
    /// callers cancel any existing (channel, action) timer first,
    /// otherwise duplicates accumulate and both fire.
    pub async fn add_timer(
        &self,
        channel_id: i64,
        user_id: i64,
        action: TimerAction,
        execute_at: NaiveDateTime,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO ticket_timers (channel_id, user_id, action, execute_at, status) \
             VALUES (?, ?, ?, ?, 'pending')",
        )
        .bind(channel_id)
        .bind(user_id)
        .bind(action.as_str())
        .bind(execute_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Remove pending timers for (channel, action). Returns how many rows
    /// went away; cancelling a timer that does not exist returns 0.
    pub async fn cancel_timer(&self, channel_id: i64, action: TimerAction) -> Result<u64> {
        let res = sqlx::query("DELETE FROM ticket_timers WHERE channel_id = ? AND action = ?")
            .bind(channel_id)
            .bind(action.as_str())
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    /// Delete a single timer row after dispatch. Unlike `cancel_timer`
    /// this targets the exact row, so a malformed row still gets reaped.
    pub async fn consume_timer(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM ticket_timers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn cancel_all_timers(&self, channel_id: i64) -> Result<u64> {
        let res = sqlx::query("DELETE FROM ticket_timers WHERE channel_id = ?")
            .bind(channel_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    /// All pending timers with `execute_at <= now`, in storage order.
    pub async fn due_timers(&self, now: NaiveDateTime) -> Result<Vec<TicketTimer>> {
        let timers = sqlx::query_as::<_, TicketTimer>(
            "SELECT * FROM ticket_timers WHERE status = 'pending' AND execute_at <= ?",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(timers)
    }

    pub async fn pending_timers(&self, channel_id: i64) -> Result<Vec<TicketTimer>> {
        let timers = sqlx::query_as::<_, TicketTimer>(
            "SELECT * FROM ticket_timers WHERE channel_id = ? AND status = 'pending'",
        )
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(timers)
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/infra_db_timers.rs"]
mod tests;
