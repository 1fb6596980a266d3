use anyhow::Result;
use chrono::{NaiveDateTime, Utc};

use super::{types::Ticket, Database};

pub struct NewTicket<'a> {
    pub channel_id: i64,
    pub user_id: i64,
    pub member_username: &'a str,
    pub category_id: i64,
    pub channel_name: &'a str,
    pub ticket_type: &'a str,
}

impl Database {
    pub async fn get_open_ticket_channel_id(&self, user_id: i64) -> Result<Option<i64>> {
        let channel_id: Option<i64> = sqlx::query_scalar(
            "SELECT channel_id FROM active_tickets WHERE user_id = ? AND status = 'open'",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(channel_id)
    }

    pub async fn get_open_ticket_by_channel(&self, channel_id: i64) -> Result<Option<Ticket>> {
        let ticket = sqlx::query_as::<_, Ticket>(
            "SELECT * FROM active_tickets WHERE channel_id = ? AND status = 'open'",
        )
        .bind(channel_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(ticket)
    }

    pub async fn get_ticket_by_channel(&self, channel_id: i64) -> Result<Option<Ticket>> {
        let ticket =
            sqlx::query_as::<_, Ticket>("SELECT * FROM active_tickets WHERE channel_id = ?")
                .bind(channel_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(ticket)
    }

    pub async fn get_open_tickets(&self) -> Result<Vec<Ticket>> {
        let tickets =
            sqlx::query_as::<_, Ticket>("SELECT * FROM active_tickets WHERE status = 'open'")
                .fetch_all(&self.pool)
                .await?;
        Ok(tickets)
    }

    pub async fn create_ticket(&self, ticket: NewTicket<'_>) -> Result<()> {
        let now = Utc::now().naive_utc();
        sqlx::query(
            "INSERT INTO active_tickets \
             (channel_id, user_id, member_username, mod_id, mod_username, category_id, \
              channel_name, ticket_type, status, notified, created_at, closed_at) \
             VALUES (?, ?, ?, NULL, NULL, ?, ?, ?, 'open', 0, ?, NULL)",
        )
        .bind(ticket.channel_id)
        .bind(ticket.user_id)
        .bind(ticket.member_username)
        .bind(ticket.category_id)
        .bind(ticket.channel_name)
        .bind(ticket.ticket_type)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Compare-and-swap claim: succeeds only while the ticket is open and
    /// unclaimed. Returns false when someone else got there first.
    pub async fn claim_ticket(
        &self,
        channel_id: i64,
        mod_id: i64,
        mod_username: &str,
    ) -> Result<bool> {
        let res = sqlx::query(
            "UPDATE active_tickets SET mod_id = ?, mod_username = ? \
             WHERE channel_id = ? AND status = 'open' AND mod_id IS NULL",
        )
        .bind(mod_id)
        .bind(mod_username)
        .bind(channel_id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    /// Reassign the responsible staff member. Unlike claim this also
    /// overwrites an existing assignee.
    pub async fn transfer_ticket(
        &self,
        channel_id: i64,
        mod_id: i64,
        mod_username: &str,
    ) -> Result<bool> {
        let res = sqlx::query(
            "UPDATE active_tickets SET mod_id = ?, mod_username = ? \
             WHERE channel_id = ? AND status = 'open'",
        )
        .bind(mod_id)
        .bind(mod_username)
        .bind(channel_id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    /// Compare-and-swap close: a second close of the same ticket is a
    /// no-op and reports false.
    pub async fn close_ticket(&self, channel_id: i64, closed_at: NaiveDateTime) -> Result<bool> {
        let res = sqlx::query(
            "UPDATE active_tickets SET status = 'closed', closed_at = ? \
             WHERE channel_id = ? AND status = 'open'",
        )
        .bind(closed_at)
        .bind(channel_id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn close_tickets_for_user(
        &self,
        user_id: i64,
        closed_at: NaiveDateTime,
    ) -> Result<u64> {
        let res = sqlx::query(
            "UPDATE active_tickets SET status = 'closed', closed_at = ? \
             WHERE user_id = ? AND status = 'open'",
        )
        .bind(closed_at)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected())
    }

    /// Mark that the unclaimed reminder has been posted for this ticket.
    pub async fn mark_ticket_notified(&self, channel_id: i64) -> Result<()> {
        sqlx::query("UPDATE active_tickets SET notified = 1 WHERE channel_id = ?")
            .bind(channel_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/infra_db_tickets.rs"]
mod tests;
