use anyhow::Result;

use super::Database;

impl Database {
    /// Subscribe a staff member to the ticket owner's next reply.
    /// Returns false when they were already subscribed.
    pub async fn add_watcher(&self, channel_id: i64, mod_id: i64) -> Result<bool> {
        let res =
            sqlx::query("INSERT OR IGNORE INTO ticket_watchers (channel_id, mod_id) VALUES (?, ?)")
                .bind(channel_id)
                .bind(mod_id)
                .execute(&self.pool)
                .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn get_watchers(&self, channel_id: i64) -> Result<Vec<i64>> {
        let mod_ids: Vec<i64> =
            sqlx::query_scalar("SELECT mod_id FROM ticket_watchers WHERE channel_id = ?")
                .bind(channel_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(mod_ids)
    }

    pub async fn remove_watcher(&self, channel_id: i64, mod_id: i64) -> Result<u64> {
        let res = sqlx::query("DELETE FROM ticket_watchers WHERE channel_id = ? AND mod_id = ?")
            .bind(channel_id)
            .bind(mod_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    pub async fn remove_watchers_for_channel(&self, channel_id: i64) -> Result<u64> {
        let res = sqlx::query("DELETE FROM ticket_watchers WHERE channel_id = ?")
            .bind(channel_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/infra_db_watchers.rs"]
mod tests;
