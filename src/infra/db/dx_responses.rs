use anyhow::Result;

use super::{types::DxResponse, Database};

impl Database {
    pub async fn get_dx_response(&self, key: &str) -> Result<Option<String>> {
        let response: Option<String> =
            sqlx::query_scalar("SELECT response FROM dx_responses WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(response)
    }

    pub async fn add_dx_response(&self, key: &str, response: &str) -> Result<()> {
        sqlx::query("INSERT INTO dx_responses (key, response) VALUES (?, ?)")
            .bind(key)
            .bind(response)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn remove_dx_response(&self, key: &str) -> Result<u64> {
        let res = sqlx::query("DELETE FROM dx_responses WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    pub async fn get_all_dx_responses(&self) -> Result<Vec<DxResponse>> {
        let rows = sqlx::query_as::<_, DxResponse>(
            "SELECT key, response FROM dx_responses ORDER BY key",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/infra_db_dx_responses.rs"]
mod tests;
