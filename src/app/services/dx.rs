use anyhow::Result;

use crate::infra::db::{types::DxResponse, Database};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DxAddOutcome {
    Added,
    KeyExists,
}

pub async fn add_response(db: &Database, key: &str, response: &str) -> Result<DxAddOutcome> {
    if db.get_dx_response(key).await?.is_some() {
        return Ok(DxAddOutcome::KeyExists);
    }
    db.add_dx_response(key, response).await?;
    Ok(DxAddOutcome::Added)
}

pub async fn remove_response(db: &Database, key: &str) -> Result<bool> {
    Ok(db.remove_dx_response(key).await? > 0)
}

pub async fn get_response(db: &Database, key: &str) -> Result<Option<String>> {
    db.get_dx_response(key).await
}

pub async fn list_responses(db: &Database) -> Result<Vec<DxResponse>> {
    db.get_all_dx_responses().await
}
