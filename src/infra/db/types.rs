use chrono::NaiveDateTime;

use crate::core::types::TicketStatus;

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Ticket {
    pub channel_id: i64,
    pub user_id: i64,
    pub member_username: String,
    pub mod_id: Option<i64>,
    pub mod_username: Option<String>,
    pub category_id: i64,
    pub channel_name: String,
    pub ticket_type: String,
    pub status: String,
    pub notified: bool,
    pub created_at: NaiveDateTime,
    pub closed_at: Option<NaiveDateTime>,
}

impl Ticket {
    pub fn is_open(&self) -> bool {
        self.status == TicketStatus::Open.as_str()
    }

    pub fn is_claimed(&self) -> bool {
        self.mod_id.is_some()
    }
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct TicketTimer {
    pub id: i64,
    pub channel_id: i64,
    pub user_id: i64,
    pub action: String,
    pub execute_at: NaiveDateTime,
    #[allow(dead_code)]
    pub status: String,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct DxResponse {
    pub key: String,
    pub response: String,
}
