use serde::Deserialize;
use std::collections::HashSet;

#[derive(Deserialize, Clone)]
pub struct Config {
    pub general: GeneralConfig,
    pub database: DatabaseConfig,
    pub discord: DiscordConfig,
    #[serde(default)]
    pub permissions: PermissionsConfig,
    pub tickets: TicketsConfig,
    pub transcripts: TranscriptsConfig,

    #[serde(default)]
    pub operational_parameters: OperationalParameters,
}

#[derive(Deserialize, Clone)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: LogLevelConfig,
}

const fn default_log_level() -> LogLevelConfig {
    LogLevelConfig::Info
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevelConfig {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevelConfig {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct DatabaseConfig {
    pub db_file: String,
}

#[derive(Deserialize, Clone)]
pub struct DiscordConfig {
    pub token: String,
    pub guild_id: i64,
    /// Role pinged when a new ticket opens or goes unclaimed too long.
    pub staff_ping_role_id: i64,
    /// Channel receiving transcript logs.
    pub log_channel_id: i64,
    /// Category that `!contact` tickets are created under.
    pub contact_category_id: i64,
}

#[derive(Deserialize, Clone, Default)]
pub struct PermissionsConfig {
    /// Junior staff: may log tickets, subscribe to replies, use macros.
    #[serde(default)]
    pub junior_role_ids: Vec<i64>,
    /// Full staff: everything junior plus close/suspend/transfer/delete.
    #[serde(default)]
    pub staff_role_ids: Vec<i64>,
    /// Admins: premade-response management, `!contact`, `!newcc`.
    #[serde(default)]
    pub admin_user_ids: Vec<i64>,
    /// Ordered role→display-name pairs for staff reply footers; the first
    /// matching entry wins.
    #[serde(default)]
    pub staff_positions: Vec<StaffPosition>,
}

#[derive(Deserialize, Clone)]
pub struct StaffPosition {
    pub role_id: i64,
    pub name: String,
}

#[derive(Deserialize, Clone)]
pub struct TicketsConfig {
    /// Hours until the "still unclaimed" staff reminder fires.
    #[serde(default = "default_unclaimed_reminder_hours")]
    pub unclaimed_reminder_hours: u64,
    /// Hours a suspended ticket waits for a user reply before auto-close.
    /// Kept separate from the reminder interval on purpose.
    #[serde(default = "default_suspend_close_hours")]
    pub suspend_close_hours: u64,
    pub categories: Vec<TicketCategory>,
}

const fn default_unclaimed_reminder_hours() -> u64 {
    48
}

const fn default_suspend_close_hours() -> u64 {
    24
}

#[derive(Deserialize, Clone)]
pub struct TicketCategory {
    /// Short key used in select values and the ticket_type column.
    pub key: String,
    /// Label shown in the category picker.
    pub label: String,
    /// Discord category channel the ticket lands under.
    pub category_id: i64,
    /// Blurb posted when the category is picked.
    #[serde(default)]
    pub details: String,
}

#[derive(Deserialize, Clone)]
pub struct TranscriptsConfig {
    pub transcript_dir: String,
    pub image_dir: String,
    /// Base URL of the companion file server rendering saved transcripts.
    #[serde(default = "default_transcript_base_url")]
    pub base_url: String,
}

fn default_transcript_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

#[derive(Deserialize, Clone)]
pub struct OperationalParameters {
    #[serde(default = "default_timer_poll_interval_secs")]
    pub timer_poll_interval_secs: u64,
    #[serde(default = "default_typing_notice_ttl_secs")]
    pub typing_notice_ttl_secs: u64,
}

const fn default_timer_poll_interval_secs() -> u64 {
    300
}

const fn default_typing_notice_ttl_secs() -> u64 {
    5
}

impl Default for OperationalParameters {
    fn default() -> Self {
        Self {
            timer_poll_interval_secs: default_timer_poll_interval_secs(),
            typing_notice_ttl_secs: default_typing_notice_ttl_secs(),
        }
    }
}

impl Config {
    pub fn ticket_category_ids(&self) -> HashSet<i64> {
        let mut ids: HashSet<i64> = self
            .tickets
            .categories
            .iter()
            .map(|c| c.category_id)
            .collect();
        ids.insert(self.discord.contact_category_id);
        ids
    }

    pub fn is_ticket_category(&self, category_id: Option<i64>) -> bool {
        category_id.is_some_and(|id| self.ticket_category_ids().contains(&id))
    }

    pub fn category_by_key(&self, key: &str) -> Option<&TicketCategory> {
        self.tickets.categories.iter().find(|c| c.key == key)
    }

    /// Display name for a staff member's highest configured position.
    pub fn staff_position_name(&self, role_ids: &[i64]) -> &str {
        self.permissions
            .staff_positions
            .iter()
            .find(|p| role_ids.contains(&p.role_id))
            .map_or("Staff", |p| p.name.as_str())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/bootstrap_config.rs"]
mod tests;
