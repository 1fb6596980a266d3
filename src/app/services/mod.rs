pub mod cache;
pub mod dx;
pub mod lifecycle;
pub mod replies;
pub mod scheduler;
pub mod transcripts;
pub mod watchers;

use std::sync::Arc;

use crate::bootstrap::config::Config;
use crate::core::gateway::Gateway;
use crate::infra::db::Database;

/// Shared service context handed to every handler and background task.
/// Cheap to clone; the store stays authoritative, the cache is advisory.
#[derive(Clone)]
pub struct Ctx {
    pub db: Database,
    pub gateway: Arc<dyn Gateway>,
    pub config: Arc<Config>,
    pub cache: cache::TicketCache,
    pub delayed: scheduler::DelayedCloses,
}


/// Embed accent colors, matching the palette the original staff UI used.
pub mod colors {
    pub const RED: u32 = 0xED4245;
    pub const GREEN: u32 = 0x57F287;
    pub const ORANGE: u32 = 0xE67E22;
    pub const BLUE: u32 = 0x3498DB;
    pub const PURPLE: u32 = 0x9B59B6;
    pub const BLURPLE: u32 = 0x5865F2;
    pub const PINK: u32 = 0xEB459E;
}
