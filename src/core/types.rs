use serde::{Deserialize, Serialize};
use std::fmt;

/// Action kinds stored in the `ticket_timers` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerAction {
    Unclaimed,
    Suspend,
    Close,
}

impl TimerAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            TimerAction::Unclaimed => "unclaimed",
            TimerAction::Suspend => "suspend",
            TimerAction::Close => "close",
        }
    }
}

impl fmt::Display for TimerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for TimerAction {
    type Error = &'static str;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "unclaimed" => Ok(TimerAction::Unclaimed),
            "suspend" => Ok(TimerAction::Suspend),
            "close" => Ok(TimerAction::Close),
            _ => Err("unsupported timer action"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketStatus {
    Open,
    Closed,
}

impl TicketStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for TicketStatus {
    type Error = &'static str;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "open" => Ok(TicketStatus::Open),
            "closed" => Ok(TicketStatus::Closed),
            _ => Err("unsupported ticket status"),
        }
    }
}

/// Permission tier a command requires. Tiers are inclusive upward: a
/// staff member passes junior checks, an admin passes everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PermTier {
    None,
    Junior,
    Staff,
    Admin,
}

#[cfg(test)]
#[path = "../../tests/unit/core_types.rs"]
mod tests;
