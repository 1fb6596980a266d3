use anyhow::{anyhow, Result};

pub const CATEGORY_SELECT_ID: &str = "ticket-category-select";
pub const CLAIM_BUTTON_ID: &str = "ticket-claim";

/// The closed set of UI component actions the bot dispatches on.
///
/// Component custom-ids are static strings; a select interaction carries
/// its chosen value separately, attached here during parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    CategorySelected { key: String },
    TicketClaimed,
}

impl UiAction {
    pub const fn custom_id(&self) -> &'static str {
        match self {
            UiAction::CategorySelected { .. } => CATEGORY_SELECT_ID,
            UiAction::TicketClaimed => CLAIM_BUTTON_ID,
        }
    }

    /// Resolve an incoming component interaction from its custom-id plus
    /// (for selects) the chosen value.
    pub fn from_interaction(custom_id: &str, selected: Option<&str>) -> Result<Self> {
        match custom_id {
            CATEGORY_SELECT_ID => {
                let key = selected.ok_or_else(|| anyhow!("category select without a value"))?;
                Ok(UiAction::CategorySelected {
                    key: key.to_string(),
                })
            }
            CLAIM_BUTTON_ID => Ok(UiAction::TicketClaimed),
            other => Err(anyhow!("unknown component custom id: {other}")),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/core_callbacks.rs"]
mod tests;
