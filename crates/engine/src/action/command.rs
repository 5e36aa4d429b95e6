use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::ExecutorConfig;
use crate::nav::{Direction, TileCoord};

use super::result::ActionError;

/// One directive, already parsed. Numeric fields are unsigned here; zero is
/// still rejected by [`ActionCommand::normalized`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionCommand {
    MoveTo {
        target: TileCoord,
        facing: Option<Direction>,
    },
    Step {
        direction: Direction,
        count: u32,
    },
    UseTool {
        direction: Option<Direction>,
    },
    Wait {
        ticks: u32,
    },
    Interact,
    SelectSlot {
        slot: u8,
    },
    SelectItem {
        item: String,
    },
    Face {
        direction: Direction,
    },
    DismissMenu,
    ToggleMenu,
    Purchase {
        item: String,
        quantity: u32,
    },
    Eat {
        slot: Option<u8>,
    },
    Warp {
        destination: String,
    },
}

impl ActionCommand {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::MoveTo { .. } => "move_to",
            Self::Step { .. } => "step",
            Self::UseTool { .. } => "use_tool",
            Self::Wait { .. } => "wait",
            Self::Interact => "interact",
            Self::SelectSlot { .. } => "select_slot",
            Self::SelectItem { .. } => "select_item",
            Self::Face { .. } => "face",
            Self::DismissMenu => "dismiss_menu",
            Self::ToggleMenu => "toggle_menu",
            Self::Purchase { .. } => "purchase",
            Self::Eat { .. } => "eat",
            Self::Warp { .. } => "warp",
        }
    }

    /// Whether accepting this command hands work to the state machine.
    pub fn is_asynchronous(&self) -> bool {
        match self {
            Self::MoveTo { .. } | Self::Step { .. } | Self::Wait { .. } => true,
            Self::UseTool { direction } => direction.is_some(),
            Self::Interact
            | Self::SelectSlot { .. }
            | Self::SelectItem { .. }
            | Self::Face { .. }
            | Self::DismissMenu
            | Self::ToggleMenu
            | Self::Purchase { .. }
            | Self::Eat { .. }
            | Self::Warp { .. } => false,
        }
    }

    /// Rejects zero counts, out-of-range slots and blank names; clamps wait
    /// ticks and step counts to the configured maxima.
    pub fn normalized(self, config: &ExecutorConfig) -> Result<Self, ActionError> {
        match self {
            Self::Wait { ticks } => Ok(Self::Wait {
                ticks: clamp_positive("ticks", ticks, config.max_wait_ticks)?,
            }),
            Self::Step { direction, count } => Ok(Self::Step {
                direction,
                count: clamp_positive("count", count, config.max_step_count)?,
            }),
            Self::SelectSlot { slot } => {
                check_slot(slot, config.inventory_slots)?;
                Ok(Self::SelectSlot { slot })
            }
            Self::Eat { slot } => {
                if let Some(slot) = slot {
                    check_slot(slot, config.inventory_slots)?;
                }
                Ok(Self::Eat { slot })
            }
            Self::SelectItem { item } => Ok(Self::SelectItem {
                item: non_blank("item", item)?,
            }),
            Self::Purchase { item, quantity } => {
                if quantity == 0 {
                    return Err(ActionError::validation(
                        "quantity",
                        "quantity must be at least 1, got 0",
                    ));
                }
                Ok(Self::Purchase {
                    item: non_blank("item", item)?,
                    quantity,
                })
            }
            Self::Warp { destination } => Ok(Self::Warp {
                destination: non_blank("destination", destination)?,
            }),
            other => Ok(other),
        }
    }
}

fn clamp_positive(field: &'static str, value: u32, max: u32) -> Result<u32, ActionError> {
    if value == 0 {
        return Err(ActionError::validation(
            field,
            format!("{field} must be at least 1, got 0"),
        ));
    }
    if value > max {
        warn!(field, requested = value, max, "action_field_clamped");
        return Ok(max);
    }
    Ok(value)
}

fn check_slot(slot: u8, slot_count: u8) -> Result<(), ActionError> {
    if slot >= slot_count {
        return Err(ActionError::validation(
            "slot",
            format!(
                "slot {slot} is outside 0..={}",
                slot_count.saturating_sub(1)
            ),
        ));
    }
    Ok(())
}

fn non_blank(field: &'static str, value: String) -> Result<String, ActionError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ActionError::validation(
            field,
            format!("{field} must not be empty"),
        ));
    }
    Ok(trimmed.to_string())
}

/// Transport-agnostic wire record. Every field except `kind` is optional and
/// numeric fields are signed so bad values can be reported precisely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCommand {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facing: Option<String>,
    #[serde(default, alias = "steps", skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(default, alias = "item_name", skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticks: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
}

impl RawCommand {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }
}
