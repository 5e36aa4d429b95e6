use std::collections::HashMap;

use tracing::error;

use crate::nav::{Direction, TileCoord};

use super::command::{ActionCommand, RawCommand};
use super::result::ActionError;

pub type ParseFn = fn(&RawCommand) -> Result<ActionCommand, ActionError>;

pub struct ActionSpec {
    name: String,
    help: String,
    arg_schema: String,
    parse: ParseFn,
}

impl ActionSpec {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Kind name to parse function table. Lookups are case-insensitive; the
/// result of a lookup is a closed [`ActionCommand`], so registering an alias
/// never needs a new handler.
pub struct ActionRegistry {
    specs: Vec<ActionSpec>,
    lookup_by_lower_name: HashMap<String, usize>,
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

const BUILTIN_ACTIONS: &[(&str, &str, &str, ParseFn)] = &[
    (
        "move_to",
        "Walk to a tile along a computed path",
        "x:i32 y:i32 [facing:direction]",
        parse_move_to,
    ),
    (
        "step",
        "Walk straight in a direction",
        "direction:direction [count:1..=10]",
        parse_step,
    ),
    (
        "use_tool",
        "Use the held tool; with a direction, face it and play the swing",
        "[direction:direction]",
        parse_use_tool,
    ),
    (
        "wait",
        "Idle for a number of ticks",
        "ticks:1..=600",
        parse_wait,
    ),
    (
        "interact",
        "Harvest or act on the facing tile",
        "",
        parse_interact,
    ),
    (
        "select_slot",
        "Select an inventory slot",
        "slot:0..=11",
        parse_select_slot,
    ),
    (
        "select_item",
        "Select the first slot holding an item or tool",
        "item:string",
        parse_select_item,
    ),
    (
        "face",
        "Turn to face a direction",
        "direction:direction",
        parse_face,
    ),
    (
        "dismiss_menu",
        "Close any open dialogue or menu",
        "",
        parse_dismiss_menu,
    ),
    ("toggle_menu", "Open or close the game menu", "", parse_toggle_menu),
    (
        "purchase",
        "Buy an item from the shop",
        "item:string [quantity:>=1]",
        parse_purchase,
    ),
    (
        "eat",
        "Eat the held item or the item in a slot",
        "[slot:0..=11]",
        parse_eat,
    ),
    (
        "warp",
        "Transition to another location",
        "destination:string",
        parse_warp,
    ),
    ("harvest", "Alias of interact", "", parse_interact),
    (
        "buy",
        "Alias of purchase",
        "item:string [quantity:>=1]",
        parse_purchase,
    ),
];

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            specs: Vec::new(),
            lookup_by_lower_name: HashMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (name, help, arg_schema, parse) in BUILTIN_ACTIONS.iter().copied() {
            if let Err(reason) = registry.register(name, help, arg_schema, parse) {
                error!(name, %reason, "builtin_action_registration_failed");
            }
        }
        registry
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        help: impl Into<String>,
        arg_schema: impl Into<String>,
        parse: ParseFn,
    ) -> Result<(), String> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err("action name cannot be empty".to_string());
        }
        let lower = name.to_ascii_lowercase();
        if self.lookup_by_lower_name.contains_key(&lower) {
            return Err(format!("duplicate action registration: {name}"));
        }

        self.specs.push(ActionSpec {
            name,
            help: help.into(),
            arg_schema: arg_schema.into(),
            parse,
        });
        self.lookup_by_lower_name.insert(lower, self.specs.len() - 1);
        Ok(())
    }

    pub fn lookup(&self, kind: &str) -> Option<&ActionSpec> {
        let lower = kind.trim().to_ascii_lowercase();
        let index = self.lookup_by_lower_name.get(&lower)?;
        self.specs.get(*index)
    }

    pub fn parse(&self, raw: &RawCommand) -> Result<ActionCommand, ActionError> {
        let Some(spec) = self.lookup(&raw.kind) else {
            return Err(ActionError::UnknownAction {
                kind: raw.kind.clone(),
            });
        };
        (spec.parse)(raw)
    }

    pub fn iter_specs_in_order(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        // Help output order is registration order.
        self.specs.iter().map(|spec| {
            (
                spec.name.as_str(),
                spec.help.as_str(),
                spec.arg_schema.as_str(),
            )
        })
    }
}

fn parse_move_to(raw: &RawCommand) -> Result<ActionCommand, ActionError> {
    Ok(ActionCommand::MoveTo {
        target: TileCoord {
            x: required_coordinate("x", raw.x)?,
            y: required_coordinate("y", raw.y)?,
        },
        facing: optional_direction("facing", raw.facing.as_deref())?,
    })
}

fn parse_step(raw: &RawCommand) -> Result<ActionCommand, ActionError> {
    Ok(ActionCommand::Step {
        direction: required_direction("direction", raw.direction.as_deref())?,
        count: positive_u32("count", raw.count.unwrap_or(1))?,
    })
}

fn parse_use_tool(raw: &RawCommand) -> Result<ActionCommand, ActionError> {
    Ok(ActionCommand::UseTool {
        direction: optional_direction("direction", raw.direction.as_deref())?,
    })
}

fn parse_wait(raw: &RawCommand) -> Result<ActionCommand, ActionError> {
    let ticks = raw
        .ticks
        .ok_or_else(|| ActionError::validation("ticks", "missing required field"))?;
    Ok(ActionCommand::Wait {
        ticks: positive_u32("ticks", ticks)?,
    })
}

fn parse_interact(_raw: &RawCommand) -> Result<ActionCommand, ActionError> {
    Ok(ActionCommand::Interact)
}

fn parse_select_slot(raw: &RawCommand) -> Result<ActionCommand, ActionError> {
    let slot = raw
        .slot
        .ok_or_else(|| ActionError::validation("slot", "missing required field"))?;
    Ok(ActionCommand::SelectSlot {
        slot: slot_index(slot)?,
    })
}

fn parse_select_item(raw: &RawCommand) -> Result<ActionCommand, ActionError> {
    let item = raw
        .item
        .as_ref()
        .or(raw.tool.as_ref())
        .ok_or_else(|| ActionError::validation("item", "missing required field"))?;
    Ok(ActionCommand::SelectItem { item: item.clone() })
}

fn parse_face(raw: &RawCommand) -> Result<ActionCommand, ActionError> {
    let token = raw.direction.as_deref().or(raw.facing.as_deref());
    Ok(ActionCommand::Face {
        direction: required_direction("direction", token)?,
    })
}

fn parse_dismiss_menu(_raw: &RawCommand) -> Result<ActionCommand, ActionError> {
    Ok(ActionCommand::DismissMenu)
}

fn parse_toggle_menu(_raw: &RawCommand) -> Result<ActionCommand, ActionError> {
    Ok(ActionCommand::ToggleMenu)
}

fn parse_purchase(raw: &RawCommand) -> Result<ActionCommand, ActionError> {
    let item = raw
        .item
        .clone()
        .ok_or_else(|| ActionError::validation("item", "missing required field"))?;
    Ok(ActionCommand::Purchase {
        item,
        quantity: positive_u32("quantity", raw.quantity.unwrap_or(1))?,
    })
}

fn parse_eat(raw: &RawCommand) -> Result<ActionCommand, ActionError> {
    Ok(ActionCommand::Eat {
        slot: raw.slot.map(slot_index).transpose()?,
    })
}

fn parse_warp(raw: &RawCommand) -> Result<ActionCommand, ActionError> {
    let destination = raw
        .destination
        .clone()
        .ok_or_else(|| ActionError::validation("destination", "missing required field"))?;
    Ok(ActionCommand::Warp { destination })
}

fn required_coordinate(field: &'static str, value: Option<i64>) -> Result<i32, ActionError> {
    let value = value.ok_or_else(|| ActionError::validation(field, "missing required field"))?;
    i32::try_from(value).map_err(|_| {
        ActionError::validation(field, format!("coordinate {value} does not fit in i32"))
    })
}

fn optional_direction(
    field: &'static str,
    token: Option<&str>,
) -> Result<Option<Direction>, ActionError> {
    token
        .map(|token| {
            Direction::from_token(token).ok_or_else(|| {
                ActionError::validation(
                    field,
                    format!(
                        "unknown direction '{token}' (expected up|right|down|left or north|east|south|west)"
                    ),
                )
            })
        })
        .transpose()
}

fn required_direction(field: &'static str, token: Option<&str>) -> Result<Direction, ActionError> {
    optional_direction(field, token)?
        .ok_or_else(|| ActionError::validation(field, "missing required field"))
}

/// Values above `u32::MAX` saturate; the clamp in normalization caps them.
fn positive_u32(field: &'static str, value: i64) -> Result<u32, ActionError> {
    if value <= 0 {
        return Err(ActionError::validation(
            field,
            format!("{field} must be at least 1, got {value}"),
        ));
    }
    Ok(u32::try_from(value).unwrap_or(u32::MAX))
}

fn slot_index(value: i64) -> Result<u8, ActionError> {
    u8::try_from(value)
        .map_err(|_| ActionError::validation("slot", format!("slot {value} is out of range")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::action::ActionErrorKind;

    fn raw(value: serde_json::Value) -> RawCommand {
        serde_json::from_value(value).expect("raw command")
    }

    #[test]
    fn builtin_names_are_listed_in_registration_order() {
        let registry = ActionRegistry::with_builtins();
        let names: Vec<&str> = registry
            .iter_specs_in_order()
            .map(|(name, _, _)| name)
            .collect();
        assert_eq!(names.first(), Some(&"move_to"));
        assert_eq!(names.len(), BUILTIN_ACTIONS.len());
        assert!(names.contains(&"purchase"));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let registry = ActionRegistry::with_builtins();
        let command = registry
            .parse(&raw(json!({"kind": "MOVE_TO", "x": 3, "y": 4})))
            .expect("move_to");
        assert_eq!(
            command,
            ActionCommand::MoveTo {
                target: TileCoord::new(3, 4),
                facing: None
            }
        );
    }

    #[test]
    fn unknown_kind_is_reported_as_unknown_action() {
        let registry = ActionRegistry::with_builtins();
        let error = registry
            .parse(&raw(json!({"kind": "dance"})))
            .expect_err("unknown");
        assert_eq!(error.kind(), ActionErrorKind::UnknownAction);
        assert_eq!(error.to_string(), "unknown action 'dance'");
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = ActionRegistry::with_builtins();
        let error = registry
            .register("Wait", "again", "", parse_wait)
            .expect_err("duplicate");
        assert!(error.contains("duplicate"));
        assert!(registry.register("  ", "blank", "", parse_wait).is_err());
        registry
            .register("go", "Alias of move_to", "x y", parse_move_to)
            .expect("alias");
        assert_eq!(registry.lookup("GO").map(ActionSpec::name), Some("go"));
    }

    #[test]
    fn malformed_fields_name_the_offending_field() {
        let registry = ActionRegistry::with_builtins();
        let cases = [
            (json!({"kind": "move_to", "x": 1}), "'y'"),
            (json!({"kind": "step", "direction": "sideways"}), "'direction'"),
            (json!({"kind": "step", "direction": "up", "count": 0}), "'count'"),
            (json!({"kind": "wait", "ticks": -5}), "'ticks'"),
            (json!({"kind": "wait"}), "'ticks'"),
            (json!({"kind": "select_slot", "slot": -1}), "'slot'"),
            (json!({"kind": "purchase", "item": "Seeds", "quantity": 0}), "'quantity'"),
            (json!({"kind": "warp"}), "'destination'"),
            (json!({"kind": "use_tool", "direction": "diagonal"}), "'direction'"),
        ];
        for (value, field) in cases {
            let error = registry.parse(&raw(value.clone())).expect_err("invalid");
            assert_eq!(error.kind(), ActionErrorKind::Validation, "{value}");
            assert!(error.to_string().contains(field), "{value}: {error}");
        }
    }

    #[test]
    fn optional_fields_take_documented_defaults() {
        let registry = ActionRegistry::with_builtins();
        assert_eq!(
            registry
                .parse(&raw(json!({"kind": "step", "direction": "west"})))
                .expect("step"),
            ActionCommand::Step {
                direction: Direction::Left,
                count: 1
            }
        );
        assert_eq!(
            registry
                .parse(&raw(json!({"kind": "buy", "item": "Parsnip Seeds"})))
                .expect("buy"),
            ActionCommand::Purchase {
                item: "Parsnip Seeds".to_string(),
                quantity: 1
            }
        );
        assert_eq!(
            registry
                .parse(&raw(json!({"kind": "select_item", "tool": "Hoe"})))
                .expect("select_item"),
            ActionCommand::SelectItem {
                item: "Hoe".to_string()
            }
        );
    }
}
