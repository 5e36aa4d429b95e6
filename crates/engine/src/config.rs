use std::fmt::Display;
use std::str::FromStr;

use tracing::warn;

pub const EXPANSION_BUDGET_ENV_VAR: &str = "TICKEX_EXPANSION_BUDGET";
pub const TOOL_USE_TICKS_ENV_VAR: &str = "TICKEX_TOOL_USE_TICKS";

pub const DEFAULT_EXPANSION_BUDGET: usize = 20_000;
pub const DEFAULT_TOOL_USE_TICKS: u32 = 12;
pub const MAX_WAIT_TICKS: u32 = 600;
pub const MAX_STEP_COUNT: u32 = 10;
pub const INVENTORY_SLOT_COUNT: u8 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Upper bound on A* node expansions per traversal command.
    pub expansion_budget: usize,
    pub max_wait_ticks: u32,
    pub max_step_count: u32,
    pub inventory_slots: u8,
    /// Length of the directional tool-use animation.
    pub tool_use_ticks: u32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            expansion_budget: DEFAULT_EXPANSION_BUDGET,
            max_wait_ticks: MAX_WAIT_TICKS,
            max_step_count: MAX_STEP_COUNT,
            inventory_slots: INVENTORY_SLOT_COUNT,
            tool_use_ticks: DEFAULT_TOOL_USE_TICKS,
        }
    }
}

impl ExecutorConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            expansion_budget: parse_positive_or_default(
                EXPANSION_BUDGET_ENV_VAR,
                lookup(EXPANSION_BUDGET_ENV_VAR).as_deref(),
                defaults.expansion_budget,
            ),
            tool_use_ticks: parse_positive_or_default(
                TOOL_USE_TICKS_ENV_VAR,
                lookup(TOOL_USE_TICKS_ENV_VAR).as_deref(),
                defaults.tool_use_ticks,
            ),
            ..defaults
        }
        .normalized()
    }

    /// Clamps every limit into a range the executor can honor: tick and step
    /// limits are at least 1 and never above the documented maxima.
    pub fn normalized(self) -> Self {
        Self {
            expansion_budget: self.expansion_budget.max(1),
            max_wait_ticks: self.max_wait_ticks.clamp(1, MAX_WAIT_TICKS),
            max_step_count: self.max_step_count.clamp(1, MAX_STEP_COUNT),
            inventory_slots: self.inventory_slots.clamp(1, INVENTORY_SLOT_COUNT),
            tool_use_ticks: self.tool_use_ticks.clamp(1, MAX_WAIT_TICKS),
        }
    }
}

fn parse_positive_or_default<T>(var: &'static str, raw: Option<&str>, fallback: T) -> T
where
    T: FromStr + PartialOrd + Default + Display + Copy,
{
    let Some(value) = raw else {
        return fallback;
    };
    match value.trim().parse::<T>() {
        Ok(parsed) if parsed > T::default() => parsed,
        _ => {
            warn!(var, value, %fallback, "config_invalid_value_using_default");
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from_pairs(pairs: &[(&str, &str)]) -> ExecutorConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        ExecutorConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn missing_variables_use_defaults() {
        assert_eq!(config_from_pairs(&[]), ExecutorConfig::default());
    }

    #[test]
    fn valid_overrides_are_applied() {
        let config = config_from_pairs(&[
            (EXPANSION_BUDGET_ENV_VAR, "512"),
            (TOOL_USE_TICKS_ENV_VAR, " 30 "),
        ]);
        assert_eq!(config.expansion_budget, 512);
        assert_eq!(config.tool_use_ticks, 30);
    }

    #[test]
    fn invalid_or_non_positive_values_fall_back() {
        let config = config_from_pairs(&[
            (EXPANSION_BUDGET_ENV_VAR, "lots"),
            (TOOL_USE_TICKS_ENV_VAR, "0"),
        ]);
        assert_eq!(config.expansion_budget, DEFAULT_EXPANSION_BUDGET);
        assert_eq!(config.tool_use_ticks, DEFAULT_TOOL_USE_TICKS);
    }

    #[test]
    fn normalized_caps_limits_at_documented_maxima() {
        let config = ExecutorConfig {
            expansion_budget: 0,
            max_wait_ticks: 10_000,
            max_step_count: 0,
            inventory_slots: 40,
            tool_use_ticks: 9_999,
        }
        .normalized();
        assert_eq!(config.expansion_budget, 1);
        assert_eq!(config.max_wait_ticks, MAX_WAIT_TICKS);
        assert_eq!(config.max_step_count, 1);
        assert_eq!(config.inventory_slots, INVENTORY_SLOT_COUNT);
        assert_eq!(config.tool_use_ticks, MAX_WAIT_TICKS);
    }
}
