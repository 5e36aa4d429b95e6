use crate::nav::{Direction, PassabilityOracle, TileCoord};

/// Domain effect outcome: a human readable message, or the violated
/// precondition.
pub type EffectResult = Result<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Moved,
    Blocked,
}

/// Live world handed to every submit and tick call. The executor keeps no
/// reference to it between calls.
pub trait ActionWorld {
    /// Snapshot consulted by the pathfinder, and only by it.
    fn passability(&self) -> &dyn PassabilityOracle;

    fn player_tile(&self) -> TileCoord;

    /// Moves the player one tile in `direction` if the live collision check
    /// allows it. Also turns the player to face `direction`.
    fn step_player(&mut self, direction: Direction) -> StepOutcome;

    /// Snaps the player onto `tile` without any collision check.
    fn place_player(&mut self, tile: TileCoord);

    fn facing(&self) -> Direction;

    fn set_facing(&mut self, direction: Direction);

    fn equipped_tool(&self) -> Option<String>;

    fn apply_tool(&mut self, target: TileCoord) -> EffectResult;

    fn interact(&mut self, target: TileCoord) -> EffectResult;

    fn select_slot(&mut self, slot: u8) -> EffectResult;

    fn select_item(&mut self, item: &str) -> EffectResult;

    fn dismiss_menu(&mut self) -> EffectResult;

    fn toggle_menu(&mut self) -> EffectResult;

    fn purchase(&mut self, item: &str, quantity: u32) -> EffectResult;

    fn eat(&mut self, slot: Option<u8>) -> EffectResult;

    fn warp(&mut self, destination: &str) -> EffectResult;

    /// Tile directly in front of the player, if it exists.
    fn facing_tile(&self) -> Option<TileCoord> {
        self.player_tile().offset(self.facing())
    }
}
