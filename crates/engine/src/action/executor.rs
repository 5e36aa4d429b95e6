use tracing::{info, warn};

use crate::config::ExecutorConfig;
use crate::nav::{find_path, Direction, Path, TileCoord};

use super::command::{ActionCommand, RawCommand};
use super::machine::{CountdownEffect, ExecutionSnapshot, ExecutionStateMachine, TickOutcome};
use super::registry::ActionRegistry;
use super::result::{ActionError, ActionResult, ExecutionState};
use super::world::{ActionWorld, EffectResult};

/// Command intake plus the state machine it feeds.
///
/// Every call borrows the world for its own duration only. Callers must
/// serialize `submit*`, `advance_one_tick` and `reset` onto one thread.
pub struct ActionExecutor {
    config: ExecutorConfig,
    registry: ActionRegistry,
    machine: ExecutionStateMachine,
}

impl Default for ActionExecutor {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}

impl ActionExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self::with_registry(config, ActionRegistry::with_builtins())
    }

    pub fn with_registry(config: ExecutorConfig, registry: ActionRegistry) -> Self {
        Self {
            config: config.normalized(),
            registry,
            machine: ExecutionStateMachine::new(),
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn state(&self) -> ExecutionState {
        self.machine.state()
    }

    pub fn machine(&self) -> &ExecutionStateMachine {
        &self.machine
    }

    pub fn snapshot(&self) -> ExecutionSnapshot {
        self.machine.snapshot()
    }

    pub fn submit_raw(&mut self, raw: &RawCommand, world: &mut dyn ActionWorld) -> ActionResult {
        if let Err(error) = self.ensure_accepting() {
            return self.reject(&raw.kind, error);
        }
        match self.registry.parse(raw) {
            Ok(command) => self.submit(command, world),
            Err(error) => self.reject(&raw.kind, error),
        }
    }

    pub fn submit(&mut self, command: ActionCommand, world: &mut dyn ActionWorld) -> ActionResult {
        let kind = command.kind_name();
        if let Err(error) = self.ensure_accepting() {
            return self.reject(kind, error);
        }
        let command = match command.normalized(&self.config) {
            Ok(command) => command,
            Err(error) => return self.reject(kind, error),
        };
        info!(kind, asynchronous = command.is_asynchronous(), "action_submitted");
        self.dispatch(command, world)
    }

    pub fn advance_one_tick(&mut self, world: &mut dyn ActionWorld) -> TickOutcome {
        self.machine.advance_one_tick(world)
    }

    pub fn reset(&mut self) {
        self.machine.reset();
    }

    fn ensure_accepting(&self) -> Result<(), ActionError> {
        let state = self.machine.state();
        if state.accepts_commands() {
            return Ok(());
        }
        Err(ActionError::Busy {
            active: self.machine.active_kind().unwrap_or("action"),
            state,
        })
    }

    /// Busy, unknown and validation errors leave the machine untouched.
    fn reject(&self, kind: &str, error: ActionError) -> ActionResult {
        warn!(kind, error = %error, error_kind = ?error.kind(), "action_rejected");
        ActionResult::err(&error, self.machine.state())
    }

    fn dispatch(&mut self, command: ActionCommand, world: &mut dyn ActionWorld) -> ActionResult {
        match command {
            ActionCommand::MoveTo { target, facing } => self.handle_move_to(target, facing, world),
            ActionCommand::Step { direction, count } => self.handle_step(direction, count, world),
            ActionCommand::UseTool {
                direction: Some(direction),
            } => self.handle_use_tool_animated(direction, world),
            ActionCommand::UseTool { direction: None } => {
                self.finish_sync("use_tool", handle_use_tool(world))
            }
            ActionCommand::Wait { ticks } => self.handle_wait(ticks),
            ActionCommand::Interact => self.finish_sync("interact", handle_interact(world)),
            ActionCommand::SelectSlot { slot } => {
                self.finish_sync("select_slot", world.select_slot(slot))
            }
            ActionCommand::SelectItem { item } => {
                self.finish_sync("select_item", world.select_item(&item))
            }
            ActionCommand::Face { direction } => {
                self.finish_sync("face", handle_face(direction, world))
            }
            ActionCommand::DismissMenu => self.finish_sync("dismiss_menu", world.dismiss_menu()),
            ActionCommand::ToggleMenu => self.finish_sync("toggle_menu", world.toggle_menu()),
            ActionCommand::Purchase { item, quantity } => {
                self.finish_sync("purchase", world.purchase(&item, quantity))
            }
            ActionCommand::Eat { slot } => self.finish_sync("eat", world.eat(slot)),
            ActionCommand::Warp { destination } => {
                self.finish_sync("warp", world.warp(&destination))
            }
        }
    }

    fn handle_move_to(
        &mut self,
        target: TileCoord,
        facing: Option<Direction>,
        world: &mut dyn ActionWorld,
    ) -> ActionResult {
        let start = world.player_tile();
        let path = match find_path(
            start,
            target,
            world.passability(),
            self.config.expansion_budget,
        ) {
            Ok(path) => path,
            Err(unreachable) => {
                warn!(
                    start_x = start.x,
                    start_y = start.y,
                    goal_x = target.x,
                    goal_y = target.y,
                    expanded = unreachable.expanded,
                    "path_unreachable"
                );
                return self.fail("move_to", ActionError::from(unreachable));
            }
        };
        self.start_traversal("move_to", path, facing, world)
    }

    fn handle_step(
        &mut self,
        direction: Direction,
        count: u32,
        world: &mut dyn ActionWorld,
    ) -> ActionResult {
        world.set_facing(direction);
        let path = Path::straight_line(world.player_tile(), direction, count);
        self.start_traversal("step", path, Some(direction), world)
    }

    fn start_traversal(
        &mut self,
        kind: &'static str,
        path: Path,
        facing: Option<Direction>,
        world: &mut dyn ActionWorld,
    ) -> ActionResult {
        let goal = path.goal();
        let steps = path.step_count();
        if let Some(result) = self.machine.begin_traversal(kind, path, facing, world) {
            return result;
        }
        ActionResult::ok(
            format!("{kind} accepted: {steps} steps to {goal}"),
            self.machine.state(),
        )
    }

    fn handle_use_tool_animated(
        &mut self,
        direction: Direction,
        world: &mut dyn ActionWorld,
    ) -> ActionResult {
        let Some(tool) = world.equipped_tool() else {
            return self.fail(
                "use_tool",
                ActionError::Precondition("use_tool requires an equipped tool".to_string()),
            );
        };
        world.set_facing(direction);
        let Some(target) = world.facing_tile() else {
            return self.fail(
                "use_tool",
                ActionError::Precondition(format!("no tile {direction} of the player")),
            );
        };
        let ticks = self.config.tool_use_ticks;
        self.machine.begin_countdown(
            "use_tool",
            ExecutionState::PerformingAction,
            ticks,
            CountdownEffect::ToolUse { target },
        );
        ActionResult::ok(
            format!("using {tool} on {target} for {ticks} ticks"),
            self.machine.state(),
        )
    }

    fn handle_wait(&mut self, ticks: u32) -> ActionResult {
        self.machine.begin_countdown(
            "wait",
            ExecutionState::WaitingForAnimation,
            ticks,
            CountdownEffect::None,
        );
        ActionResult::ok(format!("waiting {ticks} ticks"), self.machine.state())
    }

    fn finish_sync(&mut self, kind: &'static str, outcome: EffectResult) -> ActionResult {
        match outcome {
            Ok(message) => {
                info!(kind, "action_complete");
                let result = ActionResult::ok(message, ExecutionState::Complete);
                self.machine.settle(kind, result.clone());
                result
            }
            Err(precondition) => self.fail(kind, ActionError::Precondition(precondition)),
        }
    }

    fn fail(&mut self, kind: &'static str, error: ActionError) -> ActionResult {
        warn!(kind, error = %error, "action_failed");
        let result = ActionResult::err(&error, ExecutionState::Failed);
        self.machine.settle(kind, result.clone());
        result
    }
}

fn handle_use_tool(world: &mut dyn ActionWorld) -> EffectResult {
    if world.equipped_tool().is_none() {
        return Err("use_tool requires an equipped tool".to_string());
    }
    let target = world
        .facing_tile()
        .ok_or_else(|| format!("no tile {} of the player", world.facing()))?;
    world.apply_tool(target)
}

fn handle_interact(world: &mut dyn ActionWorld) -> EffectResult {
    let target = world
        .facing_tile()
        .ok_or_else(|| format!("no tile {} of the player", world.facing()))?;
    world.interact(target)
}

fn handle_face(direction: Direction, world: &mut dyn ActionWorld) -> EffectResult {
    world.set_facing(direction);
    Ok(format!("facing {direction}"))
}
