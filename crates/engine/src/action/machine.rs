use serde::Serialize;
use tracing::{debug, info, warn};

use crate::nav::{Direction, Path, TileCoord};

use super::result::{ActionError, ActionResult, ExecutionState};
use super::world::{ActionWorld, StepOutcome};

/// Position of the next waypoint inside an immutable [`Path`].
///
/// `index == path.len()` means every waypoint has been reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathCursor {
    path: Path,
    index: usize,
}

impl PathCursor {
    pub fn new(path: Path) -> Self {
        Self { path, index: 0 }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn next_waypoint(&self) -> Option<TileCoord> {
        self.path.get(self.index)
    }

    pub fn is_complete(&self) -> bool {
        self.index >= self.path.len()
    }

    fn advance(&mut self) {
        if self.index < self.path.len() {
            self.index += 1;
        }
    }

    /// Moves past waypoints equal to the occupied tile.
    fn skip_reached(&mut self, occupied: TileCoord) {
        while self.next_waypoint() == Some(occupied) {
            self.advance();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CountdownEffect {
    None,
    ToolUse { target: TileCoord },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Activity {
    None,
    Traversal {
        cursor: PathCursor,
        facing_on_arrival: Option<Direction>,
    },
    Countdown {
        remaining: u32,
        total: u32,
        effect: CountdownEffect,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Idle,
    InProgress,
    Finished(ActionResult),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionSnapshot {
    pub state: ExecutionState,
    pub kind: Option<&'static str>,
    pub cursor_index: Option<usize>,
    pub path_len: Option<usize>,
    pub goal: Option<TileCoord>,
    pub remaining_ticks: Option<u32>,
}

/// Owns the single in-flight action and drives it one tick at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionStateMachine {
    state: ExecutionState,
    active_kind: Option<&'static str>,
    activity: Activity,
    last_result: Option<ActionResult>,
}

impl Default for ExecutionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionStateMachine {
    pub fn new() -> Self {
        Self {
            state: ExecutionState::Idle,
            active_kind: None,
            activity: Activity::None,
            last_result: None,
        }
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    pub fn active_kind(&self) -> Option<&'static str> {
        self.active_kind
    }

    pub fn cursor(&self) -> Option<&PathCursor> {
        match &self.activity {
            Activity::Traversal { cursor, .. } => Some(cursor),
            _ => None,
        }
    }

    pub fn remaining_ticks(&self) -> Option<u32> {
        match self.activity {
            Activity::Countdown { remaining, .. } => Some(remaining),
            _ => None,
        }
    }

    /// Most recent terminal result, whether produced synchronously or by a tick.
    pub fn last_result(&self) -> Option<&ActionResult> {
        self.last_result.as_ref()
    }

    pub fn snapshot(&self) -> ExecutionSnapshot {
        let cursor = self.cursor();
        ExecutionSnapshot {
            state: self.state,
            kind: self.active_kind,
            cursor_index: cursor.map(PathCursor::index),
            path_len: cursor.map(|cursor| cursor.path().len()),
            goal: cursor.map(|cursor| cursor.path().goal()),
            remaining_ticks: self.remaining_ticks(),
        }
    }

    /// Starts following `path`. Returns the terminal result instead when the
    /// occupied tile already is the goal.
    pub(crate) fn begin_traversal(
        &mut self,
        kind: &'static str,
        path: Path,
        facing_on_arrival: Option<Direction>,
        world: &mut dyn ActionWorld,
    ) -> Option<ActionResult> {
        let mut cursor = PathCursor::new(path);
        cursor.skip_reached(world.player_tile());
        self.active_kind = Some(kind);
        if cursor.is_complete() {
            let result = arrive(&cursor, facing_on_arrival, world);
            self.settle(kind, result.clone());
            return Some(result);
        }
        info!(
            kind,
            path_len = cursor.path().len(),
            goal_x = cursor.path().goal().x,
            goal_y = cursor.path().goal().y,
            "traversal_started"
        );
        self.state = ExecutionState::MovingToTarget;
        self.activity = Activity::Traversal {
            cursor,
            facing_on_arrival,
        };
        None
    }

    pub(crate) fn begin_countdown(
        &mut self,
        kind: &'static str,
        state: ExecutionState,
        ticks: u32,
        effect: CountdownEffect,
    ) {
        let ticks = ticks.max(1);
        info!(kind, ticks, state = state.as_token(), "countdown_started");
        self.state = state;
        self.active_kind = Some(kind);
        self.activity = Activity::Countdown {
            remaining: ticks,
            total: ticks,
            effect,
        };
    }

    /// Records a terminal result and drops any path, cursor or countdown.
    pub(crate) fn settle(&mut self, kind: &'static str, result: ActionResult) {
        self.state = result.state();
        self.active_kind = Some(kind);
        self.activity = Activity::None;
        self.last_result = Some(result);
    }

    /// Forces Idle from any state, discarding whatever was in flight.
    pub fn reset(&mut self) {
        if self.state.is_in_flight() {
            info!(
                kind = self.active_kind.unwrap_or("none"),
                state = self.state.as_token(),
                "action_cancelled"
            );
        }
        self.state = ExecutionState::Idle;
        self.active_kind = None;
        self.activity = Activity::None;
        self.last_result = None;
    }

    pub fn advance_one_tick(&mut self, world: &mut dyn ActionWorld) -> TickOutcome {
        if !self.state.is_in_flight() {
            return TickOutcome::Idle;
        }
        let kind = self.active_kind.unwrap_or("action");

        let finished = match &mut self.activity {
            Activity::None => {
                // Not reachable through the public API.
                warn!(kind, state = self.state.as_token(), "in_flight_without_activity");
                Some(ActionResult::err(
                    &ActionError::Precondition(format!("{kind} lost its execution state")),
                    ExecutionState::Failed,
                ))
            }
            Activity::Traversal {
                cursor,
                facing_on_arrival,
            } => advance_traversal(kind, cursor, *facing_on_arrival, world),
            Activity::Countdown {
                remaining,
                total,
                effect,
            } => advance_countdown(kind, remaining, *total, *effect, world),
        };

        match finished {
            Some(result) => {
                self.settle(kind, result.clone());
                TickOutcome::Finished(result)
            }
            None => TickOutcome::InProgress,
        }
    }
}

fn advance_traversal(
    kind: &'static str,
    cursor: &mut PathCursor,
    facing_on_arrival: Option<Direction>,
    world: &mut dyn ActionWorld,
) -> Option<ActionResult> {
    let occupied = world.player_tile();
    cursor.skip_reached(occupied);
    let Some(waypoint) = cursor.next_waypoint() else {
        return Some(arrive(cursor, facing_on_arrival, world));
    };
    let direction = occupied.direction_toward(waypoint)?;

    match world.step_player(direction) {
        StepOutcome::Blocked => {
            let goal = cursor.path().goal();
            warn!(
                kind,
                x = occupied.x,
                y = occupied.y,
                goal_x = goal.x,
                goal_y = goal.y,
                "traversal_blocked"
            );
            Some(ActionResult::ok(
                format!(
                    "{kind} blocked at {occupied} after {} of {} steps; goal {goal} not reached",
                    cursor.index().saturating_sub(1),
                    cursor.path().step_count()
                ),
                ExecutionState::Complete,
            ))
        }
        StepOutcome::Moved => {
            let now = world.player_tile();
            if now == waypoint {
                cursor.advance();
            }
            debug!(
                kind,
                x = now.x,
                y = now.y,
                cursor_index = cursor.index(),
                "traversal_step"
            );
            if cursor.is_complete() {
                Some(arrive(cursor, facing_on_arrival, world))
            } else {
                None
            }
        }
    }
}

fn arrive(
    cursor: &PathCursor,
    facing_on_arrival: Option<Direction>,
    world: &mut dyn ActionWorld,
) -> ActionResult {
    let goal = cursor.path().goal();
    world.place_player(goal);
    if let Some(facing) = facing_on_arrival {
        world.set_facing(facing);
    }
    info!(x = goal.x, y = goal.y, "traversal_arrived");
    ActionResult::ok(
        format!(
            "arrived at {goal} after {} steps",
            cursor.path().step_count()
        ),
        ExecutionState::Complete,
    )
}

fn advance_countdown(
    kind: &'static str,
    remaining: &mut u32,
    total: u32,
    effect: CountdownEffect,
    world: &mut dyn ActionWorld,
) -> Option<ActionResult> {
    *remaining = remaining.saturating_sub(1);
    if *remaining > 0 {
        return None;
    }

    match effect {
        CountdownEffect::None => {
            info!(kind, ticks = total, "countdown_finished");
            Some(ActionResult::ok(
                format!("{kind} finished after {total} ticks"),
                ExecutionState::Complete,
            ))
        }
        CountdownEffect::ToolUse { target } => match world.apply_tool(target) {
            Ok(message) => {
                info!(kind, ticks = total, x = target.x, y = target.y, "tool_use_finished");
                Some(ActionResult::ok(message, ExecutionState::Complete))
            }
            Err(precondition) => {
                warn!(kind, %precondition, "tool_use_failed");
                Some(ActionResult::err(
                    &ActionError::Precondition(precondition),
                    ExecutionState::Failed,
                ))
            }
        },
    }
}
