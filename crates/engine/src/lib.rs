pub mod action;
pub mod config;
pub mod nav;

pub use action::{
    ActionCommand, ActionError, ActionErrorKind, ActionExecutor, ActionRegistry, ActionResult,
    ActionSpec, ActionWorld, EffectResult, ExecutionSnapshot, ExecutionState,
    ExecutionStateMachine, PathCursor, RawCommand, StepOutcome, TickOutcome,
};
pub use config::ExecutorConfig;
pub use nav::{
    find_path, Direction, GridError, GridSnapshot, ObstacleCluster, PassabilityOracle, Path,
    TileCoord, Unreachable, UnreachableReason,
};
