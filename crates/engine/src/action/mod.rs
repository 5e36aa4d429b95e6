mod command;
mod executor;
mod machine;
mod registry;
mod result;
mod world;

pub use command::{ActionCommand, RawCommand};
pub use executor::ActionExecutor;
pub use machine::{ExecutionSnapshot, ExecutionStateMachine, PathCursor, TickOutcome};
pub use registry::{ActionRegistry, ActionSpec, ParseFn};
pub use result::{ActionError, ActionErrorKind, ActionResult, ExecutionState};
pub use world::{ActionWorld, EffectResult, StepOutcome};
