mod bootstrap;
mod error;
mod loop_runner;
mod script;
mod wire;
mod world;

pub(crate) use bootstrap::build_host;
pub(crate) use loop_runner::{run_live, LoopConfig};
pub(crate) use script::{load_script, run_script};
