use tickex_engine::{ActionExecutor, ExecutorConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::error::HostError;
use super::loop_runner::LoopConfig;
use super::world::FarmWorld;

pub(crate) struct HostWiring {
    pub(crate) loop_config: LoopConfig,
    pub(crate) executor: ActionExecutor,
    pub(crate) world: FarmWorld,
}

pub(crate) fn build_host() -> Result<HostWiring, HostError> {
    init_tracing();
    info!("=== tickex host startup ===");

    let executor_config = ExecutorConfig::from_env();
    info!(
        expansion_budget = executor_config.expansion_budget,
        tool_use_ticks = executor_config.tool_use_ticks,
        max_wait_ticks = executor_config.max_wait_ticks,
        max_step_count = executor_config.max_step_count,
        "executor_config"
    );
    let executor = ActionExecutor::new(executor_config);
    let world = FarmWorld::demo()?;
    let status = world.status();
    info!(
        location = %status.location,
        x = status.player.x,
        y = status.player.y,
        actions = executor.registry().iter_specs_in_order().count(),
        "world_loaded"
    );

    Ok(HostWiring {
        loop_config: LoopConfig::from_env(),
        executor,
        world,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
