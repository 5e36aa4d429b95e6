use std::io::{BufRead, Write};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use tickex_engine::{ActionExecutor, RawCommand, TickOutcome};
use tracing::{info, warn};

use super::error::HostError;
use super::wire::{parse_json, write_line, OutputLine};
use super::world::FarmWorld;

pub(crate) const TPS_ENV_VAR: &str = "TICKEX_TPS";
const DEFAULT_TARGET_TPS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LoopConfig {
    pub(crate) target_tps: u32,
    pub(crate) max_ticks: Option<u64>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: DEFAULT_TARGET_TPS,
            max_ticks: None,
        }
    }
}

impl LoopConfig {
    pub(crate) fn from_env() -> Self {
        Self::from_tps_value(std::env::var(TPS_ENV_VAR).ok().as_deref())
    }

    fn from_tps_value(raw: Option<&str>) -> Self {
        let target_tps = match raw {
            Some(value) => match value.trim().parse::<u32>() {
                Ok(parsed) if parsed > 0 => parsed,
                _ => {
                    warn!(
                        value,
                        fallback_tps = DEFAULT_TARGET_TPS,
                        "loop_invalid_tps_using_default"
                    );
                    DEFAULT_TARGET_TPS
                }
            },
            None => DEFAULT_TARGET_TPS,
        };
        Self {
            target_tps,
            max_ticks: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct LiveSummary {
    pub(crate) ticks: u64,
    pub(crate) lines: u64,
}

/// Fixed-rate loop fed by a line reader thread.
///
/// Each tick drains every pending line (submit, `reset` or `status`) and then
/// advances the executor once. Ends at `max_ticks`, or once input has closed
/// and nothing is in flight.
pub(crate) fn run_live<R, W>(
    config: LoopConfig,
    executor: &mut ActionExecutor,
    world: &mut FarmWorld,
    input: R,
    out: &mut W,
) -> Result<LiveSummary, HostError>
where
    R: BufRead + Send + 'static,
    W: Write,
{
    let receiver = spawn_line_reader(input)?;
    let target_tps = config.target_tps.max(1);
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let mut summary = LiveSummary::default();
    let mut input_closed = false;
    info!(target_tps, max_ticks = ?config.max_ticks, "live_loop_started");

    loop {
        let tick_start = Instant::now();

        while !input_closed {
            match receiver.try_recv() {
                Ok(line) => {
                    summary.lines += 1;
                    handle_line(&line, summary.ticks, executor, world, out)?;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    info!(tick = summary.ticks, "live_input_closed");
                    input_closed = true;
                }
            }
        }

        summary.ticks += 1;
        if let TickOutcome::Finished(result) = executor.advance_one_tick(world) {
            write_line(
                out,
                &OutputLine::Result {
                    tick: summary.ticks,
                    result: &result,
                },
            )?;
        }

        if config.max_ticks.is_some_and(|max| summary.ticks >= max) {
            break;
        }
        if input_closed && executor.state().accepts_commands() {
            break;
        }

        let elapsed = tick_start.elapsed();
        if elapsed < fixed_dt {
            thread::sleep(fixed_dt - elapsed);
        }
    }

    info!(
        ticks = summary.ticks,
        lines = summary.lines,
        state = executor.state().as_token(),
        "live_loop_stopped"
    );
    Ok(summary)
}

fn spawn_line_reader<R>(input: R) -> Result<Receiver<String>, HostError>
where
    R: BufRead + Send + 'static,
{
    let (sender, receiver) = mpsc::channel();
    thread::Builder::new()
        .name("line-reader".to_string())
        .spawn(move || {
            for line in input.lines() {
                match line {
                    Ok(line) => {
                        if sender.send(line).is_err() {
                            break;
                        }
                    }
                    Err(error) => {
                        warn!(%error, "live_input_read_failed");
                        break;
                    }
                }
            }
        })
        .map_err(HostError::SpawnReader)?;
    Ok(receiver)
}

fn handle_line<W: Write>(
    line: &str,
    tick: u64,
    executor: &mut ActionExecutor,
    world: &mut FarmWorld,
    out: &mut W,
) -> Result<(), HostError> {
    let trimmed = line.trim();
    match trimmed {
        "" => Ok(()),
        "reset" => {
            executor.reset();
            write_line(out, &OutputLine::Reset { tick })
        }
        "status" => write_line(
            out,
            &OutputLine::Status {
                tick,
                execution: executor.snapshot(),
                farm: world.status(),
            },
        ),
        _ => match parse_json::<RawCommand>(trimmed, "command") {
            Ok(raw) => {
                let result = executor.submit_raw(&raw, world);
                write_line(
                    out,
                    &OutputLine::Result {
                        tick,
                        result: &result,
                    },
                )
            }
            Err(error) => {
                warn!(tick, %error, "live_input_rejected");
                write_line(out, &OutputLine::InputError { tick, error })
            }
        },
    }
}
