use std::fs;
use std::io::Write;
use std::path::Path;

use serde::Deserialize;
use tickex_engine::{ActionExecutor, ExecutionState, RawCommand, TickOutcome, TileCoord};
use tracing::info;

use super::error::HostError;
use super::wire::{parse_json, write_line, OutputLine};
use super::world::FarmWorld;

/// Deterministic sequence of submissions and ticks.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Script {
    pub(crate) steps: Vec<ScriptStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ScriptStep {
    Submit(RawCommand),
    Tick(u32),
    RunUntilSettled(u32),
    Reset,
    ExpectState(String),
    /// Live-only obstacle, e.g. a character stepping into the planned path.
    Block(TileCoord),
    Status,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ScriptReport {
    pub(crate) steps: usize,
    pub(crate) ticks: u64,
    pub(crate) results: usize,
}

pub(crate) fn load_script(path: &Path) -> Result<Script, HostError> {
    let raw = fs::read_to_string(path).map_err(|source| HostError::ReadScript {
        path: path.to_path_buf(),
        source,
    })?;
    parse_script_json(&raw)
}

pub(crate) fn parse_script_json(raw: &str) -> Result<Script, HostError> {
    parse_json(raw, "script").map_err(HostError::ParseScript)
}

/// Runs every step in order, printing each action result as a JSON line.
/// Stops at the first failed expectation.
pub(crate) fn run_script<W: Write>(
    script: &Script,
    executor: &mut ActionExecutor,
    world: &mut FarmWorld,
    out: &mut W,
) -> Result<ScriptReport, HostError> {
    let mut report = ScriptReport::default();
    for (step, entry) in script.steps.iter().enumerate() {
        match entry {
            ScriptStep::Submit(raw) => {
                let result = executor.submit_raw(raw, world);
                report.results += 1;
                write_line(
                    out,
                    &OutputLine::Result {
                        tick: report.ticks,
                        result: &result,
                    },
                )?;
            }
            ScriptStep::Tick(count) => {
                for _ in 0..*count {
                    tick_once(executor, world, &mut report, out)?;
                }
            }
            ScriptStep::RunUntilSettled(max_ticks) => {
                let mut spent = 0;
                while executor.state().is_in_flight() {
                    if spent == *max_ticks {
                        return Err(HostError::NotSettled {
                            step,
                            state: executor.state().as_token(),
                            max_ticks: *max_ticks,
                        });
                    }
                    tick_once(executor, world, &mut report, out)?;
                    spent += 1;
                }
            }
            ScriptStep::Reset => {
                executor.reset();
                write_line(out, &OutputLine::Reset { tick: report.ticks })?;
            }
            ScriptStep::ExpectState(token) => {
                let expected =
                    ExecutionState::from_token(token).ok_or_else(|| HostError::UnknownState {
                        step,
                        token: token.clone(),
                    })?;
                let actual = executor.state();
                if expected != actual {
                    return Err(HostError::ExpectationFailed {
                        step,
                        expected: expected.as_token(),
                        actual: actual.as_token(),
                    });
                }
            }
            ScriptStep::Block(tile) => world.place_live_obstacle(*tile),
            ScriptStep::Status => write_line(
                out,
                &OutputLine::Status {
                    tick: report.ticks,
                    execution: executor.snapshot(),
                    farm: world.status(),
                },
            )?,
        }
        report.steps += 1;
    }
    info!(
        steps = report.steps,
        ticks = report.ticks,
        results = report.results,
        "script_finished"
    );
    Ok(report)
}

fn tick_once<W: Write>(
    executor: &mut ActionExecutor,
    world: &mut FarmWorld,
    report: &mut ScriptReport,
    out: &mut W,
) -> Result<(), HostError> {
    report.ticks += 1;
    if let TickOutcome::Finished(result) = executor.advance_one_tick(world) {
        report.results += 1;
        write_line(
            out,
            &OutputLine::Result {
                tick: report.ticks,
                result: &result,
            },
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use serde_json::Value;
    use tickex_engine::ActionWorld;

    use super::*;

    fn run(raw: &str) -> (Result<ScriptReport, HostError>, FarmWorld, Vec<Value>) {
        let script = parse_script_json(raw).expect("script");
        let mut executor = ActionExecutor::default();
        let mut world = FarmWorld::demo().expect("demo farm");
        let mut out = Vec::new();
        let report = run_script(&script, &mut executor, &mut world, &mut out);
        let lines = String::from_utf8(out)
            .expect("utf8")
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect();
        (report, world, lines)
    }

    #[test]
    fn walk_then_hoe_prints_ack_and_arrival() {
        let (report, world, lines) = run(
            r#"{"steps": [
                {"submit": {"kind": "move_to", "x": 2, "y": 3, "facing": "left"}},
                {"expect_state": "moving_to_target"},
                {"run_until_settled": 20},
                {"expect_state": "complete"},
                {"submit": {"kind": "use_tool"}},
                {"status": null}
            ]}"#,
        );

        let report = report.expect("script runs");
        assert_eq!(report.steps, 6);
        assert_eq!(report.ticks, 2);
        assert_eq!(report.results, 3);
        assert_eq!(world.player_tile(), TileCoord::new(2, 3));

        assert_eq!(lines[0]["result"]["result"]["state"], "moving_to_target");
        assert_eq!(lines[1]["result"]["tick"], 2);
        assert_eq!(
            lines[1]["result"]["result"]["message"],
            "arrived at (2, 3) after 2 steps"
        );
        assert_eq!(lines[2]["result"]["result"]["message"], "tilled (1, 3)");
        assert_eq!(lines[3]["status"]["farm"]["energy"], 198);
        assert_eq!(lines[3]["status"]["execution"]["state"], "complete");
    }

    #[test]
    fn live_obstacle_turns_walk_into_partial_success() {
        let (report, world, lines) = run(
            r#"{"steps": [
                {"submit": {"kind": "step", "direction": "right", "count": 4}},
                {"block": {"x": 5, "y": 1}},
                {"run_until_settled": 10},
                {"expect_state": "complete"}
            ]}"#,
        );

        report.expect("script runs");
        assert_eq!(world.player_tile(), TileCoord::new(4, 1));
        let message = lines[1]["result"]["result"]["message"]
            .as_str()
            .expect("message");
        assert!(message.contains("blocked at (4, 1)"), "{message}");
    }

    #[test]
    fn expectation_mismatch_stops_the_script() {
        let (report, _, lines) = run(
            r#"{"steps": [
                {"submit": {"kind": "wait", "ticks": 5}},
                {"expect_state": "idle"},
                {"submit": {"kind": "toggle_menu"}}
            ]}"#,
        );

        let error = report.expect_err("expectation should fail");
        assert_eq!(
            error.to_string(),
            "step 1: expected state idle, found waiting_for_animation"
        );
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn run_until_settled_gives_up_after_max_ticks() {
        let (report, _, _) = run(
            r#"{"steps": [
                {"submit": {"kind": "wait", "ticks": 50}},
                {"run_until_settled": 10}
            ]}"#,
        );

        let error = report.expect_err("wait outlasts budget");
        assert_eq!(
            error.to_string(),
            "step 1: action still waiting_for_animation after 10 ticks"
        );
    }

    #[test]
    fn busy_and_reset_are_reported_in_order() {
        let (report, _, lines) = run(
            r#"{"steps": [
                {"submit": {"kind": "wait", "ticks": 30}},
                {"tick": 3},
                {"submit": {"kind": "move_to", "x": 5, "y": 5}},
                {"reset": null},
                {"expect_state": "idle"},
                {"submit": {"kind": "eat", "slot": 3}}
            ]}"#,
        );

        report.expect("script runs");
        assert_eq!(lines[1]["result"]["result"]["error_kind"], "busy");
        assert_eq!(lines[1]["result"]["tick"], 3);
        assert_eq!(lines[2]["reset"]["tick"], 3);
        assert_eq!(
            lines[3]["result"]["result"]["message"],
            "ate Salad; energy 200 -> 245"
        );
    }

    #[test]
    fn unknown_state_token_is_an_error() {
        let (report, _, _) = run(r#"{"steps": [{"expect_state": "sleeping"}]}"#);
        assert!(matches!(
            report,
            Err(HostError::UnknownState { step: 0, .. })
        ));
    }

    #[test]
    fn parse_errors_name_the_failing_step() {
        let error = parse_script_json(r#"{"steps": [{"tick": 1}, {"tick": "soon"}]}"#)
            .expect_err("bad tick");
        let message = error.to_string();
        assert!(message.contains("parse script json at steps[1]"), "{message}");

        let unknown = parse_script_json(r#"{"steps": [{"dance": 1}]}"#).expect_err("bad step");
        assert!(unknown.to_string().contains("unknown variant"));
    }

    #[test]
    fn load_script_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"steps": [{{"tick": 2}}]}}"#).expect("write script");

        let script = load_script(file.path()).expect("load");
        assert_eq!(script.steps, vec![ScriptStep::Tick(2)]);

        let missing = load_script(&file.path().with_extension("missing")).expect_err("missing");
        assert!(matches!(missing, HostError::ReadScript { .. }));
    }
}
