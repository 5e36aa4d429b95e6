use std::env;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use tickex_engine::ActionRegistry;

mod app;

#[derive(Debug, Clone, PartialEq, Eq)]
enum CliCommand {
    Help,
    Script { path: PathBuf },
    Live { max_ticks: Option<u64> },
}

fn main() -> ExitCode {
    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::from(1)
        }
    }
}

fn run_cli() -> Result<(), String> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    let command = parse_args(&args)?;
    if command == CliCommand::Help {
        print_usage();
        return Ok(());
    }

    let mut wiring = app::build_host().map_err(|error| error.to_string())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match command {
        CliCommand::Help => Ok(()),
        CliCommand::Script { path } => {
            let script = app::load_script(&path).map_err(|error| error.to_string())?;
            app::run_script(&script, &mut wiring.executor, &mut wiring.world, &mut out)
                .map(|_| ())
                .map_err(|error| error.to_string())
        }
        CliCommand::Live { max_ticks } => {
            let config = app::LoopConfig {
                max_ticks,
                ..wiring.loop_config
            };
            app::run_live(
                config,
                &mut wiring.executor,
                &mut wiring.world,
                BufReader::new(io::stdin()),
                &mut out,
            )
            .map(|_| ())
            .map_err(|error| error.to_string())
        }
    }
}

fn parse_args(args: &[String]) -> Result<CliCommand, String> {
    let Some(command) = args.first() else {
        return Err(usage_text());
    };
    let command_args = &args[1..];
    match command.as_str() {
        "help" | "-h" | "--help" => Ok(CliCommand::Help),
        "script" => match command_args {
            [path] => Ok(CliCommand::Script {
                path: PathBuf::from(path),
            }),
            [] => Err("script requires a file path".to_string()),
            _ => Err("script takes exactly one file path".to_string()),
        },
        "live" => {
            let mut max_ticks = None;
            let mut index = 0usize;
            while index < command_args.len() {
                match command_args[index].as_str() {
                    "--max-ticks" => {
                        let value = command_args
                            .get(index + 1)
                            .ok_or_else(|| "missing value for --max-ticks".to_string())?;
                        let parsed = value.parse::<u64>().map_err(|_| {
                            format!("invalid --max-ticks value '{value}' (expected u64)")
                        })?;
                        max_ticks = Some(parsed);
                        index += 2;
                    }
                    other => {
                        return Err(format!(
                            "unknown live argument '{other}' (expected --max-ticks)"
                        ))
                    }
                }
            }
            Ok(CliCommand::Live { max_ticks })
        }
        other => Err(format!("unknown subcommand '{other}'\n{}", usage_text())),
    }
}

fn print_usage() {
    println!("{}", usage_text());
}

fn usage_text() -> String {
    let mut text = String::from(
        "usage:\n  host script <path>\n  host live [--max-ticks N]\n  host help\n\nactions:",
    );
    let registry = ActionRegistry::with_builtins();
    for (name, help, schema) in registry.iter_specs_in_order() {
        text.push_str(&format!("\n  {name:<13} {schema:<28} {help}"));
    }
    text
}
