use std::io::Write;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tickex_engine::{ActionResult, ExecutionSnapshot};

use super::error::HostError;
use super::world::FarmStatus;

/// One line of host output. Logs go to stderr; these go to stdout.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum OutputLine<'a> {
    Result {
        tick: u64,
        result: &'a ActionResult,
    },
    Reset {
        tick: u64,
    },
    Status {
        tick: u64,
        execution: ExecutionSnapshot,
        farm: FarmStatus,
    },
    InputError {
        tick: u64,
        error: String,
    },
}

pub(crate) fn write_line<W: Write>(out: &mut W, line: &OutputLine<'_>) -> Result<(), HostError> {
    serde_json::to_writer(&mut *out, line)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

/// Parses JSON and names the failing path, e.g. `steps[2].submit.x`.
pub(crate) fn parse_json<T: DeserializeOwned>(raw: &str, label: &str) -> Result<T, String> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, T>(&mut deserializer) {
        Ok(value) => Ok(value),
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            if path.is_empty() || path == "." {
                Err(format!("parse {label} json: {source}"))
            } else {
                Err(format!("parse {label} json at {path}: {source}"))
            }
        }
    }
}
