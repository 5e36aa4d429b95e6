use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tickex_engine::GridError;

#[derive(Debug, Error)]
pub(crate) enum HostError {
    #[error("failed to build demo farm: {0}")]
    World(#[from] GridError),
    #[error("read script '{path}': {source}")]
    ReadScript {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0}")]
    ParseScript(String),
    #[error("step {step}: unknown execution state '{token}'")]
    UnknownState { step: usize, token: String },
    #[error("step {step}: expected state {expected}, found {actual}")]
    ExpectationFailed {
        step: usize,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("step {step}: action still {state} after {max_ticks} ticks")]
    NotSettled {
        step: usize,
        state: &'static str,
        max_ticks: u32,
    },
    #[error("failed to spawn stdin reader thread: {0}")]
    SpawnReader(#[source] io::Error),
    #[error("write output: {0}")]
    Output(#[from] io::Error),
    #[error("encode output: {0}")]
    Encode(#[from] serde_json::Error),
}
