pub(crate) mod bootstrap;
pub(crate) mod campaign;
pub(crate) mod collaborators;
pub(crate) mod level;
pub(crate) mod loop_runner;
pub(crate) mod metrics;
pub(crate) mod script;

use std::path::PathBuf;

use stealth_engine::{ConfigError, SimError};
use thiserror::Error;

use self::level::LevelError;
use self::script::ScriptError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path} at {field}: {source}")]
    ConfigFormat {
        path: PathBuf,
        field: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error("no level files found in {0}")]
    EmptyCampaign(PathBuf),
    #[error("simulation failed: {0}")]
    Sim(#[from] SimError),
}
