use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use stealth_engine::{InputAction, InputSnapshot};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum ScriptError {
    #[error("failed to read input script {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid input script at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("input span {index} ends at tick {to_tick} before it starts at {from_tick}")]
    InvertedSpan {
        index: usize,
        from_tick: u64,
        to_tick: u64,
    },
}

/// Actions held for every tick in `from_tick..=to_tick`. Ticks count from zero across
/// the whole run, level reloads included.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct InputSpan {
    pub(crate) from_tick: u64,
    pub(crate) to_tick: u64,
    pub(crate) actions: Vec<InputAction>,
}

/// Scripted input for headless runs. Overlapping spans combine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct InputScript {
    spans: Vec<InputSpan>,
}

impl InputScript {
    pub(crate) fn load(path: &Path) -> Result<Self, ScriptError> {
        let text = fs::read_to_string(path).map_err(|source| ScriptError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub(crate) fn parse(text: &str) -> Result<Self, ScriptError> {
        let mut deserializer = serde_json::Deserializer::from_str(text);
        let spans: Vec<InputSpan> =
            serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
                ScriptError::Parse {
                    path: err.path().to_string(),
                    source: err.into_inner(),
                }
            })?;
        for (index, span) in spans.iter().enumerate() {
            if span.to_tick < span.from_tick {
                return Err(ScriptError::InvertedSpan {
                    index,
                    from_tick: span.from_tick,
                    to_tick: span.to_tick,
                });
            }
        }
        Ok(Self { spans })
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Last tick any span covers.
    pub(crate) fn last_tick(&self) -> Option<u64> {
        self.spans.iter().map(|span| span.to_tick).max()
    }

    pub(crate) fn snapshot_for_tick(&self, tick: u64) -> InputSnapshot {
        self.spans
            .iter()
            .filter(|span| (span.from_tick..=span.to_tick).contains(&tick))
            .flat_map(|span| span.actions.iter().copied())
            .fold(InputSnapshot::empty(), |snapshot, action| {
                snapshot.with_action_down(action, true)
            })
    }
}
