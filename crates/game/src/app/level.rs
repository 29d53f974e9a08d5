//! Plain-text level files.
//!
//! One entity per line: `kind params...`. Everything after `#` is a comment and blank
//! lines are skipped. Kinds are `player x y [daggers]`, `house x y size [loot
//! [difficulty]]`, `guard name x y [patrol...]` and `dog name x y [patrol...]`.

use std::fs;
use std::path::{Path, PathBuf};

use stealth_engine::{EntityId, GuardKind, HouseSize, PatrolConfig, Vec2, World};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub(crate) enum LevelError {
    #[error("failed to read level {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: unknown entity kind '{kind}'")]
    UnknownKind { line: usize, kind: String },
    #[error("line {line}: {kind} is missing {field}")]
    MissingField {
        line: usize,
        kind: &'static str,
        field: &'static str,
    },
    #[error("line {line}: invalid {field} '{token}'")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        token: String,
    },
    #[error("line {line}: house size must be 1, 2 or 3 (got {value})")]
    InvalidHouseSize { line: usize, value: i64 },
    #[error("line {line}: patrol coordinate {value} has no partner")]
    UnpairedCoordinate { line: usize, value: i64 },
    #[error("line {line}: unexpected token '{token}'")]
    UnexpectedToken { line: usize, token: String },
    #[error("level '{name}' has no player")]
    MissingPlayer { name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LevelEntry {
    Player {
        position: Vec2,
        daggers: Option<u32>,
    },
    House {
        position: Vec2,
        size: HouseSize,
        loot: Option<u32>,
        difficulty: f32,
    },
    Guard {
        kind: GuardKind,
        name: String,
        position: Vec2,
        patrol: PatrolConfig,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Level {
    pub(crate) name: String,
    pub(crate) entries: Vec<LevelEntry>,
}

pub(crate) fn load_level(path: &Path) -> Result<Level, LevelError> {
    let text = fs::read_to_string(path).map_err(|source| LevelError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    parse_level(&name, &text)
}

pub(crate) fn parse_level(name: &str, text: &str) -> Result<Level, LevelError> {
    let mut entries = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let content = raw.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }
        let mut tokens = content.split_whitespace();
        let Some(kind) = tokens.next() else {
            continue;
        };
        let params: Vec<&str> = tokens.collect();
        let entry = match kind.to_ascii_lowercase().as_str() {
            "player" => parse_player(line, &params)?,
            "house" => parse_house(line, &params)?,
            "guard" => parse_guard(line, GuardKind::Human, &params)?,
            "dog" => parse_guard(line, GuardKind::Dog, &params)?,
            _ => {
                return Err(LevelError::UnknownKind {
                    line,
                    kind: kind.to_string(),
                })
            }
        };
        entries.push(entry);
    }

    if !entries
        .iter()
        .any(|entry| matches!(entry, LevelEntry::Player { .. }))
    {
        return Err(LevelError::MissingPlayer {
            name: name.to_string(),
        });
    }
    Ok(Level {
        name: name.to_string(),
        entries,
    })
}

impl Level {
    /// Stages every entry and promotes them so the first tick sees the whole level.
    /// Returns the player spawned last, which is the one the world tracks.
    pub(crate) fn spawn_into(&self, world: &mut World) -> Option<EntityId> {
        let mut player = None;
        for entry in &self.entries {
            match entry {
                LevelEntry::Player { position, daggers } => {
                    player = Some(world.spawn_player(*position, *daggers));
                }
                LevelEntry::House {
                    position,
                    size,
                    loot,
                    difficulty,
                } => {
                    world.spawn_house(*position, *size, *loot, *difficulty);
                }
                LevelEntry::Guard {
                    kind,
                    name,
                    position,
                    patrol,
                } => {
                    world.spawn_guard(*kind, name, *position, patrol.clone());
                }
            }
        }
        let promoted = world.apply_pending();
        debug!(level = %self.name, promoted, "level_spawned");
        player
    }
}

fn parse_player(line: usize, params: &[&str]) -> Result<LevelEntry, LevelError> {
    let mut fields = Fields::new(line, "player", params);
    let position = fields.position()?;
    let daggers = fields
        .optional_number("daggers")?
        .map(|value| value.max(0.0) as u32);
    fields.finish()?;
    Ok(LevelEntry::Player { position, daggers })
}

fn parse_house(line: usize, params: &[&str]) -> Result<LevelEntry, LevelError> {
    let mut fields = Fields::new(line, "house", params);
    let position = fields.position()?;
    let class = fields.number("size")?;
    let size = u8::try_from(class as i64)
        .ok()
        .filter(|_| class.fract() == 0.0)
        .and_then(HouseSize::from_class)
        .ok_or(LevelError::InvalidHouseSize {
            line,
            value: class as i64,
        })?;
    // A non-positive loot amount means "use the default".
    let loot = fields
        .optional_number("loot")?
        .filter(|value| *value > 0.0)
        .map(|value| value as u32);
    let difficulty = fields.optional_number("difficulty")?.unwrap_or(1.0) as f32;
    fields.finish()?;
    Ok(LevelEntry::House {
        position,
        size,
        loot,
        difficulty,
    })
}

fn parse_guard(line: usize, kind: GuardKind, params: &[&str]) -> Result<LevelEntry, LevelError> {
    let label = match kind {
        GuardKind::Human => "guard",
        GuardKind::Dog => "dog",
    };
    let mut fields = Fields::new(line, label, params);
    let name = fields.word("name")?.to_string();
    let position = fields.position()?;
    let patrol = parse_patrol(line, fields.rest())?;
    Ok(LevelEntry::Guard {
        kind,
        name,
        position,
        patrol,
    })
}

/// Patrol tokens: coordinate pairs add waypoints, `dir dx dy` sets the initial facing,
/// and a lone negative number (not inside a pair) makes the route loop.
fn parse_patrol(line: usize, tokens: &[&str]) -> Result<PatrolConfig, LevelError> {
    let mut patrol = PatrolConfig::default();
    let mut pending: Option<i64> = None;
    let mut next_is_direction = false;
    for token in tokens {
        if token.eq_ignore_ascii_case("dir") {
            if let Some(value) = pending {
                return Err(LevelError::UnpairedCoordinate { line, value });
            }
            next_is_direction = true;
            continue;
        }
        let value = parse_integer(line, "patrol coordinate", token)?;
        match pending.take() {
            Some(first) if next_is_direction => {
                patrol.initial_facing = Some(Vec2::new(first as f32, value as f32));
                next_is_direction = false;
            }
            Some(first) => patrol
                .waypoints
                .push(Vec2::new(first as f32, value as f32)),
            None if !next_is_direction && value < 0 => patrol.looping = true,
            None => pending = Some(value),
        }
    }
    if let Some(value) = pending {
        return Err(LevelError::UnpairedCoordinate { line, value });
    }
    if next_is_direction {
        return Err(LevelError::MissingField {
            line,
            kind: "dir",
            field: "a direction",
        });
    }
    Ok(patrol)
}

struct Fields<'a> {
    line: usize,
    kind: &'static str,
    params: &'a [&'a str],
    cursor: usize,
}

impl<'a> Fields<'a> {
    fn new(line: usize, kind: &'static str, params: &'a [&'a str]) -> Self {
        Self {
            line,
            kind,
            params,
            cursor: 0,
        }
    }

    fn next_token(&mut self) -> Option<&'a str> {
        let token = self.params.get(self.cursor).copied();
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    fn word(&mut self, field: &'static str) -> Result<&'a str, LevelError> {
        self.next_token().ok_or(LevelError::MissingField {
            line: self.line,
            kind: self.kind,
            field,
        })
    }

    fn number(&mut self, field: &'static str) -> Result<f64, LevelError> {
        let token = self.word(field)?;
        parse_number(self.line, field, token)
    }

    fn optional_number(&mut self, field: &'static str) -> Result<Option<f64>, LevelError> {
        self.next_token()
            .map(|token| parse_number(self.line, field, token))
            .transpose()
    }

    fn position(&mut self) -> Result<Vec2, LevelError> {
        let x = self.number("x")?;
        let y = self.number("y")?;
        Ok(Vec2::new(x as f32, y as f32))
    }

    fn rest(&self) -> &'a [&'a str] {
        &self.params[self.cursor..]
    }

    fn finish(&self) -> Result<(), LevelError> {
        match self.params.get(self.cursor) {
            Some(token) => Err(LevelError::UnexpectedToken {
                line: self.line,
                token: token.to_string(),
            }),
            None => Ok(()),
        }
    }
}

fn parse_number(line: usize, field: &'static str, token: &str) -> Result<f64, LevelError> {
    token
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| LevelError::InvalidNumber {
            line,
            field,
            token: token.to_string(),
        })
}

fn parse_integer(line: usize, field: &'static str, token: &str) -> Result<i64, LevelError> {
    token.parse::<i64>().map_err(|_| LevelError::InvalidNumber {
        line,
        field,
        token: token.to_string(),
    })
}
