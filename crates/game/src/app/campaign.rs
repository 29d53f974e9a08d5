//! Level progression: win moves on to the next level, death reloads the current one.

use std::fs;
use std::path::Path;

use stealth_engine::{
    Canvas, Hooks, InputSnapshot, LevelOutcome, Scoreboard, SimConfig, TickReport, World,
};
use tracing::{info, warn};

use super::collaborators::{ScoreboardState, TracingEvents};
use super::level::{load_level, Level};
use super::AppError;

const LEVEL_EXTENSION: &str = "txt";

/// Every level of a run, parsed up front so a broken file fails before the first tick.
#[derive(Debug, Clone)]
pub(crate) struct Campaign {
    levels: Vec<Level>,
}

impl Campaign {
    /// A directory runs its `.txt` files in lexical order; a file is a one-level campaign.
    pub(crate) fn discover(path: &Path) -> Result<Self, AppError> {
        let files = if path.is_dir() {
            let entries = fs::read_dir(path).map_err(|source| AppError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let mut files = Vec::new();
            for entry in entries {
                let entry = entry.map_err(|source| AppError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                let file = entry.path();
                if file.extension().and_then(|ext| ext.to_str()) == Some(LEVEL_EXTENSION) {
                    files.push(file);
                }
            }
            files.sort();
            files
        } else {
            vec![path.to_path_buf()]
        };

        if files.is_empty() {
            return Err(AppError::EmptyCampaign(path.to_path_buf()));
        }
        let levels = files
            .iter()
            .map(|file| load_level(file))
            .collect::<Result<Vec<_>, _>>()?;
        info!(levels = levels.len(), source = %path.display(), "campaign_discovered");
        Ok(Self { levels })
    }

    #[cfg(test)]
    pub(crate) fn from_levels(levels: Vec<Level>) -> Self {
        Self { levels }
    }

    pub(crate) fn len(&self) -> usize {
        self.levels.len()
    }

    pub(crate) fn level_names(&self) -> Vec<&str> {
        self.levels.iter().map(|level| level.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepOutcome {
    Continue,
    LevelRestarted,
    LevelAdvanced,
    CampaignComplete,
}

/// Owns the world and the collaborators for one run.
pub(crate) struct Session {
    world: World,
    campaign: Campaign,
    current: usize,
    events: TracingEvents,
    scoreboard: ScoreboardState,
    restarts: u32,
    complete: bool,
}

impl Session {
    pub(crate) fn start(config: SimConfig, seed: u64, campaign: Campaign) -> Result<Self, AppError> {
        let world = World::with_seed(config, seed)?;
        let mut session = Self {
            world,
            campaign,
            current: 0,
            events: TracingEvents::default(),
            scoreboard: ScoreboardState::default(),
            restarts: 0,
            complete: false,
        };
        session.load_current();
        Ok(session)
    }

    #[cfg(test)]
    pub(crate) fn with_world(world: World, campaign: Campaign) -> Self {
        let mut session = Self {
            world,
            campaign,
            current: 0,
            events: TracingEvents::default(),
            scoreboard: ScoreboardState::default(),
            restarts: 0,
            complete: false,
        };
        session.load_current();
        session
    }

    fn load_current(&mut self) {
        let Some(level) = self.campaign.levels.get(self.current) else {
            warn!(index = self.current, "level_index_out_of_range");
            return;
        };
        self.world.clear_all();
        level.spawn_into(&mut self.world);
        if let Some((_, player)) = self.world.player() {
            let vitals = player.vitals();
            self.scoreboard.update_health(vitals.hp(), vitals.max_hp());
            self.scoreboard.daggers_changed(player.daggers());
        }
        info!(
            level = %level.name,
            index = self.current,
            entity_count = self.world.entity_count(),
            "level_loaded"
        );
    }

    /// Advances one tick and applies the level transitions its outcome calls for.
    pub(crate) fn step(&mut self, dt: f32, input: &InputSnapshot) -> Result<StepOutcome, AppError> {
        if self.complete {
            return Ok(StepOutcome::CampaignComplete);
        }
        let report = self.advance_world(dt, input)?;
        match report.outcome {
            LevelOutcome::InProgress => Ok(StepOutcome::Continue),
            LevelOutcome::Won => {
                self.current += 1;
                if self.current >= self.campaign.len() {
                    self.complete = true;
                    self.world.clear_all();
                    info!(
                        overall_loot = self.scoreboard.overall_loot,
                        houses_looted = self.scoreboard.houses_looted,
                        kills = self.scoreboard.killed_names.len(),
                        "campaign_complete"
                    );
                    return Ok(StepOutcome::CampaignComplete);
                }
                self.scoreboard.reset_for_level(false);
                self.load_current();
                Ok(StepOutcome::LevelAdvanced)
            }
            // Let the death fade play out before starting over.
            LevelOutcome::PlayerDied if self.world.player().is_some() => Ok(StepOutcome::Continue),
            LevelOutcome::PlayerDied => {
                self.restarts += 1;
                self.scoreboard.reset_for_level(true);
                self.load_current();
                Ok(StepOutcome::LevelRestarted)
            }
        }
    }

    fn advance_world(&mut self, dt: f32, input: &InputSnapshot) -> Result<TickReport, AppError> {
        let mut hooks = Hooks::new(&mut self.events, &mut self.scoreboard);
        Ok(self.world.advance(dt, input, &mut hooks)?)
    }

    pub(crate) fn draw(&self, canvas: &mut dyn Canvas) {
        self.world.draw_all(canvas);
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    pub(crate) fn scoreboard(&self) -> &ScoreboardState {
        &self.scoreboard
    }

    pub(crate) fn events(&self) -> &TracingEvents {
        &self.events
    }

    pub(crate) fn current_level(&self) -> usize {
        self.current
    }

    pub(crate) fn restarts(&self) -> u32 {
        self.restarts
    }
}
