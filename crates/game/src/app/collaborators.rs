//! Headless stand-ins for the presentation collaborators: events and scoreboard
//! changes go to the log instead of the speakers and the HUD.

use std::collections::BTreeMap;

use stealth_engine::{
    Canvas, EntityId, EventOrigin, EventPriority, EventSink, GameEvent, RenderState, Scoreboard,
};
use tracing::{debug, info, trace};

#[derive(Debug, Default)]
pub(crate) struct TracingEvents {
    fired: BTreeMap<&'static str, u32>,
}

impl TracingEvents {
    pub(crate) fn fired(&self, name: &str) -> u32 {
        self.fired.get(name).copied().unwrap_or(0)
    }

    pub(crate) fn total_fired(&self) -> u32 {
        self.fired.values().sum()
    }
}

impl EventSink for TracingEvents {
    fn trigger(&mut self, event: GameEvent, origin: Option<EventOrigin<'_>>) {
        *self.fired.entry(event.name()).or_default() += 1;
        let source = origin.map(|origin| origin.name).unwrap_or("world");
        match event.priority() {
            EventPriority::Normal => info!(event = event.name(), source, "game_event"),
            EventPriority::Low | EventPriority::VeryLow => {
                debug!(event = event.name(), source, priority = ?event.priority(), "game_event")
            }
        }
    }

    fn forget_entity(&mut self, id: EntityId) {
        debug!(entity = id.0, "events_forgot_entity");
    }
}

/// Counts what would have been drawn; each sprite goes to the trace log.
#[derive(Debug, Default)]
pub(crate) struct TracingCanvas {
    pub(crate) frames: u64,
    pub(crate) sprites: u64,
}

impl TracingCanvas {
    pub(crate) fn begin_frame(&mut self) {
        self.frames += 1;
    }
}

impl Canvas for TracingCanvas {
    fn draw(&mut self, state: &RenderState) {
        self.sprites += 1;
        trace!(
            entity = state.id.0,
            sprite = state.sprite.as_str(),
            x = state.center.x,
            y = state.center.y,
            opacity = state.opacity,
            "sprite_drawn"
        );
    }
}

/// Running totals for the current level and the whole campaign.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScoreboardState {
    pub(crate) loot: u32,
    pub(crate) overall_loot: u32,
    pub(crate) houses_looted: u32,
    pub(crate) pockets_picked: u32,
    pub(crate) killed_names: Vec<String>,
    pub(crate) health_fraction: f32,
    pub(crate) looting_fraction: Option<f32>,
    pub(crate) daggers: u32,
    pub(crate) won_level: bool,
    pub(crate) deaths: u32,
}

impl Default for ScoreboardState {
    fn default() -> Self {
        Self {
            loot: 0,
            overall_loot: 0,
            houses_looted: 0,
            pockets_picked: 0,
            killed_names: Vec::new(),
            health_fraction: 1.0,
            looting_fraction: None,
            daggers: 0,
            won_level: false,
            deaths: 0,
        }
    }
}

impl ScoreboardState {
    /// Starts a fresh level. Dying forfeits everything stolen so far; kills, counts and
    /// deaths carry over.
    pub(crate) fn reset_for_level(&mut self, player_died: bool) {
        self.loot = 0;
        self.looting_fraction = None;
        self.health_fraction = 1.0;
        self.won_level = false;
        if player_died {
            self.overall_loot = 0;
        }
    }
}

impl Scoreboard for ScoreboardState {
    fn update_health(&mut self, hp: i32, max_hp: i32) {
        self.health_fraction = if max_hp > 0 {
            hp.max(0) as f32 / max_hp as f32
        } else {
            0.0
        };
        info!(hp, max_hp, "health_changed");
    }

    fn add_loot(&mut self, amount: u32, pickpocketed: Option<&str>) {
        self.loot = self.loot.saturating_add(amount);
        self.overall_loot = self.overall_loot.saturating_add(amount);
        match pickpocketed {
            Some(victim) => {
                self.pockets_picked += 1;
                info!(amount, victim, loot = self.loot, "pocket_picked");
            }
            None => {
                self.houses_looted += 1;
                info!(amount, loot = self.loot, "house_looted");
            }
        }
    }

    fn add_kill(&mut self, name: &str) {
        self.killed_names.push(name.to_string());
        info!(victim = name, kills = self.killed_names.len(), "kill_recorded");
    }

    fn set_looting_completion(&mut self, fraction: f32) {
        self.looting_fraction = Some(fraction);
    }

    fn stop_looting(&mut self) {
        if let Some(fraction) = self.looting_fraction.take() {
            debug!(percent = (fraction * 100.0) as u32, "looting_interrupted");
        }
    }

    fn report_death(&mut self) {
        self.deaths += 1;
        info!(deaths = self.deaths, "player_died");
    }

    fn set_won_level(&mut self) {
        self.won_level = true;
        info!(loot = self.loot, overall_loot = self.overall_loot, "level_won");
    }

    fn daggers_changed(&mut self, count: u32) {
        self.daggers = count;
        debug!(daggers = count, "daggers_changed");
    }
}
