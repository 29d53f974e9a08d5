//! Call-outs from the simulation to its collaborators. The core only names what
//! happened; text, sound and on-screen presentation belong to the implementors.

use crate::geometry::Vec2;
use crate::world::{EntityId, GuardKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventPriority {
    Normal,
    /// May be delayed while other events are showing.
    Low,
    /// May be dropped entirely while other events are showing.
    VeryLow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    GuardHit(GuardKind),
    GuardDeath(GuardKind),
    GuardSawPlayer(GuardKind),
    GuardHitPlayer(GuardKind),
    ThrewDagger,
    PlayerSpotted,
    PickpocketedGuard,
    PlayerDeath,
    DaggerHitHouse,
    LootedChest,
    WonLevel,
}

impl GameEvent {
    pub fn name(self) -> &'static str {
        match self {
            Self::GuardHit(GuardKind::Human) => "guard_hit",
            Self::GuardHit(GuardKind::Dog) => "dog_hit",
            Self::GuardDeath(GuardKind::Human) => "guard_death",
            Self::GuardDeath(GuardKind::Dog) => "dog_death",
            Self::GuardSawPlayer(GuardKind::Human) => "guard_saw_player",
            Self::GuardSawPlayer(GuardKind::Dog) => "dog_saw_player",
            Self::GuardHitPlayer(GuardKind::Human) => "guard_hit_player",
            Self::GuardHitPlayer(GuardKind::Dog) => "dog_hit_player",
            Self::ThrewDagger => "threw_dagger",
            Self::PlayerSpotted => "player_spotted",
            Self::PickpocketedGuard => "pickpocketed_guard",
            Self::PlayerDeath => "player_death",
            Self::DaggerHitHouse => "dagger_hit_house",
            Self::LootedChest => "looted_chest",
            Self::WonLevel => "won_level",
        }
    }

    pub fn priority(self) -> EventPriority {
        match self {
            Self::PlayerSpotted | Self::PlayerDeath => EventPriority::Low,
            Self::DaggerHitHouse => EventPriority::VeryLow,
            _ => EventPriority::Normal,
        }
    }
}

/// The entity an event came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventOrigin<'a> {
    pub id: EntityId,
    pub name: &'a str,
    pub center: Vec2,
}

pub trait EventSink {
    fn trigger(&mut self, event: GameEvent, origin: Option<EventOrigin<'_>>);

    /// Called when an entity starts dying so queued events about it can be dropped.
    fn forget_entity(&mut self, _id: EntityId) {}
}

/// Stats/progress collaborator. Receives raw numbers, never formats them.
pub trait Scoreboard {
    fn update_health(&mut self, hp: i32, max_hp: i32);
    fn add_loot(&mut self, amount: u32, pickpocketed: Option<&str>);
    fn add_kill(&mut self, name: &str);
    fn set_looting_completion(&mut self, fraction: f32);
    fn stop_looting(&mut self);
    fn report_death(&mut self);
    fn set_won_level(&mut self);
    fn daggers_changed(&mut self, count: u32);
}

pub struct Hooks<'a> {
    pub events: &'a mut dyn EventSink,
    pub scoreboard: &'a mut dyn Scoreboard,
}

impl<'a> Hooks<'a> {
    pub fn new(events: &'a mut dyn EventSink, scoreboard: &'a mut dyn Scoreboard) -> Self {
        Self { events, scoreboard }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScoreboardCall {
    UpdateHealth { hp: i32, max_hp: i32 },
    AddLoot { amount: u32, pickpocketed: Option<String> },
    AddKill(String),
    SetLootingCompletion(f32),
    StopLooting,
    ReportDeath,
    SetWonLevel,
    DaggersChanged(u32),
}

/// Keeps every call in order. Used by tests and by headless tooling that wants to
/// inspect what a run produced.
#[derive(Debug, Default, Clone)]
pub struct RecordingHooks {
    pub events: Vec<(GameEvent, Option<EntityId>)>,
    pub forgotten: Vec<EntityId>,
    pub scoreboard: Vec<ScoreboardCall>,
}

impl RecordingHooks {
    pub fn count(&self, event: GameEvent) -> usize {
        self.events.iter().filter(|(seen, _)| *seen == event).count()
    }

    pub fn total_loot(&self) -> u32 {
        self.scoreboard
            .iter()
            .map(|call| match call {
                ScoreboardCall::AddLoot { amount, .. } => *amount,
                _ => 0,
            })
            .sum()
    }
}

impl EventSink for RecordingHooks {
    fn trigger(&mut self, event: GameEvent, origin: Option<EventOrigin<'_>>) {
        self.events.push((event, origin.map(|origin| origin.id)));
    }

    fn forget_entity(&mut self, id: EntityId) {
        self.forgotten.push(id);
    }
}

impl Scoreboard for RecordingHooks {
    fn update_health(&mut self, hp: i32, max_hp: i32) {
        self.scoreboard.push(ScoreboardCall::UpdateHealth { hp, max_hp });
    }

    fn add_loot(&mut self, amount: u32, pickpocketed: Option<&str>) {
        self.scoreboard.push(ScoreboardCall::AddLoot {
            amount,
            pickpocketed: pickpocketed.map(str::to_owned),
        });
    }

    fn add_kill(&mut self, name: &str) {
        self.scoreboard.push(ScoreboardCall::AddKill(name.to_owned()));
    }

    fn set_looting_completion(&mut self, fraction: f32) {
        self.scoreboard
            .push(ScoreboardCall::SetLootingCompletion(fraction));
    }

    fn stop_looting(&mut self) {
        self.scoreboard.push(ScoreboardCall::StopLooting);
    }

    fn report_death(&mut self) {
        self.scoreboard.push(ScoreboardCall::ReportDeath);
    }

    fn set_won_level(&mut self) {
        self.scoreboard.push(ScoreboardCall::SetWonLevel);
    }

    fn daggers_changed(&mut self, count: u32) {
        self.scoreboard.push(ScoreboardCall::DaggersChanged(count));
    }
}
