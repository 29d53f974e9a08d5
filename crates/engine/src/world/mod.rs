//! Entity registry and per-tick update.
//!
//! Entities spawned during a tick (or by a level loader) are staged and only join the
//! live set once the tick finishes, so nothing collides with an entity in the tick that
//! created it. Dead entities are filtered out at the same point.

mod collision;
mod dagger;
mod entity;
mod guard;
mod house;
mod perception;
mod player;
mod render;

#[cfg(test)]
mod tests;

use thiserror::Error;
use tracing::{debug, trace};

use crate::config::{ConfigError, SimConfig};
use crate::geometry::Vec2;
use crate::hooks::Hooks;
use crate::input::InputSnapshot;
use crate::random::{RandomSource, SeededRandom};

pub use dagger::Dagger;
pub use entity::{
    Body, Capabilities, CollisionShape, DamageResult, Entity, EntityId, EntityIdAllocator,
    EntityKind, Vitals,
};
pub use guard::{Guard, GuardKind, GuardState, PatrolConfig, VisionCone};
pub use house::{House, HouseSize, LootCompletion};
pub use perception::can_see;
pub use player::Player;
pub use render::{Canvas, RenderState, Tint, VisionConeState};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("guards are live but no player has been spawned")]
    MissingPlayer,
    #[error("tick delta must be finite and non-negative, got {dt}")]
    InvalidDelta { dt: f32 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LevelOutcome {
    #[default]
    InProgress,
    Won,
    PlayerDied,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub updated: usize,
    pub removed: usize,
    pub promoted: usize,
    pub live: usize,
    pub outcome: LevelOutcome,
}

#[derive(Debug, Default)]
struct NameCounters {
    houses: u32,
    chests: u32,
    daggers: u32,
}

impl NameCounters {
    fn next(counter: &mut u32) -> u32 {
        *counter += 1;
        *counter
    }
}

/// The entities other than the one being updated, split around it in the live set.
pub(crate) struct Others<'w> {
    before: &'w mut [Entity],
    after: &'w mut [Entity],
}

impl<'w> Others<'w> {
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.before.iter().chain(self.after.iter())
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> + '_ {
        self.before.iter_mut().chain(self.after.iter_mut())
    }

    pub(crate) fn find(&self, id: EntityId) -> Option<&Entity> {
        self.iter().find(|entity| entity.id == id)
    }

    pub(crate) fn find_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.iter_mut().find(|entity| entity.id == id)
    }
}

pub(crate) struct TickContext<'a, 'h> {
    pub dt: f32,
    pub config: &'a SimConfig,
    pub input: &'a InputSnapshot,
    pub rng: &'a mut dyn RandomSource,
    pub hooks: &'a mut Hooks<'h>,
    pub player_id: Option<EntityId>,
    pub outcome: &'a mut LevelOutcome,
    allocator: &'a mut EntityIdAllocator,
    names: &'a mut NameCounters,
    spawns: &'a mut Vec<Entity>,
}

impl TickContext<'_, '_> {
    pub(crate) fn stage_dagger(&mut self, position: Vec2, direction: Vec2) -> EntityId {
        let id = self.allocator.allocate();
        let index = NameCounters::next(&mut self.names.daggers);
        let dagger = dagger::build(id, index, position, direction, &self.config.dagger);
        debug!(entity = %dagger.name, x = position.x, y = position.y, "dagger_staged");
        self.spawns.push(dagger);
        id
    }
}

pub struct World {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    pending_spawns: Vec<Entity>,
    player_id: Option<EntityId>,
    config: SimConfig,
    rng: Box<dyn RandomSource>,
    names: NameCounters,
    outcome: LevelOutcome,
    tick: u64,
}

impl World {
    pub fn new(config: SimConfig, rng: Box<dyn RandomSource>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            allocator: EntityIdAllocator::default(),
            entities: Vec::new(),
            pending_spawns: Vec::new(),
            player_id: None,
            config,
            rng,
            names: NameCounters::default(),
            outcome: LevelOutcome::InProgress,
            tick: 0,
        })
    }

    pub fn with_seed(config: SimConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::new(config, Box::new(SeededRandom::new(seed)))
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn spawn_player(&mut self, position: Vec2, daggers: Option<u32>) -> EntityId {
        let id = self.allocator.allocate();
        let entity = player::build(id, position, daggers, &self.config);
        if let Some(previous) = self.player_id.replace(id) {
            debug!(previous = previous.0, replacement = id.0, "player_replaced");
        }
        self.stage(entity)
    }

    pub fn spawn_guard(
        &mut self,
        kind: GuardKind,
        name: &str,
        position: Vec2,
        patrol: PatrolConfig,
    ) -> EntityId {
        let id = self.allocator.allocate();
        let entity = guard::build(
            id,
            kind,
            name,
            position,
            patrol,
            &self.config,
            self.rng.as_mut(),
        );
        self.stage(entity)
    }

    /// Spawns a house and the chest it owns. Returns the house id.
    pub fn spawn_house(
        &mut self,
        position: Vec2,
        size: HouseSize,
        nominal_loot: Option<u32>,
        difficulty: f32,
    ) -> EntityId {
        let house_id = self.allocator.allocate();
        let chest_id = self.allocator.allocate();
        let house_index = NameCounters::next(&mut self.names.houses);
        let chest_index = NameCounters::next(&mut self.names.chests);
        let (house, chest) = house::build(
            house::HouseSpawn {
                house_id,
                chest_id,
                house_index,
                chest_index,
                position,
                size,
                nominal_loot,
                difficulty,
            },
            &self.config,
            self.rng.as_mut(),
        );
        self.stage(house);
        self.stage(chest);
        house_id
    }

    pub fn spawn_dagger(&mut self, position: Vec2, direction: Vec2) -> EntityId {
        let id = self.allocator.allocate();
        let index = NameCounters::next(&mut self.names.daggers);
        let entity = dagger::build(id, index, position, direction, &self.config.dagger);
        self.stage(entity)
    }

    fn stage(&mut self, entity: Entity) -> EntityId {
        let id = entity.id;
        debug!(
            entity = %entity.name,
            kind = entity.kind_name(),
            x = entity.body.position().x,
            y = entity.body.position().y,
            "entity_staged"
        );
        self.pending_spawns.push(entity);
        id
    }

    /// Promotes staged entities without running a tick. Level loaders call this so the
    /// first tick already sees the whole level.
    pub fn apply_pending(&mut self) -> usize {
        let promoted = self.pending_spawns.len();
        self.entities.append(&mut self.pending_spawns);
        promoted
    }

    /// Removes every live and staged entity. Config and the random source are kept.
    pub fn clear_all(&mut self) {
        let cleared = self.entities.len() + self.pending_spawns.len();
        self.entities.clear();
        self.pending_spawns.clear();
        self.player_id = None;
        self.names = NameCounters::default();
        self.outcome = LevelOutcome::InProgress;
        debug!(cleared, "world_cleared");
    }

    pub fn advance(
        &mut self,
        dt: f32,
        input: &InputSnapshot,
        hooks: &mut Hooks<'_>,
    ) -> Result<TickReport, SimError> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(SimError::InvalidDelta { dt });
        }
        if self.player_id.is_none()
            && self
                .entities
                .iter()
                .any(|entity| entity.capabilities().perceives)
        {
            return Err(SimError::MissingPlayer);
        }

        self.tick = self.tick.saturating_add(1);
        let mut spawns = Vec::new();
        let updated = self.entities.len();
        {
            let mut ctx = TickContext {
                dt,
                config: &self.config,
                input,
                rng: self.rng.as_mut(),
                hooks,
                player_id: self.player_id,
                outcome: &mut self.outcome,
                allocator: &mut self.allocator,
                names: &mut self.names,
                spawns: &mut spawns,
            };
            for index in 0..self.entities.len() {
                let (before, rest) = self.entities.split_at_mut(index);
                let Some((entity, after)) = rest.split_first_mut() else {
                    break;
                };
                let mut others = Others { before, after };
                update_entity(entity, &mut others, &mut ctx);
            }
        }

        let before_filter = self.entities.len();
        self.entities.retain(|entity| {
            if !entity.body.is_alive() {
                debug!(entity = %entity.name, id = entity.id.0, "entity_removed");
            }
            entity.body.is_alive()
        });
        let removed = before_filter - self.entities.len();

        self.pending_spawns.append(&mut spawns);
        let promoted = self.apply_pending();

        let report = TickReport {
            tick: self.tick,
            updated,
            removed,
            promoted,
            live: self.entities.len(),
            outcome: self.outcome,
        };
        trace!(
            tick = report.tick,
            live = report.live,
            removed,
            promoted,
            "tick_advanced"
        );
        Ok(report)
    }

    pub fn draw_all(&self, canvas: &mut dyn Canvas) {
        for entity in &self.entities {
            match render::render_state(entity, &self.config) {
                Ok(state) => canvas.draw(&state),
                Err(error) => {
                    tracing::warn!(entity = %entity.name, %error, "sprite_key_rejected");
                }
            }
        }
    }

    pub fn outcome(&self) -> LevelOutcome {
        self.outcome
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending_spawns.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    pub fn player_id(&self) -> Option<EntityId> {
        self.player_id
    }

    /// The live player, if it has been promoted and has not been removed.
    pub fn player(&self) -> Option<(&Entity, &Player)> {
        let id = self.player_id?;
        let entity = self.find_entity(id)?;
        entity.as_player().map(|player| (entity, player))
    }

    /// True while any house still holds its chest.
    pub fn has_unlooted_house(&self) -> bool {
        self.entities
            .iter()
            .chain(self.pending_spawns.iter())
            .filter_map(Entity::as_house)
            .any(House::has_chest)
    }
}

fn update_entity(entity: &mut Entity, others: &mut Others<'_>, ctx: &mut TickContext<'_, '_>) {
    match &entity.kind {
        EntityKind::Guard(_) => guard::pre_move(entity, others, ctx),
        EntityKind::Player(_) => player::pre_move(entity, others, ctx),
        EntityKind::Dagger(_) | EntityKind::House(_) | EntityKind::Chest => {}
    }

    entity.body.snapshot_and_integrate(ctx.dt);

    if entity.body.is_dying() {
        entity.body.advance_death(ctx.dt);
    } else {
        if matches!(entity.kind, EntityKind::Dagger(_)) {
            dagger::resolve_hits(entity, others, ctx);
        } else {
            collision::resolve(entity, others, ctx.dt);
        }
        collision::apply_screen_rules(&mut entity.body, &ctx.config.play_field);
        collision::track_stuck(&mut entity.body, ctx.dt, ctx.config.lifecycle.stuck_dist_sq);
    }

    match &mut entity.kind {
        EntityKind::Guard(guard) => {
            guard.vitals.decay_flash(ctx.dt);
            guard.refresh_vision(&entity.body, &ctx.config.guard);
        }
        EntityKind::Player(player) => player.vitals.decay_flash(ctx.dt),
        EntityKind::Dagger(_) | EntityKind::House(_) | EntityKind::Chest => {}
    }
}
