use tracing::debug;

use crate::config::SimConfig;
use crate::geometry::{sign, SubRect, Vec2, COS_45_DEG};
use crate::hooks::{EventOrigin, GameEvent};
use crate::input::InputAction;

use super::entity::{Body, DamageResult, Entity, EntityId, EntityKind, Vitals};
use super::house::House;
use super::{LevelOutcome, Others, TickContext};

#[derive(Debug, Clone)]
pub struct Player {
    pub(crate) vitals: Vitals,
    facing: Vec2,
    daggers: u32,
    firing: bool,
    loot_target: Option<EntityId>,
    ever_spotted: bool,
    move_speed: f32,
    pickpocket_reach: f32,
}

pub(crate) fn build(id: EntityId, position: Vec2, daggers: Option<u32>, config: &SimConfig) -> Entity {
    let tuning = &config.player;
    let sub_rect =
        SubRect::full(tuning.size).with_horizontal(tuning.sub_rect_left, tuning.sub_rect_right);
    let mut body = Body::new(position, tuning.size, sub_rect);
    body.clamp_to_screen = true;

    Entity {
        id,
        name: "Kane".to_owned(),
        body,
        kind: EntityKind::Player(Player {
            vitals: Vitals::new(tuning.hp),
            facing: Vec2::new(1.0, 0.0),
            daggers: daggers.unwrap_or(tuning.starting_daggers),
            firing: false,
            loot_target: None,
            ever_spotted: false,
            move_speed: tuning.move_speed,
            pickpocket_reach: tuning.pickpocket_reach,
        }),
    }
}

impl Player {
    pub fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    pub fn facing(&self) -> Vec2 {
        self.facing
    }

    pub fn daggers(&self) -> u32 {
        self.daggers
    }

    pub fn loot_target(&self) -> Option<EntityId> {
        self.loot_target
    }

    pub fn ever_spotted(&self) -> bool {
        self.ever_spotted
    }

    /// Returns true only on the first call.
    pub(crate) fn set_spotted(&mut self) -> bool {
        !std::mem::replace(&mut self.ever_spotted, true)
    }
}

pub(crate) fn pre_move(entity: &mut Entity, others: &mut Others<'_>, ctx: &mut TickContext<'_, '_>) {
    entity.body.velocity = Vec2::ZERO;
    if !entity.body.is_active() {
        return;
    }
    steer(entity, ctx);
    fire(entity, ctx);
    check_looting(entity, others, ctx);
}

fn steer(entity: &mut Entity, ctx: &TickContext<'_, '_>) {
    let Some((body, player)) = entity.as_player_mut() else {
        return;
    };
    let input = ctx.input;
    let speed = player.move_speed;
    let mut velocity = Vec2::ZERO;
    if input.is_down(InputAction::MoveLeft) {
        velocity.x -= speed;
    }
    if input.is_down(InputAction::MoveRight) {
        velocity.x += speed;
    }
    if input.is_down(InputAction::MoveUp) {
        velocity.y += speed;
    }
    if input.is_down(InputAction::MoveDown) {
        velocity.y -= speed;
    }
    if velocity.x != 0.0 && velocity.y != 0.0 {
        velocity = velocity.scale(COS_45_DEG);
    }
    if !velocity.is_zero() {
        player.facing = Vec2::new(sign(velocity.x), sign(velocity.y));
    }
    body.velocity = velocity;
}

/// One dagger per press; holding the key does not keep throwing.
fn fire(entity: &mut Entity, ctx: &mut TickContext<'_, '_>) {
    let id = entity.id;
    let center = entity.body.center();
    let half = entity.body.half_extents();
    let Some((_, player)) = entity.as_player_mut() else {
        return;
    };
    if !ctx.input.is_down(InputAction::Fire) {
        player.firing = false;
        return;
    }
    if player.firing || player.daggers == 0 {
        return;
    }

    player.firing = true;
    player.daggers -= 1;
    let facing = player.facing;
    let daggers = player.daggers;
    ctx.hooks.events.trigger(
        GameEvent::ThrewDagger,
        Some(EventOrigin {
            id,
            name: &entity.name,
            center,
        }),
    );
    ctx.hooks.scoreboard.daggers_changed(daggers);

    let dagger_half = ctx.config.dagger.size.scale(0.5);
    let dagger_center = center
        + Vec2::new(
            (half.x + dagger_half.x) * facing.x,
            (half.y + dagger_half.y) * facing.y,
        );
    ctx.stage_dagger(dagger_center - dagger_half, facing);
}

fn check_looting(entity: &mut Entity, others: &mut Others<'_>, ctx: &mut TickContext<'_, '_>) {
    let Entity {
        id,
        name,
        body,
        kind,
    } = entity;
    let id = *id;
    let name: &str = name;
    let rect = body.rect();
    let circle = body.circle();
    let EntityKind::Player(player) = kind else {
        return;
    };

    let mut target = None;
    if ctx.input.is_down(InputAction::Loot) {
        for other in others.iter_mut() {
            if !other.capabilities().lootable {
                continue;
            }
            let other_id = other.id;
            let other_circle = other.body.circle();
            let other_active = other.body.is_active();
            match &mut other.kind {
                EntityKind::House(house) => {
                    if rect.overlaps(&house.loot_zone()) {
                        target = Some(other_id);
                    }
                }
                EntityKind::Guard(guard) => {
                    if !other_active || guard.has_seen_player() {
                        continue;
                    }
                    let gap = circle.center.dist(other_circle.center)
                        - (circle.radius + other_circle.radius);
                    if gap <= player.pickpocket_reach {
                        let amount = guard.take_pocket_loot();
                        debug!(guard = %other.name, amount, "guard_pickpocketed");
                        ctx.hooks.events.trigger(
                            GameEvent::PickpocketedGuard,
                            Some(EventOrigin {
                                id,
                                name,
                                center: circle.center,
                            }),
                        );
                        ctx.hooks.scoreboard.add_loot(amount, Some(&other.name));
                        return;
                    }
                }
                EntityKind::Player(_) | EntityKind::Dagger(_) | EntityKind::Chest => {}
            }
        }
    }

    if target != player.loot_target {
        if let Some(previous) = player.loot_target.take() {
            if let Some(house) = others.find_mut(previous).and_then(Entity::as_house_mut) {
                house.stop_looting(ctx.hooks.scoreboard);
            }
        }
        player.loot_target = target;
        if let Some(next) = target {
            if let Some(house) = others.find_mut(next).and_then(Entity::as_house_mut) {
                house.start_looting(ctx.hooks.scoreboard);
            }
        }
        return;
    }

    let Some(target) = target else {
        return;
    };
    let Some(house) = others.find_mut(target).and_then(Entity::as_house_mut) else {
        return;
    };
    let Some(completion) = house.update_looting(ctx.dt, ctx.hooks.scoreboard) else {
        return;
    };
    player.loot_target = None;

    let fade = ctx.config.lifecycle.death_fade_seconds;
    if let Some(chest) = others.find_mut(completion.chest) {
        chest.body.start_dying(fade);
    }
    let won = !others
        .iter()
        .filter_map(Entity::as_house)
        .any(House::has_chest);
    debug!(house = target.0, amount = completion.amount, won, "house_looted");

    let origin = Some(EventOrigin {
        id,
        name,
        center: circle.center,
    });
    if won {
        ctx.hooks.events.trigger(GameEvent::WonLevel, origin);
        ctx.hooks.scoreboard.set_won_level();
        *ctx.outcome = LevelOutcome::Won;
    } else {
        ctx.hooks.events.trigger(GameEvent::LootedChest, origin);
    }
}

/// Damages the player and, on death, abandons any loot in progress.
pub(crate) fn damage_player(
    others: &mut Others<'_>,
    player_id: EntityId,
    amount: i32,
    ctx: &mut TickContext<'_, '_>,
) -> DamageResult {
    let Some(entity) = others.find_mut(player_id) else {
        return DamageResult::Ignored;
    };
    let center = entity.body.center();
    let name = entity.name.clone();
    let Some((body, player)) = entity.as_player_mut() else {
        return DamageResult::Ignored;
    };
    let lifecycle = ctx.config.lifecycle;
    let result = player.vitals.apply_damage(
        body,
        amount,
        lifecycle.death_fade_seconds,
        lifecycle.damage_flash_seconds,
    );
    if result == DamageResult::Ignored {
        return result;
    }
    ctx.hooks
        .scoreboard
        .update_health(player.vitals.hp(), player.vitals.max_hp());
    if result != DamageResult::Killed {
        return result;
    }

    let abandoned = player.loot_target.take();
    if let Some(house) = abandoned.and_then(|id| others.find_mut(id)).and_then(Entity::as_house_mut) {
        house.stop_looting(ctx.hooks.scoreboard);
    }
    debug!("player_died");
    ctx.hooks.scoreboard.report_death();
    ctx.hooks.events.trigger(
        GameEvent::PlayerDeath,
        Some(EventOrigin {
            id: player_id,
            name: &name,
            center,
        }),
    );
    ctx.hooks.events.forget_entity(player_id);
    *ctx.outcome = LevelOutcome::PlayerDied;
    result
}
