//! Guard decision engine: Patrol, Chase and Alert states, waypoint traversal and
//! stuck-breaking steering.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{GuardTuning, GuardVariantTuning, SimConfig};
use crate::geometry::{rotation_from_direction, sign, SubRect, Vec2, COS_45_DEG};
use crate::hooks::{EventOrigin, GameEvent};
use crate::random::RandomSource;

use super::entity::{Body, DamageResult, Entity, EntityId, EntityKind, Vitals};
use super::perception;
use super::player;
use super::{Others, TickContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardKind {
    Human,
    Dog,
}

impl GuardKind {
    pub fn event_prefix(self) -> &'static str {
        match self {
            Self::Human => "guard",
            Self::Dog => "dog",
        }
    }

    pub fn display_name(self, name: &str) -> String {
        match self {
            Self::Human => format!("{name} the Guard"),
            Self::Dog => format!("{name} the dog"),
        }
    }

    pub fn sprite_key(self) -> &'static str {
        match self {
            Self::Human => "guard",
            Self::Dog => "dog",
        }
    }

    fn tuning(self, guard: &GuardTuning) -> &GuardVariantTuning {
        match self {
            Self::Human => &guard.human,
            Self::Dog => &guard.dog,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GuardState {
    #[default]
    Patrol,
    Chase,
    Alert,
}

/// Patrol route as validated by the level loader. Waypoints are positions in the same
/// convention as the spawn point, which is always the implicit first waypoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatrolConfig {
    pub waypoints: Vec<Vec2>,
    pub initial_facing: Option<Vec2>,
    pub looping: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Decision {
    direction: Vec2,
    diagonal: bool,
}

impl Default for Decision {
    fn default() -> Self {
        Self {
            direction: Vec2::ZERO,
            diagonal: false,
        }
    }
}

/// Where the vision cone sprite sits in front of the guard.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VisionCone {
    pub center: Vec2,
    pub rotation: f32,
}

#[derive(Debug, Clone)]
pub struct Guard {
    pub kind: GuardKind,
    pub(crate) vitals: Vitals,
    state: GuardState,
    seen_player: bool,
    facing: Vec2,
    waypoints: Vec<Vec2>,
    next_waypoint: usize,
    waypoint_step: isize,
    looping: bool,
    alert_target: Option<Vec2>,
    alert_timer: Option<f32>,
    decision_timer: f32,
    decision: Decision,
    attack_cooldown: Option<f32>,
    pocket_loot: u32,
    close_range_min_cos: f32,
    vision: VisionCone,
}

pub(crate) fn build(
    id: EntityId,
    kind: GuardKind,
    name: &str,
    position: Vec2,
    patrol: PatrolConfig,
    config: &SimConfig,
    rng: &mut dyn RandomSource,
) -> Entity {
    let tuning = &config.guard;
    let variant = kind.tuning(tuning);
    let sub_rect =
        SubRect::full(tuning.size).with_horizontal(variant.sub_rect_left, variant.sub_rect_right);
    let mut body = Body::new(position, tuning.size, sub_rect);
    body.clamp_to_screen = true;

    let half = body.half_extents();
    let waypoints = std::iter::once(position)
        .chain(patrol.waypoints)
        .map(|point| point + half)
        .collect();
    let facing = patrol
        .initial_facing
        .map(|dir| Vec2::new(sign(dir.x), sign(dir.y)))
        .filter(|dir| !dir.is_zero())
        .unwrap_or(Vec2::new(1.0, 0.0));

    let mut guard = Guard {
        kind,
        vitals: Vitals::new(tuning.hp),
        state: GuardState::Patrol,
        seen_player: false,
        facing,
        waypoints,
        next_waypoint: 1,
        waypoint_step: 1,
        looping: patrol.looping,
        alert_target: None,
        alert_timer: None,
        decision_timer: 0.0,
        decision: Decision::default(),
        attack_cooldown: None,
        pocket_loot: rng.range_inclusive(variant.pocket_loot_min, variant.pocket_loot_max),
        close_range_min_cos: variant.close_range_min_cos,
        vision: VisionCone::default(),
    };
    guard.refresh_vision(&body, tuning);

    Entity {
        id,
        name: kind.display_name(name),
        body,
        kind: EntityKind::Guard(guard),
    }
}

impl Guard {
    pub fn state(&self) -> GuardState {
        self.state
    }

    pub fn has_seen_player(&self) -> bool {
        self.seen_player
    }

    pub fn facing(&self) -> Vec2 {
        self.facing
    }

    pub fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    /// Waypoint centers, starting with the spawn point.
    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    pub fn next_waypoint(&self) -> usize {
        self.next_waypoint
    }

    pub fn alert_target(&self) -> Option<Vec2> {
        self.alert_target
    }

    pub fn attack_cooldown(&self) -> Option<f32> {
        self.attack_cooldown
    }

    pub fn pocket_loot(&self) -> u32 {
        self.pocket_loot
    }

    pub fn close_range_min_cos(&self) -> f32 {
        self.close_range_min_cos
    }

    pub fn vision(&self) -> VisionCone {
        self.vision
    }

    pub(crate) fn take_pocket_loot(&mut self) -> u32 {
        std::mem::take(&mut self.pocket_loot)
    }

    pub(crate) fn set_state(&mut self, state: GuardState) {
        if state == self.state {
            return;
        }
        debug!(from = ?self.state, to = ?state, "guard_state_changed");
        self.state = state;
        self.alert_timer = None;
        if state == GuardState::Chase {
            self.alert_target = None;
        }
    }

    /// Switches to permanent pursuit.
    pub(crate) fn spot_player(&mut self) {
        self.seen_player = true;
        self.set_state(GuardState::Chase);
    }

    /// Sends the guard to investigate `target`. Ignored once the guard has seen the
    /// player.
    pub(crate) fn alert_to(&mut self, target: Vec2) -> bool {
        if self.seen_player {
            return false;
        }
        self.alert_target = Some(target);
        self.set_state(GuardState::Alert);
        true
    }

    pub(crate) fn refresh_vision(&mut self, body: &Body, tuning: &GuardTuning) {
        let mut offset = body.half_extents().x + tuning.vision_cone_half_width;
        if self.facing.x != 0.0 && self.facing.y != 0.0 {
            offset *= COS_45_DEG;
        }
        if let Some(rotation) = rotation_from_direction(self.facing) {
            self.vision.rotation = rotation;
        }
        self.vision.center = body.center() + self.facing.scale(offset);
    }

    fn tick_attack_cooldown(&mut self, dt: f32) {
        if let Some(remaining) = self.attack_cooldown {
            let remaining = remaining - dt;
            self.attack_cooldown = (remaining > 0.0).then_some(remaining);
        }
    }

    /// Picks the steering direction toward an objective `offset` away. While the
    /// decision timer runs the cached choice is reused; a stuck guard perturbs it.
    fn choose_direction(
        &mut self,
        offset: Vec2,
        stuck: bool,
        interval: f32,
        rng: &mut dyn RandomSource,
    ) -> Decision {
        let abs_x = offset.x.abs();
        let abs_y = offset.y.abs();
        let both_axes = abs_x > 0.0 && abs_y > 0.0;

        let mut diagonal = false;
        if both_axes {
            let ratio = if abs_x > abs_y {
                abs_x / abs_y
            } else {
                abs_y / abs_x
            };
            diagonal = ratio < 1.1;
        }
        let mut direction = Vec2::new(
            if offset.x < 0.0 { -1.0 } else { 1.0 },
            if offset.y < 0.0 { -1.0 } else { 1.0 },
        );

        if self.decision_timer > 0.0 {
            return self.decision;
        }

        if stuck {
            self.decision_timer = interval;
            if both_axes && diagonal == self.decision.diagonal {
                diagonal = !diagonal;
                if !diagonal {
                    zero_minor_axis(&mut direction, abs_x, abs_y);
                }
            } else if both_axes {
                // Head along the shorter offset, occasionally the other way round.
                if abs_x > abs_y {
                    direction.x = 0.0;
                    if rng.one_in(4) {
                        direction.y = -direction.y;
                    }
                } else {
                    direction.y = 0.0;
                    if rng.one_in(4) {
                        direction.x = -direction.x;
                    }
                }
                tracing::trace!(dx = direction.x, dy = direction.y, "guard_unstick");
            } else {
                zero_minor_axis(&mut direction, abs_x, abs_y);
            }
        } else if !diagonal {
            zero_minor_axis(&mut direction, abs_x, abs_y);
        }

        self.decision = Decision {
            direction,
            diagonal,
        };
        self.decision
    }

    fn advance_waypoint(&mut self) {
        let count = self.waypoints.len() as isize;
        let mut next = self.next_waypoint as isize + self.waypoint_step;
        let mut finished = false;
        if next < 0 {
            next = if self.looping { count - 1 } else { 1 };
            finished = true;
        } else if next >= count {
            next = if self.looping { 0 } else { count - 2 };
            finished = true;
        }
        if finished && !self.looping {
            self.waypoint_step = -self.waypoint_step;
        }
        // A single-point route has nowhere to go.
        self.next_waypoint = usize::try_from(next)
            .ok()
            .filter(|index| *index < self.waypoints.len())
            .unwrap_or(self.waypoints.len());
    }
}

fn zero_minor_axis(direction: &mut Vec2, abs_x: f32, abs_y: f32) {
    if abs_x > abs_y {
        direction.y = 0.0;
    } else {
        direction.x = 0.0;
    }
}

enum Objective {
    Player { target: Vec2, reach: f32 },
    Alert { target: Vec2, reach: f32 },
    Waypoint { target: Vec2, reach: f32 },
}

impl Objective {
    fn target_and_reach(&self) -> (Vec2, f32) {
        match *self {
            Self::Player { target, reach }
            | Self::Alert { target, reach }
            | Self::Waypoint { target, reach } => (target, reach),
        }
    }
}

pub(crate) fn pre_move(entity: &mut Entity, others: &mut Others<'_>, ctx: &mut TickContext<'_, '_>) {
    let Entity { id, name, body, kind } = entity;
    let EntityKind::Guard(guard) = kind else {
        return;
    };
    if body.is_active() {
        think(*id, name, body, guard, others, ctx);
    }
    guard.tick_attack_cooldown(ctx.dt);
}

fn think(
    id: EntityId,
    name: &str,
    body: &mut Body,
    guard: &mut Guard,
    others: &mut Others<'_>,
    ctx: &mut TickContext<'_, '_>,
) {
    body.velocity = Vec2::ZERO;

    let Some(player_id) = ctx.player_id else {
        return;
    };
    let Some(player) = others.find(player_id) else {
        return;
    };
    if !player.body.is_active() {
        return;
    }
    let player_circle = player.body.circle();
    let config = ctx.config;
    let tuning = &config.guard;

    if !guard.seen_player {
        let occluders = others
            .iter()
            .filter(|other| other.capabilities().occludes)
            .map(|other| other.body.rect());
        let seen = perception::can_see(
            body.circle(),
            guard.facing,
            guard.close_range_min_cos,
            tuning,
            player_circle,
            occluders,
        );
        if seen {
            debug!(guard = name, "guard_saw_player");
            ctx.hooks.events.trigger(
                GameEvent::GuardSawPlayer(guard.kind),
                Some(EventOrigin {
                    id,
                    name,
                    center: body.center(),
                }),
            );
            guard.spot_player();
            perception::mark_player_spotted(others, ctx);
            perception::alert_guards_in_range(others, id, body.center(), ctx);
        }
    }

    let center = body.center();
    let objective = if guard.seen_player {
        Some(Objective::Player {
            target: player_circle.center,
            reach: body.circle().radius + player_circle.radius + tuning.attack_reach_margin,
        })
    } else if let Some(target) = guard.alert_target {
        Some(Objective::Alert {
            target,
            reach: tuning.alert_capture_range,
        })
    } else {
        guard
            .waypoints
            .get(guard.next_waypoint)
            .map(|target| Objective::Waypoint {
                target: *target,
                reach: tuning.patrol_capture_range,
            })
    };
    let speed = if guard.seen_player {
        tuning.chase_speed
    } else {
        tuning.patrol_speed
    };

    if guard.decision_timer > 0.0 {
        guard.decision_timer -= ctx.dt;
    }

    let Some(objective) = objective else {
        return;
    };
    let (target, reach) = objective.target_and_reach();
    let offset = target - center;
    let stuck = body.stuck_seconds() > 0.0;
    let decision =
        guard.choose_direction(offset, stuck, tuning.decision_interval_seconds, &mut *ctx.rng);

    let speed = if decision.diagonal {
        speed * COS_45_DEG
    } else {
        speed
    };
    body.velocity = decision.direction.scale(speed);

    if offset.length_sq() < reach * reach {
        match objective {
            Objective::Player { .. } => {
                if guard.attack_cooldown.is_none() {
                    debug!(guard = name, "guard_attacked_player");
                    ctx.hooks.events.trigger(
                        GameEvent::GuardHitPlayer(guard.kind),
                        Some(EventOrigin { id, name, center }),
                    );
                    player::damage_player(others, player_id, tuning.attack_damage, ctx);
                    guard.attack_cooldown = Some(tuning.attack_cooldown_seconds);
                }
            }
            Objective::Alert { .. } => match guard.alert_timer {
                None => guard.alert_timer = Some(tuning.alert_pause_seconds),
                Some(remaining) => {
                    let remaining = remaining - ctx.dt;
                    if remaining <= 0.0 {
                        debug!(guard = name, "guard_alert_cleared");
                        guard.alert_target = None;
                        guard.set_state(GuardState::Patrol);
                    } else {
                        guard.alert_timer = Some(remaining);
                    }
                }
            },
            Objective::Waypoint { .. } => guard.advance_waypoint(),
        }
    }

    if !body.velocity.is_zero() {
        guard.facing = Vec2::new(sign(body.velocity.x), sign(body.velocity.y));
    }
}

/// Damages the guard `target_id` and runs the follow-ups: a surviving guard spots the
/// player, a dying one is reported as a kill, and either way nearby guards are alerted.
pub(crate) fn damage_guard(
    others: &mut Others<'_>,
    target_id: EntityId,
    amount: i32,
    ctx: &mut TickContext<'_, '_>,
) -> DamageResult {
    let Some(target) = others.find_mut(target_id) else {
        return DamageResult::Ignored;
    };
    let center = target.body.center();
    let name = target.name.clone();
    let Some((body, guard)) = target.as_guard_mut() else {
        return DamageResult::Ignored;
    };
    let lifecycle = ctx.config.lifecycle;
    let result = guard.vitals.apply_damage(
        body,
        amount,
        lifecycle.death_fade_seconds,
        lifecycle.damage_flash_seconds,
    );
    let kind = guard.kind;
    let origin = Some(EventOrigin {
        id: target_id,
        name: &name,
        center,
    });

    match result {
        DamageResult::Ignored => return result,
        DamageResult::Hurt => {
            debug!(guard = %name, hp = guard.vitals.hp(), "guard_hurt");
            guard.spot_player();
            ctx.hooks.events.trigger(GameEvent::GuardHit(kind), origin);
            perception::mark_player_spotted(others, ctx);
        }
        DamageResult::Killed => {
            debug!(guard = %name, "guard_killed");
            ctx.hooks.events.trigger(GameEvent::GuardDeath(kind), origin);
            ctx.hooks.events.forget_entity(target_id);
            ctx.hooks.scoreboard.add_kill(&name);
        }
    }
    perception::alert_guards_in_range(others, target_id, center, ctx);
    result
}
