use tracing::debug;

use crate::config::DaggerTuning;
use crate::geometry::{rotation_from_direction, sign, SubRect, Vec2, COS_45_DEG};
use crate::hooks::{EventOrigin, GameEvent};

use super::entity::{Entity, EntityId, EntityKind};
use super::{guard, perception, Body, Others, TickContext};

#[derive(Debug, Clone)]
pub struct Dagger {
    direction: Vec2,
}

impl Dagger {
    /// One of the eight compass directions, components in {-1, 0, 1}.
    pub fn direction(&self) -> Vec2 {
        self.direction
    }
}

pub(crate) fn build(
    id: EntityId,
    index: u32,
    position: Vec2,
    direction: Vec2,
    tuning: &DaggerTuning,
) -> Entity {
    let direction = Vec2::new(sign(direction.x), sign(direction.y));
    let mut body = Body::new(position, tuning.size, SubRect::full(tuning.size));
    body.die_off_screen = true;
    body.velocity = direction.scale(tuning.speed);
    if direction.x != 0.0 && direction.y != 0.0 {
        body.velocity = body.velocity.scale(COS_45_DEG);
    }
    if let Some(rotation) = rotation_from_direction(direction) {
        body.rotation = rotation;
    }

    Entity {
        id,
        name: format!("dagger {index}"),
        body,
        kind: EntityKind::Dagger(Dagger { direction }),
    }
}

enum Hit {
    Guard(EntityId),
    House,
}

/// Daggers stop at the first guard or house they overlap and pass through everything
/// else. Unlike other entities they check even when not moving.
pub(crate) fn resolve_hits(entity: &mut Entity, others: &mut Others<'_>, ctx: &mut TickContext<'_, '_>) {
    let rect = entity.body.rect();
    let hit = others.iter().find_map(|other| {
        if !rect.overlaps(&other.body.rect()) {
            return None;
        }
        match other.kind {
            EntityKind::Guard(_) => Some(Hit::Guard(other.id)),
            EntityKind::House(_) => Some(Hit::House),
            _ => None,
        }
    });
    let Some(hit) = hit else {
        return;
    };

    let fade = ctx.config.lifecycle.death_fade_seconds;
    entity.body.start_dying(fade);
    match hit {
        Hit::Guard(target) => {
            debug!(dagger = %entity.name, target = target.0, "dagger_hit_guard");
            guard::damage_guard(others, target, ctx.config.dagger.damage, ctx);
        }
        Hit::House => {
            let center = entity.body.center();
            debug!(dagger = %entity.name, "dagger_hit_house");
            ctx.hooks.events.trigger(
                GameEvent::DaggerHitHouse,
                Some(EventOrigin {
                    id: entity.id,
                    name: &entity.name,
                    center,
                }),
            );
            perception::alert_guards_in_range(others, entity.id, center, ctx);
        }
    }
}
