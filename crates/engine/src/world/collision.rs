use crate::config::PlayField;

use super::entity::{Body, CollisionShape, Entity};
use super::Others;

/// Resolves overlaps for a body that moved this tick. Living pairs roll the mover back
/// to its snapshot; every other pair clamps the axis the mover was travelling along.
pub(crate) fn resolve(entity: &mut Entity, others: &Others<'_>, dt: f32) {
    if entity.body.velocity.is_zero() {
        return;
    }

    let capabilities = entity.capabilities();
    let mut circle_hit = false;
    let mut rect_hit = false;
    for other in others.iter() {
        match CollisionShape::between(capabilities, other.capabilities()) {
            CollisionShape::Circle => {
                if entity.body.circle().overlaps(&other.body.circle()) {
                    entity.body.rollback();
                    circle_hit = true;
                }
            }
            CollisionShape::Rect => {
                if entity.body.rect().overlaps(&other.body.rect()) {
                    clamp_against(&mut entity.body, other);
                    rect_hit = true;
                }
            }
        }
    }

    let body = &mut entity.body;
    body.circle_collision_seconds = if circle_hit {
        body.circle_collision_seconds + dt
    } else {
        0.0
    };
    body.rect_collision_seconds = if rect_hit {
        body.rect_collision_seconds + dt
    } else {
        0.0
    };
}

/// Only clamps an axis whose leading edge had not yet crossed the obstacle at the start
/// of the tick, so bodies that began the tick overlapping are left alone.
fn clamp_against(body: &mut Body, obstacle: &Entity) {
    let previous = body.prev_rect();
    let wall = obstacle.body.rect();
    let velocity = body.velocity;

    if velocity.x > 0.0 && previous.right <= wall.left {
        body.limit_right(wall.left);
    } else if velocity.x < 0.0 && previous.left >= wall.right {
        body.limit_left(wall.right);
    }

    if velocity.y > 0.0 && previous.top <= wall.bottom {
        body.limit_top(wall.bottom);
    } else if velocity.y < 0.0 && previous.bottom >= wall.top {
        body.limit_bottom(wall.top);
    }
}

pub(crate) fn apply_screen_rules(body: &mut Body, field: &PlayField) {
    if body.die_off_screen && !field.contains(body.position()) {
        body.kill();
    }
    if body.clamp_to_screen {
        body.clamp_to(field);
    }
}

pub(crate) fn track_stuck(body: &mut Body, dt: f32, threshold_sq: f32) {
    if body.velocity.is_zero() {
        body.stuck_seconds = 0.0;
        return;
    }
    if body.position().dist_sq(body.prev_position()) < threshold_sq {
        body.stuck_seconds += dt;
    } else {
        body.stuck_seconds = 0.0;
    }
}
