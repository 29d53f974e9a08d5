use tracing::debug;

use crate::config::GuardTuning;
use crate::geometry::{normalized_dot, segment_intersects_rect, Circle, Rect, Vec2};
use crate::hooks::{EventOrigin, GameEvent};

use super::entity::EntityId;
use super::{Others, TickContext};

/// Line-of-sight test from a guard to the player.
///
/// The player must be within `view_distance` (edge to edge), inside the facing cone,
/// and no occluder rect may cross the segment joining the two centers. Inside
/// `close_range_distance` the cone widens to `close_range_min_cos`. Coincident centers
/// have no direction and are never perceived.
pub fn can_see(
    guard: Circle,
    facing: Vec2,
    close_range_min_cos: f32,
    tuning: &GuardTuning,
    player: Circle,
    mut occluders: impl Iterator<Item = Rect>,
) -> bool {
    let separation = guard.separation(&player);
    if separation >= tuning.view_distance {
        return false;
    }

    let Some(cos) = normalized_dot(player.center - guard.center, facing) else {
        return false;
    };
    let min_cos = if separation < tuning.close_range_distance {
        close_range_min_cos
    } else {
        tuning.far_min_cos
    };
    if cos < min_cos {
        return false;
    }

    !occluders.any(|rect| segment_intersects_rect(player.center, guard.center, &rect))
}

/// Sets the player's one-shot "spotted" flag, firing the event the first time.
pub(crate) fn mark_player_spotted(others: &mut Others<'_>, ctx: &mut TickContext<'_, '_>) {
    let Some(player_id) = ctx.player_id else {
        return;
    };
    let Some(entity) = others.find_mut(player_id) else {
        return;
    };
    let center = entity.body.center();
    let Some((_, player)) = entity.as_player_mut() else {
        return;
    };
    if player.set_spotted() {
        debug!("player_spotted");
        ctx.hooks.events.trigger(
            GameEvent::PlayerSpotted,
            Some(EventOrigin {
                id: player_id,
                name: &entity.name,
                center,
            }),
        );
    }
}

/// Sends every guard other than `source` whose center is strictly within the alert
/// radius of `center` to investigate it.
pub(crate) fn alert_guards_in_range(
    others: &mut Others<'_>,
    source: EntityId,
    center: Vec2,
    ctx: &TickContext<'_, '_>,
) -> usize {
    let radius = ctx.config.guard.alert_radius;
    let mut alerted = 0;
    for other in others.iter_mut() {
        if other.id == source {
            continue;
        }
        let distance = other.body.center().dist(center);
        let Some((_, guard)) = other.as_guard_mut() else {
            continue;
        };
        if distance < radius && guard.alert_to(center) {
            alerted += 1;
        }
    }
    if alerted > 0 {
        debug!(source = source.0, alerted, "guards_alerted");
    }
    alerted
}
