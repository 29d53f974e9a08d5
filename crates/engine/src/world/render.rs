use crate::config::SimConfig;
use crate::geometry::Vec2;
use crate::sprite_keys::{SpriteKey, SpriteKeyError};

use super::entity::{Entity, EntityId, EntityKind};
use super::guard::GuardState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tint {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Tint {
    pub const WHITE: Tint = Tint::rgb(255, 255, 255);
    pub const DYING: Tint = Tint::rgb(255, 64, 64);
    pub const CHASE: Tint = Tint::rgb(255, 96, 96);
    pub const ALERT: Tint = Tint::rgb(255, 255, 96);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Red flash that fades back to white as `remaining` goes to zero.
    fn damage_flash(remaining: f32, duration: f32) -> Self {
        let fraction = (remaining / duration).clamp(0.0, 1.0);
        let channel = (255.0 - 192.0 * fraction).round() as u8;
        Self::rgb(255, channel, channel)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisionConeState {
    pub center: Vec2,
    pub rotation: f32,
    pub tint: Tint,
    pub opacity: f32,
}

/// What a drawing collaborator needs to present one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    pub id: EntityId,
    pub sprite: SpriteKey,
    pub center: Vec2,
    pub size: Vec2,
    pub rotation: f32,
    pub opacity: f32,
    pub tint: Tint,
    pub vision: Option<VisionConeState>,
}

pub trait Canvas {
    fn draw(&mut self, state: &RenderState);
}

pub(crate) fn render_state(entity: &Entity, config: &SimConfig) -> Result<RenderState, SpriteKeyError> {
    let lifecycle = &config.lifecycle;
    let body = &entity.body;
    let opacity = body.opacity(lifecycle.death_fade_seconds);

    let key = match &entity.kind {
        EntityKind::Player(_) => "thief".to_owned(),
        EntityKind::Guard(guard) => format!("guards/{}", guard.kind.sprite_key()),
        EntityKind::Dagger(_) => "dagger".to_owned(),
        EntityKind::House(house) => format!("houses/house{}-{}", house.style(), house.size().class()),
        EntityKind::Chest => "chest".to_owned(),
    };

    let tint = match entity.vitals() {
        Some(_) if body.is_dying() => Tint::DYING,
        Some(vitals) if vitals.damage_timer() > 0.0 => {
            Tint::damage_flash(vitals.damage_timer(), lifecycle.damage_flash_seconds)
        }
        _ => Tint::WHITE,
    };

    let vision = entity.as_guard().map(|guard| {
        let cone = guard.vision();
        VisionConeState {
            center: cone.center,
            rotation: cone.rotation,
            tint: match guard.state() {
                GuardState::Patrol => Tint::WHITE,
                GuardState::Chase => Tint::CHASE,
                GuardState::Alert => Tint::ALERT,
            },
            opacity,
        }
    });

    Ok(RenderState {
        id: entity.id,
        sprite: SpriteKey::new(key)?,
        center: body.center(),
        size: body.size(),
        rotation: body.rotation,
        opacity,
        tint,
        vision,
    })
}
