use crate::config::PlayField;
use crate::geometry::{Circle, Rect, SubRect, Vec2};

use super::dagger::Dagger;
use super::guard::{Guard, GuardKind};
use super::house::House;
use super::player::Player;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Position, motion and lifecycle state shared by every entity.
///
/// `rect` and `circle` are derived from `position` and `sub_rect`; every setter that
/// moves the body recomputes them.
#[derive(Debug, Clone)]
pub struct Body {
    position: Vec2,
    pub velocity: Vec2,
    pub rotation: f32,
    size: Vec2,
    sub_rect: SubRect,
    rect: Rect,
    circle: Circle,
    prev_position: Vec2,
    prev_rect: Rect,
    prev_circle: Circle,
    alive: bool,
    dying: bool,
    death_timer: f32,
    pub die_off_screen: bool,
    pub clamp_to_screen: bool,
    pub(crate) circle_collision_seconds: f32,
    pub(crate) rect_collision_seconds: f32,
    pub(crate) stuck_seconds: f32,
}

impl Body {
    pub fn new(position: Vec2, size: Vec2, sub_rect: SubRect) -> Self {
        let mut body = Self {
            position,
            velocity: Vec2::ZERO,
            rotation: 0.0,
            size,
            sub_rect,
            rect: Rect::default(),
            circle: Circle::default(),
            prev_position: position,
            prev_rect: Rect::default(),
            prev_circle: Circle::default(),
            alive: true,
            dying: false,
            death_timer: 0.0,
            die_off_screen: false,
            clamp_to_screen: false,
            circle_collision_seconds: 0.0,
            rect_collision_seconds: 0.0,
            stuck_seconds: 0.0,
        };
        body.update_bounds();
        body.prev_rect = body.rect;
        body.prev_circle = body.circle;
        body
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.update_bounds();
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn half_extents(&self) -> Vec2 {
        self.size.scale(0.5)
    }

    pub fn center(&self) -> Vec2 {
        self.circle.center
    }

    pub fn sub_rect(&self) -> SubRect {
        self.sub_rect
    }

    pub fn set_sub_rect(&mut self, sub_rect: SubRect) {
        self.sub_rect = sub_rect;
        self.update_bounds();
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn circle(&self) -> Circle {
        self.circle
    }

    pub fn prev_position(&self) -> Vec2 {
        self.prev_position
    }

    pub fn prev_rect(&self) -> Rect {
        self.prev_rect
    }

    pub fn prev_circle(&self) -> Circle {
        self.prev_circle
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn is_dying(&self) -> bool {
        self.dying
    }

    /// Alive and not fading out.
    pub fn is_active(&self) -> bool {
        self.alive && !self.dying
    }

    pub fn stuck_seconds(&self) -> f32 {
        self.stuck_seconds
    }

    pub fn circle_collision_seconds(&self) -> f32 {
        self.circle_collision_seconds
    }

    pub fn rect_collision_seconds(&self) -> f32 {
        self.rect_collision_seconds
    }

    fn update_bounds(&mut self) {
        let sub = self.sub_rect;
        self.rect = Rect::new(
            self.position.x + sub.left,
            self.position.y + sub.bottom,
            self.position.x + sub.right,
            self.position.y + sub.top,
        );
        self.circle = Circle {
            center: self.position + self.half_extents(),
            radius: sub.radius(),
        };
    }

    pub(crate) fn snapshot_and_integrate(&mut self, dt: f32) {
        self.prev_position = self.position;
        self.prev_rect = self.rect;
        self.prev_circle = self.circle;
        self.position += self.velocity.scale(dt);
        self.update_bounds();
    }

    pub(crate) fn rollback(&mut self) {
        self.position = self.prev_position;
        self.update_bounds();
    }

    pub(crate) fn limit_right(&mut self, limit: f32) {
        let overlap = self.rect.right - limit;
        if overlap > 0.0 {
            self.position.x -= overlap;
            self.update_bounds();
        }
    }

    pub(crate) fn limit_left(&mut self, limit: f32) {
        let overlap = limit - self.rect.left;
        if overlap > 0.0 {
            self.position.x += overlap;
            self.update_bounds();
        }
    }

    pub(crate) fn limit_top(&mut self, limit: f32) {
        let overlap = self.rect.top - limit;
        if overlap > 0.0 {
            self.position.y -= overlap;
            self.update_bounds();
        }
    }

    pub(crate) fn limit_bottom(&mut self, limit: f32) {
        let overlap = limit - self.rect.bottom;
        if overlap > 0.0 {
            self.position.y += overlap;
            self.update_bounds();
        }
    }

    pub(crate) fn clamp_to(&mut self, field: &PlayField) {
        self.limit_right(field.width);
        self.limit_left(0.0);
        self.limit_top(field.height);
        self.limit_bottom(field.min_y);
    }

    /// Starts the fade-out. Returns false if the body was already dying.
    pub(crate) fn start_dying(&mut self, fade_seconds: f32) -> bool {
        if self.dying {
            return false;
        }
        self.dying = true;
        self.death_timer = fade_seconds;
        self.velocity = Vec2::ZERO;
        true
    }

    pub(crate) fn advance_death(&mut self, dt: f32) {
        self.death_timer -= dt;
        if self.death_timer <= 0.0 {
            self.alive = false;
        }
    }

    pub(crate) fn kill(&mut self) {
        self.alive = false;
    }

    /// Opacity in `[0, 1]`; fades linearly while dying.
    pub fn opacity(&self, fade_seconds: f32) -> f32 {
        if !self.dying {
            return 1.0;
        }
        (self.death_timer / fade_seconds).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageResult {
    /// Already dying; the hit changed nothing.
    Ignored,
    Hurt,
    Killed,
}

/// Hit points and the damage flash of a living entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Vitals {
    hp: i32,
    max_hp: i32,
    damage_timer: f32,
}

impl Vitals {
    pub fn new(max_hp: i32) -> Self {
        let max_hp = max_hp.max(1);
        Self {
            hp: max_hp,
            max_hp,
            damage_timer: 0.0,
        }
    }

    pub fn hp(&self) -> i32 {
        self.hp
    }

    pub fn max_hp(&self) -> i32 {
        self.max_hp
    }

    pub fn damage_timer(&self) -> f32 {
        self.damage_timer
    }

    /// Reaching zero hp starts the body's fade-out on the spot.
    pub(crate) fn apply_damage(
        &mut self,
        body: &mut Body,
        amount: i32,
        fade_seconds: f32,
        flash_seconds: f32,
    ) -> DamageResult {
        if body.is_dying() || !body.is_alive() {
            return DamageResult::Ignored;
        }
        self.hp -= amount;
        if self.hp <= 0 {
            body.start_dying(fade_seconds);
            self.damage_timer = 0.0;
            DamageResult::Killed
        } else {
            self.damage_timer = flash_seconds;
            DamageResult::Hurt
        }
    }

    pub(crate) fn decay_flash(&mut self, dt: f32) {
        if self.damage_timer > 0.0 {
            self.damage_timer = (self.damage_timer - dt).max(0.0);
        }
    }
}

#[derive(Debug, Clone)]
pub enum EntityKind {
    Player(Player),
    Guard(Guard),
    Dagger(Dagger),
    House(House),
    Chest,
}

/// What an entity can do, independent of its concrete kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub living: bool,
    pub perceives: bool,
    /// Holds something the player could steal right now.
    pub lootable: bool,
    pub occludes: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionShape {
    Circle,
    Rect,
}

impl CollisionShape {
    /// Two living entities block each other as circles; any other pair uses rects.
    pub fn between(a: Capabilities, b: Capabilities) -> Self {
        if a.living && b.living {
            Self::Circle
        } else {
            Self::Rect
        }
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub body: Body,
    pub kind: EntityKind,
}

impl Entity {
    pub fn capabilities(&self) -> Capabilities {
        match &self.kind {
            EntityKind::Player(_) => Capabilities {
                living: true,
                ..Capabilities::default()
            },
            EntityKind::Guard(guard) => Capabilities {
                living: true,
                perceives: true,
                lootable: guard.kind == GuardKind::Human && guard.pocket_loot() > 0,
                ..Capabilities::default()
            },
            EntityKind::House(house) => Capabilities {
                lootable: house.has_chest(),
                occludes: true,
                ..Capabilities::default()
            },
            EntityKind::Dagger(_) | EntityKind::Chest => Capabilities::default(),
        }
    }

    pub fn vitals(&self) -> Option<&Vitals> {
        match &self.kind {
            EntityKind::Player(player) => Some(&player.vitals),
            EntityKind::Guard(guard) => Some(&guard.vitals),
            _ => None,
        }
    }

    pub fn as_player(&self) -> Option<&Player> {
        match &self.kind {
            EntityKind::Player(player) => Some(player),
            _ => None,
        }
    }

    pub fn as_guard(&self) -> Option<&Guard> {
        match &self.kind {
            EntityKind::Guard(guard) => Some(guard),
            _ => None,
        }
    }

    pub fn as_house(&self) -> Option<&House> {
        match &self.kind {
            EntityKind::House(house) => Some(house),
            _ => None,
        }
    }

    pub fn as_dagger(&self) -> Option<&Dagger> {
        match &self.kind {
            EntityKind::Dagger(dagger) => Some(dagger),
            _ => None,
        }
    }

    pub(crate) fn as_guard_mut(&mut self) -> Option<(&mut Body, &mut Guard)> {
        match &mut self.kind {
            EntityKind::Guard(guard) => Some((&mut self.body, guard)),
            _ => None,
        }
    }

    pub(crate) fn as_player_mut(&mut self) -> Option<(&mut Body, &mut Player)> {
        match &mut self.kind {
            EntityKind::Player(player) => Some((&mut self.body, player)),
            _ => None,
        }
    }

    pub(crate) fn as_house_mut(&mut self) -> Option<&mut House> {
        match &mut self.kind {
            EntityKind::House(house) => Some(house),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            EntityKind::Player(_) => "player",
            EntityKind::Guard(guard) => guard.kind.event_prefix(),
            EntityKind::Dagger(_) => "dagger",
            EntityKind::House(_) => "house",
            EntityKind::Chest => "chest",
        }
    }
}
