use tracing::debug;

use crate::config::SimConfig;
use crate::geometry::{Rect, SubRect, Vec2};
use crate::hooks::Scoreboard;
use crate::random::RandomSource;

use super::entity::{Body, Entity, EntityId, EntityKind};

/// Level files give a house size class of 1, 2 or 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HouseSize {
    Small,
    Medium,
    Large,
}

impl HouseSize {
    pub fn from_class(class: u8) -> Option<Self> {
        match class {
            1 => Some(Self::Small),
            2 => Some(Self::Medium),
            3 => Some(Self::Large),
            _ => None,
        }
    }

    pub fn class(self) -> u8 {
        match self {
            Self::Small => 1,
            Self::Medium => 2,
            Self::Large => 3,
        }
    }

    pub fn side_px(self) -> f32 {
        match self {
            Self::Small => 96.0,
            Self::Medium => 128.0,
            Self::Large => 160.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LootCompletion {
    pub chest: EntityId,
    pub amount: u32,
}

#[derive(Debug, Clone)]
pub struct House {
    size: HouseSize,
    style: u32,
    chest: Option<EntityId>,
    loot_amount: u32,
    difficulty: f32,
    base_loot_seconds: f32,
    loot_zone: Rect,
    loot_timer: Option<f32>,
}

pub(crate) struct HouseSpawn {
    pub house_id: EntityId,
    pub chest_id: EntityId,
    pub house_index: u32,
    pub chest_index: u32,
    pub position: Vec2,
    pub size: HouseSize,
    pub nominal_loot: Option<u32>,
    pub difficulty: f32,
}

/// Builds a house and the chest it owns. The chest sits above the house center; the
/// loot zone is a strip below the house's front edge.
pub(crate) fn build(
    spawn: HouseSpawn,
    config: &SimConfig,
    rng: &mut dyn RandomSource,
) -> (Entity, Entity) {
    let tuning = &config.house;
    let side = spawn.size.side_px();
    let size = Vec2::new(side, side);
    let body = Body::new(spawn.position, size, SubRect::full(size));

    let center = body.center();
    let zone_half_width = side / 8.0;
    let loot_zone = Rect::new(
        center.x - zone_half_width,
        body.rect().bottom - tuning.loot_zone_depth,
        center.x + zone_half_width,
        body.rect().bottom,
    );

    let style = rng.range_inclusive(1, 4);
    let nominal = spawn.nominal_loot.unwrap_or(tuning.nominal_loot);
    let variance = tuning.loot_variance;
    let factor = 1.0 - variance + rng.next_unit() * 2.0 * variance;
    let loot_amount = (nominal as f32 * factor).round().max(0.0) as u32;

    let chest_half = tuning.chest_size.scale(0.5);
    let chest_center = Vec2::new(center.x, center.y + side * 0.2);
    let chest = Entity {
        id: spawn.chest_id,
        name: format!("chest {}", spawn.chest_index),
        body: Body::new(
            chest_center - chest_half,
            tuning.chest_size,
            SubRect::full(tuning.chest_size),
        ),
        kind: EntityKind::Chest,
    };

    let house = Entity {
        id: spawn.house_id,
        name: format!("house {}", spawn.house_index),
        body,
        kind: EntityKind::House(House {
            size: spawn.size,
            style,
            chest: Some(spawn.chest_id),
            loot_amount,
            difficulty: if spawn.difficulty > 0.0 {
                spawn.difficulty
            } else {
                1.0
            },
            base_loot_seconds: tuning.base_loot_seconds,
            loot_zone,
            loot_timer: None,
        }),
    };
    (house, chest)
}

impl House {
    pub fn size(&self) -> HouseSize {
        self.size
    }

    pub fn style(&self) -> u32 {
        self.style
    }

    pub fn chest(&self) -> Option<EntityId> {
        self.chest
    }

    pub fn has_chest(&self) -> bool {
        self.chest.is_some()
    }

    pub fn loot_amount(&self) -> u32 {
        self.loot_amount
    }

    pub fn difficulty(&self) -> f32 {
        self.difficulty
    }

    pub fn loot_zone(&self) -> Rect {
        self.loot_zone
    }

    pub fn loot_timer(&self) -> Option<f32> {
        self.loot_timer
    }

    pub fn looting_duration(&self) -> f32 {
        self.base_loot_seconds * self.difficulty
    }

    /// Resumes from any earlier partial attempt.
    pub(crate) fn start_looting<S: Scoreboard + ?Sized>(&mut self, scoreboard: &mut S) {
        if self.chest.is_none() {
            return;
        }
        if self.loot_timer.is_none() {
            self.loot_timer = Some(self.looting_duration());
        }
        scoreboard.set_looting_completion(0.0);
    }

    /// Abandoning an attempt keeps half the progress: the next attempt needs the average
    /// of what was left and a full duration.
    pub(crate) fn stop_looting<S: Scoreboard + ?Sized>(&mut self, scoreboard: &mut S) {
        let full = self.looting_duration();
        if let Some(remaining) = self.loot_timer {
            self.loot_timer = Some((remaining + full) / 2.0);
        }
        scoreboard.stop_looting();
    }

    pub(crate) fn update_looting<S: Scoreboard + ?Sized>(
        &mut self,
        dt: f32,
        scoreboard: &mut S,
    ) -> Option<LootCompletion> {
        let full = self.looting_duration();
        let remaining = self.loot_timer.unwrap_or(full) - dt;
        if remaining > 0.0 {
            self.loot_timer = Some(remaining);
            scoreboard.set_looting_completion(1.0 - remaining / full);
            return None;
        }

        let chest = self.chest.take()?;
        self.loot_timer = None;
        let amount = std::mem::take(&mut self.loot_amount);
        debug!(amount, "chest_looted");
        scoreboard.add_loot(amount, None);
        Some(LootCompletion { chest, amount })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{RecordingHooks, ScoreboardCall};
    use crate::random::SequenceRandom;

    fn house(nominal: Option<u32>, difficulty: f32, roll: f32) -> (Entity, Entity) {
        let mut rng = SequenceRandom::constant(roll);
        build(
            HouseSpawn {
                house_id: EntityId(1),
                chest_id: EntityId(2),
                house_index: 1,
                chest_index: 1,
                position: Vec2::new(300.0, 300.0),
                size: HouseSize::Medium,
                nominal_loot: nominal,
                difficulty,
            },
            &SimConfig::default(),
            &mut rng,
        )
    }

    fn house_state(entity: Entity) -> House {
        match entity.kind {
            EntityKind::House(house) => house,
            _ => panic!("expected house"),
        }
    }

    #[test]
    fn chest_and_loot_zone_are_placed_around_the_house() {
        let (house, chest) = house(None, 1.0, 0.5);
        assert_eq!(house.body.rect(), Rect::new(300.0, 300.0, 428.0, 428.0));
        assert_eq!(chest.body.center(), Vec2::new(364.0, 364.0 + 128.0 * 0.2));

        let zone = house_state(house).loot_zone();
        assert_eq!(zone, Rect::new(348.0, 268.0, 380.0, 300.0));
    }

    #[test]
    fn loot_rolls_within_ten_percent() {
        assert_eq!(house_state(house(None, 1.0, 0.5).0).loot_amount(), 100);
        assert_eq!(house_state(house(None, 1.0, 0.0).0).loot_amount(), 90);
        assert_eq!(house_state(house(Some(200), 1.0, 0.999_999).0).loot_amount(), 220);
    }

    #[test]
    fn stopping_keeps_half_of_the_progress() {
        let mut scoreboard = RecordingHooks::default();
        let mut house = house_state(house(None, 1.0, 0.5).0);
        house.start_looting(&mut scoreboard);
        assert_eq!(house.loot_timer(), Some(2.0));
        assert_eq!(house.update_looting(1.0, &mut scoreboard), None);
        house.stop_looting(&mut scoreboard);
        assert_eq!(house.loot_timer(), Some(1.5));

        house.start_looting(&mut scoreboard);
        assert_eq!(house.loot_timer(), Some(1.5));
    }

    #[test]
    fn finishing_hands_over_the_chest_and_loot() {
        let mut scoreboard = RecordingHooks::default();
        let mut house = house_state(house(None, 2.0, 0.5).0);
        house.start_looting(&mut scoreboard);
        assert_eq!(house.update_looting(2.0, &mut scoreboard), None);
        let done = house.update_looting(2.0, &mut scoreboard);
        assert_eq!(
            done,
            Some(LootCompletion {
                chest: EntityId(2),
                amount: 100
            })
        );
        assert!(!house.has_chest());
        assert_eq!(house.loot_amount(), 0);
        assert!(scoreboard.scoreboard.contains(&ScoreboardCall::AddLoot {
            amount: 100,
            pickpocketed: None
        }));
    }

    #[test]
    fn size_classes_map_to_pixel_sides() {
        assert_eq!(HouseSize::from_class(1).map(HouseSize::side_px), Some(96.0));
        assert_eq!(HouseSize::from_class(3).map(HouseSize::side_px), Some(160.0));
        assert_eq!(HouseSize::from_class(4), None);
    }
}
