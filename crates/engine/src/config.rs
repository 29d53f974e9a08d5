use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Vec2, COS_45_DEG};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be a finite number greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("{field} must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f32 },
    #[error("{field} must be at least 1")]
    ZeroCount { field: &'static str },
    #[error("play_field.min_y ({min_y}) must be below play_field.height ({height})")]
    EmptyPlayField { min_y: f32, height: f32 },
    #[error("{field}: min {min} is greater than max {max}")]
    InvertedRange { field: &'static str, min: u32, max: u32 },
}

/// Playable area. Everything below `min_y` is reserved for on-screen text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayField {
    pub width: f32,
    pub height: f32,
    pub min_y: f32,
}

impl Default for PlayField {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            min_y: 50.0,
        }
    }
}

impl PlayField {
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= 0.0 && point.x < self.width && point.y >= self.min_y && point.y < self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardVariantTuning {
    pub sub_rect_left: f32,
    pub sub_rect_right: f32,
    /// Minimum facing cosine inside `close_range_distance`. Negative values let the
    /// guard notice things slightly behind it.
    pub close_range_min_cos: f32,
    pub pocket_loot_min: u32,
    pub pocket_loot_max: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardTuning {
    pub size: Vec2,
    pub hp: i32,
    pub view_distance: f32,
    pub close_range_distance: f32,
    pub far_min_cos: f32,
    pub patrol_speed: f32,
    pub chase_speed: f32,
    pub attack_damage: i32,
    pub attack_cooldown_seconds: f32,
    pub attack_reach_margin: f32,
    pub decision_interval_seconds: f32,
    pub alert_pause_seconds: f32,
    pub alert_capture_range: f32,
    pub patrol_capture_range: f32,
    pub alert_radius: f32,
    pub vision_cone_half_width: f32,
    pub human: GuardVariantTuning,
    pub dog: GuardVariantTuning,
}

impl Default for GuardTuning {
    fn default() -> Self {
        Self {
            size: Vec2::new(33.0, 33.0),
            hp: 2,
            view_distance: 150.0,
            close_range_distance: 50.0,
            far_min_cos: COS_45_DEG,
            patrol_speed: 60.0,
            chase_speed: 100.0,
            attack_damage: 1,
            attack_cooldown_seconds: 2.0,
            attack_reach_margin: 5.0,
            decision_interval_seconds: 0.5,
            alert_pause_seconds: 2.5,
            alert_capture_range: 20.0,
            patrol_capture_range: 5.0,
            alert_radius: 120.0,
            vision_cone_half_width: 64.0,
            human: GuardVariantTuning {
                sub_rect_left: 4.0,
                sub_rect_right: 29.0,
                close_range_min_cos: 0.0,
                pocket_loot_min: 5,
                pocket_loot_max: 15,
            },
            dog: GuardVariantTuning {
                sub_rect_left: 3.0,
                sub_rect_right: 30.0,
                close_range_min_cos: -COS_45_DEG,
                pocket_loot_min: 0,
                pocket_loot_max: 0,
            },
        }
    }
}

impl Default for GuardVariantTuning {
    fn default() -> Self {
        GuardTuning::default().human
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub size: Vec2,
    pub sub_rect_left: f32,
    pub sub_rect_right: f32,
    pub hp: i32,
    pub move_speed: f32,
    pub starting_daggers: u32,
    /// Edge-to-edge distance within which an unaware guard can be pickpocketed.
    pub pickpocket_reach: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            size: Vec2::new(33.0, 33.0),
            sub_rect_left: 6.0,
            sub_rect_right: 27.0,
            hp: 3,
            move_speed: 130.0,
            starting_daggers: 10,
            pickpocket_reach: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaggerTuning {
    pub size: Vec2,
    pub speed: f32,
    pub damage: i32,
}

impl Default for DaggerTuning {
    fn default() -> Self {
        Self {
            size: Vec2::new(16.0, 16.0),
            speed: 300.0,
            damage: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HouseTuning {
    pub nominal_loot: u32,
    pub loot_variance: f32,
    pub base_loot_seconds: f32,
    pub loot_zone_depth: f32,
    pub chest_size: Vec2,
}

impl Default for HouseTuning {
    fn default() -> Self {
        Self {
            nominal_loot: 100,
            loot_variance: 0.1,
            base_loot_seconds: 2.0,
            loot_zone_depth: 32.0,
            chest_size: Vec2::new(24.0, 18.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub play_field: PlayField,
    pub lifecycle: LifecycleTuning,
    pub guard: GuardTuning,
    pub player: PlayerTuning,
    pub dagger: DaggerTuning,
    pub house: HouseTuning,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleTuning {
    pub death_fade_seconds: f32,
    pub damage_flash_seconds: f32,
    /// Squared displacement below which a moving entity counts as stuck.
    pub stuck_dist_sq: f32,
}

impl Default for LifecycleTuning {
    fn default() -> Self {
        Self {
            death_fade_seconds: 1.0,
            damage_flash_seconds: 1.0,
            stuck_dist_sq: 1.0,
        }
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { field, value })
    }
}

fn positive_size(field: &'static str, size: Vec2) -> Result<(), ConfigError> {
    positive(field, size.x)?;
    positive(field, size.y)
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let field = &self.play_field;
        positive("play_field.width", field.width)?;
        positive("play_field.height", field.height)?;
        finite("play_field.min_y", field.min_y)?;
        if field.min_y >= field.height {
            return Err(ConfigError::EmptyPlayField {
                min_y: field.min_y,
                height: field.height,
            });
        }

        positive("lifecycle.death_fade_seconds", self.lifecycle.death_fade_seconds)?;
        positive("lifecycle.damage_flash_seconds", self.lifecycle.damage_flash_seconds)?;
        finite("lifecycle.stuck_dist_sq", self.lifecycle.stuck_dist_sq)?;

        let guard = &self.guard;
        positive_size("guard.size", guard.size)?;
        if guard.hp < 1 {
            return Err(ConfigError::ZeroCount { field: "guard.hp" });
        }
        positive("guard.view_distance", guard.view_distance)?;
        finite("guard.close_range_distance", guard.close_range_distance)?;
        finite("guard.far_min_cos", guard.far_min_cos)?;
        positive("guard.patrol_speed", guard.patrol_speed)?;
        positive("guard.chase_speed", guard.chase_speed)?;
        positive("guard.decision_interval_seconds", guard.decision_interval_seconds)?;
        positive("guard.alert_radius", guard.alert_radius)?;
        for (name, variant) in [("guard.human", &guard.human), ("guard.dog", &guard.dog)] {
            finite(name, variant.close_range_min_cos)?;
            if variant.pocket_loot_min > variant.pocket_loot_max {
                return Err(ConfigError::InvertedRange {
                    field: name,
                    min: variant.pocket_loot_min,
                    max: variant.pocket_loot_max,
                });
            }
        }

        let player = &self.player;
        positive_size("player.size", player.size)?;
        if player.hp < 1 {
            return Err(ConfigError::ZeroCount { field: "player.hp" });
        }
        positive("player.move_speed", player.move_speed)?;

        positive_size("dagger.size", self.dagger.size)?;
        positive("dagger.speed", self.dagger.speed)?;

        positive("house.base_loot_seconds", self.house.base_loot_seconds)?;
        finite("house.loot_variance", self.house.loot_variance)?;
        positive_size("house.chest_size", self.house.chest_size)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(SimConfig::default().validate(), Ok(()));
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let config: SimConfig =
            serde_json::from_str(r#"{ "guard": { "view_distance": 200.0 } }"#).expect("config");
        assert_eq!(config.guard.view_distance, 200.0);
        assert_eq!(config.guard.chase_speed, 100.0);
        assert_eq!(config.play_field, PlayField::default());
    }

    #[test]
    fn validate_rejects_non_positive_speed() {
        let mut config = SimConfig::default();
        config.player.move_speed = 0.0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotPositive {
                field: "player.move_speed",
                value: 0.0
            })
        );
    }

    #[test]
    fn validate_rejects_play_field_without_room() {
        let mut config = SimConfig::default();
        config.play_field.min_y = 700.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyPlayField { .. })
        ));
    }

    #[test]
    fn play_field_bounds_are_half_open() {
        let field = PlayField::default();
        assert!(field.contains(Vec2::new(0.0, 50.0)));
        assert!(!field.contains(Vec2::new(800.0, 100.0)));
        assert!(!field.contains(Vec2::new(10.0, 49.9)));
    }
}
