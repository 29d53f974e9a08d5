pub mod config;
pub mod geometry;
pub mod hooks;
pub mod input;
pub mod random;
mod sprite_keys;
pub mod world;

pub use config::{
    ConfigError, DaggerTuning, GuardTuning, GuardVariantTuning, HouseTuning, LifecycleTuning,
    PlayField, PlayerTuning, SimConfig,
};
pub use geometry::{Circle, Rect, SubRect, Vec2, COS_45_DEG};
pub use hooks::{
    EventOrigin, EventPriority, EventSink, GameEvent, Hooks, RecordingHooks, Scoreboard,
    ScoreboardCall,
};
pub use input::{InputAction, InputSnapshot};
pub use random::{RandomSource, SeededRandom, SequenceRandom};
pub use sprite_keys::{SpriteKey, SpriteKeyError};
pub use world::{
    Canvas, EntityId, EntityKind, GuardKind, GuardState, HouseSize, LevelOutcome, PatrolConfig,
    RenderState, SimError, TickReport, Tint, World,
};
