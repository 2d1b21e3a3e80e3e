//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One step per frame, driven by [`tick`]
//! - Seeded RNG only
//! - Stable iteration order (rows newest-first, cells left to right)
//! - No rendering or platform dependencies

pub mod anim;
pub mod bounds;
pub mod catalog;
pub mod collision;
pub mod debris;
pub mod state;
pub mod tick;
pub mod world;

pub use bounds::Aabb;
pub use catalog::{Catalog, CatalogError, Instance, Template, TemplateKind, TemplateSet};
pub use collision::{Hit, detect_collisions, find_hits};
pub use debris::DebrisBit;
pub use state::{
    CameraRig, GameEvent, GamePhase, GameState, LevelOutcome, LevelReport, Rocket, SceneConfig,
    WaterState,
};
pub use tick::{
    TickInput, end_level, next_level, restart_from_level_1, setup_level, start_game, tick,
};
pub use world::{BackgroundUnit, ChallengeRow, Obstacle, ObstacleKind, World};
