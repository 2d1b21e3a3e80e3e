//! Game state and core simulation types
//!
//! A single `GameState` owns everything the frame driver mutates; nothing in
//! the simulation is global.

use glam::{EulerRot, Quat, Vec3};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::anim::AnimationPlayer;
use super::bounds::Aabb;
use super::catalog::{Catalog, CatalogError, Instance, TemplateKind};
use super::debris::DebrisBit;
use super::world::{ObstacleKind, World};
use crate::consts::*;
use crate::tuning::Tuning;

/// How a level ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelOutcome {
    /// Reached the end of the course
    Completed,
    /// Shields ran out
    Damaged,
}

/// Current phase of the level flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Level laid out, camera orbiting the rocket, waiting for start
    PreStart,
    /// Camera flying in behind the rocket
    IntroCamera,
    /// World scrolling, collisions live
    Running,
    /// Level ended; the rocket is flying away to the mothership
    LevelOver { outcome: LevelOutcome },
    /// End-of-level panel is up, waiting for next level / restart
    LevelEndScreen { outcome: LevelOutcome },
}

/// Summary shown on the end-of-level panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelReport {
    pub level: u32,
    pub outcome: LevelOutcome,
    pub crystals: u32,
    pub shields: i32,
}

/// Notifications for the presentation layer, drained once per frame
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// A fresh level has been laid out
    LevelSetup { level: u32 },
    /// Intro camera started
    GameStarted,
    /// Intro finished; the rocket is under way
    RocketLaunched,
    Progress(f32),
    CrystalCount(u32),
    ShieldCount(i32),
    ShieldDanger(bool),
    ObstacleHit { id: u32, kind: ObstacleKind, at: Vec3 },
    LevelOver(LevelReport),
    /// Fly-away finished; show the end panel
    LevelEndScreen(LevelReport),
}

/// Process-wide scene configuration and per-level counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Templates loaded and the first level laid out
    pub ready: bool,
    /// World is scrolling
    pub rocket_moving: bool,
    pub level_over: bool,
    /// Current level (starts at 1)
    pub level: u32,
    /// Distance covered this level
    pub course_progress: f32,
    pub course_length: f32,
    pub speed: f32,
    /// Spawn-index generators, reset on level setup
    pub background_spawned: u32,
    pub rows_spawned: u32,
    pub crystals: u32,
    /// Can go negative down to the shield floor
    pub shields: i32,
    /// Shield readout is in the danger state
    pub shield_danger: bool,
}

impl SceneConfig {
    pub fn new(level: u32, tuning: &Tuning) -> Self {
        Self {
            ready: false,
            rocket_moving: false,
            level_over: false,
            level,
            course_progress: 0.0,
            course_length: tuning.course_length(level),
            speed: 0.0,
            background_spawned: 0,
            rows_spawned: 0,
            crystals: 0,
            shields: 0,
            shield_danger: false,
        }
    }

    /// Fraction of the course covered, 0..1
    pub fn course_fraction(&self) -> f32 {
        if self.course_length <= 0.0 {
            return 0.0;
        }
        (self.course_progress / self.course_length).clamp(0.0, 1.0)
    }

    pub fn report(&self, outcome: LevelOutcome) -> LevelReport {
        LevelReport {
            level: self.level,
            outcome,
            crystals: self.crystals,
            shields: self.shields,
        }
    }
}

/// The player's rocket
#[derive(Debug, Clone, PartialEq)]
pub struct Rocket {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: f32,
    /// Level is over and the rocket is heading back to the mothership
    pub flying_away: bool,
    pub half_extents: Vec3,
    pub center_offset: Vec3,
    /// Fly-away clip, present from level end until the next setup
    pub animation: Option<AnimationPlayer>,
}

impl Rocket {
    pub fn from_instance(instance: &Instance) -> Self {
        let mut rocket = Self {
            position: ROCKET_START,
            rotation: Quat::IDENTITY,
            scale: ROCKET_SCALE,
            flying_away: false,
            half_extents: instance.half_extents,
            center_offset: instance.center_offset,
            animation: None,
        };
        rocket.reset();
        rocket
    }

    /// Back to the launch pose
    pub fn reset(&mut self) {
        self.position = ROCKET_START;
        self.rotation = Quat::from_euler(EulerRot::XYZ, std::f32::consts::PI, 0.0, std::f32::consts::PI);
        self.flying_away = false;
        self.animation = None;
    }

    /// World-space box, rebuilt every tick
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.position + self.center_offset, self.half_extents)
    }
}

/// Camera with its own animation track
#[derive(Debug, Clone, PartialEq)]
pub struct CameraRig {
    pub position: Vec3,
    pub rotation: Quat,
    /// Pre-start orbit angle around the rocket
    pub orbit_angle: f32,
    pub animation: Option<AnimationPlayer>,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            position: CAMERA_START,
            rotation: Quat::from_rotation_y(CAMERA_START_YAW),
            orbit_angle: 0.0,
            animation: None,
        }
    }
}

impl CameraRig {
    pub fn reset(&mut self) {
        self.position = CAMERA_START;
        self.rotation = Quat::from_rotation_y(CAMERA_START_YAW);
        self.animation = None;
    }
}

/// Water shader inputs
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WaterState {
    pub time: f32,
    pub scroll: f32,
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    pub seed: u64,
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub catalog: Catalog,
    pub phase: GamePhase,
    pub config: SceneConfig,
    pub rocket: Rocket,
    pub camera: CameraRig,
    pub world: World,
    pub debris: Vec<DebrisBit>,
    /// Mothership placement (static scenery)
    pub mothership: Instance,
    pub water: WaterState,
    /// Frames driven since start
    pub time_ticks: u64,
    /// Pending notifications for the presentation layer
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Build the state and lay out level 1.
    ///
    /// Fails if any template is missing: the frame driver must never run
    /// against an incomplete catalog.
    pub fn new(seed: u64, catalog: Catalog, tuning: Tuning) -> Result<Self, CatalogError> {
        if let Some(kind) = catalog.missing() {
            return Err(CatalogError::NotLoaded(kind));
        }

        let rocket = Rocket::from_instance(&catalog.instantiate(TemplateKind::Rocket)?);
        let mut mothership = catalog.instantiate(TemplateKind::Mothership)?;
        mothership.transform.translation = MOTHERSHIP_POSITION;
        mothership.transform.scale = Vec3::splat(MOTHERSHIP_SCALE);

        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            config: SceneConfig::new(1, &tuning),
            tuning,
            catalog,
            phase: GamePhase::PreStart,
            rocket,
            camera: CameraRig::default(),
            world: World::new(),
            debris: Vec::new(),
            mothership,
            water: WaterState::default(),
            time_ticks: 0,
            events: Vec::new(),
        };

        super::tick::setup_level(&mut state, 1)?;
        state.config.ready = true;
        Ok(state)
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
pub(crate) fn test_state(seed: u64) -> GameState {
    use super::catalog::TemplateSet;
    GameState::new(seed, Catalog::loaded(TemplateSet::default()), Tuning::default())
        .expect("built-in templates are complete")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_complete_catalog() {
        let err = GameState::new(1, Catalog::new(), Tuning::default()).unwrap_err();
        assert!(matches!(err, CatalogError::NotLoaded(TemplateKind::Rock)));
    }

    #[test]
    fn test_new_lays_out_level_one() {
        let state = test_state(3);
        assert!(state.config.ready);
        assert_eq!(state.phase, GamePhase::PreStart);
        assert_eq!(state.config.level, 1);
        assert_eq!(state.config.course_length, 1000.0);
        assert_eq!(state.world.rows.len(), 60);
        assert_eq!(state.rocket.position, ROCKET_START);
        assert!(!state.rocket.flying_away);
    }

    #[test]
    fn test_same_seed_same_layout() {
        let a = test_state(99);
        let b = test_state(99);
        assert_eq!(a.world.rows, b.world.rows);
        let c = test_state(100);
        assert_ne!(a.world.rows, c.world.rows);
    }

    #[test]
    fn test_course_fraction_clamped() {
        let mut config = SceneConfig::new(2, &Tuning::default());
        config.course_progress = 500.0;
        assert!((config.course_fraction() - 0.25).abs() < 1e-6);
        config.course_progress = 5000.0;
        assert_eq!(config.course_fraction(), 1.0);
    }

    #[test]
    fn test_rocket_bounds_track_position() {
        let mut state = test_state(1);
        state.rocket.position.x = 13.0;
        let bounds = state.rocket.bounds();
        assert_eq!(bounds.center(), Vec3::new(13.0, 10.0, 70.0));
    }
}
