//! Rocket Run - an endless-corridor rocket runner
//!
//! Core modules:
//! - `sim`: Deterministic simulation (world streaming, collisions, level flow)
//! - `renderer`: Frame snapshots handed to the external renderer
//! - `platform`: Browser/native input folding
//! - `tuning`: Data-driven game balance
//! - `ui`: HUD contract and event dispatch
//! - `audio`: Procedural sound effects for game events

pub mod audio;
pub mod highscores;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;
pub mod ui;

pub use highscores::HighScores;
pub use settings::Settings;
pub use tuning::Tuning;

use glam::{Quat, Vec3};

/// Fixed structural constants (tunable numbers live in [`Tuning`])
pub mod consts {
    use glam::Vec3;

    /// Lateral cells per challenge row
    pub const ROW_CELLS: usize = 5;
    /// Debris bits spawned per obstacle hit
    pub const DEBRIS_PER_BURST: usize = 6;

    /// Nominal frame step for per-frame quantities (60 Hz)
    pub const FRAME_DT: f64 = 1.0 / 60.0;

    /// Rocket pose after level setup
    pub const ROCKET_START: Vec3 = Vec3::new(0.0, 10.0, 70.0);
    pub const ROCKET_SCALE: f32 = 0.3;

    /// Camera pose after level setup (before the orbit takes over)
    pub const CAMERA_START: Vec3 = Vec3::new(15.0, 12.0, 50.0);
    pub const CAMERA_START_YAW: f32 = 2.5;

    /// Where the intro clip parks the camera, and what it looks at once parked
    pub const CAMERA_CHASE: Vec3 = Vec3::new(0.0, 30.0, 100.0);
    pub const CAMERA_CHASE_TILT: f32 = 0.3;
    pub const CAMERA_RUN_TARGET: Vec3 = Vec3::new(0.0, -500.0, -1400.0);

    /// Launch bay scenery placement on level setup
    pub const STARTER_BAY_START: Vec3 = Vec3::new(10.0, 0.0, 120.0);

    /// Mothership hovering above the course
    pub const MOTHERSHIP_POSITION: Vec3 = Vec3::new(0.0, 200.0, 100.0);
    pub const MOTHERSHIP_SCALE: f32 = 15.0;

    /// Fly-away waypoints (keys at 2 s, 3 s, 5 s; first key is the rocket's current position)
    pub const FLY_AWAY_WAYPOINT: Vec3 = Vec3::new(20.0, 100.0, 20.0);
    pub const FLY_AWAY_DESTINATION: Vec3 = Vec3::new(40.0, 400.0, 100.0);
}

/// Rotation that points an object's -Z axis from `eye` toward `target` (Y up)
///
/// Matches how a camera "looks at" something. Returns identity when the two
/// points coincide.
pub fn look_rotation(eye: Vec3, target: Vec3) -> Quat {
    let dir = target - eye;
    if dir.length_squared() < 1e-10 {
        return Quat::IDENTITY;
    }
    let dir = dir.normalize();
    // Looking straight up or down - Y can't be up, any perpendicular will do
    let up = if dir.cross(Vec3::Y).length_squared() < 1e-10 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    // glam builds the view rotation; the object's orientation is its inverse
    Quat::look_to_rh(dir, up).inverse()
}
