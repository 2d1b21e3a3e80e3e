//! Data-driven game balance
//!
//! Every gameplay number the simulation reads lives here so a level designer
//! can override it from JSON. `Tuning::default()` reproduces the shipped game.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while loading a tuning override
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to parse tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid tuning: {0}")]
    Invalid(&'static str),
}

/// How the eviction sweep treats passed segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EvictionSweep {
    /// Remove every segment past the eviction line
    #[default]
    All,
    /// Leave the oldest passed segment in place each sweep (legacy behavior)
    RetainOldest,
}

/// Per-cell obstacle roll table
///
/// A roll is uniform in `[0, roll_range)`. Values below `crystal_below` give a
/// crystal, values below `rock_below` a rock, values above `shield_above` a
/// shield, anything else leaves the cell empty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstacleOdds {
    pub roll_range: f32,
    pub crystal_below: f32,
    pub rock_below: f32,
    pub shield_above: f32,
}

impl Default for ObstacleOdds {
    fn default() -> Self {
        Self {
            roll_range: 10.0,
            crystal_below: 2.0,
            rock_below: 4.0,
            shield_above: 9.0,
        }
    }
}

/// Gameplay tuning table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Speed & course ===
    /// Speed added every running tick
    pub speed_ramp: f32,
    /// Speed removed every tick once the level is over
    pub speed_decay: f32,
    /// Starting speed for level L is `level_start_speed_step * (L - 1)`
    pub level_start_speed_step: f32,
    /// Course length for level L is `course_length_per_level * L`
    pub course_length_per_level: f32,

    // === Streaming ===
    /// Rows and background units placed on level setup
    pub fill_count: u32,
    /// Spacing between fill-time segments (segment i sits at `-fill_spacing * i`)
    pub fill_spacing: f32,
    /// Where steady-state segments are spawned
    pub horizon_z: f32,
    /// Spawn a new segment when the newest one has scrolled past this z
    pub spawn_trigger_z: f32,
    /// Segments past this z are evicted
    pub eviction_z: f32,
    /// Starter bay is dropped past this z
    pub starter_bay_removal_z: f32,
    pub eviction_sweep: EvictionSweep,

    // === Background scenery ===
    /// Lateral distance of cliffs from the track centre
    pub scenery_lateral: f32,

    // === Challenge rows ===
    pub cell_pitch: f32,
    pub cell_origin: f32,
    pub odds: ObstacleOdds,

    // === Steering ===
    pub lateral_min: f32,
    pub lateral_max: f32,
    /// Lateral units per tick while an arrow key is held
    pub key_steer_step: f32,

    // === Scoring ===
    /// Shield tally at or below which the run ends
    pub shield_floor: i32,
    /// Shield tally cap
    pub shield_ceiling: i32,

    // === Debris ===
    pub debris_lifetime_ticks: u32,
    pub debris_drift: f32,
    pub debris_burst_radius: f32,
    pub debris_spawn_secs: f32,

    // === Animation ===
    /// Length of the intro camera track
    pub intro_track_secs: f32,
    /// Length of the intro clip (the transition fires when it finishes)
    pub intro_clip_secs: f32,
    pub camera_look_secs: f32,
    pub fly_away_clip_secs: f32,

    // === Pre-start camera orbit ===
    pub orbit_radius: f32,
    pub orbit_height: f32,
    pub orbit_step: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            speed_ramp: 0.001,
            speed_decay: 0.1,
            level_start_speed_step: 0.1,
            course_length_per_level: 1000.0,

            fill_count: 60,
            fill_spacing: 60.0,
            horizon_z: -1400.0,
            spawn_trigger_z: -1300.0,
            eviction_z: 100.0,
            starter_bay_removal_z: 200.0,
            eviction_sweep: EvictionSweep::All,

            scenery_lateral: 60.0,

            cell_pitch: 11.0,
            cell_origin: -20.0,
            odds: ObstacleOdds::default(),

            lateral_min: -20.0,
            lateral_max: 25.0,
            key_steer_step: 0.5,

            shield_floor: -5,
            shield_ceiling: 5,

            debris_lifetime_ticks: 500,
            debris_drift: 0.8,
            debris_burst_radius: 15.0,
            debris_spawn_secs: 0.3,

            intro_track_secs: 2.0,
            intro_clip_secs: 4.0,
            camera_look_secs: 2.0,
            fly_away_clip_secs: 6.0,

            orbit_radius: 20.0,
            orbit_height: 30.0,
            orbit_step: 0.005,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) tuning override; missing fields keep defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject tables the simulation can't run with
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.lateral_min >= self.lateral_max {
            return Err(TuningError::Invalid("lateral_min must be below lateral_max"));
        }
        if self.course_length_per_level <= 0.0 {
            return Err(TuningError::Invalid("course_length_per_level must be positive"));
        }
        // Speed may only ramp up while running and only decay afterwards
        if !(self.speed_ramp >= 0.0 && self.speed_decay >= 0.0 && self.level_start_speed_step >= 0.0) {
            return Err(TuningError::Invalid("speed ramp, decay and start step must not be negative"));
        }
        if self.fill_spacing <= 0.0 {
            return Err(TuningError::Invalid("fill_spacing must be positive"));
        }
        if self.spawn_trigger_z <= self.horizon_z {
            return Err(TuningError::Invalid("spawn_trigger_z must be nearer than horizon_z"));
        }
        let odds = &self.odds;
        if !(0.0 <= odds.crystal_below
            && odds.crystal_below <= odds.rock_below
            && odds.rock_below <= odds.shield_above
            && odds.shield_above <= odds.roll_range)
        {
            return Err(TuningError::Invalid("obstacle odds must be ordered within roll_range"));
        }
        if self.shield_floor >= 0 || self.shield_ceiling <= 0 {
            return Err(TuningError::Invalid("shield floor must be negative and ceiling positive"));
        }
        if self.intro_clip_secs < self.intro_track_secs {
            return Err(TuningError::Invalid("intro clip can't be shorter than its track"));
        }
        Ok(())
    }

    /// Course length for a level (levels start at 1)
    pub fn course_length(&self, level: u32) -> f32 {
        self.course_length_per_level * level as f32
    }

    /// Speed the rocket carries into a level
    pub fn level_start_speed(&self, level: u32) -> f32 {
        self.level_start_speed_step * level.saturating_sub(1) as f32
    }

    /// Lateral offset of a row cell
    pub fn cell_offset(&self, cell: usize) -> f32 {
        cell as f32 * self.cell_pitch + self.cell_origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_course_length_scales_with_level() {
        let t = Tuning::default();
        assert_eq!(t.course_length(1), 1000.0);
        assert_eq!(t.course_length(4), 4000.0);
    }

    #[test]
    fn test_level_start_speed() {
        let t = Tuning::default();
        assert_eq!(t.level_start_speed(1), 0.0);
        assert!((t.level_start_speed(4) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_cell_offsets() {
        let t = Tuning::default();
        let offsets: Vec<f32> = (0..5).map(|c| t.cell_offset(c)).collect();
        assert_eq!(offsets, vec![-20.0, -9.0, 2.0, 13.0, 24.0]);
    }

    #[test]
    fn test_partial_override() {
        let t = Tuning::from_json(r#"{ "speed_ramp": 0.002, "fill_count": 10 }"#).unwrap();
        assert_eq!(t.speed_ramp, 0.002);
        assert_eq!(t.fill_count, 10);
        assert_eq!(t.horizon_z, -1400.0);
        assert_eq!(t.eviction_sweep, EvictionSweep::All);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let err = Tuning::from_json(r#"{ "lateral_min": 30.0 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid(_)));

        for field in ["speed_ramp", "speed_decay", "level_start_speed_step"] {
            let json = format!(r#"{{ "{}": -0.01 }}"#, field);
            let err = Tuning::from_json(&json).unwrap_err();
            assert!(matches!(err, TuningError::Invalid(_)), "{} accepted", field);
        }
        assert!(Tuning::from_json(r#"{ "speed_ramp": 0.0, "speed_decay": 0.0 }"#).is_ok());

        let err = Tuning::from_json("{ not json").unwrap_err();
        assert!(matches!(err, TuningError::Parse(_)));
    }
}
