//! Destruction debris
//!
//! Purely visual: six small bits fly from the rocket out around the hit on
//! every collision, then drift back toward the rocket until they expire. Debris never affects scoring.

use glam::Vec3;

use super::anim::{AnimationPlayer, Clip, VectorTrack};
use crate::consts::DEBRIS_PER_BURST;
use crate::tuning::Tuning;

#[derive(Debug, Clone, PartialEq)]
pub struct DebrisBit {
    pub position: Vec3,
    /// Ticks lived
    pub age: u32,
    /// Outward burst; dropped once it has played
    pub spawn: Option<AnimationPlayer>,
}

/// Offset of burst bit `i` from the hit centre, in the water plane
pub fn burst_offset(i: usize, radius: f32) -> Vec3 {
    // One "degree" step per index, read back as radians
    let angle = (i as f32 / 45.0).to_degrees();
    Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius)
}

/// Spawn a burst for a hit centred at `at`; bits leave from the rocket
pub fn spawn_burst(debris: &mut Vec<DebrisBit>, rocket: Vec3, at: Vec3, tuning: &Tuning) {
    for i in 0..DEBRIS_PER_BURST {
        let offset = burst_offset(i, tuning.debris_burst_radius);
        let track = VectorTrack::new(vec![0.0, tuning.debris_spawn_secs], vec![rocket, at + offset]);
        let clip = Clip::new("debris-burst", tuning.debris_spawn_secs).with_position(track);
        debris.push(DebrisBit {
            position: rocket,
            age: 0,
            spawn: Some(AnimationPlayer::new(clip)),
        });
    }
}

/// Per-tick aging: expire old bits, drift the rest toward the rocket
pub fn update(debris: &mut Vec<DebrisBit>, rocket: Vec3, tuning: &Tuning) {
    debris.retain_mut(|bit| {
        if bit.age > tuning.debris_lifetime_ticks {
            return false;
        }
        let toward = (rocket - bit.position).normalize_or_zero();
        bit.position += toward * tuning.debris_drift;
        bit.age += 1;
        true
    });
}

/// Advance burst animations on each bit's own clock
pub fn animate(debris: &mut [DebrisBit], now: f64) {
    for bit in debris {
        let Some(player) = &mut bit.spawn else {
            continue;
        };
        if let Some(position) = player.advance(now).position {
            bit.position = position;
        }
        if player.is_finished() {
            bit.spawn = None;
        }
    }
}
