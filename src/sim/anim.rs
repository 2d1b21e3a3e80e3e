//! Keyframe animation
//!
//! Clips are play-once, clamp-when-finished: once a player's elapsed time
//! reaches the clip duration it keeps reporting the final pose and
//! [`AnimationPlayer::is_finished`] turns true. The frame driver polls that
//! flag to fire state transitions instead of reacting to callbacks.
//!
//! Each animated object owns its own [`Clock`], so objects started at
//! different moments advance by their own elapsed-time deltas.

use glam::{Quat, Vec3};

/// How values between two keys are blended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    #[default]
    Linear,
    /// Cubic Hermite with Catmull-Rom tangents (flat at the first and last key)
    Smooth,
}

/// Keyframed `Vec3` (positions)
#[derive(Debug, Clone, PartialEq)]
pub struct VectorTrack {
    pub times: Vec<f32>,
    pub values: Vec<Vec3>,
    pub interpolation: Interpolation,
}

/// Keyframed rotation, always slerped
#[derive(Debug, Clone, PartialEq)]
pub struct QuatTrack {
    pub times: Vec<f32>,
    pub values: Vec<Quat>,
}

/// Locate the key span containing `t`: `(index of left key, local 0..1 factor)`.
/// Before the first key or after the last the factor is clamped.
fn key_span(times: &[f32], t: f32) -> (usize, f32) {
    if times.len() < 2 || t <= times[0] {
        return (0, 0.0);
    }
    let last = times.len() - 1;
    if t >= times[last] {
        return (last - 1, 1.0);
    }
    let i = times.partition_point(|&k| k <= t).saturating_sub(1).min(last - 1);
    let span = times[i + 1] - times[i];
    let u = if span > 0.0 { (t - times[i]) / span } else { 1.0 };
    (i, u)
}

impl VectorTrack {
    pub fn new(times: Vec<f32>, values: Vec<Vec3>) -> Self {
        debug_assert_eq!(times.len(), values.len());
        Self {
            times,
            values,
            interpolation: Interpolation::Linear,
        }
    }

    pub fn smooth(mut self) -> Self {
        self.interpolation = Interpolation::Smooth;
        self
    }

    pub fn sample(&self, t: f32) -> Vec3 {
        match self.values.len() {
            0 => Vec3::ZERO,
            1 => self.values[0],
            n => {
                let (i, u) = key_span(&self.times, t);
                let (p0, p1) = (self.values[i], self.values[i + 1]);
                match self.interpolation {
                    Interpolation::Linear => p0.lerp(p1, u),
                    Interpolation::Smooth => {
                        let dt = self.times[i + 1] - self.times[i];
                        let m0 = if i == 0 {
                            Vec3::ZERO
                        } else {
                            (p1 - self.values[i - 1]) / (self.times[i + 1] - self.times[i - 1])
                        };
                        let m1 = if i + 2 >= n {
                            Vec3::ZERO
                        } else {
                            (self.values[i + 2] - p0) / (self.times[i + 2] - self.times[i])
                        };
                        let (u2, u3) = (u * u, u * u * u);
                        p0 * (2.0 * u3 - 3.0 * u2 + 1.0)
                            + m0 * dt * (u3 - 2.0 * u2 + u)
                            + p1 * (-2.0 * u3 + 3.0 * u2)
                            + m1 * dt * (u3 - u2)
                    }
                }
            }
        }
    }
}

impl QuatTrack {
    pub fn new(times: Vec<f32>, values: Vec<Quat>) -> Self {
        debug_assert_eq!(times.len(), values.len());
        Self { times, values }
    }

    pub fn sample(&self, t: f32) -> Quat {
        match self.values.len() {
            0 => Quat::IDENTITY,
            1 => self.values[0],
            _ => {
                let (i, u) = key_span(&self.times, t);
                self.values[i].slerp(self.values[i + 1], u)
            }
        }
    }
}

/// A named set of tracks played together
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub name: &'static str,
    pub duration: f32,
    pub position: Option<VectorTrack>,
    pub rotation: Option<QuatTrack>,
}

impl Clip {
    pub fn new(name: &'static str, duration: f32) -> Self {
        Self {
            name,
            duration,
            position: None,
            rotation: None,
        }
    }

    pub fn with_position(mut self, track: VectorTrack) -> Self {
        self.position = Some(track);
        self
    }

    pub fn with_rotation(mut self, track: QuatTrack) -> Self {
        self.rotation = Some(track);
        self
    }
}

/// A sampled pose; tracks the clip doesn't have stay `None`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub position: Option<Vec3>,
    pub rotation: Option<Quat>,
}

/// Per-object wall clock
///
/// The first `delta` after creation returns zero and starts the clock, so an
/// animation begins on the frame after it was created.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Clock {
    last: Option<f64>,
}

impl Clock {
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Seconds since the previous call (never negative)
    pub fn delta(&mut self, now: f64) -> f32 {
        let dt = match self.last {
            Some(last) => (now - last).max(0.0),
            None => 0.0,
        };
        self.last = Some(now);
        dt as f32
    }
}

/// Plays one clip once, holding the last pose when done
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationPlayer {
    pub clip: Clip,
    pub elapsed: f32,
    clock: Clock,
}

impl AnimationPlayer {
    pub fn new(clip: Clip) -> Self {
        Self {
            clip,
            elapsed: 0.0,
            clock: Clock::new(),
        }
    }

    /// Advance by this player's own clock delta and return the pose
    pub fn advance(&mut self, now: f64) -> Pose {
        let dt = self.clock.delta(now);
        self.step(dt)
    }

    /// Advance by an explicit delta
    pub fn step(&mut self, dt: f32) -> Pose {
        self.elapsed = (self.elapsed + dt).min(self.clip.duration);
        self.pose()
    }

    pub fn pose(&self) -> Pose {
        Pose {
            position: self.clip.position.as_ref().map(|t| t.sample(self.elapsed)),
            rotation: self.clip.rotation.as_ref().map(|t| t.sample(self.elapsed)),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.clip.duration
    }
}
