//! Steering input
//!
//! Keyboard arrows and the touch joystick both end up here. The frame driver
//! reads [`Controls::tick_input`] once per frame.

use crate::settings::Settings;
use crate::sim::TickInput;

/// Current state of every steering source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Controls {
    pub left_held: bool,
    pub right_held: bool,
    /// Joystick x in [-1, 1]; zero when released
    pub joystick_x: f32,
    /// Demo mode
    pub autopilot: bool,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the key is a steering key
    pub fn key_down(&mut self, key: &str) -> bool {
        self.set_key(key, true)
    }

    pub fn key_up(&mut self, key: &str) -> bool {
        self.set_key(key, false)
    }

    fn set_key(&mut self, key: &str, held: bool) -> bool {
        match key {
            "ArrowLeft" | "a" | "A" => self.left_held = held,
            "ArrowRight" | "d" | "D" => self.right_held = held,
            _ => return false,
        }
        true
    }

    pub fn joystick_move(&mut self, x: f32) {
        self.joystick_x = if x.is_finite() { x.clamp(-1.0, 1.0) } else { 0.0 };
    }

    pub fn joystick_end(&mut self) {
        self.joystick_x = 0.0;
    }

    /// Drop everything held, e.g. when the window loses focus
    pub fn release_all(&mut self) {
        self.left_held = false;
        self.right_held = false;
        self.joystick_x = 0.0;
    }

    /// Snapshot for this frame, with the player's steering preferences applied
    pub fn tick_input(&self, settings: &Settings) -> TickInput {
        let (left, right) = if settings.invert_steering {
            (self.right_held, self.left_held)
        } else {
            (self.left_held, self.right_held)
        };
        TickInput {
            left,
            right,
            lateral_offset: self.joystick_x * settings.steering_sensitivity * settings.steering_sign(),
            autopilot: self.autopilot,
            still_camera: settings.reduced_motion,
        }
    }
}
