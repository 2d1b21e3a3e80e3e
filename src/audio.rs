//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects - no external files needed!
//! Effects are picked from simulation events; the synth itself only exists
//! on wasm.

use crate::sim::{GameEvent, LevelOutcome, ObstacleKind};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Intro camera done, engines lit
    Launch,
    /// Crystal collected
    CrystalCollect,
    /// Shield restored
    ShieldCollect,
    /// Rock hit the hull
    RockImpact,
    /// Course finished
    LevelComplete,
    /// Shields gone
    ShipDestroyed,
    /// New best haul
    HighScore,
}

impl SoundEffect {
    /// Effect for a simulation event, if it has one
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::RocketLaunched => Some(SoundEffect::Launch),
            GameEvent::ObstacleHit { kind, .. } => Some(match kind {
                ObstacleKind::Crystal => SoundEffect::CrystalCollect,
                ObstacleKind::Shield => SoundEffect::ShieldCollect,
                ObstacleKind::Rock => SoundEffect::RockImpact,
            }),
            GameEvent::LevelOver(report) => Some(match report.outcome {
                LevelOutcome::Completed => SoundEffect::LevelComplete,
                LevelOutcome::Damaged => SoundEffect::ShipDestroyed,
            }),
            _ => None,
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use synth::AudioManager;

#[cfg(target_arch = "wasm32")]
mod synth {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::SoundEffect;
    use crate::settings::Settings;

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        volume: f32,
    }

    impl AudioManager {
        pub fn new(settings: &Settings) -> Self {
            // Try to create audio context (may fail if not in secure context)
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                volume: settings.effective_sfx_volume(),
            }
        }

        /// Pick up volume/mute changes
        pub fn apply_settings(&mut self, settings: &Settings) {
            self.volume = settings.effective_sfx_volume();
        }

        /// Silence everything until the next `apply_settings`
        pub fn silence(&mut self) {
            self.volume = 0.0;
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        /// Play a sound effect
        pub fn play(&self, effect: SoundEffect) {
            let vol = self.volume;
            if vol <= 0.0 {
                return;
            }

            let Some(ctx) = &self.ctx else { return };

            // Resume context if suspended (browsers require user gesture)
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match effect {
                SoundEffect::Launch => self.play_launch(ctx, vol),
                SoundEffect::CrystalCollect => self.play_crystal(ctx, vol),
                SoundEffect::ShieldCollect => self.play_shield(ctx, vol),
                SoundEffect::RockImpact => self.play_rock_impact(ctx, vol),
                SoundEffect::LevelComplete => self.play_arpeggio(ctx, vol, &[400.0, 500.0, 600.0, 800.0], 0.1),
                SoundEffect::ShipDestroyed => self.play_ship_destroyed(ctx, vol),
                SoundEffect::HighScore => {
                    self.play_arpeggio(ctx, vol, &[500.0, 600.0, 700.0, 800.0, 1000.0], 0.08)
                }
            }
        }

        // === Sound generators ===

        /// Create an oscillator with gain envelope
        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Launch - rising engine roar
        fn play_launch(&self, ctx: &AudioContext, vol: f32) {
            let t = ctx.current_time();

            if let Some((osc, gain)) = self.create_osc(ctx, 80.0, OscillatorType::Sawtooth) {
                gain.gain().set_value_at_time(vol * 0.3, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.8)
                    .ok();
                osc.frequency().set_value_at_time(80.0, t).ok();
                osc.frequency()
                    .exponential_ramp_to_value_at_time(400.0, t + 0.6)
                    .ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.9).ok();
            }

            // Sub rumble
            if let Some((osc, gain)) = self.create_osc(ctx, 40.0, OscillatorType::Sine) {
                gain.gain().set_value_at_time(vol * 0.4, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.6)
                    .ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.7).ok();
            }
        }

        /// Crystal - sparkly chime
        fn play_crystal(&self, ctx: &AudioContext, vol: f32) {
            for (i, freq) in [1200.0, 1800.0, 2400.0].iter().enumerate() {
                let delay = i as f64 * 0.02;
                if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Sine) {
                    let t = ctx.current_time() + delay;
                    gain.gain().set_value_at_time(vol * 0.2, t).ok();
                    gain.gain()
                        .exponential_ramp_to_value_at_time(0.01, t + 0.3)
                        .ok();
                    osc.start_with_when(t).ok();
                    osc.stop_with_when(t + 0.35).ok();
                }
            }
        }

        /// Shield - happy ding
        fn play_shield(&self, ctx: &AudioContext, vol: f32) {
            for (i, freq) in [600.0, 800.0, 1000.0].iter().enumerate() {
                let delay = i as f64 * 0.08;
                if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Sine) {
                    let t = ctx.current_time() + delay;
                    gain.gain().set_value_at_time(vol * 0.25, t).ok();
                    gain.gain()
                        .exponential_ramp_to_value_at_time(0.01, t + 0.15)
                        .ok();
                    osc.start_with_when(t).ok();
                    osc.stop_with_when(t + 0.2).ok();
                }
            }
        }

        /// Rock - boom with a hull clang
        fn play_rock_impact(&self, ctx: &AudioContext, vol: f32) {
            let t = ctx.current_time();

            if let Some((osc, gain)) = self.create_osc(ctx, 100.0, OscillatorType::Sawtooth) {
                gain.gain().set_value_at_time(vol * 0.5, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.4)
                    .ok();
                osc.frequency().set_value_at_time(100.0, t).ok();
                osc.frequency()
                    .exponential_ramp_to_value_at_time(30.0, t + 0.4)
                    .ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.5).ok();
            }

            if let Some((osc, gain)) = self.create_osc(ctx, 400.0, OscillatorType::Square) {
                gain.gain().set_value_at_time(vol * 0.2, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.2)
                    .ok();
                osc.frequency().set_value_at_time(400.0, t).ok();
                osc.frequency().set_value_at_time(300.0, t + 0.05).ok();
                osc.frequency().set_value_at_time(200.0, t + 0.1).ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.25).ok();
            }
        }

        /// Ship destroyed - sad descending
        fn play_ship_destroyed(&self, ctx: &AudioContext, vol: f32) {
            for (i, freq) in [400.0, 350.0, 300.0, 200.0].iter().enumerate() {
                let delay = i as f64 * 0.2;
                if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Sine) {
                    let t = ctx.current_time() + delay;
                    gain.gain().set_value_at_time(vol * 0.3, t).ok();
                    gain.gain()
                        .exponential_ramp_to_value_at_time(0.01, t + 0.3)
                        .ok();
                    osc.start_with_when(t).ok();
                    osc.stop_with_when(t + 0.4).ok();
                }
            }
        }

        /// Rising fanfare
        fn play_arpeggio(&self, ctx: &AudioContext, vol: f32, notes: &[f32], step: f64) {
            for (i, freq) in notes.iter().enumerate() {
                let delay = i as f64 * step;
                if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Triangle) {
                    let t = ctx.current_time() + delay;
                    gain.gain().set_value_at_time(vol * 0.3, t).ok();
                    gain.gain()
                        .exponential_ramp_to_value_at_time(0.01, t + 0.4)
                        .ok();
                    osc.start_with_when(t).ok();
                    osc.stop_with_when(t + 0.5).ok();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::LevelReport;
    use glam::Vec3;

    #[test]
    fn test_hits_map_to_effects() {
        let hit = |kind| GameEvent::ObstacleHit {
            id: 1,
            kind,
            at: Vec3::ZERO,
        };
        assert_eq!(
            SoundEffect::for_event(&hit(ObstacleKind::Rock)),
            Some(SoundEffect::RockImpact)
        );
        assert_eq!(
            SoundEffect::for_event(&hit(ObstacleKind::Crystal)),
            Some(SoundEffect::CrystalCollect)
        );
        assert_eq!(SoundEffect::for_event(&GameEvent::Progress(0.5)), None);
    }

    #[test]
    fn test_level_over_by_outcome() {
        let report = LevelReport {
            level: 1,
            outcome: LevelOutcome::Damaged,
            crystals: 0,
            shields: -5,
        };
        assert_eq!(
            SoundEffect::for_event(&GameEvent::LevelOver(report)),
            Some(SoundEffect::ShipDestroyed)
        );
    }
}
