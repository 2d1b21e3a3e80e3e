//! HUD contract
//!
//! The simulation never touches the page. It queues [`GameEvent`]s and the
//! frame driver forwards them to a [`Hud`] implementation once per frame.

use crate::sim::{GameEvent, LevelOutcome, LevelReport};

/// Heads-up display setters. Write-only: nothing is ever read back.
pub trait Hud {
    /// Course progress, 0..1
    fn set_progress_bar_fraction(&mut self, fraction: f32);
    fn set_crystal_count(&mut self, count: u32);
    fn set_shield_count(&mut self, count: i32);
    fn set_shield_danger(&mut self, danger: bool);
    fn show_level_end_screen(&mut self, report: &LevelReport);
    fn show_start_panel(&mut self);
    /// Hide the start panel and bring up the in-flight HUD
    fn hide_start_panel(&mut self) {}
    fn set_level_indicator(&mut self, text: &str);
}

/// Route one simulation event to the HUD. Events with no HUD counterpart
/// (hits, launch, level over) are ignored here.
pub fn apply_event(event: &GameEvent, hud: &mut impl Hud) {
    match event {
        GameEvent::LevelSetup { level } => {
            hud.set_level_indicator(&level_indicator(*level));
            hud.show_start_panel();
        }
        GameEvent::GameStarted => hud.hide_start_panel(),
        GameEvent::Progress(fraction) => hud.set_progress_bar_fraction(*fraction),
        GameEvent::CrystalCount(n) => hud.set_crystal_count(*n),
        GameEvent::ShieldCount(n) => hud.set_shield_count(*n),
        GameEvent::ShieldDanger(danger) => hud.set_shield_danger(*danger),
        GameEvent::LevelEndScreen(report) => hud.show_level_end_screen(report),
        GameEvent::RocketLaunched | GameEvent::ObstacleHit { .. } | GameEvent::LevelOver(_) => {}
    }
}

pub fn level_indicator(level: u32) -> String {
    format!("LEVEL {}", level)
}

/// Status line for the end-of-level panel
pub fn ship_status(report: &LevelReport) -> &'static str {
    if report.outcome == LevelOutcome::Damaged {
        return "Your ship has hit too many rocks and is too damaged to continue! \
                We have another one you can use but you'll have to start over...";
    }
    match report.shields {
        5.. => "Your ship is in pristine condition!",
        1..=4 => "Your ship is in pretty good condition.",
        0 => "Your ship is in the same condition as when you left.",
        _ => "Your ship is in pretty bad shape. We'll patch it up, but try to hit less rocks.",
    }
}

/// Whether the end panel offers "next level" (otherwise only "start over")
pub fn offers_next_level(report: &LevelReport) -> bool {
    report.outcome == LevelOutcome::Completed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingHud {
        calls: Vec<String>,
    }

    impl Hud for RecordingHud {
        fn set_progress_bar_fraction(&mut self, fraction: f32) {
            self.calls.push(format!("progress {fraction}"));
        }
        fn set_crystal_count(&mut self, count: u32) {
            self.calls.push(format!("crystals {count}"));
        }
        fn set_shield_count(&mut self, count: i32) {
            self.calls.push(format!("shields {count}"));
        }
        fn set_shield_danger(&mut self, danger: bool) {
            self.calls.push(format!("danger {danger}"));
        }
        fn show_level_end_screen(&mut self, report: &LevelReport) {
            self.calls.push(format!("end {}", report.level));
        }
        fn show_start_panel(&mut self) {
            self.calls.push("start panel".into());
        }
        fn set_level_indicator(&mut self, text: &str) {
            self.calls.push(text.into());
        }
    }

    fn report(outcome: LevelOutcome, shields: i32) -> LevelReport {
        LevelReport {
            level: 2,
            outcome,
            crystals: 4,
            shields,
        }
    }

    #[test]
    fn test_level_setup_drives_indicator_and_panel() {
        let mut hud = RecordingHud::default();
        let mut state = crate::sim::state::test_state(1);
        for event in state.drain_events() {
            apply_event(&event, &mut hud);
        }
        assert_eq!(
            hud.calls,
            vec![
                "LEVEL 1",
                "start panel",
                "progress 0",
                "crystals 0",
                "shields 0",
                "danger false"
            ]
        );
    }

    #[test]
    fn test_end_screen_forwarded() {
        let mut hud = RecordingHud::default();
        apply_event(
            &GameEvent::LevelEndScreen(report(LevelOutcome::Completed, 1)),
            &mut hud,
        );
        apply_event(&GameEvent::RocketLaunched, &mut hud);
        assert_eq!(hud.calls, vec!["end 2"]);
    }

    #[test]
    fn test_ship_status_thresholds() {
        assert!(ship_status(&report(LevelOutcome::Damaged, -5)).contains("too damaged"));
        assert!(ship_status(&report(LevelOutcome::Completed, 5)).contains("pristine"));
        assert!(ship_status(&report(LevelOutcome::Completed, 1)).contains("pretty good"));
        assert!(ship_status(&report(LevelOutcome::Completed, 0)).contains("same condition"));
        assert!(ship_status(&report(LevelOutcome::Completed, -3)).contains("bad shape"));
        assert!(!offers_next_level(&report(LevelOutcome::Damaged, -5)));
    }
}
