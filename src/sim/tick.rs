//! Frame driver
//!
//! One call to [`tick`] per display refresh. Within a tick the order is fixed:
//! steer the rocket, scroll/spawn/evict the world, resolve collisions, check
//! for course completion, age debris, then advance every animation on its own
//! clock. Phase transitions that wait on an animation are taken here, by
//! checking whether the clip has finished.

use glam::{EulerRot, Quat, Vec3};

use super::anim::{AnimationPlayer, Clip, QuatTrack, VectorTrack};
use super::catalog::CatalogError;
use super::collision;
use super::debris;
use super::state::{GameEvent, GamePhase, GameState, LevelOutcome};
use super::world::ObstacleKind;
use crate::consts::*;
use crate::look_rotation;

/// How far ahead of the rocket the autopilot looks for the next row
const AUTOPILOT_LOOKAHEAD: f32 = 150.0;

/// Input for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Steer left (arrow key held)
    pub left: bool,
    /// Steer right (arrow key held)
    pub right: bool,
    /// Analog joystick offset, roughly [-1, 1], added on top of the keys
    pub lateral_offset: f32,
    /// Demo mode - the rocket steers itself
    pub autopilot: bool,
    /// Reduced motion: hold the establishing shot instead of orbiting
    pub still_camera: bool,
}

/// Advance the game by one frame. `now` is the wall clock in seconds and only
/// feeds the per-object animation clocks.
pub fn tick(state: &mut GameState, input: &TickInput, now: f64) {
    if !state.config.ready {
        return;
    }
    state.time_ticks += 1;

    if state.phase == GamePhase::Running {
        steer_rocket(state, input);
    }

    if state.config.rocket_moving {
        let tuning = &state.tuning;
        state.config.speed += tuning.speed_ramp;
        state.config.course_progress += state.config.speed;
        state
            .events
            .push(GameEvent::Progress(state.config.course_fraction()));

        state.world.advance(state.config.speed, &state.tuning);
        if !state.config.level_over
            && let Err(err) = state.world.spawn_at_horizon(
                &mut state.config,
                &state.catalog,
                &state.tuning,
                &mut state.rng,
            )
        {
            log::error!("Horizon spawn failed: {}", err);
        }
        state.world.evict(&state.tuning);

        collision::detect_collisions(state);
    }

    if state.config.rocket_moving
        && state.config.course_progress >= state.config.course_length
        && !state.rocket.flying_away
    {
        end_level(state, LevelOutcome::Completed);
    }

    if state.config.level_over {
        state.config.speed = (state.config.speed - state.tuning.speed_decay).max(0.0);
    }

    debris::update(&mut state.debris, state.rocket.position, &state.tuning);

    advance_animations(state, input, now);

    state.water.time += FRAME_DT as f32;
    if state.config.rocket_moving {
        state.water.scroll += state.config.speed / 50.0;
    }
}

/// Lateral update: keys (or autopilot), then joystick, then clamp
fn steer_rocket(state: &mut GameState, input: &TickInput) {
    let step = state.tuning.key_steer_step;
    let mut left = input.left;
    let mut right = input.right;

    if input.autopilot
        && let Some(target) = autopilot_target(state)
    {
        let delta = target - state.rocket.position.x;
        left = delta < -step * 0.5;
        right = delta > step * 0.5;
    }

    let mut x = state.rocket.position.x;
    if left {
        x -= step;
    }
    if right {
        x += step;
    }
    x += input.lateral_offset;
    state.rocket.position.x = x.clamp(state.tuning.lateral_min, state.tuning.lateral_max);
}

/// Lane the autopilot wants for the next row ahead: the nearest pickup, or
/// failing that the nearest lane without a rock
fn autopilot_target(state: &GameState) -> Option<f32> {
    let rocket = state.rocket.position;
    let row = state
        .world
        .rows
        .iter()
        .filter(|r| r.z < rocket.z && r.z > rocket.z - AUTOPILOT_LOOKAHEAD)
        .max_by(|a, b| a.z.total_cmp(&b.z))?;

    let distance = |cell: usize| (state.tuning.cell_offset(cell) - rocket.x).abs();
    let pickup = row
        .obstacles()
        .filter(|(_, o)| o.kind != ObstacleKind::Rock)
        .map(|(cell, _)| cell)
        .min_by(|&a, &b| distance(a).total_cmp(&distance(b)));
    let cell = pickup.or_else(|| {
        (0..ROW_CELLS)
            .filter(|&c| !row.cells[c].as_ref().is_some_and(|o| o.kind == ObstacleKind::Rock))
            .min_by(|&a, &b| distance(a).total_cmp(&distance(b)))
    })?;
    Some(state.tuning.cell_offset(cell))
}

/// Advance one animation slot, applying its pose. Returns true on the tick the
/// clip finishes; the player is dropped then and the last pose is kept.
fn advance_player(
    slot: &mut Option<AnimationPlayer>,
    position: &mut Vec3,
    rotation: &mut Quat,
    now: f64,
) -> bool {
    let Some(player) = slot else {
        return false;
    };
    let pose = player.advance(now);
    if let Some(p) = pose.position {
        *position = p;
    }
    if let Some(r) = pose.rotation {
        *rotation = r;
    }
    if player.is_finished() {
        *slot = None;
        true
    } else {
        false
    }
}

fn advance_animations(state: &mut GameState, input: &TickInput, now: f64) {
    let camera_done = advance_player(
        &mut state.camera.animation,
        &mut state.camera.position,
        &mut state.camera.rotation,
        now,
    );
    let rocket_done = advance_player(
        &mut state.rocket.animation,
        &mut state.rocket.position,
        &mut state.rocket.rotation,
        now,
    );
    debris::animate(&mut state.debris, now);

    match state.phase {
        GamePhase::PreStart if input.still_camera => {
            state.camera.rotation = look_rotation(state.camera.position, state.rocket.position);
        }
        GamePhase::PreStart => orbit_camera(state),
        GamePhase::IntroCamera if camera_done => launch(state),
        GamePhase::LevelOver { outcome } if rocket_done => {
            let report = state.config.report(outcome);
            state.phase = GamePhase::LevelEndScreen { outcome };
            state.events.push(GameEvent::LevelEndScreen(report));
        }
        _ => {}
    }

    // Once the look-at clip is done the camera follows the rocket home
    if state.rocket.flying_away && state.camera.animation.is_none() {
        state.camera.rotation = look_rotation(state.camera.position, state.rocket.position);
    }
}

/// Establishing shot: circle the rocket until the player starts
fn orbit_camera(state: &mut GameState) {
    let tuning = &state.tuning;
    let camera = &mut state.camera;
    let center = state.rocket.position;
    camera.position = Vec3::new(
        center.x + tuning.orbit_radius * camera.orbit_angle.cos(),
        tuning.orbit_height,
        center.z + tuning.orbit_radius * camera.orbit_angle.sin(),
    );
    camera.rotation = look_rotation(camera.position, center);
    camera.orbit_angle += tuning.orbit_step;
}

/// Intro finished: face down the course and get moving
fn launch(state: &mut GameState) {
    state.camera.rotation = look_rotation(state.camera.position, CAMERA_RUN_TARGET);
    state.config.rocket_moving = true;
    state.phase = GamePhase::Running;
    state.events.push(GameEvent::RocketLaunched);
    log::info!("Rocket launched on level {}", state.config.level);
}

fn intro_clip(state: &GameState) -> Clip {
    let tuning = &state.tuning;
    let camera = &state.camera;
    let keys = vec![0.0, tuning.intro_track_secs];
    let position = VectorTrack::new(keys.clone(), vec![camera.position, CAMERA_CHASE]).smooth();
    let rotation = QuatTrack::new(
        keys,
        vec![
            camera.rotation,
            Quat::from_axis_angle(Vec3::NEG_X, CAMERA_CHASE_TILT),
        ],
    );
    Clip::new("animate-in", tuning.intro_clip_secs)
        .with_position(position)
        .with_rotation(rotation)
}

fn look_at_rocket_clip(state: &GameState) -> Clip {
    let camera = &state.camera;
    let target = look_rotation(camera.position, state.rocket.position);
    let rotation = QuatTrack::new(
        vec![0.0, state.tuning.camera_look_secs],
        vec![camera.rotation, target],
    );
    Clip::new("look-at-rocket", state.tuning.camera_look_secs).with_rotation(rotation)
}

fn fly_away_clip(state: &GameState) -> Clip {
    let rocket = &state.rocket;
    let position = VectorTrack::new(
        vec![2.0, 3.0, 5.0],
        vec![rocket.position, FLY_AWAY_WAYPOINT, FLY_AWAY_DESTINATION],
    );
    // Authored as raw Euler values, not degrees
    let banked = Quat::from_euler(EulerRot::XYZ, -90.0, 0.0, -90.0);
    let rotation = QuatTrack::new(vec![0.0, 2.0], vec![rocket.rotation, banked]);
    Clip::new("fly-away", state.tuning.fly_away_clip_secs)
        .with_position(position)
        .with_rotation(rotation)
}

/// Lay out a fresh level and park everything at the start
pub fn setup_level(state: &mut GameState, level: u32) -> Result<(), CatalogError> {
    let level = level.max(1);
    let config = &mut state.config;
    config.level = level;
    config.course_length = state.tuning.course_length(level);
    config.course_progress = 0.0;
    config.speed = state.tuning.level_start_speed(level);
    config.crystals = 0;
    config.shields = 0;
    config.shield_danger = false;
    config.level_over = false;
    config.rocket_moving = false;

    state
        .world
        .setup(&mut state.config, &state.catalog, &state.tuning, &mut state.rng)?;
    state.rocket.reset();
    state.camera.reset();
    state.debris.clear();
    state.phase = GamePhase::PreStart;

    state.events.extend([
        GameEvent::LevelSetup { level },
        GameEvent::Progress(0.0),
        GameEvent::CrystalCount(0),
        GameEvent::ShieldCount(0),
        GameEvent::ShieldDanger(false),
    ]);
    log::info!(
        "Level {} set up: course length {}, starting speed {:.2}",
        level,
        state.config.course_length,
        state.config.speed
    );
    Ok(())
}

/// Stop the run and start the fly-away. Calling it again is a no-op.
pub fn end_level(state: &mut GameState, outcome: LevelOutcome) {
    if state.config.level_over {
        return;
    }
    state.config.rocket_moving = false;
    state.config.level_over = true;
    state.rocket.flying_away = true;
    state.debris.clear();

    state.camera.animation = Some(AnimationPlayer::new(look_at_rocket_clip(state)));
    state.rocket.animation = Some(AnimationPlayer::new(fly_away_clip(state)));
    state.phase = GamePhase::LevelOver { outcome };

    let report = state.config.report(outcome);
    state.events.push(GameEvent::LevelOver(report));
    log::info!(
        "Level {} over ({:?}): {} crystals, {} shields",
        report.level,
        outcome,
        report.crystals,
        report.shields
    );
}

/// Start the intro camera flight. Only valid before the level has started.
pub fn start_game(state: &mut GameState) -> bool {
    if state.phase != GamePhase::PreStart || !state.config.ready {
        log::warn!("start_game ignored in {:?}", state.phase);
        return false;
    }
    state.camera.animation = Some(AnimationPlayer::new(intro_clip(state)));
    state.phase = GamePhase::IntroCamera;
    state.events.push(GameEvent::GameStarted);
    log::info!("Starting level {}", state.config.level);
    true
}

/// Move on after a completed level
pub fn next_level(state: &mut GameState) -> bool {
    if state.phase
        != (GamePhase::LevelEndScreen {
            outcome: LevelOutcome::Completed,
        })
    {
        log::warn!("next_level ignored in {:?}", state.phase);
        return false;
    }
    let level = state.config.level + 1;
    set_up_or_log(state, level)
}

/// Start over from level 1 after either outcome
pub fn restart_from_level_1(state: &mut GameState) -> bool {
    if !matches!(state.phase, GamePhase::LevelEndScreen { .. }) {
        log::warn!("restart ignored in {:?}", state.phase);
        return false;
    }
    set_up_or_log(state, 1)
}

fn set_up_or_log(state: &mut GameState, level: u32) -> bool {
    match setup_level(state, level) {
        Ok(()) => true,
        Err(err) => {
            log::error!("Level {} setup failed: {}", level, err);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::test_state;
    use crate::sim::world::{ChallengeRow, Obstacle};
    use crate::tuning::Tuning;
    use proptest::prelude::*;

    /// Wall clock stepped one nominal frame per tick
    struct Driver {
        now: f64,
    }

    impl Driver {
        fn new() -> Self {
            Self { now: 100.0 }
        }

        fn step(&mut self, state: &mut GameState, input: &TickInput) {
            self.now += FRAME_DT;
            tick(state, input, self.now);
        }

        fn run_until(
            &mut self,
            state: &mut GameState,
            input: &TickInput,
            max_ticks: usize,
            done: impl Fn(&GameState) -> bool,
        ) -> bool {
            for _ in 0..max_ticks {
                self.step(state, input);
                if done(state) {
                    return true;
                }
            }
            false
        }
    }

    fn launched(seed: u64) -> (GameState, Driver) {
        let mut state = test_state(seed);
        let mut driver = Driver::new();
        assert!(start_game(&mut state));
        assert!(driver.run_until(&mut state, &TickInput::default(), 400, |s| {
            s.phase == GamePhase::Running
        }));
        (state, driver)
    }

    fn finish_level(state: &mut GameState, driver: &mut Driver) {
        state.config.course_progress = state.config.course_length;
        driver.step(state, &TickInput::default());
        assert!(driver.run_until(state, &TickInput::default(), 600, |s| {
            matches!(s.phase, GamePhase::LevelEndScreen { .. })
        }));
    }

    fn level_over_events(events: &[GameEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, GameEvent::LevelOver(_)))
            .count()
    }

    #[test]
    fn test_pre_start_orbits_without_moving() {
        let mut state = test_state(1);
        let mut driver = Driver::new();
        let rows_before = state.world.rows.clone();
        for _ in 0..10 {
            driver.step(&mut state, &TickInput { left: true, ..Default::default() });
        }
        assert_eq!(state.phase, GamePhase::PreStart);
        assert_eq!(state.world.rows, rows_before);
        assert_eq!(state.rocket.position, ROCKET_START);
        assert!((state.camera.orbit_angle - 0.05).abs() < 1e-5);
        assert!((state.camera.position.y - 30.0).abs() < 1e-5);
        let flat = Vec3::new(state.camera.position.x, 0.0, state.camera.position.z);
        assert!((flat.distance(Vec3::new(0.0, 0.0, 70.0)) - 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_still_camera_holds_start_pose_into_intro() {
        let mut state = test_state(1);
        let mut driver = Driver::new();
        let still = TickInput {
            still_camera: true,
            ..Default::default()
        };
        for _ in 0..10 {
            driver.step(&mut state, &still);
        }
        assert_eq!(state.camera.position, CAMERA_START);
        assert_eq!(state.camera.orbit_angle, 0.0);
        let forward = state.camera.rotation * Vec3::NEG_Z;
        let to_rocket = (state.rocket.position - CAMERA_START).normalize();
        assert!((forward - to_rocket).length() < 1e-4);

        // The intro leaves from the pose that was on screen
        assert!(start_game(&mut state));
        driver.step(&mut state, &still);
        assert!((state.camera.position - CAMERA_START).length() < 1e-4);
    }

    #[test]
    fn test_intro_runs_then_launches() {
        let mut state = test_state(2);
        let mut driver = Driver::new();
        assert!(start_game(&mut state));
        assert!(!start_game(&mut state));
        assert_eq!(state.phase, GamePhase::IntroCamera);

        // 4 s clip at 60 fps, plus the tick that starts the clock
        for _ in 0..200 {
            driver.step(&mut state, &TickInput::default());
        }
        assert_eq!(state.phase, GamePhase::IntroCamera);
        assert!(!state.config.rocket_moving);
        assert!((state.camera.position - CAMERA_CHASE).length() < 1e-3);

        assert!(driver.run_until(&mut state, &TickInput::default(), 60, |s| {
            s.phase == GamePhase::Running
        }));
        assert!(state.config.rocket_moving);
        assert!(state.events.contains(&GameEvent::RocketLaunched));
        let forward = state.camera.rotation * Vec3::NEG_Z;
        let expected = (CAMERA_RUN_TARGET - state.camera.position).normalize();
        assert!((forward - expected).length() < 1e-3);
    }

    #[test]
    fn test_running_ramps_speed_and_progress() {
        let (mut state, mut driver) = launched(3);
        let speed = state.config.speed;
        let progress = state.config.course_progress;
        driver.step(&mut state, &TickInput::default());
        assert!((state.config.speed - (speed + 0.001)).abs() < 1e-6);
        assert!((state.config.course_progress - (progress + state.config.speed)).abs() < 1e-4);
        assert!(state.water.scroll > 0.0);
    }

    #[test]
    fn test_steering_keys_and_clamp() {
        let (mut state, mut driver) = launched(4);
        driver.step(&mut state, &TickInput { right: true, ..Default::default() });
        assert!((state.rocket.position.x - 0.5).abs() < 1e-6);
        driver.step(
            &mut state,
            &TickInput {
                left: true,
                lateral_offset: -0.25,
                ..Default::default()
            },
        );
        assert!((state.rocket.position.x + 0.25).abs() < 1e-6);

        driver.step(&mut state, &TickInput { lateral_offset: 100.0, ..Default::default() });
        assert_eq!(state.rocket.position.x, 25.0);
        driver.step(&mut state, &TickInput { lateral_offset: -100.0, ..Default::default() });
        assert_eq!(state.rocket.position.x, -20.0);
    }

    #[test]
    fn test_autopilot_heads_for_pickup() {
        let (mut state, mut driver) = launched(5);
        state.world.rows.clear();
        let mut instance = state.catalog.instantiate(ObstacleKind::Crystal.template()).unwrap();
        instance.transform.translation.x = state.tuning.cell_offset(3);
        let mut row = ChallengeRow {
            index: 900,
            z: state.rocket.position.z - 100.0,
            cells: Default::default(),
        };
        row.cells[3] = Some(Obstacle {
            id: 9000,
            kind: ObstacleKind::Crystal,
            instance,
        });
        state.world.rows.push_front(row);

        let x = state.rocket.position.x;
        driver.step(&mut state, &TickInput { autopilot: true, ..Default::default() });
        assert!(state.rocket.position.x > x);
    }

    #[test]
    fn test_scenario_a_level_one_setup() {
        let state = test_state(10);
        assert_eq!(state.config.level, 1);
        assert_eq!(state.config.course_length, 1000.0);
        assert_eq!(state.config.speed, 0.0);
        assert_eq!(state.world.rows.len(), 60);
        assert_eq!(state.world.background.len(), 60);
    }

    #[test]
    fn test_scenario_b_next_level_from_three() {
        let mut state = test_state(11);
        setup_level(&mut state, 3).unwrap();
        state.config.crystals = 7;
        state.config.shields = 2;
        state.phase = GamePhase::LevelEndScreen {
            outcome: LevelOutcome::Completed,
        };

        assert!(next_level(&mut state));
        assert_eq!(state.config.level, 4);
        assert_eq!(state.config.course_length, 4000.0);
        assert_eq!(state.config.crystals, 0);
        assert_eq!(state.config.shields, 0);
        assert!((state.config.speed - 0.3).abs() < 1e-6);
        assert_eq!(state.phase, GamePhase::PreStart);
        assert!(state.events.contains(&GameEvent::LevelSetup { level: 4 }));
    }

    #[test]
    fn test_scenario_c_rock_at_zero_shields() {
        let (mut state, mut driver) = launched(12);
        state.world.rows.clear();
        let mut instance = state.catalog.instantiate(ObstacleKind::Rock.template()).unwrap();
        instance.transform.translation.x = state.tuning.cell_offset(2);
        state.rocket.position.x = 2.0;
        let mut row = ChallengeRow {
            index: 500,
            // Lands on the rocket after this tick's scroll
            z: state.rocket.position.z - state.config.speed - 0.001,
            cells: Default::default(),
        };
        row.cells[2] = Some(Obstacle {
            id: 5000,
            kind: ObstacleKind::Rock,
            instance,
        });
        state.world.rows.push_front(row);

        driver.step(&mut state, &TickInput::default());
        assert_eq!(state.config.shields, -1);
        assert!(state.config.shield_danger);
        assert_eq!(state.phase, GamePhase::Running);
    }

    #[test]
    fn test_scenario_d_fifth_rock_ends_level() {
        let (mut state, mut driver) = launched(13);
        state.world.rows.clear();
        state.config.shields = -4;
        let mut instance = state.catalog.instantiate(ObstacleKind::Rock.template()).unwrap();
        instance.transform.translation.x = state.tuning.cell_offset(2);
        state.rocket.position.x = 2.0;
        let mut row = ChallengeRow {
            index: 501,
            z: state.rocket.position.z - state.config.speed - 0.001,
            cells: Default::default(),
        };
        row.cells[2] = Some(Obstacle {
            id: 5001,
            kind: ObstacleKind::Rock,
            instance,
        });
        state.world.rows.push_front(row);

        driver.step(&mut state, &TickInput::default());
        assert_eq!(state.config.shields, -5);
        assert_eq!(
            state.phase,
            GamePhase::LevelOver {
                outcome: LevelOutcome::Damaged
            }
        );
        assert!(state.rocket.flying_away);
        assert!(!state.config.rocket_moving);
    }

    #[test]
    fn test_scenario_e_completion_fires_once() {
        let (mut state, mut driver) = launched(14);
        state.events.clear();
        // This tick's step carries progress just past the finish line
        state.config.course_progress =
            state.config.course_length - state.config.speed - state.tuning.speed_ramp * 0.5;
        let before = state.config.course_progress;
        assert!(before < state.config.course_length);
        driver.step(&mut state, &TickInput::default());

        assert_eq!(
            state.phase,
            GamePhase::LevelOver {
                outcome: LevelOutcome::Completed
            }
        );
        assert!(state.rocket.flying_away);
        assert_eq!(level_over_events(&state.events), 1);

        for _ in 0..30 {
            driver.step(&mut state, &TickInput::default());
        }
        assert_eq!(level_over_events(&state.events), 1);
    }

    #[test]
    fn test_level_over_decays_speed_and_clears_debris() {
        let (mut state, mut driver) = launched(15);
        state.config.speed = 0.35;
        debris::spawn_burst(&mut state.debris, state.rocket.position, Vec3::ZERO, &state.tuning);
        end_level(&mut state, LevelOutcome::Completed);
        assert!(state.debris.is_empty());

        driver.step(&mut state, &TickInput::default());
        assert!((state.config.speed - 0.25).abs() < 1e-6);
        for _ in 0..5 {
            driver.step(&mut state, &TickInput::default());
        }
        assert_eq!(state.config.speed, 0.0);
    }

    #[test]
    fn test_fly_away_reaches_mothership_then_end_screen() {
        let (mut state, mut driver) = launched(16);
        finish_level(&mut state, &mut driver);

        assert_eq!(
            state.phase,
            GamePhase::LevelEndScreen {
                outcome: LevelOutcome::Completed
            }
        );
        assert!((state.rocket.position - FLY_AWAY_DESTINATION).length() < 1e-3);
        assert!(state.rocket.animation.is_none());
        let forward = state.camera.rotation * Vec3::NEG_Z;
        let expected = (state.rocket.position - state.camera.position).normalize();
        assert!((forward - expected).length() < 1e-3);
        assert!(
            state
                .events
                .iter()
                .any(|e| matches!(e, GameEvent::LevelEndScreen(r) if r.level == 1))
        );
    }

    #[test]
    fn test_next_level_refused_after_damage() {
        let mut state = test_state(17);
        state.phase = GamePhase::LevelEndScreen {
            outcome: LevelOutcome::Damaged,
        };
        assert!(!next_level(&mut state));
        assert!(restart_from_level_1(&mut state));
        assert_eq!(state.config.level, 1);
        assert_eq!(state.phase, GamePhase::PreStart);
    }

    #[test]
    fn test_commands_rejected_mid_level() {
        let (mut state, _) = launched(18);
        assert!(!next_level(&mut state));
        assert!(!restart_from_level_1(&mut state));
        assert!(!start_game(&mut state));
        assert_eq!(state.phase, GamePhase::Running);
    }

    #[test]
    fn test_restart_resets_level_and_speed() {
        let (mut state, mut driver) = launched(19);
        finish_level(&mut state, &mut driver);
        assert!(next_level(&mut state));
        assert_eq!(state.config.level, 2);
        assert!(start_game(&mut state));
        assert!(driver.run_until(&mut state, &TickInput::default(), 400, |s| {
            s.phase == GamePhase::Running
        }));
        finish_level(&mut state, &mut driver);

        assert!(restart_from_level_1(&mut state));
        assert_eq!(state.config.level, 1);
        assert_eq!(state.config.course_length, 1000.0);
        assert_eq!(state.config.speed, 0.0);
        assert_eq!(state.rocket.position, ROCKET_START);
        assert!(!state.rocket.flying_away);
        assert!(state.world.starter_bay.is_some());
    }

    #[test]
    fn test_determinism() {
        let (mut a, mut da) = launched(77);
        let (mut b, mut db) = launched(77);
        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };
        for _ in 0..500 {
            da.step(&mut a, &input);
            db.step(&mut b, &input);
        }
        assert_eq!(a.config, b.config);
        assert_eq!(a.world.rows, b.world.rows);
        assert_eq!(a.rocket.position, b.rocket.position);
    }

    #[test]
    fn test_unready_state_does_not_tick() {
        let mut state = test_state(20);
        state.config.ready = false;
        tick(&mut state, &TickInput::default(), 1.0);
        assert_eq!(state.time_ticks, 0);
    }

    fn input_strategy() -> impl Strategy<Value = TickInput> {
        (any::<bool>(), any::<bool>(), -1.0f32..1.0, any::<bool>()).prop_map(
            |(left, right, lateral_offset, autopilot)| TickInput {
                left,
                right,
                lateral_offset,
                autopilot,
                still_camera: false,
            },
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(12))]

        #[test]
        fn prop_run_invariants(
            seed in any::<u64>(),
            start_speed in 0.5f32..3.0,
            inputs in prop::collection::vec(input_strategy(), 50..120),
        ) {
            let (mut state, mut driver) = launched(seed);
            // Make the rocks hurt so some runs end damaged
            state.tuning = Tuning {
                odds: crate::tuning::ObstacleOdds { crystal_below: 1.0, rock_below: 6.0, ..Default::default() },
                ..state.tuning.clone()
            };
            state.config.speed = start_speed;
            state.events.clear();

            let mut hit_ids = std::collections::HashSet::new();
            let mut prev_progress = state.config.course_progress;
            let mut prev_speed = state.config.speed;

            for i in 0..1200 {
                let input = &inputs[i % inputs.len()];
                let was_running = state.phase == GamePhase::Running;
                driver.step(&mut state, input);

                // Eviction bound
                prop_assert!(state.world.rows.iter().all(|r| r.z <= state.tuning.eviction_z));
                prop_assert!(state.world.background.iter().all(|u| u.z() <= state.tuning.eviction_z));

                // Spawn monotonicity
                prop_assert_eq!(
                    state.world.rows.len() as u32 + state.world.rows_evicted,
                    state.config.rows_spawned
                );
                prop_assert_eq!(
                    state.world.background.len() as u32 + state.world.backgrounds_evicted,
                    state.config.background_spawned
                );

                // Shield bound
                prop_assert!(state.config.shields >= state.tuning.shield_floor);
                prop_assert!(state.config.shields <= state.tuning.shield_ceiling);
                if state.config.shields == state.tuning.shield_floor {
                    prop_assert!(state.config.level_over);
                }

                // Idempotent hit
                for event in state.drain_events() {
                    if let GameEvent::ObstacleHit { id, .. } = event {
                        prop_assert!(hit_ids.insert(id), "obstacle {} scored twice", id);
                    }
                }

                // Progress and speed monotonicity
                if was_running && state.phase == GamePhase::Running {
                    prop_assert!(state.config.course_progress >= prev_progress);
                    prop_assert!(state.config.speed >= prev_speed);
                }
                if matches!(state.phase, GamePhase::LevelOver { .. }) {
                    prop_assert!(state.config.speed >= 0.0);
                    if state.config.level_over && !was_running {
                        prop_assert!(state.config.speed <= prev_speed);
                    }
                }
                prev_progress = state.config.course_progress;
                prev_speed = state.config.speed;
            }
        }

        #[test]
        fn prop_streaming_window(
            seed in any::<u64>(),
            start_speed in 3.0f32..6.0,
            inputs in prop::collection::vec(input_strategy(), 50..120),
        ) {
            let (mut state, mut driver) = launched(seed);
            // No rocks and a long course: the run only ends by running out of ticks
            state.tuning = Tuning {
                odds: crate::tuning::ObstacleOdds { crystal_below: 2.0, rock_below: 2.0, ..Default::default() },
                ..state.tuning.clone()
            };
            state.config.course_length = 20_000.0;
            state.config.speed = start_speed;

            for i in 0..1500 {
                driver.step(&mut state, &inputs[i % inputs.len()]);
                prop_assert_eq!(state.phase, GamePhase::Running);

                prop_assert!(state.world.rows.iter().all(|r| r.z <= state.tuning.eviction_z));
                prop_assert!(state.world.background.iter().all(|u| u.z() <= state.tuning.eviction_z));
                prop_assert_eq!(
                    state.world.rows.len() as u32 + state.world.rows_evicted,
                    state.config.rows_spawned
                );
                prop_assert_eq!(
                    state.world.background.len() as u32 + state.world.backgrounds_evicted,
                    state.config.background_spawned
                );
                prop_assert!(!state.world.rows.is_empty());
                prop_assert!(!state.world.background.is_empty());
            }

            // Well past the initial fill: horizon spawns and evictions both happened
            let fill = state.tuning.fill_count;
            prop_assert!(state.config.rows_spawned > fill + 5, "rows spawned {}", state.config.rows_spawned);
            prop_assert!(state.config.background_spawned > fill + 5);
            prop_assert!(state.world.rows_evicted > 0);
        }
    }
}
