//! Collision detection and scoring
//!
//! Each running tick the rocket's box is tested against every live obstacle.
//! Hits are collected first, then resolved in row order: the obstacle is taken
//! out of its cell, a debris burst spawns at its centre, and the tally for its
//! kind is updated. Once a hit ends the level, the rest of the sweep is dropped.

use glam::Vec3;

use super::bounds::Aabb;
use super::debris;
use super::state::{GameEvent, GameState, LevelOutcome, SceneConfig};
use super::world::{ObstacleKind, World};
use crate::tuning::Tuning;

/// One rocket/obstacle overlap found this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub row_index: u32,
    pub cell: usize,
    pub obstacle_id: u32,
    pub kind: ObstacleKind,
    /// Centre of the obstacle's box, where the debris burst spawns
    pub center: Vec3,
}

/// Result of applying one hit to the tallies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreOutcome {
    Continue,
    /// Shields hit the floor; the run is over
    ShieldsDepleted,
}

/// Every obstacle overlapping `rocket_box`, in row order
pub fn find_hits(world: &World, rocket_box: &Aabb) -> Vec<Hit> {
    let mut hits = Vec::new();
    for row in &world.rows {
        let origin = row.origin();
        for (cell, obstacle) in row.obstacles() {
            let bounds = obstacle.instance.bounds(origin);
            if bounds.intersects(rocket_box) {
                hits.push(Hit {
                    row_index: row.index,
                    cell,
                    obstacle_id: obstacle.id,
                    kind: obstacle.kind,
                    center: bounds.center(),
                });
            }
        }
    }
    hits
}

/// Update crystal/shield tallies for one collected obstacle
pub fn apply_score(
    config: &mut SceneConfig,
    kind: ObstacleKind,
    tuning: &Tuning,
    events: &mut Vec<GameEvent>,
) -> ScoreOutcome {
    match kind {
        ObstacleKind::Rock => {
            config.shields -= 1;
            config.shield_danger = config.shields <= 0;
            events.push(GameEvent::ShieldCount(config.shields));
            events.push(GameEvent::ShieldDanger(config.shield_danger));
            if config.shields <= tuning.shield_floor {
                return ScoreOutcome::ShieldsDepleted;
            }
        }
        ObstacleKind::Crystal => {
            config.crystals += 1;
            events.push(GameEvent::CrystalCount(config.crystals));
        }
        ObstacleKind::Shield => {
            config.shields = (config.shields + 1).min(tuning.shield_ceiling);
            events.push(GameEvent::ShieldCount(config.shields));
            if config.shields > 0 && config.shield_danger {
                config.shield_danger = false;
                events.push(GameEvent::ShieldDanger(false));
            }
        }
    }
    ScoreOutcome::Continue
}

/// Detect and resolve this tick's collisions. Does nothing once the level is over.
pub fn detect_collisions(state: &mut GameState) {
    if state.config.level_over {
        return;
    }

    let hits = find_hits(&state.world, &state.rocket.bounds());
    for hit in hits {
        if state.config.level_over {
            break;
        }
        if state
            .world
            .take_obstacle(hit.row_index, hit.cell, hit.obstacle_id)
            .is_none()
        {
            continue;
        }

        log::debug!(
            "Hit {:?} (row {}, cell {})",
            hit.kind,
            hit.row_index,
            hit.cell
        );
        debris::spawn_burst(
            &mut state.debris,
            state.rocket.position,
            hit.center,
            &state.tuning,
        );
        state.events.push(GameEvent::ObstacleHit {
            id: hit.obstacle_id,
            kind: hit.kind,
            at: hit.center,
        });

        let outcome = apply_score(&mut state.config, hit.kind, &state.tuning, &mut state.events);
        if outcome == ScoreOutcome::ShieldsDepleted {
            super::tick::end_level(state, LevelOutcome::Damaged);
        }
    }
}
