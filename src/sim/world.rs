//! Streaming world
//!
//! The rocket never moves forward; the world scrolls toward it instead. A
//! rolling window of background scenery and challenge rows is kept alive:
//! new segments appear at the horizon as the newest one scrolls closer, and
//! segments that have passed the rocket are evicted.
//!
//! Both collections are ordered newest-first: index 0 is the segment nearest
//! the horizon, the back is the oldest (largest z).

use std::collections::VecDeque;

use glam::{EulerRot, Quat, Vec3};
use rand::Rng;

use super::catalog::{Catalog, CatalogError, Instance, TemplateKind};
use super::state::SceneConfig;
use crate::consts::{ROW_CELLS, STARTER_BAY_START};
use crate::tuning::{EvictionSweep, ObstacleOdds, Tuning};

/// Collidable obstacle kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObstacleKind {
    /// Costs a shield
    Rock,
    /// Adds to the crystal haul
    Crystal,
    /// Restores a shield
    Shield,
}

impl ObstacleKind {
    pub fn template(self) -> TemplateKind {
        match self {
            ObstacleKind::Rock => TemplateKind::Rock,
            ObstacleKind::Crystal => TemplateKind::Crystal,
            ObstacleKind::Shield => TemplateKind::Shield,
        }
    }

    /// Map a cell roll onto the odds table. The band between `rock_below` and
    /// `shield_above` is left empty on purpose.
    pub fn from_roll(roll: f32, odds: &ObstacleOdds) -> Option<Self> {
        if roll < odds.crystal_below {
            Some(ObstacleKind::Crystal)
        } else if roll < odds.rock_below {
            Some(ObstacleKind::Rock)
        } else if roll > odds.shield_above {
            Some(ObstacleKind::Shield)
        } else {
            None
        }
    }
}

/// One obstacle sitting in a row cell; `instance` is relative to the row
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub id: u32,
    pub kind: ObstacleKind,
    pub instance: Instance,
}

/// A lateral slice of up to five obstacles
#[derive(Debug, Clone, PartialEq)]
pub struct ChallengeRow {
    /// Spawn index (unique within a level)
    pub index: u32,
    pub z: f32,
    pub cells: [Option<Obstacle>; ROW_CELLS],
}

impl ChallengeRow {
    pub fn origin(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, self.z)
    }

    /// Populated cells with their cell number
    pub fn obstacles(&self) -> impl Iterator<Item = (usize, &Obstacle)> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(cell, slot)| slot.as_ref().map(|o| (cell, o)))
    }
}

/// Decorative cliff face, no collision
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundUnit {
    pub index: u32,
    pub instance: Instance,
}

impl BackgroundUnit {
    #[inline]
    pub fn z(&self) -> f32 {
        self.instance.transform.translation.z
    }
}

/// Live world content around the rocket
#[derive(Debug, Clone, Default)]
pub struct World {
    pub background: VecDeque<BackgroundUnit>,
    pub rows: VecDeque<ChallengeRow>,
    /// Launch bay scenery; dropped once it has scrolled well behind the rocket
    pub starter_bay: Option<Instance>,
    /// Evicted since the last level setup
    pub backgrounds_evicted: u32,
    pub rows_evicted: u32,
    next_obstacle_id: u32,
}

impl World {
    pub fn new() -> Self {
        Self {
            next_obstacle_id: 1,
            ..Default::default()
        }
    }

    fn next_obstacle_id(&mut self) -> u32 {
        let id = self.next_obstacle_id;
        self.next_obstacle_id += 1;
        id
    }

    fn spawn_z(index: u32, horizon_spawn: bool, tuning: &Tuning) -> f32 {
        if horizon_spawn {
            tuning.horizon_z
        } else {
            -tuning.fill_spacing * index as f32
        }
    }

    /// Place a cliff face: alternating sides by index parity, jittered slightly
    pub fn spawn_background_unit(
        &mut self,
        index: u32,
        horizon_spawn: bool,
        catalog: &Catalog,
        tuning: &Tuning,
        rng: &mut impl Rng,
    ) -> Result<(), CatalogError> {
        let mut instance = catalog.instantiate(TemplateKind::BackgroundScenery)?;
        let jitter: f32 = rng.random();
        let x = if index % 2 == 0 {
            tuning.scenery_lateral - jitter
        } else {
            -tuning.scenery_lateral - jitter
        };
        instance.transform.translation = Vec3::new(
            x,
            instance.transform.translation.y,
            Self::spawn_z(index, horizon_spawn, tuning),
        );
        let yaw: f32 = rng.random();
        instance.transform.rotation =
            Quat::from_euler(EulerRot::XYZ, (-90.0f32).to_radians(), 0.0, yaw);

        self.background.push_front(BackgroundUnit { index, instance });
        Ok(())
    }

    /// Roll each of the five cells and build a row
    pub fn spawn_challenge_row(
        &mut self,
        index: u32,
        horizon_spawn: bool,
        catalog: &Catalog,
        tuning: &Tuning,
        rng: &mut impl Rng,
    ) -> Result<(), CatalogError> {
        let mut row = ChallengeRow {
            index,
            z: Self::spawn_z(index, horizon_spawn, tuning),
            cells: Default::default(),
        };

        for cell in 0..ROW_CELLS {
            let roll = rng.random::<f32>() * tuning.odds.roll_range;
            let Some(kind) = ObstacleKind::from_roll(roll, &tuning.odds) else {
                continue;
            };
            let mut instance = catalog.instantiate(kind.template())?;
            instance.transform.translation.x = tuning.cell_offset(cell);
            row.cells[cell] = Some(Obstacle {
                id: self.next_obstacle_id(),
                kind,
                instance,
            });
        }

        self.rows.push_front(row);
        Ok(())
    }

    /// Scroll everything toward the rocket by `speed`
    pub fn advance(&mut self, speed: f32, tuning: &Tuning) {
        for unit in &mut self.background {
            unit.instance.transform.translation.z += speed;
        }
        for row in &mut self.rows {
            row.z += speed;
        }
        if let Some(bay) = &mut self.starter_bay {
            bay.transform.translation.z += speed;
            if bay.transform.translation.z > tuning.starter_bay_removal_z {
                log::debug!("Starter bay left behind");
                self.starter_bay = None;
            }
        }
    }

    /// Top up the horizon: at most one new background unit and one new row per call.
    /// An empty collection always gets a new segment.
    pub fn spawn_at_horizon(
        &mut self,
        config: &mut SceneConfig,
        catalog: &Catalog,
        tuning: &Tuning,
        rng: &mut impl Rng,
    ) -> Result<(), CatalogError> {
        if self
            .background
            .front()
            .is_none_or(|unit| unit.z() > tuning.spawn_trigger_z)
        {
            let index = config.background_spawned;
            config.background_spawned += 1;
            self.spawn_background_unit(index, true, catalog, tuning, rng)?;
            log::debug!("Horizon background unit {}", index);
        }

        if self
            .rows
            .front()
            .is_none_or(|row| row.z > tuning.spawn_trigger_z)
        {
            let index = config.rows_spawned;
            config.rows_spawned += 1;
            self.spawn_challenge_row(index, true, catalog, tuning, rng)?;
            log::debug!("Horizon challenge row {}", index);
        }
        Ok(())
    }

    /// Drop segments that have scrolled past the eviction line.
    /// Returns `(background units removed, rows removed)`.
    pub fn evict(&mut self, tuning: &Tuning) -> (usize, usize) {
        let line = tuning.eviction_z;
        let policy = tuning.eviction_sweep;
        let background = sweep(&mut self.background, |u| u.z() > line, policy);
        let rows = sweep(&mut self.rows, |r| r.z > line, policy);
        self.backgrounds_evicted += background as u32;
        self.rows_evicted += rows as u32;
        if background + rows > 0 {
            log::debug!("Evicted {} background units, {} rows", background, rows);
        }
        (background, rows)
    }

    /// Clear everything and lay out a fresh level
    pub fn setup(
        &mut self,
        config: &mut SceneConfig,
        catalog: &Catalog,
        tuning: &Tuning,
        rng: &mut impl Rng,
    ) -> Result<(), CatalogError> {
        self.background.clear();
        self.rows.clear();
        self.backgrounds_evicted = 0;
        self.rows_evicted = 0;
        config.background_spawned = 0;
        config.rows_spawned = 0;

        let mut bay = catalog.instantiate(TemplateKind::StarterBay)?;
        bay.transform.translation = STARTER_BAY_START;
        self.starter_bay = Some(bay);

        for _ in 0..tuning.fill_count {
            let row = config.rows_spawned;
            config.rows_spawned += 1;
            self.spawn_challenge_row(row, false, catalog, tuning, rng)?;

            let unit = config.background_spawned;
            config.background_spawned += 1;
            self.spawn_background_unit(unit, false, catalog, tuning, rng)?;
        }
        Ok(())
    }

    /// Remove one obstacle from its cell. Returns `None` if it's already gone,
    /// so a removed obstacle can never be collected twice.
    pub fn take_obstacle(&mut self, row_index: u32, cell: usize, id: u32) -> Option<Obstacle> {
        let row = self.rows.iter_mut().find(|r| r.index == row_index)?;
        let slot = row.cells.get_mut(cell)?;
        if slot.as_ref().is_some_and(|o| o.id == id) {
            slot.take()
        } else {
            None
        }
    }

    pub fn obstacle_count(&self) -> usize {
        self.rows.iter().map(|r| r.obstacles().count()).sum()
    }
}

/// Stable removal of passed segments; relative order of survivors is kept
fn sweep<T>(items: &mut VecDeque<T>, passed: impl Fn(&T) -> bool, policy: EvictionSweep) -> usize {
    let candidates = items.iter().filter(|item| passed(item)).count();
    let to_remove = match policy {
        EvictionSweep::All => candidates,
        EvictionSweep::RetainOldest => candidates.saturating_sub(1),
    };
    if to_remove == 0 {
        return 0;
    }

    let mut removed = 0;
    items.retain(|item| {
        if removed < to_remove && passed(item) {
            removed += 1;
            false
        } else {
            true
        }
    });
    removed
}
