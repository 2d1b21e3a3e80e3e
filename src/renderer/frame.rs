//! Frame snapshot
//!
//! Plain-old-data records that can be copied straight into GPU buffers.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};

use crate::sim::{GameState, Instance, TemplateKind};

/// What to draw for an instance (must match the JS-side mesh table)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum RenderKind {
    Rock = 0,
    Crystal = 1,
    Shield = 2,
    BackgroundScenery = 3,
    Rocket = 4,
    StarterBay = 5,
    Mothership = 6,
    Debris = 7,
}

impl From<TemplateKind> for RenderKind {
    fn from(kind: TemplateKind) -> Self {
        match kind {
            TemplateKind::Rock => RenderKind::Rock,
            TemplateKind::Crystal => RenderKind::Crystal,
            TemplateKind::Shield => RenderKind::Shield,
            TemplateKind::BackgroundScenery => RenderKind::BackgroundScenery,
            TemplateKind::Rocket => RenderKind::Rocket,
            TemplateKind::StarterBay => RenderKind::StarterBay,
            TemplateKind::Mothership => RenderKind::Mothership,
        }
    }
}

// ============================================================================
// GPU DATA STRUCTURES (must match shader)
// ============================================================================

/// Per-frame uniforms
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Globals {
    pub camera_pos: [f32; 3], // offset 0
    pub water_time: f32,      // offset 12
    pub camera_rot: [f32; 4], // offset 16 (xyzw)
    pub water_scroll: f32,    // offset 32
    pub speed: f32,           // offset 36
    pub course_fraction: f32, // offset 40
    pub instance_count: u32,  // offset 44
}

/// One drawable object
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceRaw {
    /// Column-major model matrix
    pub model: [[f32; 4]; 4],
    pub kind: u32,
    /// 0 for fresh debris, 1 when it's about to expire; 0 for everything else
    pub age: f32,
    pub _pad: [u32; 2],
}

impl InstanceRaw {
    pub fn new(kind: RenderKind, scale: Vec3, rotation: Quat, translation: Vec3) -> Self {
        Self {
            model: Mat4::from_scale_rotation_translation(scale, rotation, translation)
                .to_cols_array_2d(),
            kind: kind as u32,
            age: 0.0,
            _pad: [0; 2],
        }
    }

    fn from_instance(instance: &Instance, parent: Vec3) -> Self {
        let t = &instance.transform;
        Self::new(instance.kind.into(), t.scale, t.rotation, parent + t.translation)
    }
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub globals: Globals,
    pub instances: Vec<InstanceRaw>,
}

impl Frame {
    /// Flatten every live object in the scene
    pub fn capture(state: &GameState) -> Self {
        let world = &state.world;
        let mut instances = Vec::with_capacity(
            world.background.len() + world.rows.len() * crate::consts::ROW_CELLS + state.debris.len() + 3,
        );

        instances.extend(
            world
                .background
                .iter()
                .map(|unit| InstanceRaw::from_instance(&unit.instance, Vec3::ZERO)),
        );
        for row in &world.rows {
            let origin = row.origin();
            instances.extend(
                row.obstacles()
                    .map(|(_, o)| InstanceRaw::from_instance(&o.instance, origin)),
            );
        }
        if let Some(bay) = &world.starter_bay {
            instances.push(InstanceRaw::from_instance(bay, Vec3::ZERO));
        }
        instances.push(InstanceRaw::from_instance(&state.mothership, Vec3::ZERO));

        let rocket = &state.rocket;
        instances.push(InstanceRaw::new(
            RenderKind::Rocket,
            Vec3::splat(rocket.scale),
            rocket.rotation,
            rocket.position,
        ));

        let lifetime = state.tuning.debris_lifetime_ticks.max(1) as f32;
        instances.extend(state.debris.iter().map(|bit| {
            let mut raw = InstanceRaw::new(RenderKind::Debris, Vec3::ONE, Quat::IDENTITY, bit.position);
            raw.age = (bit.age as f32 / lifetime).min(1.0);
            raw
        }));

        let camera = &state.camera;
        let globals = Globals {
            camera_pos: camera.position.to_array(),
            water_time: state.water.time,
            camera_rot: camera.rotation.to_array(),
            water_scroll: state.water.scroll,
            speed: state.config.speed,
            course_fraction: state.config.course_fraction(),
            instance_count: instances.len() as u32,
        };

        Self { globals, instances }
    }

    /// Instance records as raw bytes
    pub fn instance_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }

    pub fn globals_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.globals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::test_state;

    #[test]
    fn test_layout_sizes() {
        assert_eq!(std::mem::size_of::<Globals>(), 48);
        assert_eq!(std::mem::size_of::<InstanceRaw>(), 80);
    }

    #[test]
    fn test_capture_counts_every_object() {
        let mut state = test_state(8);
        crate::sim::debris::spawn_burst(
            &mut state.debris,
            state.rocket.position,
            Vec3::ZERO,
            &state.tuning,
        );
        let frame = Frame::capture(&state);

        // 60 cliffs, the obstacles, starter bay, mothership, rocket, 6 debris
        let expected = 60 + state.world.obstacle_count() + 3 + 6;
        assert_eq!(frame.instances.len(), expected);
        assert_eq!(frame.globals.instance_count as usize, expected);
        assert_eq!(frame.instance_bytes().len(), expected * 80);

        let rockets: Vec<_> = frame
            .instances
            .iter()
            .filter(|i| i.kind == RenderKind::Rocket as u32)
            .collect();
        assert_eq!(rockets.len(), 1);
        // Translation lives in the last column
        assert_eq!(&rockets[0].model[3][..3], &[0.0, 10.0, 70.0]);
    }

    #[test]
    fn test_obstacles_placed_relative_to_row() {
        let state = test_state(9);
        let frame = Frame::capture(&state);
        let (row, (cell, obstacle)) = state
            .world
            .rows
            .iter()
            .find_map(|r| r.obstacles().next().map(|o| (r, o)))
            .unwrap();
        let kind = RenderKind::from(obstacle.kind.template()) as u32;
        let x = state.tuning.cell_offset(cell);
        assert!(frame.instances.iter().any(|i| {
            i.kind == kind && i.model[3][0] == x && i.model[3][2] == row.z
        }));
    }
}
