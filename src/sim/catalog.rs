//! World object catalog
//!
//! Holds one immutable template per object kind and stamps out independent
//! instances on demand. Templates arrive from the asset loader (or the built-in
//! set); the catalog must be complete before a `GameState` can be built.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bounds::Aabb;

/// Every kind of object the catalog can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateKind {
    Rock,
    Crystal,
    Shield,
    BackgroundScenery,
    Rocket,
    StarterBay,
    Mothership,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 7] = [
        TemplateKind::Rock,
        TemplateKind::Crystal,
        TemplateKind::Shield,
        TemplateKind::BackgroundScenery,
        TemplateKind::Rocket,
        TemplateKind::StarterBay,
        TemplateKind::Mothership,
    ];
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("template {0:?} has not been loaded")]
    NotLoaded(TemplateKind),

    #[error("invalid template manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// Template geometry summary: what the simulation needs to know about a model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Half size of the model's bounding box, already in world units
    pub half_extents: Vec3,
    /// Offset of the bounding box centre from the object origin
    #[serde(default)]
    pub center_offset: Vec3,
    /// Default placement height above the water
    #[serde(default)]
    pub base_height: f32,
    /// Render scale applied to the source model
    pub scale: Vec3,
}

impl Template {
    pub const fn new(half_extents: Vec3, center_offset: Vec3, base_height: f32, scale: Vec3) -> Self {
        Self {
            half_extents,
            center_offset,
            base_height,
            scale,
        }
    }
}

/// Position/rotation/scale of an instance relative to its parent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// A placed copy of a template
///
/// Instances own all their data, so mutating one never affects another or the
/// template it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instance {
    pub kind: TemplateKind,
    pub transform: Transform,
    pub half_extents: Vec3,
    pub center_offset: Vec3,
}

impl Instance {
    /// World-space box, given the parent's translation (rows carry obstacles)
    pub fn bounds(&self, parent: Vec3) -> Aabb {
        Aabb::from_center(
            parent + self.transform.translation + self.center_offset,
            self.half_extents,
        )
    }
}

/// Full set of templates the game needs, as delivered by the asset loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSet {
    pub rock: Template,
    pub crystal: Template,
    pub shield: Template,
    pub background_scenery: Template,
    pub rocket: Template,
    pub starter_bay: Template,
    pub mothership: Template,
}

impl Default for TemplateSet {
    /// Bounding summaries of the shipped models at their in-game scales
    fn default() -> Self {
        Self {
            rock: Template::new(Vec3::new(3.0, 3.0, 3.0), Vec3::ZERO, 5.0, Vec3::splat(5.0)),
            crystal: Template::new(
                Vec3::new(2.0, 4.0, 2.0),
                Vec3::new(0.0, 4.0, 0.0),
                0.0,
                Vec3::splat(0.02),
            ),
            shield: Template::new(Vec3::new(2.5, 2.5, 1.0), Vec3::ZERO, 8.0, Vec3::ONE),
            background_scenery: Template::new(
                Vec3::new(20.0, 20.0, 30.0),
                Vec3::ZERO,
                0.0,
                Vec3::splat(0.02),
            ),
            rocket: Template::new(Vec3::new(2.5, 2.5, 6.0), Vec3::ZERO, 10.0, Vec3::splat(0.3)),
            starter_bay: Template::new(Vec3::new(40.0, 5.0, 40.0), Vec3::ZERO, 0.0, Vec3::ONE),
            mothership: Template::new(
                Vec3::new(60.0, 20.0, 60.0),
                Vec3::ZERO,
                200.0,
                Vec3::splat(15.0),
            ),
        }
    }
}

impl TemplateSet {
    /// Parse a template manifest (JSON)
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Template store; individual kinds may still be missing while loading
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    rock: Option<Template>,
    crystal: Option<Template>,
    shield: Option<Template>,
    background_scenery: Option<Template>,
    rocket: Option<Template>,
    starter_bay: Option<Template>,
    mothership: Option<Template>,
}

impl Catalog {
    /// Empty catalog; every `instantiate` fails until templates are installed
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with every template present
    pub fn loaded(set: TemplateSet) -> Self {
        let mut catalog = Self::new();
        catalog.install_all(set);
        catalog
    }

    pub fn install(&mut self, kind: TemplateKind, template: Template) {
        *self.slot_mut(kind) = Some(template);
    }

    pub fn install_all(&mut self, set: TemplateSet) {
        self.install(TemplateKind::Rock, set.rock);
        self.install(TemplateKind::Crystal, set.crystal);
        self.install(TemplateKind::Shield, set.shield);
        self.install(TemplateKind::BackgroundScenery, set.background_scenery);
        self.install(TemplateKind::Rocket, set.rocket);
        self.install(TemplateKind::StarterBay, set.starter_bay);
        self.install(TemplateKind::Mothership, set.mothership);
    }

    /// First kind still missing, if any
    pub fn missing(&self) -> Option<TemplateKind> {
        TemplateKind::ALL
            .into_iter()
            .find(|&kind| self.template(kind).is_err())
    }

    pub fn template(&self, kind: TemplateKind) -> Result<&Template, CatalogError> {
        self.slot(kind).as_ref().ok_or(CatalogError::NotLoaded(kind))
    }

    /// Fresh instance of `kind` at the origin with the template's default height and scale
    pub fn instantiate(&self, kind: TemplateKind) -> Result<Instance, CatalogError> {
        let template = self.template(kind)?;
        Ok(Instance {
            kind,
            transform: Transform {
                translation: Vec3::new(0.0, template.base_height, 0.0),
                rotation: Quat::IDENTITY,
                scale: template.scale,
            },
            half_extents: template.half_extents,
            center_offset: template.center_offset,
        })
    }

    fn slot(&self, kind: TemplateKind) -> &Option<Template> {
        match kind {
            TemplateKind::Rock => &self.rock,
            TemplateKind::Crystal => &self.crystal,
            TemplateKind::Shield => &self.shield,
            TemplateKind::BackgroundScenery => &self.background_scenery,
            TemplateKind::Rocket => &self.rocket,
            TemplateKind::StarterBay => &self.starter_bay,
            TemplateKind::Mothership => &self.mothership,
        }
    }

    fn slot_mut(&mut self, kind: TemplateKind) -> &mut Option<Template> {
        match kind {
            TemplateKind::Rock => &mut self.rock,
            TemplateKind::Crystal => &mut self.crystal,
            TemplateKind::Shield => &mut self.shield,
            TemplateKind::BackgroundScenery => &mut self.background_scenery,
            TemplateKind::Rocket => &mut self.rocket,
            TemplateKind::StarterBay => &mut self.starter_bay,
            TemplateKind::Mothership => &mut self.mothership,
        }
    }
}
