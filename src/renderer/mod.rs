//! Rendering boundary
//!
//! Drawing itself happens outside the crate. Each frame the simulation is
//! flattened into a [`Frame`] of GPU-ready records and handed to a
//! [`Renderer`].

pub mod frame;

pub use frame::{Frame, Globals, InstanceRaw, RenderKind};

/// Sink for captured frames; called once per tick after all state mutation
pub trait Renderer {
    fn render(&mut self, frame: &Frame);
}
