//! Platform abstraction layer
//!
//! Browser input events are folded into plain state here so the simulation
//! only ever sees a [`crate::sim::TickInput`].

pub mod input;

pub use input::Controls;
