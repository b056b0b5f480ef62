//! World grid: authoritative placement of live objects on the item grid.
//!
//! # Invariants
//! - Each (cell, layer) pair holds at most one node.
//! - A node occupies every cell of its footprint on its own layer.
//! - All mutations flow through [`GridWorld`] and are recorded as [`WorldEvent`]s.

pub mod link;
pub mod world;

pub use link::WorldNodeLink;
pub use world::{GridWorld, World, WorldError, WorldEvent, WorldNode};

pub fn crate_info() -> &'static str {
    "homestead-kernel v0.1.0"
}
