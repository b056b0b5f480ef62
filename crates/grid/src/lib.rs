//! Grid geometry: which cells an item occupies for a given size and rotation.
//!
//! # Invariants
//! - Every function here is pure and deterministic.
//! - A footprint is never empty for width, height >= 1. Extents above
//!   [`MAX_ITEM_EXTENT`] are rejected instead of wrapping.
//! - South and West are not geometric rotations of North. South mirrors the
//!   y axis, West swaps extents and mirrors the x axis. Placement checks in the
//!   world grid rely on exactly this layout.

mod footprint;

pub use footprint::{GeometryError, MAX_ITEM_EXTENT, footprint, footprint_cells, global_cells};

pub fn crate_info() -> &'static str {
    "homestead-grid v0.1.0"
}
