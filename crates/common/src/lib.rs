//! Shared identifiers and grid vocabulary used by every homestead crate.

mod types;

pub use types::{EquipSlot, GridPos, ItemPlacement, ItemPlacementType, ItemRotation, NodeId};
