use glam::IVec2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A cell coordinate on the item grid (x right, y forward).
pub type GridPos = IVec2;

/// Unique runtime identifier for a live object. Never persisted inside records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Facing of an item on the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemRotation {
    #[default]
    North,
    South,
    East,
    West,
}

impl ItemRotation {
    pub const ALL: [ItemRotation; 4] = [Self::North, Self::South, Self::East, Self::West];

    /// Whether the item's width and height trade places in this rotation.
    pub fn swaps_extents(self) -> bool {
        matches!(self, Self::East | Self::West)
    }
}

/// Vertical layer of a grid cell. Each layer holds at most one item per cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemPlacement {
    #[default]
    Floor,
    OnTop,
    Underground,
}

impl ItemPlacement {
    pub const ALL: [ItemPlacement; 3] = [Self::Floor, Self::OnTop, Self::Underground];
}

/// Where an item conceptually lives in the world model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemPlacementType {
    #[default]
    Dropped,
    Placed,
    Carried,
}

/// Named capability slot on a player that holds at most one carried item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EquipSlot {
    Tool,
    Hat,
    Shirt,
    Pants,
    Shoes,
}

impl EquipSlot {
    pub const ALL: [EquipSlot; 5] = [Self::Tool, Self::Hat, Self::Shirt, Self::Pants, Self::Shoes];
}
