use serde::{Deserialize, Serialize};

/// Player inventory configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Number of inventory slots.
    pub capacity: usize,
    /// Item that marks a dug hole on the floor. Burying needs one at the target.
    pub hole_item: String,
    /// Item spawned on the floor over a buried item.
    pub covered_item: String,
    /// Template for `covered_item`.
    pub covered_scene: String,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            capacity: 20,
            hole_item: "res://items/misc/hole/hole.tres".into(),
            covered_item: "res://items/misc/hole/buried_item.tres".into(),
            covered_scene: "res://items/misc/hole/buried_item.tscn".into(),
        }
    }
}
