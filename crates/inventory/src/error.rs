use homestead_common::{EquipSlot, GridPos, ItemPlacement};
use homestead_grid::GeometryError;
use homestead_items::RecordError;
use homestead_kernel::WorldError;

/// Errors from inventory operations.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("slot index {index} out of range (capacity {capacity})")]
    IndexOutOfRange { index: usize, capacity: usize },
    #[error("slot {0} is empty")]
    EmptySlot(usize),
    #[error("no free inventory slot")]
    Full,
    #[error("placement blocked at {cell} on layer {layer:?}")]
    PlacementBlocked { cell: GridPos, layer: ItemPlacement },
    #[error("no hole at {0}")]
    NoHoleAtTarget(GridPos),
    #[error("equip slot {0:?} is occupied")]
    SlotOccupied(EquipSlot),
    #[error("nothing equipped in {0:?}")]
    NothingEquipped(EquipSlot),
    #[error("item {0} cannot be picked up")]
    PickupDisabled(String),
    #[error("item {0} is not edible")]
    NotConsumable(String),
    #[error("unknown item definition {0}")]
    UnknownItem(String),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    World(#[from] WorldError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

impl InventoryError {
    /// Whether this is an ordinary refused user action.
    ///
    /// Recoverable errors leave every piece of state untouched and can be
    /// shown to the player. The rest point at broken content or a broken
    /// save and should be logged as such.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::IndexOutOfRange { .. }
            | Self::EmptySlot(_)
            | Self::Full
            | Self::PlacementBlocked { .. }
            | Self::NoHoleAtTarget(_)
            | Self::SlotOccupied(_)
            | Self::NothingEquipped(_)
            | Self::PickupDisabled(_)
            | Self::NotConsumable(_) => true,
            Self::World(WorldError::Occupied { .. } | WorldError::NodeNotFound(_)) => true,
            Self::UnknownItem(_) | Self::Record(_) | Self::World(_) | Self::Geometry(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec2;

    #[test]
    fn user_action_errors_are_recoverable() {
        assert!(InventoryError::Full.is_recoverable());
        assert!(InventoryError::SlotOccupied(EquipSlot::Tool).is_recoverable());
        assert!(
            InventoryError::PlacementBlocked {
                cell: IVec2::ZERO,
                layer: ItemPlacement::Floor
            }
            .is_recoverable()
        );
        assert!(
            InventoryError::World(WorldError::Occupied {
                cell: IVec2::ZERO,
                layer: ItemPlacement::Floor
            })
            .is_recoverable()
        );
    }

    #[test]
    fn content_errors_are_not() {
        let degenerate = GeometryError::DegenerateItem {
            width: 0,
            height: 1,
        };
        assert!(!InventoryError::from(degenerate).is_recoverable());
        assert!(!InventoryError::Record(RecordError::EmptyDataPath).is_recoverable());
        assert!(!InventoryError::UnknownItem("res://x.tres".into()).is_recoverable());
    }

    #[test]
    fn messages_name_the_problem() {
        let err = InventoryError::IndexOutOfRange {
            index: 20,
            capacity: 20,
        };
        assert_eq!(err.to_string(), "slot index 20 out of range (capacity 20)");
    }
}
