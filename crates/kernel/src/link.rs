use homestead_common::{GridPos, ItemPlacement, ItemPlacementType, ItemRotation};
use homestead_grid::GeometryError;
use homestead_items::{ItemDefinition, LiveObject};
use serde::{Deserialize, Serialize};

/// Binds a live object to its place on the grid.
///
/// The path fields mirror the bound object so a link can be saved without it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldNodeLink {
    pub grid_position: GridPos,
    pub grid_rotation: ItemRotation,
    pub grid_placement: ItemPlacement,
    pub placement_type: ItemPlacementType,
    pub item_data_path: String,
    pub item_scene_path: String,
}

impl WorldNodeLink {
    pub fn new(
        object: &LiveObject,
        grid_position: GridPos,
        grid_rotation: ItemRotation,
        grid_placement: ItemPlacement,
    ) -> Self {
        Self {
            grid_position,
            grid_rotation,
            grid_placement,
            placement_type: object.placement_type,
            item_data_path: object.item_data_path.clone(),
            item_scene_path: object.scene_path.clone(),
        }
    }

    /// Cells the linked item covers, as offsets or (with `global`) grid cells.
    pub fn grid_positions(
        &self,
        definition: &ItemDefinition,
        global: bool,
    ) -> Result<Vec<GridPos>, GeometryError> {
        let offsets = definition.footprint(self.grid_rotation)?;
        if global {
            Ok(homestead_grid::global_cells(self.grid_position, &offsets))
        } else {
            Ok(offsets)
        }
    }
}

impl std::fmt::Display for WorldNodeLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[NL:{} {} {:?} {:?}]",
            self.item_data_path, self.grid_position, self.grid_rotation, self.grid_placement
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec2;

    fn link(rotation: ItemRotation) -> WorldNodeLink {
        let object = LiveObject::world_item("res://bed.tres", "res://bed.tscn");
        WorldNodeLink::new(&object, IVec2::new(4, 4), rotation, ItemPlacement::Floor)
    }

    #[test]
    fn link_copies_object_paths() {
        let l = link(ItemRotation::North);
        assert_eq!(l.item_data_path, "res://bed.tres");
        assert_eq!(l.item_scene_path, "res://bed.tscn");
        assert_eq!(l.placement_type, ItemPlacementType::Placed);
    }

    #[test]
    fn local_and_global_positions() {
        let bed = ItemDefinition::new("res://bed.tres", "Bed", 1, 2);
        let l = link(ItemRotation::South);

        let local = l.grid_positions(&bed, false).unwrap();
        assert_eq!(local, vec![IVec2::new(0, 0), IVec2::new(0, -1)]);

        let global = l.grid_positions(&bed, true).unwrap();
        assert_eq!(global, vec![IVec2::new(4, 4), IVec2::new(4, 3)]);
    }

    #[test]
    fn degenerate_definition_is_an_error() {
        let broken = ItemDefinition::new("res://bed.tres", "Bed", 0, 2);
        assert!(link(ItemRotation::North).grid_positions(&broken, true).is_err());
    }

    #[test]
    fn display_names_the_item() {
        let s = link(ItemRotation::East).to_string();
        assert!(s.starts_with("[NL:res://bed.tres"));
        assert!(s.contains("East"));
    }
}
