//! Transitions between inventory slots, equip slots and the world grid.
//!
//! Each operation checks everything it can before touching state. Operations
//! with more than one world mutation undo the earlier mutations when a later
//! one fails.

use homestead_common::{EquipSlot, GridPos, ItemPlacement, ItemPlacementType, ItemRotation, NodeId};
use homestead_items::{
    ItemDefinition, LiveKind, PersistentItemRecord, ResourceLoader, TypeRegistry,
};
use homestead_kernel::{GridWorld, WorldError, WorldNode};
use serde::{Deserialize, Serialize};

use crate::container::{ContainerEvent, InventoryContainer};
use crate::equipment::EquipmentMap;
use crate::error::InventoryError;

/// Where the player is aiming: target cell and facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementTarget {
    pub cell: GridPos,
    pub rotation: ItemRotation,
}

impl PlacementTarget {
    pub fn new(cell: GridPos, rotation: ItemRotation) -> Self {
        Self { cell, rotation }
    }
}

fn definition<'w>(
    world: &'w impl GridWorld,
    record: &PersistentItemRecord,
) -> Result<&'w ItemDefinition, InventoryError> {
    world
        .item_definition(&record.item_data_path)
        .ok_or_else(|| InventoryError::UnknownItem(record.item_data_path.clone()))
}

fn first_blocked(
    world: &impl GridWorld,
    cells: &[GridPos],
    layer: ItemPlacement,
) -> Option<GridPos> {
    cells.iter().copied().find(|c| world.occupied(*c, layer))
}

fn restore_or_log(world: &mut impl GridWorld, node: WorldNode) {
    let id = node.id();
    if let Err(err) = world.restore(node) {
        tracing::error!(%id, %err, "rollback could not restore node");
    }
}

/// Layer an item covering `cells` would be placed on.
fn placement_layer(
    world: &impl GridWorld,
    cells: &[GridPos],
) -> Result<ItemPlacement, InventoryError> {
    if first_blocked(world, cells, ItemPlacement::Floor).is_none() {
        return Ok(ItemPlacement::Floor);
    }

    for cell in cells {
        let on_surface = world
            .node_at(*cell, ItemPlacement::Floor)
            .and_then(|node| world.item_definition(&node.link.item_data_path))
            .is_some_and(|def| def.surface);
        if !on_surface {
            tracing::warn!(%cell, "floor item here is not a surface");
            return Err(InventoryError::PlacementBlocked {
                cell: *cell,
                layer: ItemPlacement::Floor,
            });
        }
    }

    match first_blocked(world, cells, ItemPlacement::OnTop) {
        Some(cell) => Err(InventoryError::PlacementBlocked {
            cell,
            layer: ItemPlacement::OnTop,
        }),
        None => Ok(ItemPlacement::OnTop),
    }
}

impl InventoryContainer {
    /// Drop the item in slot `index` onto the floor at `target`.
    pub fn drop(
        &mut self,
        index: usize,
        target: PlacementTarget,
        world: &mut impl GridWorld,
    ) -> Result<NodeId, InventoryError> {
        let _span = tracing::debug_span!("drop", index, cell = %target.cell).entered();
        let record = self.occupied_item(index)?;

        let cells = definition(&*world, record)?.footprint(target.rotation)?;
        let cells = homestead_grid::global_cells(target.cell, &cells);
        if let Some(cell) = first_blocked(&*world, &cells, ItemPlacement::Floor) {
            return Err(InventoryError::PlacementBlocked {
                cell,
                layer: ItemPlacement::Floor,
            });
        }

        let id = world.spawn(record, target.cell, target.rotation, ItemPlacement::Floor, true)?;
        self.remove_item(index)?;
        tracing::info!(%id, "dropped item");
        Ok(id)
    }

    /// Place the item in slot `index` at `target`.
    ///
    /// A free floor takes the item directly. If every footprint cell is
    /// covered by a surface item, the item goes on top instead.
    pub fn place(
        &mut self,
        index: usize,
        target: PlacementTarget,
        world: &mut impl GridWorld,
    ) -> Result<NodeId, InventoryError> {
        let _span = tracing::debug_span!("place", index, cell = %target.cell).entered();
        let record = self.occupied_item(index)?;

        let offsets = definition(&*world, record)?.footprint(target.rotation)?;
        let cells = homestead_grid::global_cells(target.cell, &offsets);
        let layer = placement_layer(&*world, &cells)?;

        let id = world.spawn(record, target.cell, target.rotation, layer, false)?;
        self.remove_item(index)?;
        tracing::info!(%id, ?layer, "placed item");
        Ok(id)
    }

    /// Equip the item in slot `index` into `slot`.
    ///
    /// An occupied equip slot is refused; unequip first.
    pub fn equip(
        &mut self,
        index: usize,
        slot: EquipSlot,
        equipment: &mut EquipmentMap,
        loader: &dyn ResourceLoader,
    ) -> Result<NodeId, InventoryError> {
        let _span = tracing::debug_span!("equip", index, ?slot).entered();
        let record = self.occupied_item(index)?;
        if equipment.is_occupied(slot) {
            return Err(InventoryError::SlotOccupied(slot));
        }

        let mut object = record.materialize(LiveKind::Carriable, loader)?;
        object.placement_type = ItemPlacementType::Carried;
        let id = object.id;

        equipment.bind(slot, object)?;
        self.remove_item(index)?;
        tracing::info!(%id, ?slot, "equipped item");
        Ok(id)
    }

    /// Capture the object in `slot` back into the first free inventory slot.
    pub fn unequip(
        &mut self,
        slot: EquipSlot,
        equipment: &mut EquipmentMap,
        registry: &TypeRegistry,
    ) -> Result<usize, InventoryError> {
        let object = equipment
            .get_equipped(slot)
            .ok_or(InventoryError::NothingEquipped(slot))?;
        let index = self.first_free_slot().ok_or(InventoryError::Full)?;
        let record = PersistentItemRecord::capture(object, registry)?;

        self.set_item(index, record)?;
        equipment.take(slot);
        tracing::info!(?slot, index, "unequipped item");
        Ok(index)
    }

    /// Bury the item in slot `index` in the hole at `cell`.
    ///
    /// The hole is replaced by the buried item underground and a covered
    /// marker on the floor. Any failure puts the hole back.
    pub fn bury(
        &mut self,
        index: usize,
        cell: GridPos,
        world: &mut impl GridWorld,
    ) -> Result<NodeId, InventoryError> {
        let _span = tracing::debug_span!("bury", index, %cell).entered();
        let record = self.occupied_item(index)?;

        let hole_id = world
            .node_at(cell, ItemPlacement::Floor)
            .filter(|node| node.link.item_data_path == self.config().hole_item)
            .map(WorldNode::id)
            .ok_or(InventoryError::NoHoleAtTarget(cell))?;
        let hole = world
            .remove(hole_id)
            .ok_or(InventoryError::NoHoleAtTarget(cell))?;

        let buried = match world.spawn(
            record,
            cell,
            ItemRotation::North,
            ItemPlacement::Underground,
            true,
        ) {
            Ok(id) => id,
            Err(err) => {
                restore_or_log(world, hole);
                return Err(err.into());
            }
        };

        let covered = PersistentItemRecord::base(
            self.config().covered_item.clone(),
            self.config().covered_scene.clone(),
        )
        .with_placement(ItemPlacementType::Placed);
        if let Err(err) = world.spawn(
            &covered,
            cell,
            ItemRotation::North,
            ItemPlacement::Floor,
            false,
        ) {
            world.remove(buried);
            restore_or_log(world, hole);
            return Err(err.into());
        }

        self.remove_item(index)?;
        tracing::info!(id = %buried, "buried item");
        Ok(buried)
    }

    /// Pick a world node up into the first free slot.
    pub fn pick_up(
        &mut self,
        id: NodeId,
        world: &mut impl GridWorld,
        registry: &TypeRegistry,
    ) -> Result<usize, InventoryError> {
        let node = world.get(id).ok_or(WorldError::NodeNotFound(id))?;
        let path = &node.link.item_data_path;
        if world
            .item_definition(path)
            .is_some_and(|def| def.disable_pickup)
        {
            return Err(InventoryError::PickupDisabled(path.clone()));
        }

        let index = self.first_free_slot().ok_or(InventoryError::Full)?;
        let record = PersistentItemRecord::capture(&node.object, registry)?;

        self.set_item(index, record)?;
        world.remove(id);
        tracing::info!(%id, index, "picked up item");
        Ok(index)
    }

    /// Eat the item in slot `index`.
    pub fn consume(
        &mut self,
        index: usize,
        loader: &dyn ResourceLoader,
    ) -> Result<PersistentItemRecord, InventoryError> {
        let record = self.occupied_item(index)?;
        let edible = loader
            .item_data(&record.item_data_path)
            .is_some_and(|def| def.edible);
        if !edible {
            return Err(InventoryError::NotConsumable(record.item_data_path.clone()));
        }

        let record = self
            .remove_item(index)?
            .ok_or(InventoryError::EmptySlot(index))?;
        self.push_event(ContainerEvent::ItemConsumed {
            index,
            item_data_path: record.item_data_path.clone(),
        });
        Ok(record)
    }
}
