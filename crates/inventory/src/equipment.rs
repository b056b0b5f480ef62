use homestead_common::EquipSlot;
use homestead_items::LiveObject;
use std::collections::BTreeMap;

use crate::error::InventoryError;

/// Live carriables held in equip slots, at most one per slot.
#[derive(Debug, Clone, Default)]
pub struct EquipmentMap {
    slots: BTreeMap<EquipSlot, LiveObject>,
}

impl EquipmentMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_equipped(&self, slot: EquipSlot) -> Option<&LiveObject> {
        self.slots.get(&slot)
    }

    pub fn get_equipped_mut(&mut self, slot: EquipSlot) -> Option<&mut LiveObject> {
        self.slots.get_mut(&slot)
    }

    pub fn is_occupied(&self, slot: EquipSlot) -> bool {
        self.slots.contains_key(&slot)
    }

    /// Put `object` in `slot`. Never replaces an existing object.
    pub fn bind(&mut self, slot: EquipSlot, object: LiveObject) -> Result<(), InventoryError> {
        if self.is_occupied(slot) {
            return Err(InventoryError::SlotOccupied(slot));
        }
        tracing::debug!(?slot, node = %object.id, "equipped");
        self.slots.insert(slot, object);
        Ok(())
    }

    /// Take the object out of `slot`.
    pub fn take(&mut self, slot: EquipSlot) -> Option<LiveObject> {
        self.slots.remove(&slot)
    }

    /// Equipped objects in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (EquipSlot, &LiveObject)> {
        self.slots.iter().map(|(slot, object)| (*slot, object))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
