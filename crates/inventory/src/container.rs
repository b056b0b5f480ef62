use homestead_items::PersistentItemRecord;
use serde::{Deserialize, Serialize};

use crate::config::InventoryConfig;
use crate::error::InventoryError;

/// One inventory slot. `index` is fixed for the life of the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySlot {
    pub index: usize,
    pub item: Option<PersistentItemRecord>,
}

impl InventorySlot {
    pub fn is_empty(&self) -> bool {
        self.item.is_none()
    }
}

/// Notifications for whoever renders or autosaves the inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerEvent {
    /// Slot contents changed.
    Changed { index: usize },
    /// An item was eaten out of a slot.
    ItemConsumed { index: usize, item_data_path: String },
}

/// Fixed-capacity ordered item slots.
#[derive(Debug, Clone)]
pub struct InventoryContainer {
    config: InventoryConfig,
    slots: Vec<InventorySlot>,
    event_log: Vec<ContainerEvent>,
}

impl InventoryContainer {
    /// A container of `capacity` empty slots with default markers.
    pub fn new(capacity: usize) -> Self {
        Self::with_config(InventoryConfig {
            capacity,
            ..InventoryConfig::default()
        })
    }

    pub fn with_config(config: InventoryConfig) -> Self {
        let slots = (0..config.capacity)
            .map(|index| InventorySlot { index, item: None })
            .collect();
        Self {
            config,
            slots,
            event_log: Vec::new(),
        }
    }

    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn get_slots(&self) -> &[InventorySlot] {
        &self.slots
    }

    /// Index of the lowest empty slot.
    pub fn first_free_slot(&self) -> Option<usize> {
        self.slots.iter().find(|s| s.is_empty()).map(|s| s.index)
    }

    /// Number of occupied slots.
    pub fn item_count(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_empty()).count()
    }

    pub fn item(&self, index: usize) -> Result<Option<&PersistentItemRecord>, InventoryError> {
        Ok(self.slot(index)?.item.as_ref())
    }

    /// Store `record` in slot `index`, returning what was there.
    pub fn set_item(
        &mut self,
        index: usize,
        record: PersistentItemRecord,
    ) -> Result<Option<PersistentItemRecord>, InventoryError> {
        record.validate()?;
        let slot = self.slot_mut(index)?;
        let previous = slot.item.replace(record);
        self.changed(index);
        Ok(previous)
    }

    /// Empty slot `index`, returning its item.
    pub fn remove_item(
        &mut self,
        index: usize,
    ) -> Result<Option<PersistentItemRecord>, InventoryError> {
        let previous = self.slot_mut(index)?.item.take();
        if previous.is_some() {
            self.changed(index);
        }
        Ok(previous)
    }

    /// Store `record` in the first free slot and return its index.
    pub fn add_item(&mut self, record: PersistentItemRecord) -> Result<usize, InventoryError> {
        let index = self.first_free_slot().ok_or(InventoryError::Full)?;
        self.set_item(index, record)?;
        Ok(index)
    }

    /// Empty every slot.
    pub fn clear(&mut self) {
        for index in 0..self.slots.len() {
            if self.slots[index].item.take().is_some() {
                self.changed(index);
            }
        }
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<ContainerEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[ContainerEvent] {
        &self.event_log
    }

    pub(crate) fn push_event(&mut self, event: ContainerEvent) {
        self.event_log.push(event);
    }

    /// The record in slot `index`, or an error if the slot is missing or empty.
    pub(crate) fn occupied_item(
        &self,
        index: usize,
    ) -> Result<&PersistentItemRecord, InventoryError> {
        self.item(index)?.ok_or(InventoryError::EmptySlot(index))
    }

    fn slot(&self, index: usize) -> Result<&InventorySlot, InventoryError> {
        let capacity = self.slots.len();
        self.slots
            .get(index)
            .ok_or(InventoryError::IndexOutOfRange { index, capacity })
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut InventorySlot, InventoryError> {
        let capacity = self.slots.len();
        self.slots
            .get_mut(index)
            .ok_or(InventoryError::IndexOutOfRange { index, capacity })
    }

    fn changed(&mut self, index: usize) {
        self.event_log.push(ContainerEvent::Changed { index });
    }
}
