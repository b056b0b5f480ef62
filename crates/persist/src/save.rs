use homestead_common::{EquipSlot, ItemPlacementType};
use homestead_inventory::{EquipmentMap, InventoryContainer, InventoryError};
use homestead_items::{
    LiveKind, PersistentItemRecord, RecordError, ResourceLoader, TypeRegistry,
};
use homestead_kernel::WorldError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Errors from building or parsing saves.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot capture equipped {slot:?}: {source}")]
    CaptureEquipped {
        slot: EquipSlot,
        #[source]
        source: RecordError,
    },
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    World(#[from] WorldError),
    #[error("snapshot hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },
}

/// Something a lenient load skipped or moved. The load itself still succeeded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadWarning {
    #[error("slot {index}: item dropped ({reason})")]
    SlotItemDropped { index: usize, reason: String },
    #[error("slot {index}: moved to slot {moved_to}")]
    SlotMoved { index: usize, moved_to: usize },
    #[error("slot {index}: no free slot left, item discarded")]
    SlotDiscarded { index: usize },
    #[error("unknown equip slot '{0}'")]
    UnknownEquipSlot(String),
    #[error("equipped {slot:?}: item skipped ({reason})")]
    EquippedSkipped { slot: EquipSlot, reason: String },
    #[error("world node {index}: skipped ({reason})")]
    WorldNodeSkipped { index: usize, reason: String },
}

/// One persisted inventory slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSlot {
    pub index: usize,
    pub item: Option<PersistentItemRecord>,
}

/// A player's persisted inventory and equipment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSaveData {
    #[serde(default)]
    pub player_name: String,
    #[serde(default)]
    pub inventory_slots: Vec<SavedSlot>,
    #[serde(default)]
    pub equipped_items: BTreeMap<EquipSlot, PersistentItemRecord>,
}

/// On-disk shape read before any record is trusted.
#[derive(Debug, Deserialize)]
struct RawSave {
    #[serde(default)]
    player_name: String,
    #[serde(default)]
    inventory_slots: Vec<RawSlot>,
    #[serde(default)]
    equipped_items: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawSlot {
    index: usize,
    #[serde(default)]
    item: Option<serde_json::Value>,
}

impl PlayerSaveData {
    /// Capture a player's container and equipment.
    pub fn capture(
        player_name: impl Into<String>,
        container: &InventoryContainer,
        equipment: &EquipmentMap,
        registry: &TypeRegistry,
    ) -> Result<Self, SaveError> {
        let inventory_slots = container
            .get_slots()
            .iter()
            .map(|slot| SavedSlot {
                index: slot.index,
                item: slot.item.clone(),
            })
            .collect();

        let mut equipped_items = BTreeMap::new();
        for (slot, object) in equipment.iter() {
            let record = PersistentItemRecord::capture(object, registry)
                .map_err(|source| SaveError::CaptureEquipped { slot, source })?;
            equipped_items.insert(slot, record);
        }

        Ok(Self {
            player_name: player_name.into(),
            inventory_slots,
            equipped_items,
        })
    }

    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a save, dropping records the registry cannot decode.
    ///
    /// Only a structurally broken document is an error.
    pub fn from_json(
        json: &str,
        registry: &TypeRegistry,
    ) -> Result<(Self, Vec<LoadWarning>), SaveError> {
        let raw: RawSave = serde_json::from_str(json)?;
        let mut warnings = Vec::new();

        let mut inventory_slots = Vec::with_capacity(raw.inventory_slots.len());
        for slot in raw.inventory_slots {
            let item = match slot.item {
                None | Some(serde_json::Value::Null) => None,
                Some(value) => match registry.decode(value) {
                    Ok(record) => Some(record),
                    Err(err) => {
                        tracing::warn!(index = slot.index, %err, "dropping unreadable slot item");
                        warnings.push(LoadWarning::SlotItemDropped {
                            index: slot.index,
                            reason: err.to_string(),
                        });
                        None
                    }
                },
            };
            inventory_slots.push(SavedSlot {
                index: slot.index,
                item,
            });
        }

        let mut equipped_items = BTreeMap::new();
        for (name, value) in raw.equipped_items {
            let Ok(slot) = serde_json::from_value::<EquipSlot>(serde_json::Value::String(name.clone()))
            else {
                tracing::warn!(%name, "skipping unknown equip slot");
                warnings.push(LoadWarning::UnknownEquipSlot(name));
                continue;
            };
            match registry.decode(value) {
                Ok(record) => {
                    equipped_items.insert(slot, record);
                }
                Err(err) => {
                    tracing::warn!(?slot, %err, "skipping unreadable equipped item");
                    warnings.push(LoadWarning::EquippedSkipped {
                        slot,
                        reason: err.to_string(),
                    });
                }
            }
        }

        let data = Self {
            player_name: raw.player_name,
            inventory_slots,
            equipped_items,
        };
        Ok((data, warnings))
    }

    /// Replace the contents of `container` and `equipment` with this save.
    ///
    /// Slots whose index is outside the container, or repeated, go to the
    /// first free slot. Equipped items that fail to materialize are skipped.
    pub fn restore(
        &self,
        container: &mut InventoryContainer,
        equipment: &mut EquipmentMap,
        loader: &dyn ResourceLoader,
    ) -> Vec<LoadWarning> {
        let _span = tracing::debug_span!("restore_player", player = %self.player_name).entered();
        let mut warnings = Vec::new();
        container.clear();
        equipment.clear();

        let mut displaced = Vec::new();
        for slot in &self.inventory_slots {
            let Some(record) = &slot.item else { continue };
            let free = matches!(container.item(slot.index), Ok(None));
            if !free {
                displaced.push((slot.index, record));
                continue;
            }
            if let Err(err) = container.set_item(slot.index, record.clone()) {
                warnings.push(dropped(slot.index, &err));
            }
        }

        for (index, record) in displaced {
            match container.add_item(record.clone()) {
                Ok(moved_to) => {
                    tracing::warn!(index, moved_to, "slot out of place, moved");
                    warnings.push(LoadWarning::SlotMoved { index, moved_to });
                }
                Err(InventoryError::Full) => {
                    tracing::warn!(index, "no room for saved slot, discarding");
                    warnings.push(LoadWarning::SlotDiscarded { index });
                }
                Err(err) => warnings.push(dropped(index, &err)),
            }
        }

        for (slot, record) in &self.equipped_items {
            let bound = record
                .materialize(LiveKind::Carriable, loader)
                .map_err(InventoryError::from)
                .and_then(|mut object| {
                    object.placement_type = ItemPlacementType::Carried;
                    equipment.bind(*slot, object)
                });
            if let Err(err) = bound {
                tracing::warn!(?slot, %err, "could not re-equip saved item");
                warnings.push(LoadWarning::EquippedSkipped {
                    slot: *slot,
                    reason: err.to_string(),
                });
            }
        }

        warnings
    }

    pub fn item_count(&self) -> usize {
        self.inventory_slots
            .iter()
            .filter(|s| s.item.is_some())
            .count()
    }
}

fn dropped(index: usize, err: &InventoryError) -> LoadWarning {
    tracing::warn!(index, %err, "dropping saved slot item");
    LoadWarning::SlotItemDropped {
        index,
        reason: err.to_string(),
    }
}
