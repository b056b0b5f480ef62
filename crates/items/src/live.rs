use homestead_common::{ItemPlacementType, NodeId};
use serde::{Deserialize, Serialize};

/// Capability of a live object: what it can be used as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiveKind {
    /// Sits on the grid (dropped or placed); cannot be held.
    WorldItem,
    /// Can be held in an equip slot, and also lie on the grid.
    Carriable,
}

impl LiveKind {
    /// Variant tag an object of this kind is captured as when it declares none.
    pub fn default_tag(self) -> &'static str {
        match self {
            Self::WorldItem => "base",
            Self::Carriable => "carriable",
        }
    }
}

/// Kind-specific state of a live object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveBody {
    WorldItem,
    Carriable { durability: u32 },
}

/// The transient form of an item, as the scene layer would hold it.
///
/// `id` is runtime-only and is never written to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveObject {
    pub id: NodeId,
    pub scene_path: String,
    pub item_data_path: String,
    /// Variant tag the object's scene declares for persistence, if any.
    pub persistent_kind: Option<String>,
    pub placement_type: ItemPlacementType,
    pub body: LiveBody,
}

impl LiveObject {
    /// A world item with no declared persistent kind.
    pub fn world_item(item_data_path: impl Into<String>, scene_path: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            scene_path: scene_path.into(),
            item_data_path: item_data_path.into(),
            persistent_kind: None,
            placement_type: ItemPlacementType::Placed,
            body: LiveBody::WorldItem,
        }
    }

    /// A carriable with no declared persistent kind.
    pub fn carriable(
        item_data_path: impl Into<String>,
        scene_path: impl Into<String>,
        durability: u32,
    ) -> Self {
        Self {
            id: NodeId::new(),
            scene_path: scene_path.into(),
            item_data_path: item_data_path.into(),
            persistent_kind: None,
            placement_type: ItemPlacementType::Dropped,
            body: LiveBody::Carriable { durability },
        }
    }

    pub fn kind(&self) -> LiveKind {
        match self.body {
            LiveBody::WorldItem => LiveKind::WorldItem,
            LiveBody::Carriable { .. } => LiveKind::Carriable,
        }
    }

    /// The tag this object should be captured as.
    pub fn persistent_kind(&self) -> &str {
        self.persistent_kind
            .as_deref()
            .unwrap_or_else(|| self.kind().default_tag())
    }

    pub fn durability(&self) -> Option<u32> {
        match self.body {
            LiveBody::Carriable { durability } => Some(durability),
            LiveBody::WorldItem => None,
        }
    }

    /// Wear a carriable down by `amount`. Returns the remaining durability.
    pub fn wear(&mut self, amount: u32) -> Option<u32> {
        match &mut self.body {
            LiveBody::Carriable { durability } => {
                *durability = durability.saturating_sub(amount);
                Some(*durability)
            }
            LiveBody::WorldItem => None,
        }
    }
}
