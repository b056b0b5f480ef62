use homestead_common::{ItemPlacementType, NodeId};
use serde::{Deserialize, Serialize};

use crate::catalog::ResourceLoader;
use crate::live::{LiveBody, LiveKind, LiveObject};
use crate::registry::{RegistryError, TypeRegistry};

/// Upper bound for carriable durability (a percentage).
pub const MAX_DURABILITY: u32 = 100;

/// JSON key holding a record's variant discriminator.
pub const VARIANT_TAG_KEY: &str = "variant_tag";

/// Errors from record validation, capture and materialization.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("record has an empty item_data_path")]
    EmptyDataPath,
    #[error("durability {durability} exceeds maximum {max}")]
    DurabilityOutOfRange { durability: u32, max: u32 },
    #[error("cannot capture node {node}: {reason}")]
    Capture { node: NodeId, reason: &'static str },
    #[error("no live-object template '{scene_path}' for item {item_data_path}")]
    MissingTemplate {
        item_data_path: String,
        scene_path: String,
    },
    #[error("type mismatch: requested {requested:?}, record provides {actual:?}")]
    TypeMismatch { requested: LiveKind, actual: LiveKind },
    #[error("record has no 'variant_tag' discriminator")]
    MissingTag,
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("malformed record: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Variant-specific record state, discriminated by `variant_tag` on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant_tag", rename_all = "snake_case")]
pub enum RecordVariant {
    /// Plain world item: data path, scene path and placement only.
    Base,
    /// Holdable tool or object with wear.
    Carriable { durability: u32 },
}

impl RecordVariant {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Carriable { .. } => "carriable",
        }
    }

    /// The live-object kind this variant materializes as.
    pub fn capability(&self) -> LiveKind {
        match self {
            Self::Base => LiveKind::WorldItem,
            Self::Carriable { .. } => LiveKind::Carriable,
        }
    }
}

/// Serializable form of an item, independent of its live representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistentItemRecord {
    #[serde(flatten)]
    pub variant: RecordVariant,
    /// Path of the item's static definition. Required.
    pub item_data_path: String,
    /// Path of the template used to materialize this record.
    #[serde(default)]
    pub item_scene_path: String,
    #[serde(default)]
    pub placement_type: ItemPlacementType,
}

impl PersistentItemRecord {
    /// An empty record of the given variant, as registry factories produce.
    pub fn empty(variant: RecordVariant) -> Self {
        Self {
            variant,
            item_data_path: String::new(),
            item_scene_path: String::new(),
            placement_type: ItemPlacementType::default(),
        }
    }

    pub fn base(item_data_path: impl Into<String>, item_scene_path: impl Into<String>) -> Self {
        Self {
            variant: RecordVariant::Base,
            item_data_path: item_data_path.into(),
            item_scene_path: item_scene_path.into(),
            placement_type: ItemPlacementType::Placed,
        }
    }

    pub fn carriable(
        item_data_path: impl Into<String>,
        item_scene_path: impl Into<String>,
        durability: u32,
    ) -> Self {
        Self {
            variant: RecordVariant::Carriable { durability },
            item_data_path: item_data_path.into(),
            item_scene_path: item_scene_path.into(),
            placement_type: ItemPlacementType::Dropped,
        }
    }

    #[must_use]
    pub fn with_placement(mut self, placement_type: ItemPlacementType) -> Self {
        self.placement_type = placement_type;
        self
    }

    pub fn variant_tag(&self) -> &'static str {
        self.variant.tag()
    }

    pub fn capability(&self) -> LiveKind {
        self.variant.capability()
    }

    pub fn durability(&self) -> Option<u32> {
        match self.variant {
            RecordVariant::Carriable { durability } => Some(durability),
            RecordVariant::Base => None,
        }
    }

    /// Reject records that must never reach the world or an equip slot.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.item_data_path.is_empty() {
            return Err(RecordError::EmptyDataPath);
        }
        if let RecordVariant::Carriable { durability } = self.variant {
            if durability > MAX_DURABILITY {
                return Err(RecordError::DurabilityOutOfRange {
                    durability,
                    max: MAX_DURABILITY,
                });
            }
        }
        Ok(())
    }

    /// Convert a live object into a record of the variant the registry resolves for it.
    pub fn capture(object: &LiveObject, registry: &TypeRegistry) -> Result<Self, RecordError> {
        if object.item_data_path.is_empty() {
            return Err(RecordError::Capture {
                node: object.id,
                reason: "object exposes no item_data_path",
            });
        }

        let tag = registry.resolve_tag(object);
        let mut record = registry.create(tag)?;
        record.read_object(object)?;

        tracing::debug!(
            node = %object.id,
            tag = record.variant_tag(),
            item = %record.item_data_path,
            "captured live object"
        );
        Ok(record)
    }

    /// Build a live object of `target` kind from this record.
    ///
    /// The record is left intact; callers that move an item out of storage
    /// drop it once the returned object has been bound somewhere.
    pub fn materialize(
        &self,
        target: LiveKind,
        loader: &dyn ResourceLoader,
    ) -> Result<LiveObject, RecordError> {
        self.validate()?;

        let actual = self.capability();
        if target != actual {
            return Err(RecordError::TypeMismatch {
                requested: target,
                actual,
            });
        }

        let template = loader
            .scene(&self.item_scene_path)
            .filter(|_| !self.item_scene_path.is_empty())
            .ok_or_else(|| RecordError::MissingTemplate {
                item_data_path: self.item_data_path.clone(),
                scene_path: self.item_scene_path.clone(),
            })?;

        if template.kind != target {
            return Err(RecordError::TypeMismatch {
                requested: target,
                actual: template.kind,
            });
        }

        let body = match self.variant {
            RecordVariant::Base => LiveBody::WorldItem,
            RecordVariant::Carriable { durability } => LiveBody::Carriable { durability },
        };

        Ok(LiveObject {
            id: NodeId::new(),
            scene_path: self.item_scene_path.clone(),
            item_data_path: self.item_data_path.clone(),
            persistent_kind: template.persistent_kind.clone(),
            placement_type: self.placement_type,
            body,
        })
    }

    /// Materialize as whatever kind the record's variant provides.
    pub fn materialize_auto(&self, loader: &dyn ResourceLoader) -> Result<LiveObject, RecordError> {
        self.materialize(self.capability(), loader)
    }

    /// Human-readable item name, falling back to the variant tag.
    pub fn display_name(&self, loader: &dyn ResourceLoader) -> String {
        loader
            .item_data(&self.item_data_path)
            .map(|def| def.name.clone())
            .unwrap_or_else(|| self.variant_tag().to_string())
    }

    /// Extra tooltip lines shown next to the item's description.
    pub fn tooltip(&self) -> String {
        match self.variant {
            RecordVariant::Carriable { durability } => format!("Durability: {durability}%"),
            RecordVariant::Base => String::new(),
        }
    }

    fn read_object(&mut self, object: &LiveObject) -> Result<(), RecordError> {
        self.item_data_path = object.item_data_path.clone();
        self.item_scene_path = object.scene_path.clone();
        self.placement_type = object.placement_type;

        match (&mut self.variant, &object.body) {
            (RecordVariant::Base, _) => Ok(()),
            (RecordVariant::Carriable { durability }, LiveBody::Carriable { durability: live }) => {
                *durability = *live;
                Ok(())
            }
            (RecordVariant::Carriable { .. }, LiveBody::WorldItem) => Err(RecordError::Capture {
                node: object.id,
                reason: "carriable record needs a carriable object",
            }),
        }
    }
}
