use homestead_common::ItemPlacementType;
use homestead_items::{ItemCatalog, PersistentItemRecord, TypeRegistry};
use homestead_kernel::{GridWorld, World, WorldNodeLink};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::save::{LoadWarning, SaveError};

/// One world node: where it sits and what it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub link: WorldNodeLink,
    pub item: PersistentItemRecord,
}

/// A content-addressed capture of every node on the world grid.
///
/// The hash is SHA-256 over the canonical JSON of `nodes` (object keys
/// sorted), so corruption is detected whatever container format the snapshot
/// was stored in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub nodes: Vec<SnapshotNode>,
    pub hash: String,
}

/// On-disk shape read before any node is trusted.
#[derive(Debug, Deserialize)]
pub(crate) struct RawSnapshot {
    #[serde(default)]
    nodes: Vec<serde_json::Value>,
    hash: String,
}

impl RawSnapshot {
    /// Check the stored hash against the nodes as they were read.
    pub(crate) fn verify(&self) -> Result<(), SaveError> {
        let actual = content_hash(&self.nodes)?;
        if actual != self.hash {
            return Err(SaveError::HashMismatch {
                expected: self.hash.clone(),
                actual,
            });
        }
        Ok(())
    }

    /// Decode every node through the registry, skipping the ones it refuses.
    ///
    /// The returned snapshot is re-hashed over the nodes that survived.
    pub(crate) fn decode(
        self,
        registry: &TypeRegistry,
    ) -> Result<(WorldSnapshot, Vec<LoadWarning>), SaveError> {
        let mut warnings = Vec::new();
        let mut nodes = Vec::with_capacity(self.nodes.len());
        for (index, raw) in self.nodes.into_iter().enumerate() {
            match decode_node(raw, registry) {
                Ok(node) => nodes.push(node),
                Err(reason) => {
                    tracing::warn!(index, %reason, "skipping unreadable world node");
                    warnings.push(LoadWarning::WorldNodeSkipped { index, reason });
                }
            }
        }
        let hash = content_hash(&nodes)?;
        Ok((WorldSnapshot { nodes, hash }, warnings))
    }
}

fn decode_node(raw: serde_json::Value, registry: &TypeRegistry) -> Result<SnapshotNode, String> {
    let serde_json::Value::Object(mut fields) = raw else {
        return Err("node is not an object".into());
    };
    let link = fields.remove("link").ok_or("node has no link")?;
    let item = fields.remove("item").ok_or("node has no item")?;
    let link: WorldNodeLink = serde_json::from_value(link).map_err(|e| e.to_string())?;
    let item = registry.decode(item).map_err(|e| e.to_string())?;
    Ok(SnapshotNode { link, item })
}

impl WorldSnapshot {
    /// Capture every node in `world`. The world is not modified.
    pub fn capture(world: &World, registry: &TypeRegistry) -> Result<Self, SaveError> {
        let mut nodes = Vec::with_capacity(world.node_count());
        for node in world.nodes() {
            let item = world.capture_node(node.id(), registry)?;
            nodes.push(SnapshotNode {
                link: node.link.clone(),
                item,
            });
        }
        let hash = content_hash(&nodes)?;
        tracing::debug!(nodes = nodes.len(), %hash, "captured world snapshot");
        Ok(Self { nodes, hash })
    }

    /// Parse a JSON snapshot leniently: nodes the registry cannot decode are
    /// skipped with a warning. A bad hash or broken document is an error.
    pub fn from_json(
        json: &str,
        registry: &TypeRegistry,
    ) -> Result<(Self, Vec<LoadWarning>), SaveError> {
        let raw: RawSnapshot = serde_json::from_str(json)?;
        raw.verify()?;
        raw.decode(registry)
    }

    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Recompute the hash and compare.
    pub fn verify(&self) -> bool {
        content_hash(&self.nodes).is_ok_and(|hash| hash == self.hash)
    }

    /// Respawn every node into a fresh world.
    ///
    /// Node ids are runtime-only, so restored nodes get new ones. A node that
    /// cannot be spawned (unknown definition, missing template, overlap) is
    /// skipped with a warning.
    pub fn restore(
        &self,
        catalog: Arc<ItemCatalog>,
    ) -> Result<(World, Vec<LoadWarning>), SaveError> {
        if !self.verify() {
            return Err(SaveError::HashMismatch {
                expected: self.hash.clone(),
                actual: content_hash(&self.nodes)?,
            });
        }

        let mut world = World::new(catalog);
        let mut warnings = Vec::new();
        for (index, node) in self.nodes.iter().enumerate() {
            let link = &node.link;
            let spawned = world.spawn(
                &node.item,
                link.grid_position,
                link.grid_rotation,
                link.grid_placement,
                link.placement_type == ItemPlacementType::Dropped,
            );
            if let Err(err) = spawned {
                tracing::warn!(index, %err, "could not respawn world node");
                warnings.push(LoadWarning::WorldNodeSkipped {
                    index,
                    reason: err.to_string(),
                });
            }
        }
        // Restoring is not a gameplay mutation.
        world.drain_events();
        Ok((world, warnings))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

pub(crate) fn content_hash<T: Serialize + ?Sized>(nodes: &T) -> Result<String, serde_json::Error> {
    let canonical = serde_json::to_value(nodes)?;
    let bytes = serde_json::to_vec(&canonical)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}
