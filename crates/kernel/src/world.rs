use homestead_common::{GridPos, ItemPlacement, ItemPlacementType, ItemRotation, NodeId};
use homestead_grid::GeometryError;
use homestead_items::{
    ItemCatalog, ItemDefinition, LiveObject, PersistentItemRecord, RecordError, ResourceLoader,
    TypeRegistry,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::link::WorldNodeLink;

/// An event record produced by every mutation to the world grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorldEvent {
    /// A node was spawned from a record.
    Spawned { id: NodeId, link: WorldNodeLink },
    /// A node was removed. Carries its link for undo support.
    Removed { id: NodeId, link: WorldNodeLink },
    /// A previously removed node was put back unchanged.
    Restored { id: NodeId, link: WorldNodeLink },
}

/// Errors from world grid operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error("cell {cell} is occupied on layer {layer:?}")]
    Occupied { cell: GridPos, layer: ItemPlacement },
    #[error("unknown item definition {0}")]
    UnknownItem(String),
    #[error("node {0} not found")]
    NodeNotFound(NodeId),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Record(#[from] RecordError),
}

/// A live object placed on the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldNode {
    pub object: LiveObject,
    pub link: WorldNodeLink,
    /// Global cells the node occupies on `link.grid_placement`.
    pub cells: Vec<GridPos>,
}

impl WorldNode {
    pub fn id(&self) -> NodeId {
        self.object.id
    }
}

/// The world-grid contract the inventory core depends on.
///
/// Implementations own occupancy; callers only query, spawn and remove.
pub trait GridWorld {
    /// Whether any node covers `cell` on `layer`.
    fn occupied(&self, cell: GridPos, layer: ItemPlacement) -> bool;

    /// The node covering `cell` on `layer`, if any.
    fn node_at(&self, cell: GridPos, layer: ItemPlacement) -> Option<&WorldNode>;

    fn get(&self, id: NodeId) -> Option<&WorldNode>;

    /// Static definition for an item path, if the world knows it.
    fn item_definition(&self, item_data_path: &str) -> Option<&ItemDefinition>;

    /// Materialize `record` at `cell`. `dropped` marks the node as dropped
    /// rather than deliberately placed.
    fn spawn(
        &mut self,
        record: &PersistentItemRecord,
        cell: GridPos,
        rotation: ItemRotation,
        layer: ItemPlacement,
        dropped: bool,
    ) -> Result<NodeId, WorldError>;

    /// Remove a node. Returns it so the caller can capture or restore it.
    fn remove(&mut self, id: NodeId) -> Option<WorldNode>;

    /// Put a removed node back exactly as it was.
    fn restore(&mut self, node: WorldNode) -> Result<(), WorldError>;
}

/// In-memory world grid.
///
/// Nodes are kept in a BTreeMap for deterministic iteration; occupancy is a
/// (cell, layer) index over the same nodes.
#[derive(Debug, Clone)]
pub struct World {
    catalog: Arc<ItemCatalog>,
    nodes: BTreeMap<NodeId, WorldNode>,
    occupancy: HashMap<(GridPos, ItemPlacement), NodeId>,
    event_log: Vec<WorldEvent>,
}

impl World {
    /// Create an empty world that resolves items through `catalog`.
    pub fn new(catalog: Arc<ItemCatalog>) -> Self {
        Self {
            catalog,
            nodes: BTreeMap::new(),
            occupancy: HashMap::new(),
            event_log: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    /// Number of nodes in the world.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All nodes, in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &WorldNode> {
        self.nodes.values()
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[WorldEvent] {
        &self.event_log
    }

    /// Capture a node's record without removing it. Safe to repeat.
    pub fn capture_node(
        &self,
        id: NodeId,
        registry: &TypeRegistry,
    ) -> Result<PersistentItemRecord, WorldError> {
        let node = self.nodes.get(&id).ok_or(WorldError::NodeNotFound(id))?;
        Ok(PersistentItemRecord::capture(&node.object, registry)?)
    }

    fn blocked_cell(&self, cells: &[GridPos], layer: ItemPlacement) -> Option<GridPos> {
        cells.iter().copied().find(|c| self.occupied(*c, layer))
    }

    fn insert(&mut self, node: WorldNode) {
        let id = node.id();
        let layer = node.link.grid_placement;
        for cell in &node.cells {
            self.occupancy.insert((*cell, layer), id);
        }
        self.nodes.insert(id, node);
    }
}

impl GridWorld for World {
    fn occupied(&self, cell: GridPos, layer: ItemPlacement) -> bool {
        self.occupancy.contains_key(&(cell, layer))
    }

    fn node_at(&self, cell: GridPos, layer: ItemPlacement) -> Option<&WorldNode> {
        self.occupancy
            .get(&(cell, layer))
            .and_then(|id| self.nodes.get(id))
    }

    fn get(&self, id: NodeId) -> Option<&WorldNode> {
        self.nodes.get(&id)
    }

    fn item_definition(&self, item_data_path: &str) -> Option<&ItemDefinition> {
        self.catalog.item_data(item_data_path)
    }

    fn spawn(
        &mut self,
        record: &PersistentItemRecord,
        cell: GridPos,
        rotation: ItemRotation,
        layer: ItemPlacement,
        dropped: bool,
    ) -> Result<NodeId, WorldError> {
        record.validate()?;

        let definition = self
            .catalog
            .item_data(&record.item_data_path)
            .ok_or_else(|| WorldError::UnknownItem(record.item_data_path.clone()))?;
        let cells =
            homestead_grid::footprint_cells(cell, definition.width, definition.height, rotation)?;

        if let Some(blocked) = self.blocked_cell(&cells, layer) {
            return Err(WorldError::Occupied {
                cell: blocked,
                layer,
            });
        }

        let mut object = record.materialize_auto(&*self.catalog)?;
        object.placement_type = if dropped {
            ItemPlacementType::Dropped
        } else {
            ItemPlacementType::Placed
        };

        let link = WorldNodeLink::new(&object, cell, rotation, layer);
        let id = object.id;
        tracing::debug!(%id, %link, "spawned node");

        self.event_log.push(WorldEvent::Spawned {
            id,
            link: link.clone(),
        });
        self.insert(WorldNode {
            object,
            link,
            cells,
        });
        Ok(id)
    }

    fn remove(&mut self, id: NodeId) -> Option<WorldNode> {
        let node = self.nodes.remove(&id)?;
        let layer = node.link.grid_placement;
        for cell in &node.cells {
            self.occupancy.remove(&(*cell, layer));
        }
        tracing::debug!(%id, link = %node.link, "removed node");
        self.event_log.push(WorldEvent::Removed {
            id,
            link: node.link.clone(),
        });
        Some(node)
    }

    fn restore(&mut self, node: WorldNode) -> Result<(), WorldError> {
        let layer = node.link.grid_placement;
        if let Some(blocked) = self.blocked_cell(&node.cells, layer) {
            return Err(WorldError::Occupied {
                cell: blocked,
                layer,
            });
        }
        self.event_log.push(WorldEvent::Restored {
            id: node.id(),
            link: node.link.clone(),
        });
        self.insert(node);
        Ok(())
    }
}
