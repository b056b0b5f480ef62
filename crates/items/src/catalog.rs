//! Static item content: definitions and live-object templates, addressed by path.
//!
//! The catalog is the in-process stand-in for the engine's resource loader.
//! Content is authored as YAML:
//!
//! ```yaml
//! items:
//!   - path: res://items/furniture/polka_chair/polka_chair.tres
//!     name: Polka Chair
//!     width: 1
//!     height: 2
//!     place_scene: res://items/furniture/polka_chair/polka_chair.tscn
//! scenes:
//!   - path: res://items/furniture/polka_chair/polka_chair.tscn
//!     kind: world_item
//! ```

use glam::IVec2;
use homestead_common::ItemRotation;
use homestead_grid::GeometryError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::live::LiveKind;
use crate::registry::{RegistryError, TypeRegistry};

/// Resolves resource paths to static item data and templates.
pub trait ResourceLoader {
    fn item_data(&self, path: &str) -> Option<&ItemDefinition>;
    fn scene(&self, path: &str) -> Option<&SceneTemplate>;
}

/// Static definition of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDefinition {
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub carry_scene: Option<String>,
    #[serde(default)]
    pub drop_scene: Option<String>,
    #[serde(default)]
    pub place_scene: Option<String>,
    #[serde(default)]
    pub disable_pickup: bool,
    /// Other items can be stacked on top of this one.
    #[serde(default)]
    pub surface: bool,
    #[serde(default)]
    pub edible: bool,
}

impl ItemDefinition {
    pub fn new(path: impl Into<String>, name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            description: String::new(),
            width,
            height,
            carry_scene: None,
            drop_scene: None,
            place_scene: None,
            disable_pickup: false,
            surface: false,
            edible: false,
        }
    }

    pub fn footprint(&self, rotation: ItemRotation) -> Result<Vec<IVec2>, GeometryError> {
        homestead_grid::footprint(self.width, self.height, rotation)
    }

    fn scenes(&self) -> impl Iterator<Item = &str> {
        [&self.carry_scene, &self.drop_scene, &self.place_scene]
            .into_iter()
            .filter_map(|s| s.as_deref())
    }
}

/// A live-object template: what kind of object a scene path instantiates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneTemplate {
    pub path: String,
    pub kind: LiveKind,
    /// Variant tag objects from this template are captured as.
    #[serde(default)]
    pub persistent_kind: Option<String>,
}

impl SceneTemplate {
    pub fn new(path: impl Into<String>, kind: LiveKind) -> Self {
        Self {
            path: path.into(),
            kind,
            persistent_kind: None,
        }
    }

    #[must_use]
    pub fn with_persistent_kind(mut self, tag: impl Into<String>) -> Self {
        self.persistent_kind = Some(tag.into());
        self
    }
}

/// Errors from loading or validating item content.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("item {path}: {source}")]
    Geometry {
        path: String,
        #[source]
        source: GeometryError,
    },
    #[error("scene {path}: {source}")]
    Registry {
        path: String,
        #[source]
        source: RegistryError,
    },
    #[error("item {item} references unknown scene {scene}")]
    MissingScene { item: String, scene: String },
    #[error("scene {path} is {kind:?} but its persistent kind '{tag}' restores as {provides:?}")]
    KindMismatch {
        path: String,
        tag: String,
        kind: LiveKind,
        provides: LiveKind,
    },
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    items: Vec<ItemDefinition>,
    #[serde(default)]
    scenes: Vec<SceneTemplate>,
}

/// In-memory item content keyed by resource path.
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    items: BTreeMap<String, ItemDefinition>,
    scenes: BTreeMap<String, SceneTemplate>,
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_item(&mut self, item: ItemDefinition) {
        self.items.insert(item.path.clone(), item);
    }

    pub fn insert_scene(&mut self, scene: SceneTemplate) {
        self.scenes.insert(scene.path.clone(), scene);
    }

    pub fn items(&self) -> impl Iterator<Item = &ItemDefinition> {
        self.items.values()
    }

    pub fn scenes(&self) -> impl Iterator<Item = &SceneTemplate> {
        self.scenes.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Parse catalog YAML. Does not validate; call [`ItemCatalog::validate`].
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(yaml)?;
        let mut catalog = Self::new();
        for item in file.items {
            catalog.insert_item(item);
        }
        for scene in file.scenes {
            catalog.insert_scene(scene);
        }
        Ok(catalog)
    }

    /// Load catalog YAML from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let yaml = std::fs::read_to_string(path.as_ref())?;
        let catalog = Self::from_yaml_str(&yaml)?;
        tracing::info!(
            path = %path.as_ref().display(),
            items = catalog.items.len(),
            scenes = catalog.scenes.len(),
            "loaded item catalog"
        );
        Ok(catalog)
    }

    /// Serialize the catalog back to YAML.
    pub fn to_yaml_string(&self) -> Result<String, CatalogError> {
        let file = CatalogFile {
            items: self.items.values().cloned().collect(),
            scenes: self.scenes.values().cloned().collect(),
        };
        Ok(serde_yaml::to_string(&file)?)
    }

    /// Content validation. Any error here is a broken item definition and
    /// should stop the game from starting.
    pub fn validate(&self, registry: &TypeRegistry) -> Result<(), CatalogError> {
        for item in self.items.values() {
            item.footprint(ItemRotation::North)
                .map_err(|source| CatalogError::Geometry {
                    path: item.path.clone(),
                    source,
                })?;

            for scene in item.scenes() {
                if !self.scenes.contains_key(scene) {
                    return Err(CatalogError::MissingScene {
                        item: item.path.clone(),
                        scene: scene.to_string(),
                    });
                }
            }
        }

        for scene in self.scenes.values() {
            let Some(tag) = &scene.persistent_kind else {
                continue;
            };
            if !registry.is_registered(tag) {
                return Err(CatalogError::Registry {
                    path: scene.path.clone(),
                    source: RegistryError::UnknownVariant(tag.clone()),
                });
            }
            // Objects are captured as `tag` and respawned from this scene.
            let provides = registry
                .create(tag)
                .map_err(|source| CatalogError::Registry {
                    path: scene.path.clone(),
                    source,
                })?
                .capability();
            if provides != scene.kind {
                return Err(CatalogError::KindMismatch {
                    path: scene.path.clone(),
                    tag: tag.clone(),
                    kind: scene.kind,
                    provides,
                });
            }
        }

        Ok(())
    }
}

impl ResourceLoader for ItemCatalog {
    fn item_data(&self, path: &str) -> Option<&ItemDefinition> {
        self.items.get(path)
    }

    fn scene(&self, path: &str) -> Option<&SceneTemplate> {
        self.scenes.get(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
items:
  - path: res://items/furniture/table/table.tres
    name: Table
    width: 2
    height: 1
    surface: true
    place_scene: res://items/furniture/table/table.tscn
  - path: res://items/tools/shovel/shovel.tres
    name: Shovel
    width: 1
    height: 1
    carry_scene: res://items/tools/shovel/shovel.tscn
scenes:
  - path: res://items/furniture/table/table.tscn
    kind: world_item
  - path: res://items/tools/shovel/shovel.tscn
    kind: carriable
    persistent_kind: carriable
"#;

    #[test]
    fn parse_and_lookup() {
        let catalog = ItemCatalog::from_yaml_str(YAML).unwrap();
        assert_eq!(catalog.len(), 2);

        let table = catalog.item_data("res://items/furniture/table/table.tres").unwrap();
        assert_eq!((table.width, table.height), (2, 1));
        assert!(table.surface);
        assert!(!table.disable_pickup);

        let shovel = catalog.scene("res://items/tools/shovel/shovel.tscn").unwrap();
        assert_eq!(shovel.kind, LiveKind::Carriable);
        assert_eq!(shovel.persistent_kind.as_deref(), Some("carriable"));
    }

    #[test]
    fn valid_catalog_passes() {
        let catalog = ItemCatalog::from_yaml_str(YAML).unwrap();
        catalog.validate(&TypeRegistry::with_builtin()).unwrap();
    }

    #[test]
    fn zero_sized_item_fails_validation() {
        let mut catalog = ItemCatalog::new();
        catalog.insert_item(ItemDefinition::new("res://flat.tres", "Flat", 0, 1));
        let err = catalog.validate(&TypeRegistry::with_builtin()).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Geometry {
                source: GeometryError::DegenerateItem { .. },
                ..
            }
        ));
    }

    #[test]
    fn huge_item_fails_validation() {
        let mut catalog = ItemCatalog::new();
        catalog.insert_item(ItemDefinition::new("res://wall.tres", "Wall", u32::MAX, 1));
        let err = catalog.validate(&TypeRegistry::with_builtin()).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Geometry {
                source: GeometryError::OversizedItem { .. },
                ..
            }
        ));
    }

    #[test]
    fn unregistered_persistent_kind_fails_validation() {
        let mut catalog = ItemCatalog::new();
        catalog.insert_scene(
            SceneTemplate::new("res://w.tscn", LiveKind::WorldItem).with_persistent_kind("wallpaper"),
        );
        let err = catalog.validate(&TypeRegistry::with_builtin()).unwrap_err();
        assert!(matches!(err, CatalogError::Registry { .. }));
    }

    #[test]
    fn persistent_kind_must_restore_as_the_scene_kind() {
        let registry = TypeRegistry::with_builtin();
        let mut catalog = ItemCatalog::new();
        catalog.insert_scene(
            SceneTemplate::new("res://tools/rake.tscn", LiveKind::Carriable)
                .with_persistent_kind("base"),
        );
        let err = catalog.validate(&registry).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::KindMismatch {
                kind: LiveKind::Carriable,
                provides: LiveKind::WorldItem,
                ..
            }
        ));

        let mut catalog = ItemCatalog::new();
        catalog.insert_scene(
            SceneTemplate::new("res://furniture/bench.tscn", LiveKind::WorldItem)
                .with_persistent_kind("carriable"),
        );
        assert!(matches!(
            catalog.validate(&registry),
            Err(CatalogError::KindMismatch { .. })
        ));
    }

    #[test]
    fn dangling_scene_reference_fails_validation() {
        let mut catalog = ItemCatalog::new();
        let mut item = ItemDefinition::new("res://a.tres", "A", 1, 1);
        item.place_scene = Some("res://missing.tscn".into());
        catalog.insert_item(item);
        let err = catalog.validate(&TypeRegistry::with_builtin()).unwrap_err();
        assert!(matches!(err, CatalogError::MissingScene { .. }));
    }

    #[test]
    fn load_from_file_and_back_to_yaml() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), YAML).unwrap();

        let catalog = ItemCatalog::load(tmp.path()).unwrap();
        let yaml = catalog.to_yaml_string().unwrap();
        let reparsed = ItemCatalog::from_yaml_str(&yaml).unwrap();
        assert_eq!(reparsed.len(), catalog.len());
        assert_eq!(reparsed.scenes().count(), 2);
    }
}
