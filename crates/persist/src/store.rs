//! File-backed save store.
//!
//! Layout inside the store directory:
//! ```text
//! save.meta.json                 - metadata and schema version
//! players/
//!   <player>.json                - player saves (pretty JSON)
//! worlds/
//!   <world>.world.cbor.zst       - CBOR+zstd compressed world snapshots
//! integrity/
//!   manifest.json                - sha256 of every file written
//! ```

use homestead_items::{ItemCatalog, TypeRegistry};
use homestead_kernel::World;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::save::{LoadWarning, PlayerSaveData, SaveError};
use crate::snapshot::{RawSnapshot, WorldSnapshot};

/// Current schema version.
const SAVE_SCHEMA_VERSION: u32 = 1;

const META_FILE: &str = "save.meta.json";
const MANIFEST_FILE: &str = "manifest.json";

/// Errors from file-backed persistence operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CBOR serialization error: {0}")]
    CborEncode(String),
    #[error("CBOR deserialization error: {0}")]
    CborDecode(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("integrity check failed for {file}: expected {expected}, got {actual}")]
    IntegrityMismatch {
        file: String,
        expected: String,
        actual: String,
    },
    #[error("schema version mismatch: file has v{file_version}, expected v{expected_version}")]
    SchemaMismatch {
        file_version: u32,
        expected_version: u32,
    },
    #[error("invalid save name '{0}'")]
    InvalidName(String),
    #[error("world '{0}' not found")]
    WorldNotFound(String),
    #[error(transparent)]
    Save(#[from] SaveError),
}

/// Metadata stored in save.meta.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveMeta {
    pub save_schema_version: u32,
    pub player_count: u32,
    pub world_count: u32,
}

/// A single entry in the integrity manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Path relative to the store root.
    pub filename: String,
    pub sha256: String,
}

/// Hashes of every file the store has written. Rewriting a file replaces its entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegrityManifest {
    pub entries: Vec<ManifestEntry>,
}

impl IntegrityManifest {
    fn get(&self, filename: &str) -> Option<&ManifestEntry> {
        self.entries.iter().find(|e| e.filename == filename)
    }

    fn record(&mut self, filename: String, sha256: String) -> bool {
        match self.entries.iter_mut().find(|e| e.filename == filename) {
            Some(entry) => {
                entry.sha256 = sha256;
                false
            }
            None => {
                self.entries.push(ManifestEntry { filename, sha256 });
                true
            }
        }
    }
}

/// File-backed save store with schema versioning and integrity checking.
pub struct SaveStore {
    root: PathBuf,
    meta: SaveMeta,
    manifest: IntegrityManifest,
}

impl SaveStore {
    /// Open or create a save store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = path.as_ref().to_path_buf();
        std::fs::create_dir_all(root.join("players"))?;
        std::fs::create_dir_all(root.join("worlds"))?;
        std::fs::create_dir_all(root.join("integrity"))?;

        let meta_path = root.join(META_FILE);
        let manifest_path = root.join("integrity").join(MANIFEST_FILE);

        let (meta, manifest) = if meta_path.exists() {
            let meta: SaveMeta = serde_json::from_reader(std::fs::File::open(&meta_path)?)?;
            if meta.save_schema_version != SAVE_SCHEMA_VERSION {
                return Err(StoreError::SchemaMismatch {
                    file_version: meta.save_schema_version,
                    expected_version: SAVE_SCHEMA_VERSION,
                });
            }
            let manifest: IntegrityManifest = if manifest_path.exists() {
                serde_json::from_reader(std::fs::File::open(&manifest_path)?)?
            } else {
                IntegrityManifest::default()
            };
            (meta, manifest)
        } else {
            let meta = SaveMeta {
                save_schema_version: SAVE_SCHEMA_VERSION,
                player_count: 0,
                world_count: 0,
            };
            let manifest = IntegrityManifest::default();
            serde_json::to_writer_pretty(std::fs::File::create(&meta_path)?, &meta)?;
            serde_json::to_writer_pretty(std::fs::File::create(&manifest_path)?, &manifest)?;
            tracing::info!(root = %root.display(), "created save store");
            (meta, manifest)
        };

        Ok(Self {
            root,
            meta,
            manifest,
        })
    }

    /// Write a player save, replacing any previous one.
    pub fn save_player(&mut self, player: &str, data: &PlayerSaveData) -> Result<(), StoreError> {
        let filename = player_file(player)?;
        let json = data.to_json()?;
        if self.write_file(filename, json.as_bytes())? {
            self.meta.player_count += 1;
        }
        self.save_meta()?;
        self.save_manifest()?;
        tracing::info!(%player, items = data.item_count(), "saved player");
        Ok(())
    }

    /// Read a player save leniently. A player with no save yields `None`.
    pub fn load_player(
        &self,
        player: &str,
        registry: &TypeRegistry,
    ) -> Result<Option<(PlayerSaveData, Vec<LoadWarning>)>, StoreError> {
        let filename = player_file(player)?;
        let path = self.root.join(&filename);
        if !path.exists() {
            tracing::warn!(%player, "no save for player");
            return Ok(None);
        }

        let bytes = std::fs::read(&path)?;
        self.verify_file_hash(&filename, &bytes)?;
        let json = String::from_utf8_lossy(&bytes);
        let (data, warnings) = PlayerSaveData::from_json(&json, registry)?;
        tracing::info!(%player, warnings = warnings.len(), "loaded player");
        Ok(Some((data, warnings)))
    }

    /// Write a world snapshot, replacing any previous one with this name.
    pub fn save_world(&mut self, world: &str, snapshot: &WorldSnapshot) -> Result<(), StoreError> {
        let filename = world_file(world)?;
        let cbor_bytes = cbor_serialize(snapshot)?;
        let compressed = zstd_compress(&cbor_bytes)?;
        if self.write_file(filename, &compressed)? {
            self.meta.world_count += 1;
        }
        self.save_meta()?;
        self.save_manifest()?;
        tracing::info!(%world, nodes = snapshot.len(), "saved world");
        Ok(())
    }

    /// Read and verify a world snapshot leniently.
    ///
    /// Nodes the registry cannot decode are skipped with a warning; a bad
    /// file or snapshot hash is an error.
    pub fn load_world_snapshot(
        &self,
        world: &str,
        registry: &TypeRegistry,
    ) -> Result<(WorldSnapshot, Vec<LoadWarning>), StoreError> {
        let filename = world_file(world)?;
        let path = self.root.join(&filename);
        if !path.exists() {
            return Err(StoreError::WorldNotFound(world.to_string()));
        }

        let compressed = std::fs::read(&path)?;
        self.verify_file_hash(&filename, &compressed)?;
        let cbor_bytes = zstd_decompress(&compressed)?;
        let raw: RawSnapshot = cbor_deserialize(&cbor_bytes)?;
        raw.verify().map_err(|err| match err {
            SaveError::HashMismatch { expected, actual } => StoreError::IntegrityMismatch {
                file: filename.clone(),
                expected,
                actual,
            },
            other => other.into(),
        })?;
        Ok(raw.decode(registry)?)
    }

    /// Load a world snapshot and respawn it into a fresh world.
    pub fn load_world(
        &self,
        world: &str,
        catalog: Arc<ItemCatalog>,
        registry: &TypeRegistry,
    ) -> Result<(World, Vec<LoadWarning>), StoreError> {
        let (snapshot, mut warnings) = self.load_world_snapshot(world, registry)?;
        let (restored, skipped) = snapshot.restore(catalog)?;
        warnings.extend(skipped);
        tracing::info!(
            %world,
            nodes = restored.node_count(),
            warnings = warnings.len(),
            "loaded world"
        );
        Ok((restored, warnings))
    }

    /// Re-hash every file in the manifest.
    pub fn verify_integrity(&self) -> Result<(), StoreError> {
        for entry in &self.manifest.entries {
            let data = std::fs::read(self.root.join(&entry.filename))?;
            let actual = sha256_hex(&data);
            if actual != entry.sha256 {
                return Err(StoreError::IntegrityMismatch {
                    file: entry.filename.clone(),
                    expected: entry.sha256.clone(),
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Get the path to the store root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the metadata.
    pub fn meta(&self) -> &SaveMeta {
        &self.meta
    }

    pub fn manifest(&self) -> &IntegrityManifest {
        &self.manifest
    }

    /// Write `data` and record its hash. Returns true for a new file.
    fn write_file(&mut self, filename: String, data: &[u8]) -> Result<bool, StoreError> {
        std::fs::write(self.root.join(&filename), data)?;
        Ok(self.manifest.record(filename, sha256_hex(data)))
    }

    fn verify_file_hash(&self, filename: &str, data: &[u8]) -> Result<(), StoreError> {
        let Some(entry) = self.manifest.get(filename) else {
            tracing::warn!(%filename, "file not in integrity manifest");
            return Ok(());
        };
        let actual = sha256_hex(data);
        if entry.sha256 != actual {
            return Err(StoreError::IntegrityMismatch {
                file: filename.to_string(),
                expected: entry.sha256.clone(),
                actual,
            });
        }
        Ok(())
    }

    fn save_meta(&self) -> Result<(), StoreError> {
        let path = self.root.join(META_FILE);
        serde_json::to_writer_pretty(std::fs::File::create(path)?, &self.meta)?;
        Ok(())
    }

    fn save_manifest(&self) -> Result<(), StoreError> {
        let path = self.root.join("integrity").join(MANIFEST_FILE);
        serde_json::to_writer_pretty(std::fs::File::create(path)?, &self.manifest)?;
        Ok(())
    }
}

/// Save names become file names, so only a conservative character set is allowed.
fn checked_name(name: &str) -> Result<&str, StoreError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(name)
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}

fn player_file(player: &str) -> Result<String, StoreError> {
    Ok(format!("players/{}.json", checked_name(player)?))
}

fn world_file(world: &str) -> Result<String, StoreError> {
    Ok(format!("worlds/{}.world.cbor.zst", checked_name(world)?))
}

fn cbor_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, StoreError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| StoreError::CborEncode(e.to_string()))?;
    Ok(buf)
}

fn cbor_deserialize<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, StoreError> {
    ciborium::from_reader(data).map_err(|e| StoreError::CborDecode(e.to_string()))
}

fn zstd_compress(data: &[u8]) -> Result<Vec<u8>, StoreError> {
    let mut encoder = zstd::Encoder::new(Vec::new(), 3)?;
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn zstd_decompress(data: &[u8]) -> Result<Vec<u8>, StoreError> {
    let mut decoder = zstd::Decoder::new(data)?;
    let mut buf = Vec::new();
    decoder.read_to_end(&mut buf)?;
    Ok(buf)
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec2;
    use homestead_common::{EquipSlot, ItemPlacement, ItemRotation};
    use homestead_inventory::{EquipmentMap, InventoryContainer};
    use homestead_items::{ItemDefinition, LiveKind, PersistentItemRecord, SceneTemplate};
    use homestead_kernel::GridWorld;

    const TABLE: &str = "res://items/furniture/table/table.tres";
    const TABLE_SCENE: &str = "res://items/furniture/table/table.tscn";
    const SHOVEL: &str = "res://items/tools/shovel/shovel.tres";
    const SHOVEL_SCENE: &str = "res://items/tools/shovel/shovel.tscn";

    fn catalog() -> Arc<ItemCatalog> {
        let mut catalog = ItemCatalog::new();
        catalog.insert_item(ItemDefinition::new(TABLE, "Table", 2, 1));
        catalog.insert_item(ItemDefinition::new(SHOVEL, "Shovel", 1, 1));
        catalog.insert_scene(SceneTemplate::new(TABLE_SCENE, LiveKind::WorldItem));
        catalog.insert_scene(SceneTemplate::new(SHOVEL_SCENE, LiveKind::Carriable));
        Arc::new(catalog)
    }

    fn player() -> PlayerSaveData {
        let mut inv = InventoryContainer::new(4);
        let mut eq = EquipmentMap::new();
        inv.set_item(0, PersistentItemRecord::base(TABLE, TABLE_SCENE)).unwrap();
        inv.set_item(1, PersistentItemRecord::carriable(SHOVEL, SHOVEL_SCENE, 80))
            .unwrap();
        inv.equip(1, EquipSlot::Tool, &mut eq, &*catalog()).unwrap();
        PlayerSaveData::capture("Juniper", &inv, &eq, &TypeRegistry::with_builtin()).unwrap()
    }

    fn snapshot() -> WorldSnapshot {
        let mut world = World::new(catalog());
        world
            .spawn(
                &PersistentItemRecord::base(TABLE, TABLE_SCENE),
                IVec2::new(1, 1),
                ItemRotation::East,
                ItemPlacement::Floor,
                false,
            )
            .unwrap();
        WorldSnapshot::capture(&world, &TypeRegistry::with_builtin()).unwrap()
    }

    #[test]
    fn store_open_creates_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SaveStore::open(tmp.path().join("save")).unwrap();
        assert_eq!(store.meta().player_count, 0);
        assert_eq!(store.meta().world_count, 0);
        assert!(store.root().join("players").is_dir());
        assert!(store.root().join("worlds").is_dir());
        assert!(store.root().join("integrity").is_dir());
        assert!(store.root().join(META_FILE).is_file());
    }

    #[test]
    fn player_round_trip_through_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("save");
        let expected = player();
        {
            let mut store = SaveStore::open(&path).unwrap();
            store.save_player("juniper", &expected).unwrap();
            store.save_player("juniper", &expected).unwrap();
            assert_eq!(store.meta().player_count, 1);
        }

        let store = SaveStore::open(&path).unwrap();
        let (loaded, warnings) = store
            .load_player("juniper", &TypeRegistry::with_builtin())
            .unwrap()
            .unwrap();
        assert!(warnings.is_empty());
        assert_eq!(loaded, expected);
        assert_eq!(loaded.equipped_items[&EquipSlot::Tool].durability(), Some(80));
    }

    #[test]
    fn missing_player_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SaveStore::open(tmp.path()).unwrap();
        assert!(store
            .load_player("nobody", &TypeRegistry::with_builtin())
            .unwrap()
            .is_none());
    }

    #[test]
    fn unsafe_names_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = SaveStore::open(tmp.path()).unwrap();
        for name in ["", "../escape", "a/b", "with space"] {
            assert!(matches!(
                store.save_player(name, &PlayerSaveData::default()),
                Err(StoreError::InvalidName(_))
            ));
        }
    }

    #[test]
    fn world_round_trip_through_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("save");
        let snap = snapshot();
        {
            let mut store = SaveStore::open(&path).unwrap();
            store.save_world("farm", &snap).unwrap();
        }

        let store = SaveStore::open(&path).unwrap();
        let registry = TypeRegistry::with_builtin();
        assert_eq!(store.meta().world_count, 1);
        let (loaded, warnings) = store.load_world_snapshot("farm", &registry).unwrap();
        assert_eq!(loaded, snap);
        assert!(warnings.is_empty());

        let (world, warnings) = store.load_world("farm", catalog(), &registry).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(world.node_count(), 1);
        // East 2x1 at (1,1) covers (1,1) and (1,2).
        assert!(world.occupied(IVec2::new(1, 2), ItemPlacement::Floor));
    }

    #[test]
    fn missing_world_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SaveStore::open(tmp.path()).unwrap();
        assert!(matches!(
            store.load_world("nowhere", catalog(), &TypeRegistry::with_builtin()),
            Err(StoreError::WorldNotFound(_))
        ));
    }

    #[test]
    fn store_integrity_verification() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = SaveStore::open(tmp.path()).unwrap();
        store.save_player("juniper", &player()).unwrap();
        store.save_world("farm", &snapshot()).unwrap();
        assert_eq!(store.manifest().entries.len(), 2);
        store.verify_integrity().unwrap();
    }

    #[test]
    fn store_integrity_fail_closed_on_corruption() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("save");
        let mut store = SaveStore::open(&path).unwrap();
        store.save_world("farm", &snapshot()).unwrap();

        let world_path = path.join("worlds").join("farm.world.cbor.zst");
        let mut data = std::fs::read(&world_path).unwrap();
        if let Some(byte) = data.last_mut() {
            *byte ^= 0xff;
        }
        std::fs::write(&world_path, &data).unwrap();

        let store2 = SaveStore::open(&path).unwrap();
        assert!(store2.verify_integrity().is_err());
        assert!(matches!(
            store2.load_world_snapshot("farm", &TypeRegistry::with_builtin()),
            Err(StoreError::IntegrityMismatch { .. })
        ));
    }

    #[test]
    fn hand_edited_player_save_fails_integrity() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = SaveStore::open(tmp.path()).unwrap();
        store.save_player("juniper", &player()).unwrap();
        std::fs::write(tmp.path().join("players/juniper.json"), "{}").unwrap();

        assert!(matches!(
            store.load_player("juniper", &TypeRegistry::with_builtin()),
            Err(StoreError::IntegrityMismatch { .. })
        ));
    }

    #[test]
    fn unlisted_player_file_loads_leniently() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SaveStore::open(tmp.path()).unwrap();
        let json = r#"{
            "player_name": "Juniper",
            "inventory_slots": [
                { "index": 0, "item": { "variant_tag": "unknown_future_type", "item_data_path": "res://x.tres" } }
            ],
            "equipped_items": {}
        }"#;
        std::fs::write(tmp.path().join("players/juniper.json"), json).unwrap();

        let (data, warnings) = store
            .load_player("juniper", &TypeRegistry::with_builtin())
            .unwrap()
            .unwrap();
        assert_eq!(data.inventory_slots[0].item, None);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn world_with_unknown_node_loads_the_rest() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SaveStore::open(tmp.path()).unwrap();
        let registry = TypeRegistry::with_builtin();

        let mut world = World::new(catalog());
        for (x, record) in [
            (0, PersistentItemRecord::base(TABLE, TABLE_SCENE)),
            (5, PersistentItemRecord::carriable(SHOVEL, SHOVEL_SCENE, 30)),
            (9, PersistentItemRecord::base(TABLE, TABLE_SCENE)),
        ] {
            world
                .spawn(&record, IVec2::new(x, 0), ItemRotation::North, ItemPlacement::Floor, false)
                .unwrap();
        }
        let snap = WorldSnapshot::capture(&world, &registry).unwrap();
        let mut value = serde_json::to_value(&snap).unwrap();
        value["nodes"][1]["item"]["variant_tag"] = "unknown_future_type".into();
        value["hash"] = crate::snapshot::content_hash(&value["nodes"]).unwrap().into();

        let bytes = zstd_compress(&cbor_serialize(&value).unwrap()).unwrap();
        std::fs::write(tmp.path().join("worlds/farm.world.cbor.zst"), bytes).unwrap();

        let (loaded, warnings) = store.load_world("farm", catalog(), &registry).unwrap();
        assert_eq!(loaded.node_count(), 2);
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            &warnings[0],
            LoadWarning::WorldNodeSkipped { index: 1, reason } if reason.contains("unknown_future_type")
        ));
    }

    #[test]
    fn schema_mismatch_fail_closed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("save");
        let _store = SaveStore::open(&path).unwrap();

        let meta_path = path.join(META_FILE);
        let mut meta: SaveMeta =
            serde_json::from_reader(std::fs::File::open(&meta_path).unwrap()).unwrap();
        meta.save_schema_version = 999;
        serde_json::to_writer_pretty(std::fs::File::create(&meta_path).unwrap(), &meta).unwrap();

        match SaveStore::open(&path) {
            Err(StoreError::SchemaMismatch {
                file_version,
                expected_version,
            }) => {
                assert_eq!(file_version, 999);
                assert_eq!(expected_version, SAVE_SCHEMA_VERSION);
            }
            Err(e) => panic!("expected SchemaMismatch, got: {e}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }
}
