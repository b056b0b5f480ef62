//! Persistence: player saves, world snapshots and the on-disk save store.
//!
//! # Invariants
//! - Every record written carries its `variant_tag` and base fields.
//! - Loading a player save never fails on an unknown or broken item; the
//!   item is dropped and a [`LoadWarning`] is reported instead.
//! - World snapshots are content-addressed and verified before restore. A
//!   node that cannot be decoded or respawned is skipped the same way.
//! - The store fails closed on schema version mismatch.

mod save;
mod snapshot;
mod store;

pub use save::{LoadWarning, PlayerSaveData, SaveError, SavedSlot};
pub use snapshot::{SnapshotNode, WorldSnapshot};
pub use store::{IntegrityManifest, ManifestEntry, SaveMeta, SaveStore, StoreError};

pub fn crate_info() -> &'static str {
    "homestead-persist v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("persist"));
    }
}
