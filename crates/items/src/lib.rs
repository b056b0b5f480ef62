//! Item persistence: records, the variant registry, and live objects.
//!
//! A [`LiveObject`] is the transient, in-world (or in-hand) form of an item.
//! A [`PersistentItemRecord`] is its serializable form. Conversion goes through
//! [`PersistentItemRecord::capture`] and [`PersistentItemRecord::materialize`];
//! which record variant an object becomes is decided by the explicit
//! [`TypeRegistry`], never by inspecting type names at runtime.
//!
//! # Invariants
//! - A record with an empty `item_data_path` is rejected before use.
//! - `capture(materialize(r)) == r` for every field both directions copy.
//! - The registry is populated once at startup; lookups are O(1).

mod catalog;
mod live;
mod record;
mod registry;

pub use catalog::{CatalogError, ItemCatalog, ItemDefinition, ResourceLoader, SceneTemplate};
pub use live::{LiveBody, LiveKind, LiveObject};
pub use record::{MAX_DURABILITY, PersistentItemRecord, RecordError, RecordVariant, VARIANT_TAG_KEY};
pub use registry::{FallbackPolicy, RecordFactory, RegistryError, TypeRegistry};

pub fn crate_info() -> &'static str {
    "homestead-items v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("items"));
    }
}
