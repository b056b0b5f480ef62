//! Explicit tag -> factory registry for record variants.
//!
//! The registry is filled at startup ([`TypeRegistry::with_builtin`] plus any
//! `register` calls from content code). Capture resolves an object's tag from
//! the persistent kind it declares; load refuses tags nobody registered.

use std::collections::HashMap;

use crate::live::LiveObject;
use crate::record::{PersistentItemRecord, RecordError, RecordVariant, VARIANT_TAG_KEY};

/// Builds an empty record of one variant. Capture fills in the fields.
pub type RecordFactory = fn() -> PersistentItemRecord;

/// What `create` does with a tag that has no factory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Unknown tags are an error.
    #[default]
    Strict,
    /// Unknown tags produce a base record, with a warning.
    Base,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown record variant '{0}'")]
    UnknownVariant(String),
}

#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    factories: HashMap<String, RecordFactory>,
    fallback: FallbackPolicy,
}

impl TypeRegistry {
    /// An empty, strict registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A strict registry holding every built-in variant.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("base", || PersistentItemRecord::empty(RecordVariant::Base));
        registry.register("carriable", || {
            PersistentItemRecord::empty(RecordVariant::Carriable { durability: 0 })
        });
        registry
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn fallback(&self) -> FallbackPolicy {
        self.fallback
    }

    /// Register a factory under `tag`, replacing any previous one.
    pub fn register(&mut self, tag: impl Into<String>, factory: RecordFactory) {
        let tag = tag.into();
        if self.factories.insert(tag.clone(), factory).is_some() {
            tracing::warn!(%tag, "replaced record factory");
        }
    }

    pub fn is_registered(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    /// All registered tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Instantiate an empty record for `tag`.
    pub fn create(&self, tag: &str) -> Result<PersistentItemRecord, RegistryError> {
        if let Some(factory) = self.factories.get(tag) {
            return Ok(factory());
        }
        match self.fallback {
            FallbackPolicy::Strict => Err(RegistryError::UnknownVariant(tag.to_string())),
            FallbackPolicy::Base => {
                tracing::warn!(%tag, "no factory registered, falling back to base record");
                Ok(PersistentItemRecord::empty(RecordVariant::Base))
            }
        }
    }

    /// The tag a live object is captured as.
    pub fn resolve_tag<'a>(&self, object: &'a LiveObject) -> &'a str {
        object.persistent_kind()
    }

    /// Decode a stored record, refusing tags this registry does not know.
    ///
    /// Loading code treats any error here as "slot is empty" rather than
    /// failing the whole save.
    pub fn decode(&self, value: serde_json::Value) -> Result<PersistentItemRecord, RecordError> {
        let tag = value
            .get(VARIANT_TAG_KEY)
            .and_then(serde_json::Value::as_str)
            .ok_or(RecordError::MissingTag)?;
        if !self.is_registered(tag) {
            return Err(RegistryError::UnknownVariant(tag.to_string()).into());
        }

        let record: PersistentItemRecord = serde_json::from_value(value)?;
        record.validate()?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builtin_tags_are_sorted_and_complete() {
        let registry = TypeRegistry::with_builtin();
        assert_eq!(registry.tags(), vec!["base", "carriable"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn every_factory_produces_its_own_tag() {
        let registry = TypeRegistry::with_builtin();
        for tag in registry.tags() {
            assert_eq!(registry.create(tag).unwrap().variant_tag(), tag);
        }
    }

    #[test]
    fn strict_registry_rejects_unknown_tags() {
        let registry = TypeRegistry::with_builtin();
        assert_eq!(
            registry.create("wallpaper"),
            Err(RegistryError::UnknownVariant("wallpaper".into()))
        );
    }

    #[test]
    fn base_fallback_only_when_configured() {
        let registry = TypeRegistry::with_builtin().with_fallback(FallbackPolicy::Base);
        let record = registry.create("wallpaper").unwrap();
        assert_eq!(record.variant, RecordVariant::Base);
    }

    #[test]
    fn empty_registry_knows_nothing() {
        let registry = TypeRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.create("base").is_err());
    }

    #[test]
    fn register_adds_an_alias() {
        let mut registry = TypeRegistry::with_builtin();
        registry.register("tool", || {
            PersistentItemRecord::empty(RecordVariant::Carriable { durability: 100 })
        });
        assert!(registry.is_registered("tool"));
        assert_eq!(registry.create("tool").unwrap().durability(), Some(100));
    }

    #[test]
    fn resolve_tag_uses_declared_kind() {
        let registry = TypeRegistry::with_builtin();
        let mut object = LiveObject::world_item("res://a.tres", "res://a.tscn");
        assert_eq!(registry.resolve_tag(&object), "base");
        object.persistent_kind = Some("tool".into());
        assert_eq!(registry.resolve_tag(&object), "tool");
    }

    #[test]
    fn decode_accepts_registered_variants() {
        let registry = TypeRegistry::with_builtin();
        let record = registry
            .decode(json!({
                "variant_tag": "carriable",
                "durability": 80,
                "item_data_path": "res://items/tools/shovel/shovel.tres",
                "item_scene_path": "res://items/tools/shovel/shovel.tscn",
                "placement_type": "Carried"
            }))
            .unwrap();
        assert_eq!(record.durability(), Some(80));
    }

    #[test]
    fn decode_refuses_unknown_and_untagged_records() {
        let registry = TypeRegistry::with_builtin();
        let unknown = registry.decode(json!({
            "variant_tag": "unknown_future_type",
            "item_data_path": "res://x.tres"
        }));
        assert!(matches!(
            unknown,
            Err(RecordError::Registry(RegistryError::UnknownVariant(tag))) if tag == "unknown_future_type"
        ));

        let untagged = registry.decode(json!({ "item_data_path": "res://x.tres" }));
        assert!(matches!(untagged, Err(RecordError::MissingTag)));
    }

    #[test]
    fn decode_validates_data_path() {
        let registry = TypeRegistry::with_builtin();
        let result = registry.decode(json!({ "variant_tag": "base", "item_data_path": "" }));
        assert!(matches!(result, Err(RecordError::EmptyDataPath)));
    }

    #[test]
    fn decode_respects_a_narrower_registry() {
        let mut registry = TypeRegistry::new();
        registry.register("base", || PersistentItemRecord::empty(RecordVariant::Base));
        let result = registry.decode(json!({
            "variant_tag": "carriable",
            "durability": 3,
            "item_data_path": "res://x.tres"
        }));
        assert!(matches!(result, Err(RecordError::Registry(_))));
    }
}
