//! The generic, metadata-driven data source
//!
//! Every operation here is driven purely by entity descriptors plus the
//! per-type backing stores: key lookup, relationship traversal, relation
//! writes and media access all work the same way for any registered entity
//! type. Side effects are confined to the stores involved; no operation
//! mutates metadata.

use crate::core::error::{
    EngineResult, MetadataError, NotFoundError, UnsupportedError,
};
use crate::core::field::FieldValue;
use crate::core::record::{EntityRecord, KeyMap, NavValue};
use crate::data::read::{ReadOptions, ReadResult};
use crate::data::store::{DataStore, StoreManager};
use crate::model::descriptor::{EntityDescriptor, Multiplicity, NavigationDescriptor};
use crate::model::keys::{key_values, set_key_values};
use crate::model::navigation::{NavInfo, resolve};
use crate::model::registry::ModelRegistry;
use std::sync::Arc;
use tracing::{debug, warn};

/// Binary content plus its MIME type, as stored in a media resource
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MediaData {
    pub content: Vec<u8>,
    pub mime_type: String,
}

impl MediaData {
    pub fn new(content: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            content,
            mime_type: mime_type.into(),
        }
    }
}

/// Result of a relationship traversal: a single related instance when the
/// relation is to-one (or was narrowed by a target key), a list otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum Related {
    One(Option<EntityRecord>),
    Many(Vec<EntityRecord>),
}

/// Generic data source over a model registry and a store manager
pub struct GenericDataSource {
    model: Arc<ModelRegistry>,
    stores: Arc<dyn StoreManager>,
}

impl GenericDataSource {
    /// Create the data source and grant a store for every registered,
    /// describable entity type.
    pub fn new(model: Arc<ModelRegistry>, stores: Arc<dyn StoreManager>) -> EngineResult<Self> {
        for descriptor in model.descriptors() {
            if descriptor.is_describable() {
                stores.grant_store(descriptor.entity_set(), descriptor)?;
            } else {
                debug!(
                    entity = descriptor.entity(),
                    "skipping store grant for type without metadata"
                );
            }
        }
        Ok(Self { model, stores })
    }

    /// The model registry this source consults
    pub fn model(&self) -> &Arc<ModelRegistry> {
        &self.model
    }

    fn store_for(&self, entity_set: &str) -> EngineResult<Arc<dyn DataStore>> {
        self.stores.store(entity_set).ok_or_else(|| {
            NotFoundError::Store {
                entity_set: entity_set.to_string(),
            }
            .into()
        })
    }

    /// Read the whole collection of an entity set.
    ///
    /// The result's applied flags come straight from the backing store;
    /// callers apply the remainder via [`ReadResult::apply_remaining`].
    pub fn read_set(&self, entity_set: &str, options: &ReadOptions) -> EngineResult<ReadResult> {
        self.store_for(entity_set)?.read(options)
    }

    /// Read a single entity by its key values.
    pub fn read_by_key(&self, entity_set: &str, keys: &KeyMap) -> EngineResult<EntityRecord> {
        let store = self.store_for(entity_set)?;
        store.read_by_key(keys)?.ok_or_else(|| {
            NotFoundError::Entity {
                entity_set: entity_set.to_string(),
            }
            .into()
        })
    }

    /// Produce a blank instance of the set's entity type. The instance is
    /// not persisted until [`GenericDataSource::create`] is called with it.
    pub fn new_instance(&self, entity_set: &str) -> EngineResult<EntityRecord> {
        Ok(self.store_for(entity_set)?.create_instance())
    }

    /// Persist a new entity.
    pub fn create(&self, entity_set: &str, record: EntityRecord) -> EngineResult<EntityRecord> {
        self.store_for(entity_set)?.create(record)
    }

    /// Update the entity that is key-equal to the given record.
    pub fn update(&self, entity_set: &str, record: EntityRecord) -> EngineResult<EntityRecord> {
        let store = self.store_for(entity_set)?;
        store.update(record)?.ok_or_else(|| {
            NotFoundError::Entity {
                entity_set: entity_set.to_string(),
            }
            .into()
        })
    }

    /// Delete the entity with the given key values.
    pub fn delete(&self, entity_set: &str, keys: &KeyMap) -> EngineResult<()> {
        let store = self.store_for(entity_set)?;
        match store.delete(keys)? {
            Some(_) => Ok(()),
            None => Err(NotFoundError::Entity {
                entity_set: entity_set.to_string(),
            }
            .into()),
        }
    }

    /// Read the data related to `source` in the target entity set.
    ///
    /// For a to-many relation without `target_keys` the whole related list
    /// is returned; with `target_keys` the list is narrowed to the single
    /// matching instance. A to-one relation always yields a single result.
    pub fn read_related(
        &self,
        source_set: &str,
        source: &EntityRecord,
        target_set: &str,
        target_keys: Option<&KeyMap>,
    ) -> EngineResult<Related> {
        let source_store = self.store_for(source_set)?;
        let target_store = self.store_for(target_set)?;
        let source_descriptor = Arc::clone(source_store.descriptor());
        let target_descriptor = Arc::clone(target_store.descriptor());

        let nav = resolve(&source_descriptor, &target_descriptor).ok_or_else(|| {
            MetadataError::MissingNavigation {
                source: source_descriptor.entity().to_string(),
                target: target_descriptor.entity().to_string(),
            }
        })?;

        let candidates = self.related_candidates(
            &nav,
            source,
            &source_descriptor,
            &target_descriptor,
            target_store.as_ref(),
        )?;

        if nav.to_multiplicity() == Multiplicity::Many {
            match target_keys {
                None => Ok(Related::Many(candidates)),
                Some(keys) => {
                    let mut probe = target_store.create_instance();
                    set_key_values(&target_descriptor, &mut probe, keys);
                    for candidate in candidates {
                        if target_store.is_key_equal(&candidate, &probe)? {
                            return Ok(Related::One(Some(candidate)));
                        }
                    }
                    Ok(Related::One(None))
                }
            }
        } else {
            Ok(Related::One(candidates.into_iter().next()))
        }
    }

    /// Collect the target-store records the relation points at.
    fn related_candidates(
        &self,
        nav: &NavInfo,
        source: &EntityRecord,
        source_descriptor: &EntityDescriptor,
        target_descriptor: &EntityDescriptor,
        target_store: &dyn DataStore,
    ) -> EngineResult<Vec<EntityRecord>> {
        let mut candidates = Vec::new();

        if let Some(from_field) = nav.from_field() {
            let Some(navigation_value) = source.link(&from_field.name) else {
                return Ok(candidates);
            };
            match navigation_value {
                NavValue::Many(references) => {
                    if let Some(to_field) = nav.to_field() {
                        // Bidirectional to-many: the keyed back-reference on
                        // each target decides membership.
                        let source_keys = key_values(source_descriptor, source);
                        for target in target_store.read_all()? {
                            if back_references(target.link(&to_field.name), &source_keys) {
                                candidates.push(target);
                            }
                        }
                    } else {
                        // Forward-only collection: the stored references on
                        // the source select the targets.
                        for target in target_store.read_all()? {
                            let target_keys = key_values(target_descriptor, &target);
                            if references.iter().any(|r| *r == target_keys) {
                                candidates.push(target);
                            }
                        }
                    }
                }
                NavValue::One(reference) => {
                    for target in target_store.read_all()? {
                        if key_values(target_descriptor, &target) == *reference {
                            candidates.push(target);
                        }
                    }
                }
            }
        } else if let Some(to_field) = nav.to_field() {
            // Relation declared only on the target side: select targets
            // whose navigation field references the source.
            let source_keys = key_values(source_descriptor, source);
            for target in target_store.read_all()? {
                if back_references(target.link(&to_field.name), &source_keys) {
                    candidates.push(target);
                }
            }
        }

        Ok(candidates)
    }

    /// Read the media resource of an instance.
    ///
    /// Falls back to the stored copy (looked up by the instance's keys)
    /// when the given instance carries no media fields itself.
    pub fn read_media(&self, entity_set: &str, instance: &EntityRecord) -> EngineResult<MediaData> {
        let store = self.store_for(entity_set)?;
        let descriptor = Arc::clone(store.descriptor());
        let media = descriptor.media().ok_or_else(|| {
            UnsupportedError::MediaResource {
                entity_set: entity_set.to_string(),
            }
        })?;

        let mut content = instance.get(&media.content).cloned();
        let mut mime_type = instance.get(&media.mime_type).cloned();

        if content.as_ref().is_none_or(FieldValue::is_null)
            && mime_type.as_ref().is_none_or(FieldValue::is_null)
        {
            let keys = key_values(&descriptor, instance);
            if let Some(stored) = store.read_by_key(&keys)? {
                content = stored.get(&media.content).cloned();
                mime_type = stored.get(&media.mime_type).cloned();
            }
        }

        let content = match content {
            Some(FieldValue::Binary(bytes)) => bytes,
            _ => Vec::new(),
        };
        let mime_type = match mime_type {
            Some(FieldValue::String(mime)) => mime,
            _ => String::new(),
        };
        Ok(MediaData { content, mime_type })
    }

    /// Write the media resource of an instance through its store.
    pub fn write_media(
        &self,
        entity_set: &str,
        instance: &EntityRecord,
        media_data: MediaData,
    ) -> EngineResult<()> {
        let store = self.store_for(entity_set)?;
        let descriptor = Arc::clone(store.descriptor());
        let media = descriptor.media().ok_or_else(|| {
            UnsupportedError::MediaResource {
                entity_set: entity_set.to_string(),
            }
        })?;

        let keys = key_values(&descriptor, instance);
        let mut stored = store.read_by_key(&keys)?.ok_or(NotFoundError::Entity {
            entity_set: entity_set.to_string(),
        })?;
        stored.set(media.content.clone(), FieldValue::Binary(media_data.content));
        stored.set(
            media.mime_type.clone(),
            FieldValue::String(media_data.mime_type),
        );
        store.update(stored)?;
        Ok(())
    }

    /// Write a relation from `source` to the target entity with the given
    /// keys: the target is set (to-one) or added (to-many) on the source's
    /// navigation field, and for a bidirectional relation the source is
    /// written back on the target's field the same way.
    ///
    /// The two sides are written sequentially; a target-side failure after
    /// the source side succeeded is not rolled back.
    pub fn write_relation(
        &self,
        source_set: &str,
        source: &EntityRecord,
        target_set: &str,
        target_keys: &KeyMap,
    ) -> EngineResult<()> {
        let source_store = self.store_for(source_set)?;
        let target_store = self.store_for(target_set)?;
        let source_descriptor = Arc::clone(source_store.descriptor());
        let target_descriptor = Arc::clone(target_store.descriptor());

        let nav = resolve(&source_descriptor, &target_descriptor).ok_or_else(|| {
            MetadataError::MissingNavigation {
                source: source_descriptor.entity().to_string(),
                target: target_descriptor.entity().to_string(),
            }
        })?;
        let from_field = nav.from_field().ok_or_else(|| {
            MetadataError::InvalidNavigationTarget {
                entity: source_descriptor.entity().to_string(),
                navigation: format!("(reverse of {})", target_descriptor.entity()),
            }
        })?;

        let target = target_store
            .read_by_key(target_keys)?
            .ok_or(NotFoundError::Entity {
                entity_set: target_set.to_string(),
            })?;

        let source_keys = key_values(&source_descriptor, source);
        let mut stored_source =
            source_store
                .read_by_key(&source_keys)?
                .ok_or(NotFoundError::Entity {
                    entity_set: source_set.to_string(),
                })?;

        set_at_navigation_field(
            &mut stored_source,
            from_field,
            key_values(&target_descriptor, &target),
        );
        source_store.update(stored_source)?;

        if let Some(to_field) = nav.to_field() {
            let mut stored_target = target;
            set_at_navigation_field(&mut stored_target, to_field, source_keys);
            if let Err(error) = target_store.update(stored_target) {
                // Known gap: the source side is already written at this
                // point and is not rolled back.
                warn!(
                    source_set,
                    target_set,
                    %error,
                    "relation write failed after the source side was updated"
                );
                return Err(error);
            }
        }
        Ok(())
    }

    /// Relation deletion is declared but not supported.
    pub fn delete_relation(
        &self,
        _source_set: &str,
        _source: &EntityRecord,
        _target_set: &str,
        _target_keys: Option<&KeyMap>,
    ) -> EngineResult<()> {
        Err(UnsupportedError::RelationDelete.into())
    }
}

/// Set (to-one) or append (to-many) a key reference at a navigation field.
fn set_at_navigation_field(
    record: &mut EntityRecord,
    field: &NavigationDescriptor,
    reference: KeyMap,
) {
    if field.collection {
        record.push_link(field.name.clone(), reference);
    } else {
        record.set_link(field.name.clone(), NavValue::One(reference));
    }
}

/// Whether a navigation value references the given keys (to-one compares
/// the single reference, to-many looks for any matching element).
fn back_references(value: Option<&NavValue>, keys: &KeyMap) -> bool {
    value.is_some_and(|v| v.references(keys))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::PropertyType;
    use crate::data::store::InMemoryStoreManager;
    use crate::model::descriptor::NavigationDescriptor;

    fn test_model() -> ModelRegistry {
        let mut model = ModelRegistry::new();
        model.register(
            EntityDescriptor::builder("Building")
                .entity_set("Buildings")
                .key("id", PropertyType::Int32)
                .property("name", PropertyType::String)
                .navigation(NavigationDescriptor::to_many("rooms", "Room"))
                .build()
                .unwrap(),
        );
        model.register(
            EntityDescriptor::builder("Room")
                .entity_set("Rooms")
                .key("id", PropertyType::Int32)
                .property("name", PropertyType::String)
                .navigation(NavigationDescriptor::to_one("building", "Building"))
                .build()
                .unwrap(),
        );
        model.register(
            EntityDescriptor::builder("Team")
                .entity_set("Teams")
                .key("id", PropertyType::Int32)
                .navigation(NavigationDescriptor::to_many("members", "Employee"))
                .build()
                .unwrap(),
        );
        model.register(
            EntityDescriptor::builder("Employee")
                .entity_set("Employees")
                .key("id", PropertyType::Int32)
                .property("name", PropertyType::String)
                .build()
                .unwrap(),
        );
        model.register(
            EntityDescriptor::builder("Photo")
                .entity_set("Photos")
                .key("id", PropertyType::Int32)
                .media("image", "imageType")
                .build()
                .unwrap(),
        );
        model
    }

    fn test_source() -> GenericDataSource {
        let model = Arc::new(test_model());
        let stores = Arc::new(InMemoryStoreManager::new());
        GenericDataSource::new(model, stores).unwrap()
    }

    fn record(entity: &str, id: i64, name: Option<&str>) -> EntityRecord {
        let mut record = EntityRecord::new(entity);
        record.set("Id", FieldValue::Integer(id));
        if let Some(name) = name {
            record.set("Name", FieldValue::String(name.to_string()));
        }
        record
    }

    fn keys(id: i64) -> KeyMap {
        let mut keys = KeyMap::new();
        keys.insert("Id".to_string(), FieldValue::Integer(id));
        keys
    }

    #[test]
    fn test_round_trip_new_create_read() {
        let source = test_source();

        let mut instance = source.new_instance("Rooms").unwrap();
        assert_eq!(instance.entity(), "Room");
        instance.set("Id", FieldValue::Integer(1));
        instance.set("Name", FieldValue::String("Room 01".to_string()));

        let created = source.create("Rooms", instance.clone()).unwrap();
        let read = source.read_by_key("Rooms", &keys(1)).unwrap();

        let descriptor = source.model().describe("Room").unwrap();
        assert!(crate::model::keys::key_match(&descriptor, &created, &read).unwrap());
    }

    #[test]
    fn test_read_by_key_not_found() {
        let source = test_source();
        let result = source.read_by_key("Rooms", &keys(404));
        assert!(matches!(
            result,
            Err(crate::core::EngineError::NotFound(NotFoundError::Entity { .. }))
        ));
    }

    #[test]
    fn test_unknown_set_is_store_not_found() {
        let source = test_source();
        let result = source.read_set("Nowhere", &ReadOptions::none());
        assert!(matches!(
            result,
            Err(crate::core::EngineError::NotFound(NotFoundError::Store { .. }))
        ));
    }

    #[test]
    fn test_update_and_delete() {
        let source = test_source();
        source.create("Rooms", record("Room", 1, Some("Old"))).unwrap();

        let updated = source
            .update("Rooms", record("Room", 1, Some("New")))
            .unwrap();
        assert_eq!(
            updated.get("Name"),
            Some(&FieldValue::String("New".to_string()))
        );

        source.delete("Rooms", &keys(1)).unwrap();
        assert!(source.delete("Rooms", &keys(1)).is_err());
    }

    #[test]
    fn test_write_relation_bidirectional_and_read_back() {
        let source = test_source();
        source
            .create("Buildings", record("Building", 1, Some("HQ")))
            .unwrap();
        source.create("Rooms", record("Room", 10, Some("Room 10"))).unwrap();
        source.create("Rooms", record("Room", 11, Some("Room 11"))).unwrap();

        let building = source.read_by_key("Buildings", &keys(1)).unwrap();
        source
            .write_relation("Buildings", &building, "Rooms", &keys(10))
            .unwrap();
        let building = source.read_by_key("Buildings", &keys(1)).unwrap();
        source
            .write_relation("Buildings", &building, "Rooms", &keys(11))
            .unwrap();

        // Forward: to-many relation yields both rooms.
        let building = source.read_by_key("Buildings", &keys(1)).unwrap();
        let related = source
            .read_related("Buildings", &building, "Rooms", None)
            .unwrap();
        match related {
            Related::Many(rooms) => assert_eq!(rooms.len(), 2),
            other => panic!("expected many, got {:?}", other),
        }

        // Reverse: each room points back at the building.
        let room = source.read_by_key("Rooms", &keys(10)).unwrap();
        let related = source.read_related("Rooms", &room, "Buildings", None).unwrap();
        match related {
            Related::One(Some(found)) => {
                assert_eq!(found.get("Id"), Some(&FieldValue::Integer(1)));
            }
            other => panic!("expected one, got {:?}", other),
        }
    }

    #[test]
    fn test_read_related_narrowed_by_target_key() {
        let source = test_source();
        source
            .create("Buildings", record("Building", 1, Some("HQ")))
            .unwrap();
        source.create("Rooms", record("Room", 10, Some("Room 10"))).unwrap();
        source.create("Rooms", record("Room", 11, Some("Room 11"))).unwrap();

        let building = source.read_by_key("Buildings", &keys(1)).unwrap();
        source
            .write_relation("Buildings", &building, "Rooms", &keys(10))
            .unwrap();

        let building = source.read_by_key("Buildings", &keys(1)).unwrap();
        let related = source
            .read_related("Buildings", &building, "Rooms", Some(&keys(10)))
            .unwrap();
        assert!(matches!(related, Related::One(Some(_))));

        // Room 11 exists but is not related.
        let related = source
            .read_related("Buildings", &building, "Rooms", Some(&keys(11)))
            .unwrap();
        assert!(matches!(related, Related::One(None)));
    }

    #[test]
    fn test_read_related_forward_only_collection() {
        let source = test_source();
        source.create("Teams", record("Team", 1, None)).unwrap();
        source
            .create("Employees", record("Employee", 5, Some("Walter")))
            .unwrap();
        source
            .create("Employees", record("Employee", 6, Some("Jesse")))
            .unwrap();

        let team = source.read_by_key("Teams", &keys(1)).unwrap();
        source
            .write_relation("Teams", &team, "Employees", &keys(5))
            .unwrap();

        let team = source.read_by_key("Teams", &keys(1)).unwrap();
        let related = source.read_related("Teams", &team, "Employees", None).unwrap();
        match related {
            Related::Many(members) => {
                assert_eq!(members.len(), 1);
                assert_eq!(members[0].get("Id"), Some(&FieldValue::Integer(5)));
            }
            other => panic!("expected many, got {:?}", other),
        }
    }

    #[test]
    fn test_read_related_reverse_of_forward_only() {
        // The relation is declared on Team only; reading from the employee
        // side still finds the owning team through the stored references,
        // and the inverse of a to-many declaration is a single instance.
        let source = test_source();
        source.create("Teams", record("Team", 1, None)).unwrap();
        source
            .create("Employees", record("Employee", 5, Some("Walter")))
            .unwrap();
        let team = source.read_by_key("Teams", &keys(1)).unwrap();
        source
            .write_relation("Teams", &team, "Employees", &keys(5))
            .unwrap();

        let employee = source.read_by_key("Employees", &keys(5)).unwrap();
        let related = source
            .read_related("Employees", &employee, "Teams", None)
            .unwrap();
        match related {
            Related::One(Some(found)) => {
                assert_eq!(found.get("Id"), Some(&FieldValue::Integer(1)));
            }
            other => panic!("expected one, got {:?}", other),
        }
    }

    #[test]
    fn test_read_related_without_navigation_is_metadata_error() {
        let source = test_source();
        source.create("Photos", record("Photo", 1, None)).unwrap();
        source
            .create("Employees", record("Employee", 5, Some("Walter")))
            .unwrap();

        let photo = source.read_by_key("Photos", &keys(1)).unwrap();
        let result = source.read_related("Photos", &photo, "Employees", None);
        assert!(matches!(
            result,
            Err(crate::core::EngineError::Metadata(
                MetadataError::MissingNavigation { .. }
            ))
        ));
    }

    #[test]
    fn test_delete_relation_is_unsupported() {
        let source = test_source();
        let building = record("Building", 1, None);
        let result = source.delete_relation("Buildings", &building, "Rooms", None);
        assert!(matches!(
            result,
            Err(crate::core::EngineError::Unsupported(
                UnsupportedError::RelationDelete
            ))
        ));
    }

    #[test]
    fn test_media_write_and_read_fallback() {
        let source = test_source();
        source.create("Photos", record("Photo", 1, None)).unwrap();

        let instance = source.read_by_key("Photos", &keys(1)).unwrap();
        source
            .write_media(
                "Photos",
                &instance,
                MediaData::new(vec![0x89, 0x50], "image/png"),
            )
            .unwrap();

        // A bare instance carrying only keys falls back to the stored copy.
        let mut probe = EntityRecord::new("Photo");
        probe.set("Id", FieldValue::Integer(1));
        let media = source.read_media("Photos", &probe).unwrap();
        assert_eq!(media.content, vec![0x89, 0x50]);
        assert_eq!(media.mime_type, "image/png");
    }

    #[test]
    fn test_media_on_non_media_entity_is_unsupported() {
        let source = test_source();
        let room = record("Room", 1, None);
        assert!(matches!(
            source.read_media("Rooms", &room),
            Err(crate::core::EngineError::Unsupported(
                UnsupportedError::MediaResource { .. }
            ))
        ));
        assert!(
            source
                .write_media("Rooms", &room, MediaData::default())
                .is_err()
        );
    }
}
