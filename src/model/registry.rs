//! Model registry: cached entity descriptors, indexed two ways
//!
//! Populated once during service construction, then shared read-only
//! (wrap it in an `Arc`); descriptors are immutable after registration.

use crate::model::descriptor::EntityDescriptor;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Registry of all entity descriptors known to the engine
#[derive(Default)]
pub struct ModelRegistry {
    by_entity: HashMap<String, Arc<EntityDescriptor>>,
    by_set: HashMap<String, Arc<EntityDescriptor>>,
}

impl ModelRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            by_entity: HashMap::new(),
            by_set: HashMap::new(),
        }
    }

    /// Register a descriptor, returning the cached copy.
    ///
    /// Registration is idempotent: registering a second descriptor under an
    /// already-known entity name returns the first one unchanged.
    pub fn register(&mut self, descriptor: EntityDescriptor) -> Arc<EntityDescriptor> {
        if let Some(existing) = self.by_entity.get(descriptor.entity()) {
            return Arc::clone(existing);
        }
        debug!(
            entity = descriptor.entity(),
            entity_set = descriptor.entity_set(),
            "registering entity descriptor"
        );
        let descriptor = Arc::new(descriptor);
        self.by_entity
            .insert(descriptor.entity().to_string(), Arc::clone(&descriptor));
        self.by_set
            .insert(descriptor.entity_set().to_string(), Arc::clone(&descriptor));
        descriptor
    }

    /// Look up a descriptor by entity-type name
    pub fn describe(&self, entity: &str) -> Option<Arc<EntityDescriptor>> {
        self.by_entity.get(entity).cloned()
    }

    /// Look up a descriptor by entity-set name
    pub fn describe_set(&self, entity_set: &str) -> Option<Arc<EntityDescriptor>> {
        self.by_set.get(entity_set).cloned()
    }

    /// Whether the entity type is registered and carries usable metadata
    pub fn is_describable(&self, entity: &str) -> bool {
        self.by_entity
            .get(entity)
            .is_some_and(|d| d.is_describable())
    }

    /// Iterate over all registered descriptors
    pub fn descriptors(&self) -> impl Iterator<Item = &Arc<EntityDescriptor>> {
        self.by_entity.values()
    }

    /// Number of registered entity types
    pub fn len(&self) -> usize {
        self.by_entity.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.by_entity.is_empty()
    }
}
