//! Dynamic entity records operated on by the generic engine
//!
//! The engine never sees concrete application structs. Every instance is an
//! [`EntityRecord`]: a bag of named property values plus named navigation
//! references, interpreted through the entity's descriptor. Navigation
//! fields hold key references to related entities rather than owned copies,
//! so relationship traversal and relation writes stay value-based.

use crate::core::field::FieldValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key property name → key value
pub type KeyMap = BTreeMap<String, FieldValue>;

/// Value of a navigation field: one reference or a collection of references
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum NavValue {
    /// A to-one reference (key values of the single related entity)
    One(KeyMap),
    /// A to-many reference list
    Many(Vec<KeyMap>),
}

impl NavValue {
    /// Check whether any referenced key set equals the given key values
    pub fn references(&self, keys: &KeyMap) -> bool {
        match self {
            NavValue::One(reference) => reference == keys,
            NavValue::Many(references) => references.iter().any(|r| r == keys),
        }
    }
}

/// A generic entity instance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityRecord {
    entity: String,
    values: BTreeMap<String, FieldValue>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    links: BTreeMap<String, NavValue>,
}

impl EntityRecord {
    /// Create an empty record of the given entity type
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            values: BTreeMap::new(),
            links: BTreeMap::new(),
        }
    }

    /// The canonical entity-type name this record belongs to
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Get a property value by its canonical name
    pub fn get(&self, property: &str) -> Option<&FieldValue> {
        self.values.get(property)
    }

    /// Set a property value by its canonical name
    pub fn set(&mut self, property: impl Into<String>, value: FieldValue) {
        self.values.insert(property.into(), value);
    }

    /// Remove a property value, returning the previous value if any
    pub fn unset(&mut self, property: &str) -> Option<FieldValue> {
        self.values.remove(property)
    }

    /// Whether the property is absent or explicitly null
    pub fn is_missing(&self, property: &str) -> bool {
        match self.values.get(property) {
            None => true,
            Some(value) => value.is_null(),
        }
    }

    /// Iterate over all set property values
    pub fn values(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Get a navigation value by its canonical property name
    pub fn link(&self, navigation: &str) -> Option<&NavValue> {
        self.links.get(navigation)
    }

    /// Replace a navigation value (to-one semantics: overwrite)
    pub fn set_link(&mut self, navigation: impl Into<String>, value: NavValue) {
        self.links.insert(navigation.into(), value);
    }

    /// Append a reference to a to-many navigation field, creating the
    /// collection if the field was unset.
    pub fn push_link(&mut self, navigation: impl Into<String>, reference: KeyMap) {
        let entry = self
            .links
            .entry(navigation.into())
            .or_insert_with(|| NavValue::Many(Vec::new()));
        match entry {
            NavValue::Many(references) => references.push(reference),
            // A to-one field written with to-many semantics is replaced by a
            // collection holding both references.
            NavValue::One(existing) => {
                let previous = existing.clone();
                *entry = NavValue::Many(vec![previous, reference]);
            }
        }
    }

    /// Remove a navigation value, returning the previous value if any
    pub fn unset_link(&mut self, navigation: &str) -> Option<NavValue> {
        self.links.remove(navigation)
    }
}
