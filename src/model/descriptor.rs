//! Entity descriptors: the declarative schema for a data type
//!
//! A descriptor is built once per entity type through [`DescriptorBuilder`]
//! and never mutated afterwards. It captures everything the generic engine
//! needs to know about a type: canonical names, key fields, property types,
//! the optional media resource, and navigation fields to other types.

use crate::core::error::{EngineResult, MetadataError};
use crate::core::field::PropertyType;
use serde::{Deserialize, Serialize};

/// Derive the canonical property name from a field name.
///
/// The fixed rule mirrors bean-style naming: first character upper-cased,
/// rest untouched ("employeeName" → "EmployeeName").
pub fn canonical_name(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Declared multiplicity of a navigation field
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Multiplicity {
    ZeroOrOne,
    One,
    Many,
}

/// A single entity property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyDescriptor {
    /// The declaring field name ("employeeId")
    pub field: String,
    /// The canonical property name ("EmployeeId"), explicit or derived
    pub name: String,
    /// Declared semantic type
    pub property_type: PropertyType,
    /// Whether null values are permitted
    pub nullable: bool,
    /// Whether the property is part of the entity key
    pub is_key: bool,
}

/// The media resource declaration of an entity type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaDescriptor {
    /// Canonical name of the binary content property
    pub content: String,
    /// Canonical name of the mime-type property
    pub mime_type: String,
}

/// A navigation field linking one entity type to another
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NavigationDescriptor {
    /// The declaring field name ("teamMembers")
    pub field: String,
    /// The canonical property name ("TeamMembers"), explicit or derived
    pub name: String,
    /// Target entity-type name
    pub target: String,
    /// Declared multiplicity hint
    pub declared_multiplicity: Multiplicity,
    /// Whether the field holds a collection of references
    pub collection: bool,
    /// Explicit association name, if declared
    pub association: Option<String>,
    /// Explicit role name, if declared
    pub role: Option<String>,
}

impl NavigationDescriptor {
    /// A to-one navigation field
    pub fn to_one(field: impl Into<String>, target: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            name: canonical_name(&field),
            field,
            target: target.into(),
            declared_multiplicity: Multiplicity::One,
            collection: false,
            association: None,
            role: None,
        }
    }

    /// A to-many (collection) navigation field
    pub fn to_many(field: impl Into<String>, target: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            name: canonical_name(&field),
            field,
            target: target.into(),
            declared_multiplicity: Multiplicity::Many,
            collection: true,
            association: None,
            role: None,
        }
    }

    /// Override the canonical property name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Declare an explicit association name
    pub fn association(mut self, association: impl Into<String>) -> Self {
        self.association = Some(association.into());
        self
    }

    /// Declare an explicit role name
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Weaken a to-one navigation to zero-or-one
    pub fn optional(mut self) -> Self {
        self.declared_multiplicity = Multiplicity::ZeroOrOne;
        self
    }

    /// Effective multiplicity: a collection field declared ONE is MANY.
    pub fn multiplicity(&self) -> Multiplicity {
        if self.collection && self.declared_multiplicity == Multiplicity::One {
            Multiplicity::Many
        } else {
            self.declared_multiplicity
        }
    }

    /// The role name of this side: explicit role, or `r_` + canonical field
    pub fn role_name(&self) -> String {
        match &self.role {
            Some(role) => role.clone(),
            None => format!("r_{}", canonical_name(&self.field)),
        }
    }
}

/// Cached metadata record for one entity type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityDescriptor {
    entity: String,
    entity_set: String,
    properties: Vec<PropertyDescriptor>,
    media: Option<MediaDescriptor>,
    navigations: Vec<NavigationDescriptor>,
}

impl EntityDescriptor {
    /// Start building a descriptor for the given entity-type name
    pub fn builder(entity: impl Into<String>) -> DescriptorBuilder {
        DescriptorBuilder {
            entity: entity.into(),
            entity_set: None,
            properties: Vec::new(),
            media: None,
            navigations: Vec::new(),
        }
    }

    /// Canonical entity-type name
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Canonical entity-set name
    pub fn entity_set(&self) -> &str {
        &self.entity_set
    }

    /// All properties in declaration order
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// Key properties in declaration order (subset of `properties`)
    pub fn key_properties(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties.iter().filter(|p| p.is_key)
    }

    /// Canonical names of the key properties, in declaration order
    pub fn key_names(&self) -> Vec<&str> {
        self.key_properties().map(|p| p.name.as_str()).collect()
    }

    /// Whether the type declares at least one key field
    pub fn has_keys(&self) -> bool {
        self.properties.iter().any(|p| p.is_key)
    }

    /// Find a property by canonical name
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// The media resource declaration, if the type is media-backed
    pub fn media(&self) -> Option<&MediaDescriptor> {
        self.media.as_ref()
    }

    /// All navigation fields in declaration order
    pub fn navigations(&self) -> &[NavigationDescriptor] {
        &self.navigations
    }

    /// Find a navigation field by canonical name
    pub fn navigation(&self, name: &str) -> Option<&NavigationDescriptor> {
        self.navigations.iter().find(|n| n.name == name)
    }

    /// Whether the type carries any recognizable metadata at all.
    ///
    /// A descriptor without properties and navigations builds fine, but
    /// callers must check this before treating the type as an entity.
    pub fn is_describable(&self) -> bool {
        !self.properties.is_empty() || !self.navigations.is_empty()
    }
}

/// Builder collecting the declared fields of one entity type
pub struct DescriptorBuilder {
    entity: String,
    entity_set: Option<String>,
    properties: Vec<PropertyDescriptor>,
    media: Option<MediaDescriptor>,
    navigations: Vec<NavigationDescriptor>,
}

impl DescriptorBuilder {
    /// Override the entity-set name (defaults to `<Entity>Set`)
    pub fn entity_set(mut self, name: impl Into<String>) -> Self {
        self.entity_set = Some(name.into());
        self
    }

    /// Declare a key property (non-nullable, canonical name derived)
    pub fn key(self, field: impl Into<String>, property_type: PropertyType) -> Self {
        let field = field.into();
        let name = canonical_name(&field);
        self.push_property(field, name, property_type, false, true)
    }

    /// Declare a key property with an explicit canonical name
    pub fn key_named(
        self,
        field: impl Into<String>,
        name: impl Into<String>,
        property_type: PropertyType,
    ) -> Self {
        self.push_property(field.into(), name.into(), property_type, false, true)
    }

    /// Declare a plain property (nullable, canonical name derived)
    pub fn property(self, field: impl Into<String>, property_type: PropertyType) -> Self {
        let field = field.into();
        let name = canonical_name(&field);
        self.push_property(field, name, property_type, true, false)
    }

    /// Declare a plain property with an explicit canonical name
    pub fn property_named(
        self,
        field: impl Into<String>,
        name: impl Into<String>,
        property_type: PropertyType,
    ) -> Self {
        self.push_property(field.into(), name.into(), property_type, true, false)
    }

    /// Declare the media resource fields (binary content + mime type).
    ///
    /// Both fields are registered as regular properties as well, so they
    /// travel with the record through stores like any other value.
    pub fn media(
        mut self,
        content_field: impl Into<String>,
        mime_field: impl Into<String>,
    ) -> Self {
        let content_field = content_field.into();
        let mime_field = mime_field.into();
        let content = canonical_name(&content_field);
        let mime_type = canonical_name(&mime_field);
        self.media = Some(MediaDescriptor {
            content: content.clone(),
            mime_type: mime_type.clone(),
        });
        self.push_property(content_field, content, PropertyType::Binary, true, false)
            .push_property(mime_field, mime_type, PropertyType::String, true, false)
    }

    /// Declare a navigation field
    pub fn navigation(mut self, navigation: NavigationDescriptor) -> Self {
        self.navigations.push(navigation);
        self
    }

    fn push_property(
        mut self,
        field: String,
        name: String,
        property_type: PropertyType,
        nullable: bool,
        is_key: bool,
    ) -> Self {
        self.properties.push(PropertyDescriptor {
            field,
            name,
            property_type,
            nullable,
            is_key,
        });
        self
    }

    /// Finish the descriptor.
    ///
    /// Declaring properties without a single key field is a construction
    /// time error; an entirely empty descriptor is permitted (callers check
    /// [`EntityDescriptor::is_describable`]).
    pub fn build(self) -> EngineResult<EntityDescriptor> {
        if !self.properties.is_empty() && !self.properties.iter().any(|p| p.is_key) {
            return Err(MetadataError::NoKeys {
                entity: self.entity,
            }
            .into());
        }
        let entity_set = self
            .entity_set
            .unwrap_or_else(|| format!("{}Set", self.entity));
        Ok(EntityDescriptor {
            entity: self.entity,
            entity_set,
            properties: self.properties,
            media: self.media,
            navigations: self.navigations,
        })
    }
}
