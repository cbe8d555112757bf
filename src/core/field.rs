//! Field value types and declared property types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A polymorphic field value that can hold different types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Uuid(Uuid),
    DateTime(DateTime<Utc>),
    Binary(Vec<u8>),
    Null,
}

impl FieldValue {
    /// Get the value as a string if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer if possible
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as a float if possible
    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get the value as a boolean if possible
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the value as a UUID if possible
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            FieldValue::Uuid(u) => Some(*u),
            _ => None,
        }
    }

    /// Get the value as binary content if possible
    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Binary(b) => Some(b),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Check whether the value fits a declared property type.
    ///
    /// `Null` conforms to every type; nullability is a facet of the
    /// property declaration, not of the value itself.
    pub fn conforms_to(&self, property_type: PropertyType) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::String(_) => property_type == PropertyType::String,
            FieldValue::Integer(_) => matches!(
                property_type,
                PropertyType::Int16 | PropertyType::Int32 | PropertyType::Int64
            ),
            FieldValue::Float(_) => {
                matches!(property_type, PropertyType::Double | PropertyType::Decimal)
            }
            FieldValue::Boolean(_) => property_type == PropertyType::Boolean,
            FieldValue::Uuid(_) => property_type == PropertyType::Guid,
            FieldValue::DateTime(_) => property_type == PropertyType::DateTime,
            FieldValue::Binary(_) => property_type == PropertyType::Binary,
        }
    }
}

/// Declared semantic type of an entity property
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PropertyType {
    String,
    Boolean,
    Int16,
    Int32,
    Int64,
    Double,
    Decimal,
    DateTime,
    Guid,
    Binary,
}
