//! Key extraction, injection and matching
//!
//! Identity of an entity instance is defined purely by its key-field
//! values. Matching follows fixed null-handling rules: a key missing (or
//! null) on both sides counts as equal, missing on one side does not, and
//! a type without key fields cannot be used for identity comparison at all.

use crate::core::error::{EngineResult, MetadataError};
use crate::core::field::FieldValue;
use crate::core::record::{EntityRecord, KeyMap};
use crate::model::descriptor::EntityDescriptor;

/// Extract the key values of a record as a map of canonical key-property
/// names to values. Every declared key name is present; unset record fields
/// appear as `Null`.
pub fn key_values(descriptor: &EntityDescriptor, record: &EntityRecord) -> KeyMap {
    let mut keys = KeyMap::new();
    for property in descriptor.key_properties() {
        let value = record
            .get(&property.name)
            .cloned()
            .unwrap_or(FieldValue::Null);
        keys.insert(property.name.clone(), value);
    }
    keys
}

/// Set key fields on a record from the given map.
///
/// A key that is absent from the map, or null in it, leaves the record
/// untouched rather than writing a null over an existing value.
pub fn set_key_values(descriptor: &EntityDescriptor, record: &mut EntityRecord, keys: &KeyMap) {
    for property in descriptor.key_properties() {
        match keys.get(&property.name) {
            Some(value) if !value.is_null() => record.set(property.name.clone(), value.clone()),
            _ => {}
        }
    }
}

/// Compare the keys of two instances of the same entity type.
///
/// Instances of different entity types never match. A type without key
/// fields raises a metadata error instead of returning a boolean.
pub fn key_match(
    descriptor: &EntityDescriptor,
    first: &EntityRecord,
    second: &EntityRecord,
) -> EngineResult<bool> {
    if first.entity() != second.entity() {
        return Ok(false);
    }
    let first_keys = key_values(descriptor, first);
    let second_keys = key_values(descriptor, second);
    if first_keys.is_empty() && second_keys.is_empty() {
        return Err(MetadataError::NoKeys {
            entity: descriptor.entity().to_string(),
        }
        .into());
    }
    key_values_match(descriptor, &first_keys, &second_keys)
}

/// Compare the keys of an instance with externally supplied key values.
pub fn key_match_map(
    descriptor: &EntityDescriptor,
    instance: &EntityRecord,
    keys: &KeyMap,
) -> EngineResult<bool> {
    let instance_keys = key_values(descriptor, instance);
    key_values_match(descriptor, &instance_keys, keys)
}

/// Compare two key maps under the null-handling rules.
fn key_values_match(
    descriptor: &EntityDescriptor,
    first: &KeyMap,
    second: &KeyMap,
) -> EngineResult<bool> {
    if first.len() != second.len() {
        return Ok(false);
    }
    if first.is_empty() {
        return Err(MetadataError::NoKeys {
            entity: descriptor.entity().to_string(),
        }
        .into());
    }
    for (name, first_value) in first {
        let first_value = present(Some(first_value));
        let second_value = present(second.get(name));
        match (first_value, second_value) {
            (None, None) => {}
            (Some(a), Some(b)) if a == b => {}
            _ => return Ok(false),
        }
    }
    Ok(true)
}

/// Normalize absent and explicit-null values to a single "missing" state.
fn present(value: Option<&FieldValue>) -> Option<&FieldValue> {
    match value {
        Some(FieldValue::Null) | None => None,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::PropertyType;

    fn employee_descriptor() -> EntityDescriptor {
        EntityDescriptor::builder("Employee")
            .entity_set("Employees")
            .key("employeeId", PropertyType::Int32)
            .property("employeeName", PropertyType::String)
            .build()
            .unwrap()
    }

    fn employee(id: i64) -> EntityRecord {
        let mut record = EntityRecord::new("Employee");
        record.set("EmployeeId", FieldValue::Integer(id));
        record
    }

    #[test]
    fn test_key_match_is_reflexive_and_symmetric() {
        let descriptor = employee_descriptor();
        let a = employee(1);
        let b = employee(1);

        assert!(key_match(&descriptor, &a, &a).unwrap());
        assert!(key_match(&descriptor, &a, &b).unwrap());
        assert!(key_match(&descriptor, &b, &a).unwrap());
    }

    #[test]
    fn test_key_match_differs_on_any_key() {
        let descriptor = employee_descriptor();
        let a = employee(1);
        let b = employee(2);
        assert!(!key_match(&descriptor, &a, &b).unwrap());
    }

    #[test]
    fn test_key_match_null_equals_null() {
        let descriptor = employee_descriptor();
        let a = EntityRecord::new("Employee");
        let mut b = EntityRecord::new("Employee");
        b.set("EmployeeId", FieldValue::Null);

        assert!(key_match(&descriptor, &a, &b).unwrap());
    }

    #[test]
    fn test_key_match_null_on_one_side_differs() {
        let descriptor = employee_descriptor();
        let a = employee(1);
        let b = EntityRecord::new("Employee");
        assert!(!key_match(&descriptor, &a, &b).unwrap());
    }

    #[test]
    fn test_key_match_different_entity_types() {
        let descriptor = employee_descriptor();
        let a = employee(1);
        let b = EntityRecord::new("Room");
        assert!(!key_match(&descriptor, &a, &b).unwrap());
    }

    #[test]
    fn test_zero_key_type_raises_metadata_error() {
        let descriptor = EntityDescriptor::builder("Ghost").build().unwrap();
        let a = EntityRecord::new("Ghost");
        let b = EntityRecord::new("Ghost");
        assert!(key_match(&descriptor, &a, &b).is_err());
        assert!(key_match_map(&descriptor, &a, &KeyMap::new()).is_err());
    }

    #[test]
    fn test_key_match_map() {
        let descriptor = employee_descriptor();
        let record = employee(7);

        let mut keys = KeyMap::new();
        keys.insert("EmployeeId".to_string(), FieldValue::Integer(7));
        assert!(key_match_map(&descriptor, &record, &keys).unwrap());

        keys.insert("EmployeeId".to_string(), FieldValue::Integer(8));
        assert!(!key_match_map(&descriptor, &record, &keys).unwrap());
    }

    #[test]
    fn test_key_match_map_size_mismatch() {
        let descriptor = employee_descriptor();
        let record = employee(7);

        let mut keys = KeyMap::new();
        keys.insert("EmployeeId".to_string(), FieldValue::Integer(7));
        keys.insert("Extra".to_string(), FieldValue::Integer(1));
        assert!(!key_match_map(&descriptor, &record, &keys).unwrap());
    }

    #[test]
    fn test_set_key_values_skips_null_and_absent() {
        let descriptor = employee_descriptor();
        let mut record = employee(7);

        let mut keys = KeyMap::new();
        keys.insert("EmployeeId".to_string(), FieldValue::Null);
        set_key_values(&descriptor, &mut record, &keys);
        assert_eq!(record.get("EmployeeId"), Some(&FieldValue::Integer(7)));

        keys.insert("EmployeeId".to_string(), FieldValue::Integer(9));
        set_key_values(&descriptor, &mut record, &keys);
        assert_eq!(record.get("EmployeeId"), Some(&FieldValue::Integer(9)));
    }
}
