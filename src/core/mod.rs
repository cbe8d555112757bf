//! Core value and error types shared by every subsystem

pub mod error;
pub mod field;
pub mod record;

pub use error::{
    EngineError, EngineResult, MetadataError, NotFoundError, StoreError, UnsupportedError,
};
pub use field::{FieldValue, PropertyType};
pub use record::{EntityRecord, KeyMap, NavValue};
