//! # Metacrud
//!
//! A metadata-driven generic CRUD and relationship-navigation engine.
//!
//! Entity types are declared once as [`model::EntityDescriptor`]s (keys,
//! properties, media resource, navigation fields) and registered in a
//! [`model::ModelRegistry`]. The [`data::GenericDataSource`] then drives
//! create/read/update/delete, relationship traversal, relation writes and
//! media access for *any* registered type against pluggable
//! [`data::DataStore`] backends — no per-entity code involved.
//!
//! ## Features
//!
//! - **Declarative schema**: builder-based entity descriptors with derived
//!   canonical names
//! - **Navigation resolution**: bidirectional, unidirectional and
//!   self-referential relations resolved from the metadata alone
//! - **Pluggable stores**: one backing store per entity set behind a small
//!   trait; an in-memory reference store is included
//! - **Read negotiation**: stores declare which of filter/order/skip/top
//!   they applied; the engine executes only the remainder, in order
//! - **Interception**: per-(entity set, operation) handlers wrap the
//!   generic path with an explicit `proceed` continuation
//!
//! ## Quick Start
//!
//! ```rust
//! use metacrud::prelude::*;
//! use std::sync::Arc;
//!
//! // Declare the schema.
//! let mut model = ModelRegistry::new();
//! model.register(
//!     EntityDescriptor::builder("Employee")
//!         .entity_set("Employees")
//!         .key("employeeId", PropertyType::Int32)
//!         .property("employeeName", PropertyType::String)
//!         .build()
//!         .unwrap(),
//! );
//!
//! // Wire the generic engine to in-memory stores.
//! let source = GenericDataSource::new(
//!     Arc::new(model),
//!     Arc::new(InMemoryStoreManager::new()),
//! )
//! .unwrap();
//!
//! // Generic CRUD, driven purely by the metadata.
//! let mut employee = source.new_instance("Employees").unwrap();
//! employee.set("EmployeeId", FieldValue::Integer(1));
//! employee.set("EmployeeName", FieldValue::String("Walter".into()));
//! source.create("Employees", employee).unwrap();
//!
//! let read = source
//!     .read_by_key("Employees", &{
//!         let mut keys = KeyMap::new();
//!         keys.insert("EmployeeId".into(), FieldValue::Integer(1));
//!         keys
//!     })
//!     .unwrap();
//! assert_eq!(
//!     read.get("EmployeeName"),
//!     Some(&FieldValue::String("Walter".into()))
//! );
//! ```

pub mod core;
pub mod data;
pub mod ext;
pub mod functions;
pub mod model;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core Types ===
    pub use crate::core::{
        EngineError, EngineResult, EntityRecord, FieldValue, KeyMap, MetadataError, NavValue,
        NotFoundError, PropertyType, StoreError, UnsupportedError,
    };

    // === Model ===
    pub use crate::model::{
        EntityDescriptor, MediaDescriptor, ModelRegistry, Multiplicity, NavInfo,
        NavigationDescriptor, PropertyDescriptor, key_match, key_match_map, key_values, resolve,
        set_key_values,
    };

    // === Data Access ===
    pub use crate::data::{
        DataStore, GenericDataSource, InMemoryDataStore, InMemoryStoreManager, MediaData,
        ReadOptions, ReadResult, Related, StoreManager,
    };

    // === Extensions ===
    pub use crate::ext::{
        ExtensionBinding, ExtensionContext, ExtensionHandler, ExtensionProvider,
        ExtensionRegistry, OperationDispatcher, OperationKind, OperationRequest,
        OperationResponse, ResponseBody,
    };

    // === Functions ===
    pub use crate::functions::{
        FunctionDescriptor, FunctionRegistry, FunctionReturn, FunctionValue,
    };

    // === External dependencies ===
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use uuid::Uuid;
}
