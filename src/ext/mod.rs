//! Extension dispatch: per-entity-set, per-operation interception

pub mod context;
pub mod processor;
pub mod registry;

pub use context::ExtensionContext;
pub use processor::{OperationDispatcher, OperationRequest, OperationResponse, ResponseBody};
pub use registry::{
    ExtensionBinding, ExtensionHandler, ExtensionProvider, ExtensionRegistry, OperationKind,
};
