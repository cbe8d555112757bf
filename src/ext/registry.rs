//! Extension registry: interceptors keyed by entity set and operation kind
//!
//! Handlers are collected once at startup from [`ExtensionProvider`]
//! implementations and indexed by every `(entity set, operation kind)`
//! pair they declare. Lookup happens before any generic processing.

use crate::core::error::EngineResult;
use crate::ext::context::ExtensionContext;
use crate::ext::processor::OperationResponse;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Separator used in the composite registry key
pub const SEPARATOR: &str = "_";

/// The kind of a generic operation, derived from the request verb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Get,
    Post,
    Put,
    Delete,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Get => "GET",
            OperationKind::Post => "POST",
            OperationKind::Put => "PUT",
            OperationKind::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An interceptor wrapping the generic operation for its bound pairs
pub type ExtensionHandler =
    Arc<dyn Fn(&mut ExtensionContext<'_>) -> EngineResult<OperationResponse> + Send + Sync>;

/// One declared extension: a handler bound to every combination of the
/// listed entity sets and operation kinds.
pub struct ExtensionBinding {
    pub entity_sets: Vec<String>,
    pub operations: Vec<OperationKind>,
    pub handler: ExtensionHandler,
}

impl ExtensionBinding {
    pub fn new(
        entity_sets: impl IntoIterator<Item = impl Into<String>>,
        operations: impl IntoIterator<Item = OperationKind>,
        handler: ExtensionHandler,
    ) -> Self {
        Self {
            entity_sets: entity_sets.into_iter().map(Into::into).collect(),
            operations: operations.into_iter().collect(),
            handler,
        }
    }
}

/// A type declaring extensions, scanned once at startup
pub trait ExtensionProvider {
    fn extensions(&self) -> Vec<ExtensionBinding>;
}

/// Lookup table of interceptors
#[derive(Default)]
pub struct ExtensionRegistry {
    handlers: HashMap<String, ExtensionHandler>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    fn extension_id(entity_set: &str, kind: OperationKind) -> String {
        format!("{}{}{}", entity_set, SEPARATOR, kind.as_str())
    }

    /// Register a handler for one `(entity set, operation kind)` pair.
    /// A later registration for the same pair replaces the earlier one.
    pub fn register(
        &mut self,
        entity_set: impl Into<String>,
        kind: OperationKind,
        handler: ExtensionHandler,
    ) {
        let entity_set = entity_set.into();
        debug!(entity_set, kind = %kind, "registering extension handler");
        self.handlers
            .insert(Self::extension_id(&entity_set, kind), handler);
    }

    /// Register a binding for every pair it declares
    pub fn register_binding(&mut self, binding: ExtensionBinding) {
        for entity_set in &binding.entity_sets {
            for kind in &binding.operations {
                self.register(entity_set.clone(), *kind, Arc::clone(&binding.handler));
            }
        }
    }

    /// Register every binding a provider declares
    pub fn register_provider(&mut self, provider: &dyn ExtensionProvider) {
        for binding in provider.extensions() {
            self.register_binding(binding);
        }
    }

    /// Look up the handler for a pair, if one is registered
    pub fn lookup(&self, entity_set: &str, kind: OperationKind) -> Option<ExtensionHandler> {
        self.handlers
            .get(&Self::extension_id(entity_set, kind))
            .cloned()
    }

    /// Whether a handler is registered for the pair
    pub fn is_registered(&self, entity_set: &str, kind: OperationKind) -> bool {
        self.handlers
            .contains_key(&Self::extension_id(entity_set, kind))
    }

    /// Number of registered `(entity set, operation kind)` pairs
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handler is registered at all
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
