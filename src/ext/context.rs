//! The context handed to an extension handler
//!
//! A context exposes everything the intercepted call knows — the resolved
//! operation kind, the target entity set and request details, the accept
//! header and the raw payload — plus [`ExtensionContext::proceed`], the
//! continuation that resumes the generic operation. A handler may call
//! `proceed` zero or more times (typically exactly once) and may transform
//! the resulting response before returning it.

use crate::core::error::EngineResult;
use crate::core::record::KeyMap;
use crate::ext::processor::{OperationRequest, OperationResponse};
use crate::ext::registry::OperationKind;
use serde_json::Value;
use std::collections::HashMap;

/// Context of one intercepted operation
pub struct ExtensionContext<'a> {
    request: &'a OperationRequest,
    proceed: &'a (dyn Fn() -> EngineResult<OperationResponse> + 'a),
    parameters: HashMap<String, Value>,
}

impl<'a> ExtensionContext<'a> {
    /// Create a context around a request and its generic continuation
    pub fn new(
        request: &'a OperationRequest,
        proceed: &'a (dyn Fn() -> EngineResult<OperationResponse> + 'a),
    ) -> Self {
        Self {
            request,
            proceed,
            parameters: HashMap::new(),
        }
    }

    /// The resolved operation kind
    pub fn kind(&self) -> OperationKind {
        self.request.kind
    }

    /// The target entity set of the call
    pub fn entity_set(&self) -> &str {
        &self.request.entity_set
    }

    /// The key values addressed by the call, if any
    pub fn key(&self) -> Option<&KeyMap> {
        self.request.key.as_ref()
    }

    /// The full request the handler intercepted
    pub fn request(&self) -> &OperationRequest {
        self.request
    }

    /// The accept header of the call, if one was captured
    pub fn accept_header(&self) -> Option<&str> {
        self.request.accept.as_deref()
    }

    /// The raw request payload, if one was captured
    pub fn payload(&self) -> Option<&[u8]> {
        self.request.payload.as_deref()
    }

    /// Attach a named parameter to the context
    pub fn add_parameter(&mut self, name: impl Into<String>, value: Value) -> &mut Self {
        self.parameters.insert(name.into(), value);
        self
    }

    /// Read back a named parameter
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    /// Resume the intercepted generic operation.
    ///
    /// Not calling this at all simply short-circuits the generic path.
    pub fn proceed(&self) -> EngineResult<OperationResponse> {
        (self.proceed)()
    }
}
