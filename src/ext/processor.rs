//! Operation dispatch: interception first, generic execution otherwise
//!
//! Every inbound generic operation is described by an [`OperationRequest`]
//! and enters through [`OperationDispatcher::execute`]. If an interceptor
//! is registered for the `(entity set, operation kind)` pair it runs and
//! decides whether to `proceed` into the generic path; otherwise the
//! generic path executes directly. Collection reads apply the remaining
//! read options the backing store did not claim.

use crate::core::error::{EngineError, EngineResult, NotFoundError};
use crate::core::record::{EntityRecord, KeyMap};
use crate::data::read::ReadOptions;
use crate::data::source::{GenericDataSource, Related};
use crate::ext::context::ExtensionContext;
use crate::ext::registry::{ExtensionRegistry, OperationKind};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::trace;

/// Descriptor of one generic operation call
#[derive(Debug, Clone)]
pub struct OperationRequest {
    /// Target entity set
    pub entity_set: String,
    /// Operation kind derived from the request verb
    pub kind: OperationKind,
    /// Key of the addressed entity, when the call targets a single one
    pub key: Option<KeyMap>,
    /// Entity set of a relationship traversal target
    pub target_set: Option<String>,
    /// Key narrowing the relationship traversal, if any
    pub target_key: Option<KeyMap>,
    /// Read constraints for collection reads
    pub options: ReadOptions,
    /// Parsed entity payload for create/update calls
    pub entity: Option<EntityRecord>,
    /// Accept header of the call, if captured
    pub accept: Option<String>,
    /// Raw request payload, if captured
    pub payload: Option<Vec<u8>>,
}

impl OperationRequest {
    /// A bare request against an entity set
    pub fn new(entity_set: impl Into<String>, kind: OperationKind) -> Self {
        Self {
            entity_set: entity_set.into(),
            kind,
            key: None,
            target_set: None,
            target_key: None,
            options: ReadOptions::none(),
            entity: None,
            accept: None,
            payload: None,
        }
    }

    /// Address a single entity by key
    pub fn with_key(mut self, key: KeyMap) -> Self {
        self.key = Some(key);
        self
    }

    /// Traverse into a related entity set, optionally narrowed by key
    pub fn with_target(mut self, target_set: impl Into<String>, target_key: Option<KeyMap>) -> Self {
        self.target_set = Some(target_set.into());
        self.target_key = target_key;
        self
    }

    /// Attach read constraints
    pub fn with_options(mut self, options: ReadOptions) -> Self {
        self.options = options;
        self
    }

    /// Attach a parsed entity payload
    pub fn with_entity(mut self, entity: EntityRecord) -> Self {
        self.entity = Some(entity);
        self
    }

    /// Attach the accept header
    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    /// Attach the raw request payload
    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Body of an operation response
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    None,
    Entity(EntityRecord),
    Entities(Vec<EntityRecord>),
}

/// Result of a dispatched operation: a body plus response headers.
///
/// Mapping to transport-level statuses is the protocol collaborator's job;
/// error conditions travel as [`EngineError`] instead.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResponse {
    headers: BTreeMap<String, String>,
    body: ResponseBody,
}

impl OperationResponse {
    /// A response without body or headers
    pub fn empty() -> Self {
        Self {
            headers: BTreeMap::new(),
            body: ResponseBody::None,
        }
    }

    /// A single-entity response
    pub fn entity(record: EntityRecord) -> Self {
        Self {
            headers: BTreeMap::new(),
            body: ResponseBody::Entity(record),
        }
    }

    /// A collection response
    pub fn entities(records: Vec<EntityRecord>) -> Self {
        Self {
            headers: BTreeMap::new(),
            body: ResponseBody::Entities(records),
        }
    }

    /// Add or replace a response header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Read a response header
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// All response headers
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// The response body
    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// Consume the response, yielding the body
    pub fn into_body(self) -> ResponseBody {
        self.body
    }
}

/// Dispatcher combining the extension registry with the generic data source
pub struct OperationDispatcher {
    source: Arc<GenericDataSource>,
    extensions: Arc<ExtensionRegistry>,
}

impl OperationDispatcher {
    pub fn new(source: Arc<GenericDataSource>, extensions: Arc<ExtensionRegistry>) -> Self {
        Self { source, extensions }
    }

    /// The generic data source operations fall through to
    pub fn source(&self) -> &Arc<GenericDataSource> {
        &self.source
    }

    /// Execute an operation: interceptor first, generic path otherwise.
    pub fn execute(&self, request: &OperationRequest) -> EngineResult<OperationResponse> {
        if let Some(handler) = self.extensions.lookup(&request.entity_set, request.kind) {
            trace!(
                entity_set = request.entity_set,
                kind = %request.kind,
                "dispatching to extension handler"
            );
            let proceed = || self.run_generic(request);
            let mut context = ExtensionContext::new(request, &proceed);
            return handler(&mut context);
        }
        self.run_generic(request)
    }

    /// The generic path: map operation kind and request shape onto the
    /// data source.
    fn run_generic(&self, request: &OperationRequest) -> EngineResult<OperationResponse> {
        match request.kind {
            OperationKind::Get => {
                if let Some(target_set) = &request.target_set {
                    let source_record = self.addressed_entity(request)?;
                    let related = self.source.read_related(
                        &request.entity_set,
                        &source_record,
                        target_set,
                        request.target_key.as_ref(),
                    )?;
                    match related {
                        Related::One(Some(record)) => Ok(OperationResponse::entity(record)),
                        Related::One(None) => Err(NotFoundError::Related {
                            source_set: request.entity_set.clone(),
                            target_set: target_set.clone(),
                        }
                        .into()),
                        Related::Many(records) => Ok(OperationResponse::entities(records)),
                    }
                } else if let Some(key) = &request.key {
                    let record = self.source.read_by_key(&request.entity_set, key)?;
                    Ok(OperationResponse::entity(record))
                } else {
                    let result = self
                        .source
                        .read_set(&request.entity_set, &request.options)?
                        .apply_remaining(&request.options);
                    Ok(OperationResponse::entities(result.into_records()))
                }
            }
            OperationKind::Post => {
                if let Some(target_set) = &request.target_set {
                    let source_record = self.addressed_entity(request)?;
                    let target_key = request.target_key.as_ref().ok_or_else(|| {
                        EngineError::Internal(
                            "relation write without a target key".to_string(),
                        )
                    })?;
                    self.source.write_relation(
                        &request.entity_set,
                        &source_record,
                        target_set,
                        target_key,
                    )?;
                    Ok(OperationResponse::empty())
                } else {
                    let entity = request.entity.clone().ok_or_else(|| {
                        EngineError::Internal("create operation without an entity".to_string())
                    })?;
                    let created = self.source.create(&request.entity_set, entity)?;
                    Ok(OperationResponse::entity(created))
                }
            }
            OperationKind::Put => {
                let entity = request.entity.clone().ok_or_else(|| {
                    EngineError::Internal("update operation without an entity".to_string())
                })?;
                let updated = self.source.update(&request.entity_set, entity)?;
                Ok(OperationResponse::entity(updated))
            }
            OperationKind::Delete => {
                if let Some(target_set) = &request.target_set {
                    let source_record = self.addressed_entity(request)?;
                    self.source.delete_relation(
                        &request.entity_set,
                        &source_record,
                        target_set,
                        request.target_key.as_ref(),
                    )?;
                    Ok(OperationResponse::empty())
                } else {
                    let key = request.key.as_ref().ok_or_else(|| {
                        EngineError::Internal("delete operation without a key".to_string())
                    })?;
                    self.source.delete(&request.entity_set, key)?;
                    Ok(OperationResponse::empty())
                }
            }
        }
    }

    /// Read the entity addressed by the request's key.
    fn addressed_entity(&self, request: &OperationRequest) -> EngineResult<EntityRecord> {
        let key = request.key.as_ref().ok_or_else(|| {
            EngineError::Internal("relationship operation without a source key".to_string())
        })?;
        self.source.read_by_key(&request.entity_set, key)
    }
}
