//! Callable functions: declared operations outside the CRUD surface
//!
//! A function is registered once at startup with a descriptor (name,
//! ordered parameters, return shape) and an executor closure. Invocation
//! maps the caller's named parameters onto the declared order; parameters
//! missing from the call arrive as `Null`.

use crate::core::error::{EngineResult, NotFoundError};
use crate::core::field::{FieldValue, PropertyType};
use crate::core::record::EntityRecord;
use crate::ext::registry::OperationKind;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

/// One declared function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionParameter {
    pub name: String,
    pub parameter_type: PropertyType,
    pub nullable: bool,
}

/// What a function returns
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionReturnKind {
    /// A simple value of the given type
    Value(PropertyType),
    /// An entity of the named type
    Entity(String),
}

/// Return declaration: kind plus whether a collection is returned
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionReturn {
    pub kind: FunctionReturnKind,
    pub collection: bool,
}

impl FunctionReturn {
    pub fn value(property_type: PropertyType) -> Self {
        Self {
            kind: FunctionReturnKind::Value(property_type),
            collection: false,
        }
    }

    pub fn entity(entity: impl Into<String>) -> Self {
        Self {
            kind: FunctionReturnKind::Entity(entity.into()),
            collection: false,
        }
    }

    pub fn collection(mut self) -> Self {
        self.collection = true;
        self
    }
}

/// Metadata of one callable function
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDescriptor {
    name: String,
    parameters: Vec<FunctionParameter>,
    returns: FunctionReturn,
    entity_set: Option<String>,
    http_method: OperationKind,
}

impl FunctionDescriptor {
    /// Declare a function with its return shape; defaults to GET and no
    /// bound entity set.
    pub fn new(name: impl Into<String>, returns: FunctionReturn) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            returns,
            entity_set: None,
            http_method: OperationKind::Get,
        }
    }

    /// Declare the next parameter (order matters for invocation)
    pub fn parameter(mut self, name: impl Into<String>, parameter_type: PropertyType) -> Self {
        self.parameters.push(FunctionParameter {
            name: name.into(),
            parameter_type,
            nullable: true,
        });
        self
    }

    /// Bind the function's result to an entity set
    pub fn entity_set(mut self, entity_set: impl Into<String>) -> Self {
        self.entity_set = Some(entity_set.into());
        self
    }

    /// Override the HTTP method the function answers to
    pub fn http_method(mut self, method: OperationKind) -> Self {
        self.http_method = method;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[FunctionParameter] {
        &self.parameters
    }

    pub fn returns(&self) -> &FunctionReturn {
        &self.returns
    }

    pub fn bound_entity_set(&self) -> Option<&str> {
        self.entity_set.as_deref()
    }

    pub fn method(&self) -> OperationKind {
        self.http_method
    }
}

/// Result of a function invocation
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionValue {
    Value(FieldValue),
    Values(Vec<FieldValue>),
    Entity(EntityRecord),
    Entities(Vec<EntityRecord>),
}

/// The callable body of a function; receives arguments in declared order
pub type FunctionExecutor =
    Arc<dyn Fn(&[FieldValue]) -> EngineResult<FunctionValue> + Send + Sync>;

struct FunctionHolder {
    descriptor: FunctionDescriptor,
    executor: FunctionExecutor,
}

/// Registry of all callable functions, populated at startup
#[derive(Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionHolder>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Register a function under its declared name
    pub fn register(&mut self, descriptor: FunctionDescriptor, executor: FunctionExecutor) {
        debug!(function = descriptor.name(), "registering function");
        self.functions.insert(
            descriptor.name().to_string(),
            FunctionHolder {
                descriptor,
                executor,
            },
        );
    }

    /// Look up a function's metadata
    pub fn descriptor(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.functions.get(name).map(|holder| &holder.descriptor)
    }

    /// Whether a function is registered under the name
    pub fn is_registered(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Execute a function with named parameters.
    ///
    /// Parameters are mapped onto the declared order; names missing from
    /// the call are passed as `Null`. Surplus names are ignored.
    pub fn execute(
        &self,
        name: &str,
        parameters: &BTreeMap<String, FieldValue>,
    ) -> EngineResult<FunctionValue> {
        let holder = self.functions.get(name).ok_or_else(|| NotFoundError::Function {
            name: name.to_string(),
        })?;

        let arguments: Vec<FieldValue> = holder
            .descriptor
            .parameters()
            .iter()
            .map(|parameter| {
                parameters
                    .get(&parameter.name)
                    .cloned()
                    .unwrap_or(FieldValue::Null)
            })
            .collect();

        (holder.executor)(&arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn max_risk_descriptor() -> FunctionDescriptor {
        FunctionDescriptor::new("MaximalAge", FunctionReturn::value(PropertyType::Int32))
            .parameter("offset", PropertyType::Int32)
    }

    #[test]
    fn test_register_and_execute() {
        let mut registry = FunctionRegistry::new();
        registry.register(
            max_risk_descriptor(),
            Arc::new(|arguments| {
                let offset = arguments
                    .first()
                    .and_then(FieldValue::as_integer)
                    .unwrap_or(0);
                Ok(FunctionValue::Value(FieldValue::Integer(42 + offset)))
            }),
        );

        let mut parameters = BTreeMap::new();
        parameters.insert("offset".to_string(), FieldValue::Integer(8));
        let result = registry.execute("MaximalAge", &parameters).unwrap();
        assert_eq!(result, FunctionValue::Value(FieldValue::Integer(50)));
    }

    #[test]
    fn test_missing_parameter_arrives_as_null() {
        let mut registry = FunctionRegistry::new();
        registry.register(
            max_risk_descriptor(),
            Arc::new(|arguments| {
                assert_eq!(arguments.len(), 1);
                assert!(arguments[0].is_null());
                Ok(FunctionValue::Value(FieldValue::Integer(42)))
            }),
        );

        let result = registry.execute("MaximalAge", &BTreeMap::new()).unwrap();
        assert_eq!(result, FunctionValue::Value(FieldValue::Integer(42)));
    }

    #[test]
    fn test_unknown_function_is_not_found() {
        let registry = FunctionRegistry::new();
        let result = registry.execute("Nope", &BTreeMap::new());
        assert!(matches!(
            result,
            Err(crate::core::EngineError::NotFound(
                NotFoundError::Function { .. }
            ))
        ));
    }

    #[test]
    fn test_descriptor_metadata() {
        let descriptor = FunctionDescriptor::new("AllEmployees", FunctionReturn::entity("Employee").collection())
            .entity_set("Employees")
            .http_method(OperationKind::Get);

        assert_eq!(descriptor.name(), "AllEmployees");
        assert_eq!(descriptor.bound_entity_set(), Some("Employees"));
        assert_eq!(descriptor.method(), OperationKind::Get);
        assert!(descriptor.returns().collection);

        let mut registry = FunctionRegistry::new();
        registry.register(
            descriptor.clone(),
            Arc::new(|_| Ok(FunctionValue::Entities(Vec::new()))),
        );
        assert!(registry.is_registered("AllEmployees"));
        assert_eq!(registry.descriptor("AllEmployees"), Some(&descriptor));
    }
}
