//! Typed error handling for the metacrud engine
//!
//! This module provides a typed error hierarchy that enables callers to
//! handle errors specifically rather than dealing with generic boxed
//! errors.
//!
//! # Error Categories
//!
//! - [`NotFoundError`]: a requested entity set, store, entity or function
//!   does not exist
//! - [`UnsupportedError`]: an operation that is intentionally unimplemented
//! - [`MetadataError`]: the declared schema is inconsistent (no keys,
//!   unresolvable navigation, ambiguous association)
//! - [`StoreError`]: a backing store failed during a CRUD call
//!
//! Metadata errors are raised as early as possible (at descriptor build or
//! navigation resolution) so a broken schema fails fast instead of deep
//! inside a CRUD call. Store failures are wrapped and surfaced unchanged;
//! the engine never retries.

use std::fmt;

/// The main error type for the metacrud engine
#[derive(Debug)]
pub enum EngineError {
    /// Requested entity set, store, entity or function does not exist
    NotFound(NotFoundError),

    /// Operation is intentionally unimplemented
    Unsupported(UnsupportedError),

    /// Declared schema is inconsistent
    Metadata(MetadataError),

    /// Backing store failure
    Store(StoreError),

    /// Internal engine errors (should not happen in normal operation)
    Internal(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::NotFound(e) => write!(f, "{}", e),
            EngineError::Unsupported(e) => write!(f, "{}", e),
            EngineError::Metadata(e) => write!(f, "{}", e),
            EngineError::Store(e) => write!(f, "{}", e),
            EngineError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::NotFound(e) => Some(e),
            EngineError::Unsupported(e) => Some(e),
            EngineError::Metadata(e) => Some(e),
            EngineError::Store(e) => Some(e),
            EngineError::Internal(_) => None,
        }
    }
}

impl EngineError {
    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            EngineError::NotFound(e) => e.error_code(),
            EngineError::Unsupported(e) => e.error_code(),
            EngineError::Metadata(e) => e.error_code(),
            EngineError::Store(_) => "STORE_FAILURE",
            EngineError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the error is an expected, recoverable-by-caller condition
    /// (not found / unsupported) as opposed to a schema or store failure.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EngineError::NotFound(_) | EngineError::Unsupported(_))
    }
}

// =============================================================================
// Not-found errors
// =============================================================================

/// Errors signalling that a requested element does not exist
#[derive(Debug)]
pub enum NotFoundError {
    /// No store is registered for the entity set
    Store { entity_set: String },

    /// No entity matches the requested key in the entity set
    Entity { entity_set: String },

    /// No related entity matches the requested target key
    Related {
        source_set: String,
        target_set: String,
    },

    /// No function is registered under the name
    Function { name: String },
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundError::Store { entity_set } => {
                write!(f, "No store found for entity set '{}'", entity_set)
            }
            NotFoundError::Entity { entity_set } => {
                write!(f, "No entity found for requested key in '{}'", entity_set)
            }
            NotFoundError::Related {
                source_set,
                target_set,
            } => {
                write!(
                    f,
                    "No related '{}' entity found for source in '{}'",
                    target_set, source_set
                )
            }
            NotFoundError::Function { name } => {
                write!(f, "No function registered with name '{}'", name)
            }
        }
    }
}

impl std::error::Error for NotFoundError {}

impl NotFoundError {
    pub fn error_code(&self) -> &'static str {
        match self {
            NotFoundError::Store { .. } => "STORE_NOT_FOUND",
            NotFoundError::Entity { .. } => "ENTITY_NOT_FOUND",
            NotFoundError::Related { .. } => "RELATED_NOT_FOUND",
            NotFoundError::Function { .. } => "FUNCTION_NOT_FOUND",
        }
    }
}

impl From<NotFoundError> for EngineError {
    fn from(err: NotFoundError) -> Self {
        EngineError::NotFound(err)
    }
}

// =============================================================================
// Unsupported operations
// =============================================================================

/// Operations that are declared but intentionally unimplemented
#[derive(Debug)]
pub enum UnsupportedError {
    /// Relation deletion is not implemented
    RelationDelete,

    /// Media access on an entity type without a media resource
    MediaResource { entity_set: String },
}

impl fmt::Display for UnsupportedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnsupportedError::RelationDelete => {
                write!(f, "Relation deletion is not supported")
            }
            UnsupportedError::MediaResource { entity_set } => {
                write!(
                    f,
                    "Entity set '{}' does not declare a media resource",
                    entity_set
                )
            }
        }
    }
}

impl std::error::Error for UnsupportedError {}

impl UnsupportedError {
    pub fn error_code(&self) -> &'static str {
        match self {
            UnsupportedError::RelationDelete => "RELATION_DELETE_UNSUPPORTED",
            UnsupportedError::MediaResource { .. } => "MEDIA_UNSUPPORTED",
        }
    }
}

impl From<UnsupportedError> for EngineError {
    fn from(err: UnsupportedError) -> Self {
        EngineError::Unsupported(err)
    }
}

// =============================================================================
// Metadata inconsistencies
// =============================================================================

/// Errors in the declared schema itself
#[derive(Debug)]
pub enum MetadataError {
    /// Entity type declares properties but no key fields
    NoKeys { entity: String },

    /// Entity type is not registered in the model
    UnknownEntity { name: String },

    /// Entity set name is not registered in the model
    UnknownEntitySet { name: String },

    /// No navigation exists between the two entity types
    MissingNavigation { source: String, target: String },

    /// Both sides of a navigation declare different association names
    AmbiguousAssociation {
        from_association: String,
        to_association: String,
    },

    /// A navigation resolved to a field whose shape contradicts its use
    InvalidNavigationTarget { entity: String, navigation: String },
}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataError::NoKeys { entity } => {
                write!(f, "Entity type '{}' declares no key fields", entity)
            }
            MetadataError::UnknownEntity { name } => {
                write!(f, "Unknown entity type: {}", name)
            }
            MetadataError::UnknownEntitySet { name } => {
                write!(f, "Unknown entity set: {}", name)
            }
            MetadataError::MissingNavigation { source, target } => {
                write!(
                    f,
                    "No navigation between entity types '{}' and '{}'",
                    source, target
                )
            }
            MetadataError::AmbiguousAssociation {
                from_association,
                to_association,
            } => {
                write!(
                    f,
                    "Navigation sides declare different associations ('{}' vs '{}')",
                    from_association, to_association
                )
            }
            MetadataError::InvalidNavigationTarget { entity, navigation } => {
                write!(
                    f,
                    "Navigation '{}' on entity '{}' has an unusable field shape",
                    navigation, entity
                )
            }
        }
    }
}

impl std::error::Error for MetadataError {}

impl MetadataError {
    pub fn error_code(&self) -> &'static str {
        match self {
            MetadataError::NoKeys { .. } => "NO_KEY_FIELDS",
            MetadataError::UnknownEntity { .. } => "UNKNOWN_ENTITY",
            MetadataError::UnknownEntitySet { .. } => "UNKNOWN_ENTITY_SET",
            MetadataError::MissingNavigation { .. } => "MISSING_NAVIGATION",
            MetadataError::AmbiguousAssociation { .. } => "AMBIGUOUS_ASSOCIATION",
            MetadataError::InvalidNavigationTarget { .. } => "INVALID_NAVIGATION_TARGET",
        }
    }
}

impl From<MetadataError> for EngineError {
    fn from(err: MetadataError) -> Self {
        EngineError::Metadata(err)
    }
}

// =============================================================================
// Store failures
// =============================================================================

/// A backing store raised an error during a CRUD call
#[derive(Debug)]
pub struct StoreError {
    /// Name of the store that failed
    pub store: String,
    /// Store-supplied failure description
    pub message: String,
}

impl StoreError {
    pub fn new(store: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            store: store.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Store '{}' failed: {}", self.store, self.message)
    }
}

impl std::error::Error for StoreError {}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        EngineError::Store(err)
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
