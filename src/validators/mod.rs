//! Schema-driven validation
//!
//! This module contains the schema model, the schema builders and the
//! recursive-descent validator for description trees.

pub mod builders;
pub mod builtins;
pub mod document_validation;
pub mod exceptions;
pub mod identities;
pub mod schemas;
pub mod validation;

// Re-exports
pub use builtins::ValueType;
pub use document_validation::{validate, validate_document};
pub use exceptions::{ErrorKind, ValidationError};
pub use schemas::{
    AttributeDef, ChildDef, ElementDef, Multiplicity, ReservedNames, Schema, SchemaRegistry,
    UniquenessGroup, ValueDef,
};
pub use validation::ValidationContext;
