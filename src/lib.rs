//! # sdformat
//!
//! Validation and canonical serialization of SDFormat description documents:
//! the XML trees describing simulated worlds, models, links, joints, visuals
//! and collisions.
//!
//! ## Features
//!
//! - Schema-driven validation with every problem reported, not just the first
//! - Sibling-name uniqueness checked per parent and per uniqueness group
//! - Reserved names rejected at any depth
//! - `plugin` and namespaced (`prefix:tag`) subtrees exempt from validation
//! - Deterministic rendering, identical before and after validation
//! - Built-in rules for format versions 1.6 and 1.7, more loadable at runtime
//!
//! ## Example
//!
//! ```rust
//! use sdformat::{ElementTree, SchemaRegistry};
//!
//! let registry = SchemaRegistry::builtin()?;
//! let mut tree = ElementTree::parse(
//!     r#"<sdf version="1.7">
//!          <model name="box">
//!            <link name="link"/>
//!            <link name="link"/>
//!          </model>
//!        </sdf>"#,
//! )?;
//!
//! let errors = sdformat::validate_document(&mut tree, &registry, None)?;
//! assert_eq!(errors.len(), 1);
//! assert_eq!(errors[0].to_string(), "Error: link with name[link] already exists.");
//! # Ok::<(), sdformat::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;
pub mod names;

// Configuration and resource loading
pub mod config;
pub mod documents;
pub mod loaders;

// Rules and validation
pub mod validators;

// Output
pub mod serializers;

// Re-exports for convenience
pub use config::Config;
pub use documents::{Attribute, Content, Element, ElementId, ElementTree};
pub use error::{Error, Result};
pub use limits::Limits;
pub use loaders::Loader;
pub use serializers::{describe, render};
pub use validators::{
    validate, validate_document, ErrorKind, Schema, SchemaRegistry, ValidationError,
};

/// Version of the sdformat library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Newest format version with built-in rules
pub const SDF_VERSION: &str = "1.7";
