//! Validation errors
//!
//! Problems found while validating a description tree. They are collected
//! and returned as data; none of them stops the traversal.

use std::fmt;

use serde::Serialize;

/// Category of a validation problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Element not declared by its parent's definition
    UnrecognizedElement,
    /// A required attribute is absent
    MissingRequiredAttribute,
    /// A required child element is absent
    MissingRequiredElement,
    /// A `name` attribute uses a reserved value
    ReservedName,
    /// An attribute or element value does not match its declared type
    InvalidValue,
    /// Siblings of one type share a name
    DuplicateNameSingleType,
    /// Siblings of different types in one uniqueness group share a name
    DuplicateNameMultiType,
}

impl ErrorKind {
    /// Get the kind as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnrecognizedElement => "unrecognized_element",
            ErrorKind::MissingRequiredAttribute => "missing_required_attribute",
            ErrorKind::MissingRequiredElement => "missing_required_element",
            ErrorKind::ReservedName => "reserved_name",
            ErrorKind::InvalidValue => "invalid_value",
            ErrorKind::DuplicateNameSingleType => "duplicate_name_single_type",
            ErrorKind::DuplicateNameMultiType => "duplicate_name_multi_type",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single validation problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// What went wrong
    pub kind: ErrorKind,
    /// The error message, without the `Error: ` prefix
    pub message: String,
    /// Path of the offending element, e.g. `/sdf/model[m]/link[l]`
    pub path: Option<String>,
    /// Tag of the offending element
    pub element: Option<String>,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            path: None,
            element: None,
        }
    }

    /// Set the path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the element tag
    pub fn with_element(mut self, tag: impl Into<String>) -> Self {
        self.element = Some(tag.into());
        self
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// A required attribute is missing on `element`
    pub fn missing_attribute(attribute: &str, element: &str) -> Self {
        Self::new(
            ErrorKind::MissingRequiredAttribute,
            format!(
                "Required attribute[{}] in element[{}] is not specified in SDF.",
                attribute, element
            ),
        )
        .with_element(element)
    }

    /// A required child element is missing
    pub fn missing_element(child: &str, parent: &str) -> Self {
        Self::new(
            ErrorKind::MissingRequiredElement,
            format!(
                "XML Missing required element[{}], child of element[{}].",
                child, parent
            ),
        )
        .with_element(parent)
    }

    /// `element` is not declared under `parent`
    pub fn unrecognized_element(element: &str, parent: Option<&str>) -> Self {
        let message = match parent {
            Some(parent) => format!(
                "XML Element[{}], child of element[{}], not defined in SDF.",
                element, parent
            ),
            None => format!("XML Element[{}] is not a valid SDF root element.", element),
        };
        Self::new(ErrorKind::UnrecognizedElement, message).with_element(element)
    }

    /// A value does not parse as its declared type
    pub fn invalid_value(value: &str, key: &str, value_type: &str, element: &str) -> Self {
        Self::new(
            ErrorKind::InvalidValue,
            format!(
                "Unable to set value [{}] for key[{}] of type[{}] in element[{}].",
                value, key, value_type, element
            ),
        )
        .with_element(element)
    }

    /// `name` is reserved for elements of this kind
    pub fn reserved_name(kind: &str, name: &str) -> Self {
        Self::new(
            ErrorKind::ReservedName,
            format!("The supplied {} name [{}] is reserved.", kind, name),
        )
        .with_element(kind)
    }

    /// Several siblings of one type share `name`
    pub fn duplicate_name(label: &str, name: &str, element: &str) -> Self {
        Self::new(
            ErrorKind::DuplicateNameSingleType,
            format!("{} with name[{}] already exists.", label, name),
        )
        .with_element(element)
    }

    /// Siblings of several types in one uniqueness group share `name`
    pub fn non_unique_names(name: &str, types: &[&str], parent: &str, parent_name: Option<&str>) -> Self {
        let scope = match parent_name {
            Some(parent_name) => format!("{}[{}]", parent, parent_name),
            None => parent.to_string(),
        };
        Self::new(
            ErrorKind::DuplicateNameMultiType,
            format!(
                "non-unique names [{}] detected among {} children of {}.",
                name,
                types.join(", "),
                scope
            ),
        )
        .with_element(parent)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error: {}", self.message)
    }
}

impl std::error::Error for ValidationError {}
