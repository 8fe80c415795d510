//! Validation context
//!
//! State carried through one validation pass: the schema in use, the errors
//! collected so far and whether defaults are filled in.

use super::exceptions::ValidationError;
use super::schemas::Schema;

/// Validation context for one pass over a tree
#[derive(Debug)]
pub struct ValidationContext<'s> {
    /// Schema the tree is checked against
    pub schema: &'s Schema,
    /// Collected validation errors, in document order
    pub errors: Vec<ValidationError>,
    /// Whether to fill in attribute defaults
    pub use_defaults: bool,
}

impl<'s> ValidationContext<'s> {
    /// Create a new validation context
    pub fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            errors: Vec::new(),
            use_defaults: true,
        }
    }

    /// Leave the tree untouched during validation
    pub fn without_defaults(mut self) -> Self {
        self.use_defaults = false;
        self
    }

    /// Record an error
    pub fn report(&mut self, error: ValidationError) {
        tracing::trace!(kind = %error.kind, path = ?error.path, "{}", error.message);
        self.errors.push(error);
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Get the error count
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Consume the context, returning the collected errors
    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::exceptions::ErrorKind;
    use crate::validators::schemas::SchemaRegistry;

    #[test]
    fn test_context_collects_errors() {
        let registry = SchemaRegistry::builtin().unwrap();
        let mut context = ValidationContext::new(registry.get("1.7").unwrap());
        assert!(!context.has_errors());

        context.report(ValidationError::missing_attribute("name", "link"));
        context.report(ValidationError::reserved_name("link", "world"));
        assert_eq!(context.error_count(), 2);

        let errors = context.into_errors();
        assert_eq!(errors[0].kind, ErrorKind::MissingRequiredAttribute);
        assert_eq!(errors[1].kind, ErrorKind::ReservedName);
    }

    #[test]
    fn test_without_defaults() {
        let registry = SchemaRegistry::builtin().unwrap();
        let context = ValidationContext::new(registry.get("1.6").unwrap()).without_defaults();
        assert!(!context.use_defaults);
        assert!(context.into_errors().is_empty());
    }
}
