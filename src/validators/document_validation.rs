//! Document Validation
//!
//! Recursive-descent validation of a description tree against a schema.
//! Every problem is collected; the traversal always covers the whole tree.

use crate::documents::{ElementId, ElementTree};
use crate::error::Result;

use super::exceptions::ValidationError;
use super::identities::check_unique_names;
use super::schemas::{AttributeDef, ElementDef, SchemaRegistry};
use super::validation::ValidationContext;
use super::Schema;

/// Validate `tree` against the registry schema for `version`.
///
/// `version` overrides the version declared by the document when picking
/// the schema. It does not stand in for the root's `version` attribute,
/// which is still checked like any other required attribute. Only an
/// unsupported version is a hard failure; everything else is returned as
/// validation errors.
pub fn validate_document(
    tree: &mut ElementTree,
    registry: &SchemaRegistry,
    version: Option<&str>,
) -> Result<Vec<ValidationError>> {
    let schema = registry.resolve(tree, version)?;
    Ok(validate(tree, schema))
}

/// Validate `tree` against `schema`, filling in attribute defaults
pub fn validate(tree: &mut ElementTree, schema: &Schema) -> Vec<ValidationError> {
    let mut context = ValidationContext::new(schema);
    validate_tree(tree, &mut context);
    tracing::debug!(
        version = %schema.version(),
        elements = tree.len(),
        errors = context.error_count(),
        "Validated description document"
    );
    context.into_errors()
}

/// Validate the whole tree with an existing context
pub fn validate_tree(tree: &mut ElementTree, context: &mut ValidationContext) {
    let root = tree.root();
    validate_element(tree, root, None, context);
}

/// Validate one element and its subtree
pub fn validate_element(
    tree: &mut ElementTree,
    id: ElementId,
    parent_def: Option<&ElementDef>,
    context: &mut ValidationContext,
) {
    let schema = context.schema;
    let (declared, def) = schema.resolve(parent_def, tree.get(id));

    if schema.is_opaque(tree.get(id), def) {
        return;
    }

    if declared.is_none() {
        let parent = tree.parent(id).map(|p| tree.get(p).name.as_str());
        let error = ValidationError::unrecognized_element(&tree.get(id).name, parent);
        context.report(error.with_path(tree.path(id)));
    }

    // Without any definition there is nothing to check the subtree against
    let Some(def) = def else { return };

    check_attributes(tree, id, def, context);
    check_reserved_name(tree, id, def, context);
    check_value(tree, id, def, context);
    check_required_children(tree, id, def, context);
    check_unique_names(tree, id, def, context);

    let children = tree.children(id).to_vec();
    for child in children {
        validate_element(tree, child, Some(def), context);
    }
}

/// Report missing required attributes and badly typed values, then fill in
/// defaults for the optional attributes the document left out
fn check_attributes(
    tree: &mut ElementTree,
    id: ElementId,
    def: &ElementDef,
    context: &mut ValidationContext,
) {
    let element = tree.get(id);
    let mut defaults: Vec<&AttributeDef> = Vec::new();

    for attr in &def.attributes {
        match element.attributes.get(&attr.name) {
            Some(value) => {
                if value.explicit && !attr.value_type.is_valid(&value.value) {
                    let error = ValidationError::invalid_value(
                        &value.value,
                        &attr.name,
                        attr.value_type.as_str(),
                        &element.name,
                    );
                    context.report(error.with_path(tree.path(id)));
                }
            }
            None if attr.required => {
                let error = ValidationError::missing_attribute(&attr.name, &element.name);
                context.report(error.with_path(tree.path(id)));
            }
            None => defaults.push(attr),
        }
    }

    if context.use_defaults {
        let element = tree.get_mut(id);
        for attr in defaults {
            element.set_default_attribute(&attr.name, &attr.default);
        }
    }
}

fn check_reserved_name(
    tree: &ElementTree,
    id: ElementId,
    def: &ElementDef,
    context: &mut ValidationContext,
) {
    if def.reserved.is_empty() {
        return;
    }
    let element = tree.get(id);
    if let Some(name) = element.explicit_attribute("name") {
        if def.reserved.is_reserved(name) {
            let error = ValidationError::reserved_name(&element.name, name);
            context.report(error.with_path(tree.path(id)));
        }
    }
}

fn check_value(tree: &ElementTree, id: ElementId, def: &ElementDef, context: &mut ValidationContext) {
    let element = tree.get(id);
    if let (Some(value), Some(text)) = (&def.value, &element.text) {
        if !value.value_type.is_valid(text) {
            let error = ValidationError::invalid_value(
                text,
                &element.name,
                value.value_type.as_str(),
                &element.name,
            );
            context.report(error.with_path(tree.path(id)));
        }
    }
}

fn check_required_children(
    tree: &ElementTree,
    id: ElementId,
    def: &ElementDef,
    context: &mut ValidationContext,
) {
    for child in def.children.iter().filter(|c| c.required.is_required()) {
        if tree.find_child(id, &child.name).is_none() {
            let error = ValidationError::missing_element(&child.name, &def.name);
            context.report(error.with_path(tree.path(id)));
        }
    }
}
