//! Sibling name uniqueness
//!
//! A parent's definition declares uniqueness groups: sets of child tags that
//! share one naming namespace. Within one parent, no two children of the
//! same group may resolve to the same name. Children of different parents
//! are never compared.

use indexmap::IndexMap;

use crate::documents::{ElementId, ElementTree};

use super::exceptions::ValidationError;
use super::schemas::{ElementDef, UniquenessGroup};
use super::validation::ValidationContext;

/// Siblings sharing one name, in document order
#[derive(Debug, Default)]
struct Collision<'t> {
    types: Vec<&'t str>,
    count: usize,
}

/// Check every uniqueness group declared on `parent_def` against the direct
/// children of `parent`
pub fn check_unique_names(
    tree: &ElementTree,
    parent: ElementId,
    parent_def: &ElementDef,
    context: &mut ValidationContext,
) {
    if tree.children(parent).len() < 2 {
        return;
    }
    for group in &parent_def.unique_groups {
        check_group(tree, parent, parent_def, group, context);
    }
}

fn check_group(
    tree: &ElementTree,
    parent: ElementId,
    parent_def: &ElementDef,
    group: &UniquenessGroup,
    context: &mut ValidationContext,
) {
    let schema = context.schema;
    let mut by_name: IndexMap<&str, Collision> = IndexMap::new();

    for &child in tree.children(parent) {
        let element = tree.get(child);
        if !group.contains(&element.name) {
            continue;
        }
        let child_def = schema.child_definition(parent_def, &element.name);
        let name = element
            .name_attribute()
            .or_else(|| child_def.and_then(|d| d.default_name()));
        let Some(name) = name else { continue };

        let entry = by_name.entry(name).or_default();
        entry.count += 1;
        if !entry.types.contains(&element.name.as_str()) {
            entry.types.push(&element.name);
        }
    }

    let parent_element = tree.get(parent);
    for (name, collision) in by_name.iter().filter(|(_, c)| c.count > 1) {
        let error = if collision.types.len() == 1 {
            let tag = collision.types[0];
            let label = schema
                .child_definition(parent_def, tag)
                .map_or(tag, |d| d.label());
            ValidationError::duplicate_name(label, name, tag)
        } else {
            ValidationError::non_unique_names(
                name,
                &collision.types,
                &parent_element.name,
                parent_element.name_attribute(),
            )
        };
        context.report(error.with_path(tree.path(parent)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::Element;
    use crate::validators::exceptions::ErrorKind;
    use crate::validators::schemas::SchemaRegistry;

    fn model_with(children: &[(&str, &str)]) -> (ElementTree, ElementId) {
        let mut tree = ElementTree::new(Element::new("sdf").with_attribute("version", "1.7"));
        let model = tree.add_child(tree.root(), Element::new("model").with_attribute("name", "m"));
        for (tag, name) in children {
            tree.add_child(model, Element::new(*tag).with_attribute("name", *name));
        }
        (tree, model)
    }

    fn check(tree: &ElementTree, parent: ElementId) -> Vec<ValidationError> {
        let registry = SchemaRegistry::builtin().unwrap();
        let schema = registry.get("1.7").unwrap();
        let mut context = ValidationContext::new(schema);
        let def = schema.element(&tree.get(parent).name).unwrap();
        check_unique_names(tree, parent, def, &mut context);
        context.into_errors()
    }

    #[test]
    fn test_single_type_duplicate() {
        let (tree, model) = model_with(&[("link", "link"), ("link", "link")]);
        let errors = check(&tree, model);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::DuplicateNameSingleType);
        assert_eq!(errors[0].message, "link with name[link] already exists.");
        assert_eq!(errors[0].path.as_deref(), Some("/sdf/model[m]"));
    }

    #[test]
    fn test_three_way_duplicate_reported_once() {
        let (tree, model) = model_with(&[("joint", "j"), ("joint", "j"), ("joint", "j")]);
        let errors = check(&tree, model);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_cross_type_duplicate() {
        let (tree, model) = model_with(&[("link", "shared"), ("joint", "shared")]);
        let errors = check(&tree, model);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::DuplicateNameMultiType);
        assert!(errors[0].to_string().starts_with("Error: non-unique names"));
        assert!(errors[0].message.contains("link, joint"));
    }

    #[test]
    fn test_distinct_names_pass() {
        let (tree, model) = model_with(&[("link", "a"), ("joint", "b"), ("link", "c")]);
        assert!(check(&tree, model).is_empty());
    }

    #[test]
    fn test_separate_groups_do_not_collide() {
        let mut tree = ElementTree::new(Element::new("link").with_attribute("name", "l"));
        let root = tree.root();
        tree.add_child(root, Element::new("collision").with_attribute("name", "box"));
        tree.add_child(root, Element::new("visual").with_attribute("name", "box"));
        assert!(check(&tree, root).is_empty());
    }
}
