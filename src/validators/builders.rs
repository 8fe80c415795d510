//! Schema builders
//!
//! Builds [`Schema`] values from schema definition documents. A definition
//! document looks like this:
//!
//! ```xml
//! <schema version="1.7" root="sdf">
//!   <element name="link" label="link">
//!     <description>A physical link.</description>
//!     <attribute name="name" type="string" default="__default__" required="1"/>
//!     <child name="pose" required="0"/>
//!     <element name="gravity" type="bool" default="true" required="0"/>
//!     <unique members="collision"/>
//!     <reserved names="world" delimiter="__"/>
//!   </element>
//! </schema>
//! ```
//!
//! Top-level `<element>`s are global definitions. A nested `<element>` is a
//! local definition that only applies under its parent, while `<child>`
//! refers to the global definition of the same tag.

use std::collections::HashSet;

use indexmap::IndexMap;
use roxmltree::Node;

use crate::error::{Error, Result};
use crate::names;

use super::builtins::ValueType;
use super::schemas::{
    AttributeDef, ChildDef, ElementDef, Multiplicity, ReservedNames, Schema, UniquenessGroup,
    ValueDef,
};

/// Parse a schema definition document
pub fn build_schema(text: &str) -> Result<Schema> {
    let doc = roxmltree::Document::parse(text)?;
    let root = doc.root_element();
    if root.tag_name().name() != "schema" {
        return Err(Error::Schema(format!(
            "Expected a <schema> document, found <{}>",
            root.tag_name().name()
        )));
    }

    let version = required_attribute(root, "version")?;
    if !names::is_valid_version(version) {
        return Err(Error::Schema(format!("Invalid schema version '{}'", version)));
    }
    let root_name = root.attribute("root").unwrap_or("sdf");

    let mut elements = IndexMap::new();
    for node in element_children(root) {
        match node.tag_name().name() {
            "element" => {
                let def = build_element(node)?;
                if elements.contains_key(&def.name) {
                    return Err(Error::Schema(format!(
                        "Element <{}> is defined more than once",
                        def.name
                    )));
                }
                elements.insert(def.name.clone(), def);
            }
            other => {
                return Err(Error::Schema(format!(
                    "Unexpected <{}> in <schema>",
                    other
                )))
            }
        }
    }

    if !elements.contains_key(root_name) {
        return Err(Error::Schema(format!(
            "Root element <{}> has no definition",
            root_name
        )));
    }

    let schema = Schema::new(version, root_name, elements);
    for def in schema.elements() {
        check_references(&schema, def)?;
    }

    tracing::debug!(version = %version, root = %root_name, "Built schema");
    Ok(schema)
}

/// Build one element definition, including its local definitions
fn build_element(node: Node) -> Result<ElementDef> {
    let mut def = ElementDef::new(required_attribute(node, "name")?);
    def.label = node.attribute("label").map(str::to_string);
    def.opaque = bool_attribute(node, "opaque")?;

    if let Some(type_name) = node.attribute("type") {
        let value_type = value_type(type_name)?;
        let default = node.attribute("default").unwrap_or("");
        check_default(&def.name, value_type, default)?;
        def.value = Some(ValueDef {
            value_type,
            default: default.to_string(),
        });
    }

    let mut child_names = HashSet::new();
    for child in element_children(node) {
        match child.tag_name().name() {
            "description" => {
                def.description = child.text().unwrap_or("").trim().to_string();
            }
            "attribute" => {
                let attribute = build_attribute(child)?;
                if def.attribute(&attribute.name).is_some() {
                    return Err(Error::Schema(format!(
                        "Attribute '{}' of <{}> is declared more than once",
                        attribute.name, def.name
                    )));
                }
                def.attributes.push(attribute);
            }
            "child" => {
                let name = required_attribute(child, "name")?;
                def.children.push(ChildDef {
                    name: name.to_string(),
                    required: multiplicity(child)?,
                    definition: None,
                });
            }
            "element" => {
                let local = build_element(child)?;
                def.children.push(ChildDef {
                    name: local.name.clone(),
                    required: multiplicity(child)?,
                    definition: Some(Box::new(local)),
                });
            }
            "unique" => {
                let members: Vec<String> = required_attribute(child, "members")?
                    .split_whitespace()
                    .map(str::to_string)
                    .collect();
                if members.is_empty() {
                    return Err(Error::Schema(format!(
                        "Empty uniqueness group in <{}>",
                        def.name
                    )));
                }
                def.unique_groups.push(UniquenessGroup { members });
            }
            "reserved" => {
                let reserved = build_reserved(child);
                def.reserved.names.extend(reserved.names);
                if reserved.delimiter.is_some() {
                    def.reserved.delimiter = reserved.delimiter;
                }
            }
            other => {
                return Err(Error::Schema(format!(
                    "Unexpected <{}> in definition of <{}>",
                    other, def.name
                )))
            }
        }
        if let Some(last) = def.children.last() {
            if matches!(child.tag_name().name(), "child" | "element")
                && !child_names.insert(last.name.clone())
            {
                return Err(Error::Schema(format!(
                    "Child <{}> of <{}> is declared more than once",
                    last.name, def.name
                )));
            }
        }
    }

    Ok(def)
}

fn build_attribute(node: Node) -> Result<AttributeDef> {
    let name = required_attribute(node, "name")?;
    let value_type = value_type(node.attribute("type").unwrap_or("string"))?;
    let default = node.attribute("default").unwrap_or("");
    check_default(name, value_type, default)?;

    let description = element_children(node)
        .find(|n| n.tag_name().name() == "description")
        .and_then(|n| n.text())
        .unwrap_or("")
        .trim()
        .to_string();

    Ok(AttributeDef {
        name: name.to_string(),
        value_type,
        default: default.to_string(),
        required: bool_attribute(node, "required")?,
        description,
    })
}

fn build_reserved(node: Node) -> ReservedNames {
    ReservedNames {
        names: node
            .attribute("names")
            .unwrap_or("")
            .split_whitespace()
            .map(str::to_string)
            .collect(),
        delimiter: node
            .attribute("delimiter")
            .filter(|d| !d.is_empty())
            .map(str::to_string),
    }
}

/// Check that child references and uniqueness groups point at known tags
fn check_references(schema: &Schema, def: &ElementDef) -> Result<()> {
    for child in &def.children {
        match &child.definition {
            Some(local) => check_references(schema, local)?,
            None => {
                if schema.element(&child.name).is_none() {
                    return Err(Error::Schema(format!(
                        "<{}> refers to undefined child <{}>",
                        def.name, child.name
                    )));
                }
            }
        }
    }

    for group in &def.unique_groups {
        for member in &group.members {
            if def.child(member).is_none() {
                return Err(Error::Schema(format!(
                    "Uniqueness group of <{}> names <{}>, which is not a child",
                    def.name, member
                )));
            }
        }
    }

    Ok(())
}

fn element_children<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|n| n.is_element())
}

fn required_attribute<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str> {
    node.attribute(name).ok_or_else(|| {
        Error::Schema(format!(
            "<{}> is missing the '{}' attribute",
            node.tag_name().name(),
            name
        ))
    })
}

fn bool_attribute(node: Node, name: &str) -> Result<bool> {
    match node.attribute(name) {
        None | Some("0") | Some("false") => Ok(false),
        Some("1") | Some("true") => Ok(true),
        Some(other) => Err(Error::Schema(format!(
            "Invalid boolean '{}' for '{}' on <{}>",
            other,
            name,
            node.tag_name().name()
        ))),
    }
}

fn multiplicity(node: Node) -> Result<Multiplicity> {
    Multiplicity::from_str(node.attribute("required").unwrap_or("0"))
}

fn value_type(name: &str) -> Result<ValueType> {
    ValueType::from_name(name)
        .ok_or_else(|| Error::Schema(format!("Unknown value type '{}'", name)))
}

fn check_default(key: &str, value_type: ValueType, default: &str) -> Result<()> {
    if default.is_empty() || value_type.is_valid(default) {
        Ok(())
    } else {
        Err(Error::Schema(format!(
            "Default '{}' of '{}' is not a valid {}",
            default, key, value_type
        )))
    }
}
