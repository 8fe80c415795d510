//! Schema definitions and the version-keyed schema registry
//!
//! A [`Schema`] holds the rule tables of one format version: one
//! [`ElementDef`] per global element tag, each listing its attributes,
//! allowed children, uniqueness groups and reserved names. Schemas are
//! immutable once built and are shared by reference between validations.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;

use crate::config::Config;
use crate::documents::{Element, ElementTree};
use crate::error::{Error, Result};
use crate::names;

use super::builders::build_schema;
use super::builtins::{ValueType, BUILTIN_SCHEMAS};
use super::document_validation;
use super::exceptions::ValidationError;

/// How many times a child element may appear
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplicity {
    /// `0`: at most once
    Optional,
    /// `1`: exactly once
    One,
    /// `*`: any number of times
    Many,
    /// `+`: at least once
    OneOrMore,
    /// `-1`: deprecated, accepted but not described as required
    Deprecated,
}

impl Multiplicity {
    /// Parse the schema notation
    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "0" => Ok(Multiplicity::Optional),
            "1" => Ok(Multiplicity::One),
            "*" => Ok(Multiplicity::Many),
            "+" => Ok(Multiplicity::OneOrMore),
            "-1" => Ok(Multiplicity::Deprecated),
            _ => Err(Error::Schema(format!(
                "Invalid required value: '{}'. Must be '0', '1', '*', '+' or '-1'",
                s
            ))),
        }
    }

    /// Get the schema notation
    pub fn as_str(&self) -> &'static str {
        match self {
            Multiplicity::Optional => "0",
            Multiplicity::One => "1",
            Multiplicity::Many => "*",
            Multiplicity::OneOrMore => "+",
            Multiplicity::Deprecated => "-1",
        }
    }

    /// Whether at least one occurrence is mandatory
    pub fn is_required(&self) -> bool {
        matches!(self, Multiplicity::One | Multiplicity::OneOrMore)
    }
}

/// Declaration of an attribute
#[derive(Debug, Clone)]
pub struct AttributeDef {
    /// Attribute name
    pub name: String,
    /// Declared value type
    pub value_type: ValueType,
    /// Default value
    pub default: String,
    /// Whether the document must supply it
    pub required: bool,
    /// Human-readable description
    pub description: String,
}

/// Declaration of an element's text value
#[derive(Debug, Clone)]
pub struct ValueDef {
    /// Declared value type
    pub value_type: ValueType,
    /// Default value
    pub default: String,
}

/// An allowed child of an element
#[derive(Debug, Clone)]
pub struct ChildDef {
    /// Tag of the child
    pub name: String,
    /// How many times it may appear
    pub required: Multiplicity,
    /// Local definition; None refers to the global definition of `name`
    pub definition: Option<Box<ElementDef>>,
}

/// A set of sibling tags sharing one naming namespace
#[derive(Debug, Clone, Default)]
pub struct UniquenessGroup {
    /// Member tags
    pub members: Vec<String>,
}

impl UniquenessGroup {
    /// Check if `tag` belongs to the group
    pub fn contains(&self, tag: &str) -> bool {
        self.members.iter().any(|m| m == tag)
    }
}

/// Values forbidden as the `name` attribute of an element kind
#[derive(Debug, Clone, Default)]
pub struct ReservedNames {
    /// Literal reserved names
    pub names: Vec<String>,
    /// Names wrapped in this delimiter on both ends are reserved
    pub delimiter: Option<String>,
}

impl ReservedNames {
    /// Check if `name` is reserved
    pub fn is_reserved(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
            || self
                .delimiter
                .as_deref()
                .map_or(false, |d| names::is_delimited(name, d))
    }

    /// Whether any name is reserved at all
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.delimiter.is_none()
    }
}

/// Rules for one element type
#[derive(Debug, Clone)]
pub struct ElementDef {
    /// Tag
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Label used in duplicate-name messages (defaults to the tag)
    pub label: Option<String>,
    /// Typed text value, if the element carries one
    pub value: Option<ValueDef>,
    /// Attributes in canonical order
    pub attributes: Vec<AttributeDef>,
    /// Allowed children in canonical order
    pub children: Vec<ChildDef>,
    /// Uniqueness groups over the direct children
    pub unique_groups: Vec<UniquenessGroup>,
    /// Reserved values for the `name` attribute
    pub reserved: ReservedNames,
    /// Content is exempt from validation
    pub opaque: bool,
}

impl ElementDef {
    /// Create an empty definition
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            label: None,
            value: None,
            attributes: Vec::new(),
            children: Vec::new(),
            unique_groups: Vec::new(),
            reserved: ReservedNames::default(),
            opaque: false,
        }
    }

    /// Label used in duplicate-name messages
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Get an attribute declaration
    pub fn attribute(&self, name: &str) -> Option<&AttributeDef> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Get a child declaration
    pub fn child(&self, name: &str) -> Option<&ChildDef> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Name an element of this type goes by when it has no explicit `name`.
    ///
    /// Only optional `name` attributes have a usable default; a required
    /// one that is missing is reported instead.
    pub fn default_name(&self) -> Option<&str> {
        self.attribute("name")
            .filter(|a| !a.required && !a.default.is_empty())
            .map(|a| a.default.as_str())
    }
}

/// Rule tables of one format version
#[derive(Debug, Clone)]
pub struct Schema {
    version: String,
    root: String,
    elements: IndexMap<String, ElementDef>,
}

impl Schema {
    /// Create a schema from its global element definitions
    pub fn new(
        version: impl Into<String>,
        root: impl Into<String>,
        elements: IndexMap<String, ElementDef>,
    ) -> Self {
        Self {
            version: version.into(),
            root: root.into(),
            elements,
        }
    }

    /// Parse a schema definition document
    pub fn from_str(text: &str) -> Result<Self> {
        build_schema(text)
    }

    /// Format version
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Tag of the root element
    pub fn root_name(&self) -> &str {
        &self.root
    }

    /// Definition of the root element
    pub fn root_definition(&self) -> Option<&ElementDef> {
        self.elements.get(&self.root)
    }

    /// Global definition of a tag
    pub fn element(&self, name: &str) -> Option<&ElementDef> {
        self.elements.get(name)
    }

    /// Iterate over the global definitions
    pub fn elements(&self) -> impl Iterator<Item = &ElementDef> {
        self.elements.values()
    }

    /// Definition of `name` as a declared child of `parent`
    pub fn child_definition<'a>(&'a self, parent: &'a ElementDef, name: &str) -> Option<&'a ElementDef> {
        let child = parent.child(name)?;
        match &child.definition {
            Some(local) => Some(local.as_ref()),
            None => self.element(name),
        }
    }

    /// Resolve the definition of `element` under `parent`.
    ///
    /// Returns the declared definition (None if `parent` does not allow the
    /// element, or for a root that is not the schema root) and the
    /// definition to continue with, which falls back to the global one.
    pub fn resolve<'a>(
        &'a self,
        parent: Option<&'a ElementDef>,
        element: &Element,
    ) -> (Option<&'a ElementDef>, Option<&'a ElementDef>) {
        let declared = match parent {
            Some(parent) => self.child_definition(parent, &element.name),
            None if element.name == self.root => self.root_definition(),
            None => None,
        };
        (declared, declared.or_else(|| self.element(&element.name)))
    }

    /// Whether `element` is exempt from validation.
    ///
    /// Namespace-qualified elements, elements built as opaque and elements
    /// whose type the schema declares opaque all qualify.
    pub fn is_opaque(&self, element: &Element, definition: Option<&ElementDef>) -> bool {
        element.is_marked_opaque()
            || definition.map_or(false, |d| d.opaque)
            || self.element(&element.name).map_or(false, |d| d.opaque)
    }

    /// Validate `tree` against this schema, filling in attribute defaults
    pub fn validate(&self, tree: &mut ElementTree) -> Vec<ValidationError> {
        document_validation::validate(tree, self)
    }

    /// Check `tree` without modifying it
    pub fn is_valid(&self, tree: &ElementTree) -> bool {
        let mut copy = tree.clone();
        self.validate(&mut copy).is_empty()
    }

    /// Canonical rendering of `tree`
    pub fn render(&self, tree: &ElementTree) -> String {
        crate::serializers::render(tree, Some(self), "")
    }

    /// Human-readable description of this schema
    pub fn describe(&self) -> String {
        crate::serializers::describe(self)
    }
}

/// Version-keyed set of schemas
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: IndexMap<String, Schema>,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the schemas shipped with the library
    pub fn builtin() -> Result<Self> {
        let mut registry = Self::new();
        for (version, text) in BUILTIN_SCHEMAS {
            let schema = build_schema(text)?;
            if schema.version() != *version {
                return Err(Error::Schema(format!(
                    "Built-in schema for version {} declares version {}",
                    version,
                    schema.version()
                )));
            }
            registry.register(schema);
        }
        Ok(registry)
    }

    /// Built-in schemas plus any found on the configured search paths
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut registry = Self::builtin()?;
        for dir in &config.schema_paths {
            registry.load_dir(dir)?;
        }
        Ok(registry)
    }

    /// Add a schema, replacing any schema of the same version
    pub fn register(&mut self, schema: Schema) {
        tracing::debug!(version = %schema.version(), elements = schema.elements.len(), "Registered schema");
        self.schemas.insert(schema.version().to_string(), schema);
    }

    /// Load and register one schema definition file
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            Error::Resource(format!("Failed to read schema '{}': {}", path.display(), e))
        })?;
        let schema = build_schema(&text)
            .map_err(|e| Error::Schema(format!("{}: {}", path.display(), e)))?;
        self.register(schema);
        Ok(())
    }

    /// Load every `*.xml` schema file in `dir`; returns how many were loaded
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            tracing::warn!(path = %dir.display(), "Schema search path is not a directory, skipping");
            return Ok(0);
        }

        let mut paths: Vec<_> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().map_or(false, |ext| ext == "xml"))
            .collect();
        paths.sort();

        for path in &paths {
            self.load_file(path)?;
        }
        Ok(paths.len())
    }

    /// Get the schema of a version
    pub fn get(&self, version: &str) -> Option<&Schema> {
        self.schemas.get(version)
    }

    /// Get the schema of a version, failing if it is not registered
    pub fn require(&self, version: &str) -> Result<&Schema> {
        self.get(version)
            .ok_or_else(|| Error::UnsupportedVersion(version.to_string()))
    }

    /// Registered versions, oldest first
    pub fn versions(&self) -> Vec<&str> {
        let mut versions: Vec<&str> = self.schemas.keys().map(|v| v.as_str()).collect();
        versions.sort_by(|a, b| names::compare_versions(a, b));
        versions
    }

    /// The newest registered schema
    pub fn latest(&self) -> Option<&Schema> {
        self.versions().last().and_then(|v| self.get(v))
    }

    /// Pick the schema for `tree`.
    ///
    /// A forced version wins; otherwise the version declared on the root is
    /// used, and documents without one fall back to the newest schema.
    pub fn resolve(&self, tree: &ElementTree, forced: Option<&str>) -> Result<&Schema> {
        let declared = tree.get(tree.root()).attribute("version");
        let schema = match forced.or(declared) {
            Some(version) => self.require(version)?,
            None => self
                .latest()
                .ok_or_else(|| Error::UnsupportedVersion("<none>".to_string()))?,
        };
        tracing::debug!(
            version = %schema.version(),
            declared = ?declared,
            forced = ?forced,
            "Resolved schema version"
        );
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplicity() {
        assert_eq!(Multiplicity::from_str("*").unwrap(), Multiplicity::Many);
        assert_eq!(Multiplicity::from_str("-1").unwrap().as_str(), "-1");
        assert!(Multiplicity::from_str("2").is_err());
        assert!(Multiplicity::One.is_required());
        assert!(Multiplicity::OneOrMore.is_required());
        assert!(!Multiplicity::Many.is_required());
    }

    #[test]
    fn test_reserved_names() {
        let reserved = ReservedNames {
            names: vec!["world".to_string()],
            delimiter: Some("__".to_string()),
        };
        assert!(reserved.is_reserved("world"));
        assert!(reserved.is_reserved("__link__"));
        assert!(!reserved.is_reserved("__link"));
        assert!(!reserved.is_reserved("World"));
        assert!(ReservedNames::default().is_empty());
    }

    #[test]
    fn test_builtin_registry() {
        let registry = SchemaRegistry::builtin().unwrap();
        assert_eq!(registry.versions(), vec!["1.6", "1.7"]);
        assert_eq!(registry.latest().unwrap().version(), "1.7");
        assert!(matches!(
            registry.require("0.1"),
            Err(Error::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_resolve_version() {
        let registry = SchemaRegistry::builtin().unwrap();

        let tree = ElementTree::parse("<sdf version='1.6'/>").unwrap();
        assert_eq!(registry.resolve(&tree, None).unwrap().version(), "1.6");
        assert_eq!(registry.resolve(&tree, Some("1.7")).unwrap().version(), "1.7");

        let tree = ElementTree::parse("<sdf/>").unwrap();
        assert_eq!(registry.resolve(&tree, None).unwrap().version(), "1.7");

        let tree = ElementTree::parse("<sdf version='2.0'/>").unwrap();
        assert!(registry.resolve(&tree, None).is_err());
    }

    #[test]
    fn test_child_resolution() {
        let registry = SchemaRegistry::builtin().unwrap();
        let schema = registry.get("1.7").unwrap();

        let geometry = schema.element("geometry").unwrap();
        let box_def = schema.child_definition(geometry, "box").unwrap();
        let plane_def = schema.child_definition(geometry, "plane").unwrap();
        let box_size = schema.child_definition(box_def, "size").unwrap();
        let plane_size = schema.child_definition(plane_def, "size").unwrap();
        assert_eq!(box_size.value.as_ref().unwrap().value_type, ValueType::Vector3);
        assert_eq!(plane_size.value.as_ref().unwrap().value_type, ValueType::Vector2d);

        let model = schema.element("model").unwrap();
        let (declared, def) = schema.resolve(Some(model), &Element::new("geometry"));
        assert!(declared.is_none());
        assert_eq!(def.unwrap().name, "geometry");
    }

    #[test]
    fn test_opaque_types() {
        let registry = SchemaRegistry::builtin().unwrap();
        let schema = registry.get("1.6").unwrap();
        assert!(schema.is_opaque(&Element::new("plugin"), None));
        assert!(schema.is_opaque(&Element::new("ignition:anything"), None));
        assert!(!schema.is_opaque(&Element::new("link"), schema.element("link")));
    }

    #[test]
    fn test_load_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let custom = r#"<schema version="9.1" root="sdf">
  <element name="sdf">
    <description>Custom root.</description>
    <attribute name="version" type="string" default="9.1" required="1"/>
  </element>
</schema>"#;
        fs::write(dir.path().join("9.1.xml"), custom).unwrap();
        fs::write(dir.path().join("notes.txt"), "not a schema").unwrap();

        let mut registry = SchemaRegistry::builtin().unwrap();
        assert_eq!(registry.load_dir(dir.path()).unwrap(), 1);
        assert_eq!(registry.latest().unwrap().version(), "9.1");

        let missing = dir.path().join("missing");
        assert_eq!(registry.load_dir(&missing).unwrap(), 0);
    }

    #[test]
    fn test_load_file_reports_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.xml");
        fs::write(&path, "<schema version='1.0'>").unwrap();

        let mut registry = SchemaRegistry::new();
        let err = registry.load_file(&path).unwrap_err();
        assert!(err.to_string().contains("broken.xml"));
    }
}
