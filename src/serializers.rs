//! Canonical text rendering
//!
//! [`render`] turns a description tree back into text and [`describe`]
//! renders a schema's rule tables. Both are pure: the same input always
//! yields the same string.
//!
//! Elements with a schema definition get their attributes in the
//! definition's order; opaque and unknown elements are written exactly as
//! stored. Attributes filled in from optional defaults are not written, so
//! a tree renders the same before and after validation.
//!
//! Text and CDATA keep their place among the children. A parsed
//! `<x>head<y/>tail</x>` is written with `head`, `<y/>` and `tail` on
//! separate lines in that order, and CDATA sections are written back as
//! CDATA.

use std::fmt::Write as _;

use quick_xml::escape::{escape, partial_escape};

use crate::documents::{Content, Element, ElementId, ElementTree};
use crate::validators::{ElementDef, Multiplicity, Schema};

/// Indentation added per nesting level
pub const INDENT: &str = "  ";

/// Render `tree` starting at `prefix` indentation
pub fn render(tree: &ElementTree, schema: Option<&Schema>, prefix: &str) -> String {
    let mut out = String::new();
    let mut renderer = Renderer { tree, schema, out: &mut out };
    renderer.element(tree.root(), None, prefix, false);
    out
}

/// Render only the subtree rooted at `id`
pub fn render_element(
    tree: &ElementTree,
    id: ElementId,
    schema: Option<&Schema>,
    prefix: &str,
) -> String {
    let mut out = String::new();
    let parent_def = schema.and_then(|schema| parent_definition(tree, id, schema));
    let mut renderer = Renderer { tree, schema, out: &mut out };
    renderer.element(id, parent_def, prefix, false);
    out
}

/// Resolve the definition of the parent of `id` by walking down from the root
fn parent_definition<'s>(tree: &ElementTree, id: ElementId, schema: &'s Schema) -> Option<&'s ElementDef> {
    let mut chain = Vec::new();
    let mut current = tree.parent(id);
    while let Some(node) = current {
        chain.push(node);
        current = tree.parent(node);
    }

    let mut def: Option<&ElementDef> = None;
    for node in chain.into_iter().rev() {
        let (_, resolved) = schema.resolve(def, tree.get(node));
        def = Some(resolved?);
    }
    def
}

struct Renderer<'a> {
    tree: &'a ElementTree,
    schema: Option<&'a Schema>,
    out: &'a mut String,
}

impl<'a> Renderer<'a> {
    fn element(&mut self, id: ElementId, parent_def: Option<&'a ElementDef>, prefix: &str, verbatim: bool) {
        let tree = self.tree;
        let element = tree.get(id);

        let def = match self.schema {
            Some(schema) if !verbatim => {
                let (_, def) = schema.resolve(parent_def, element);
                def.filter(|_| !schema.is_opaque(element, def))
            }
            _ => None,
        };

        self.out.push_str(prefix);
        self.out.push('<');
        self.out.push_str(&element.name);
        match def {
            Some(def) => self.schema_attributes(element, def),
            None => self.stored_attributes(element),
        }

        // Built trees keep their text on the element rather than as content
        let content = tree.content(id);
        let leading = element
            .text
            .as_deref()
            .filter(|_| !content.iter().any(Content::is_text));

        if tree.children(id).is_empty() {
            if leading.is_none() && content.is_empty() {
                self.out.push_str("/>\n");
                return;
            }
            self.out.push('>');
            if let Some(text) = leading {
                self.out.push_str(&partial_escape(text));
            }
            for piece in content {
                self.inline(piece);
            }
            let _ = writeln!(self.out, "</{}>", element.name);
            return;
        }

        self.out.push_str(">\n");
        let inner = format!("{}{}", prefix, INDENT);
        if let Some(text) = leading {
            let _ = writeln!(self.out, "{}{}", inner, partial_escape(text));
        }
        for piece in content {
            match piece {
                Content::Child(child) => {
                    self.element(*child, def, &inner, verbatim || def.is_none());
                }
                text => {
                    self.out.push_str(&inner);
                    self.inline(text);
                    self.out.push('\n');
                }
            }
        }
        let _ = writeln!(self.out, "{}</{}>", prefix, element.name);
    }

    /// Write a text piece without surrounding whitespace
    fn inline(&mut self, piece: &Content) {
        match piece {
            Content::Text(text) => self.out.push_str(&partial_escape(text)),
            Content::CData(raw) => {
                let _ = write!(self.out, "<![CDATA[{}]]>", raw);
            }
            Content::Child(_) => {}
        }
    }

    /// Declared attributes in schema order, then undeclared ones as stored
    fn schema_attributes(&mut self, element: &Element, def: &ElementDef) {
        for attr in &def.attributes {
            if let Some(value) = element.attributes.get(&attr.name) {
                if value.explicit || attr.required {
                    self.attribute(&attr.name, &value.value);
                }
            }
        }
        for (name, value) in &element.attributes {
            if value.explicit && def.attribute(name).is_none() {
                self.attribute(name, &value.value);
            }
        }
    }

    fn stored_attributes(&mut self, element: &Element) {
        for (name, value) in &element.attributes {
            if value.explicit {
                self.attribute(name, &value.value);
            }
        }
    }

    fn attribute(&mut self, name: &str, value: &str) {
        let _ = write!(self.out, " {}='{}'", name, escape(value));
    }
}

/// Render the rule tables of `schema`, starting at its root element
pub fn describe(schema: &Schema) -> String {
    let mut out = String::new();
    if let Some(root) = schema.root_definition() {
        let mut stack = vec![root.name.clone()];
        describe_element(&mut out, schema, root, Multiplicity::One, "", &mut stack);
    }
    out
}

fn describe_element(
    out: &mut String,
    schema: &Schema,
    def: &ElementDef,
    required: Multiplicity,
    prefix: &str,
    stack: &mut Vec<String>,
) {
    let _ = write!(
        out,
        "{}<element name ='{}' required ='{}'",
        prefix,
        def.name,
        required.as_str()
    );
    if let Some(value) = &def.value {
        let _ = write!(out, " type ='{}' default ='{}'", value.value_type, value.default);
    }
    out.push_str(">\n");

    let _ = writeln!(
        out,
        "{}{}<description><![CDATA[{}]]></description>",
        prefix, INDENT, def.description
    );

    for attr in &def.attributes {
        let _ = writeln!(
            out,
            "{p}{i}<attribute name ='{}' type ='{}' default ='{}' required ='{}'>",
            attr.name,
            attr.value_type,
            attr.default,
            if attr.required { "1" } else { "0" },
            p = prefix,
            i = INDENT
        );
        let _ = writeln!(
            out,
            "{p}{i}{i}<description><![CDATA[{}]]></description>",
            attr.description,
            p = prefix,
            i = INDENT
        );
        let _ = writeln!(out, "{}{}</attribute>", prefix, INDENT);
    }

    if def.opaque {
        let _ = writeln!(
            out,
            "{}{}<element copy_data ='true' required ='*'></element>",
            prefix, INDENT
        );
    }

    let inner = format!("{}{}", prefix, INDENT);
    for child in &def.children {
        match &child.definition {
            Some(local) => describe_element(out, schema, local, child.required, &inner, stack),
            None if stack.contains(&child.name) => {
                let _ = writeln!(
                    out,
                    "{}<element name ='{}' required ='{}' ref ='{}'></element>",
                    inner,
                    child.name,
                    child.required.as_str(),
                    child.name
                );
            }
            None => {
                if let Some(global) = schema.element(&child.name) {
                    stack.push(child.name.clone());
                    describe_element(out, schema, global, child.required, &inner, stack);
                    stack.pop();
                }
            }
        }
    }

    let _ = writeln!(out, "{}</element>", prefix);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::SchemaRegistry;
    use pretty_assertions::assert_eq;

    fn schema_17() -> Schema {
        SchemaRegistry::builtin().unwrap().get("1.7").unwrap().clone()
    }

    #[test]
    fn test_render_without_schema() {
        let tree = ElementTree::parse(
            r#"<sdf version="1.7"><model name="m"><static>true</static><link name="l"/></model></sdf>"#,
        )
        .unwrap();
        let expected = "\
<sdf version='1.7'>
  <model name='m'>
    <static>true</static>
    <link name='l'/>
  </model>
</sdf>
";
        assert_eq!(render(&tree, None, ""), expected);
    }

    #[test]
    fn test_schema_attribute_order() {
        let schema = schema_17();
        let tree = ElementTree::parse(
            r#"<sdf version="1.7"><model name="m"><joint type="fixed" name="j" extra="x"><parent>a</parent><child>b</child></joint></model></sdf>"#,
        )
        .unwrap();
        let rendered = render(&tree, Some(&schema), "");
        assert!(rendered.contains("<joint name='j' type='fixed' extra='x'>"), "{}", rendered);
    }

    #[test]
    fn test_opaque_content_verbatim() {
        let schema = schema_17();
        let tree = ElementTree::parse(
            r#"<sdf version="1.7"><model name="m"><plugin filename="libp.so" name="p"><joint type="x" name="y"/><note>a &amp; b</note></plugin></model></sdf>"#,
        )
        .unwrap();
        let rendered = render(&tree, Some(&schema), "");
        assert!(rendered.contains("<plugin filename='libp.so' name='p'>"), "{}", rendered);
        assert!(rendered.contains("<joint type='x' name='y'/>"), "{}", rendered);
        assert!(rendered.contains("<note>a &amp; b</note>"), "{}", rendered);
    }

    #[test]
    fn test_render_is_unchanged_by_validation() {
        let schema = schema_17();
        let mut tree = ElementTree::parse(
            r#"<sdf version="1.7"><world name="w"><physics type="ode"/><model name="m"><pose>0 0 1 0 0 0</pose><link name="l"/></model></world></sdf>"#,
        )
        .unwrap();
        let before = render(&tree, Some(&schema), "");
        assert!(schema.validate(&mut tree).is_empty());
        let after = render(&tree, Some(&schema), "");
        assert_eq!(before, after);
    }

    #[test]
    fn test_text_with_children_and_prefix() {
        let mut tree = ElementTree::new(Element::new("plugin").with_text("data"));
        tree.add_child(tree.root(), Element::new("x"));
        let expected = "\
>><plugin>
>>  data
>>  <x/>
>></plugin>
";
        assert_eq!(render(&tree, None, ">>"), expected);
    }

    #[test]
    fn test_escaping() {
        let tree = ElementTree::new(
            Element::new("uri")
                .with_attribute("q", "it's \"x\"")
                .with_text("a<b & c>d"),
        );
        assert_eq!(
            render(&tree, None, ""),
            "<uri q='it&apos;s &quot;x&quot;'>a&lt;b &amp; c&gt;d</uri>\n"
        );
    }

    #[test]
    fn test_plugin_mixed_content_keeps_order() {
        let schema = schema_17();
        let tree = ElementTree::parse(
            r#"<sdf version="1.7"><model name="m"><plugin name="p" filename="libp.so"><x>head<y/>tail</x></plugin></model></sdf>"#,
        )
        .unwrap();
        let expected = "\
<sdf version='1.7'>
  <model name='m'>
    <plugin name='p' filename='libp.so'>
      <x>
        head
        <y/>
        tail
      </x>
    </plugin>
  </model>
</sdf>
";
        let rendered = render(&tree, Some(&schema), "");
        assert_eq!(rendered, expected);

        let reparsed = ElementTree::parse(&rendered).unwrap();
        assert_eq!(render(&reparsed, Some(&schema), ""), expected);
    }

    #[test]
    fn test_cdata_written_back() {
        let schema = schema_17();
        let tree = ElementTree::parse(
            "<sdf version='1.7'><model name='m'><plugin name='p' filename='libp.so'>\
             <script><![CDATA[  if (a < b) { go(); }  ]]></script>\
             <body>x<![CDATA[<raw/>]]></body>\
             </plugin></model></sdf>",
        )
        .unwrap();
        let rendered = render(&tree, Some(&schema), "");
        assert!(
            rendered.contains("<script><![CDATA[  if (a < b) { go(); }  ]]></script>"),
            "{}",
            rendered
        );
        assert!(rendered.contains("<body>x<![CDATA[<raw/>]]></body>"), "{}", rendered);

        let reparsed = ElementTree::parse(&rendered).unwrap();
        assert_eq!(render(&reparsed, Some(&schema), ""), rendered);
    }

    #[test]
    fn test_render_subtree() {
        let schema = schema_17();
        let tree = ElementTree::parse(
            r#"<sdf version="1.7"><model name="m"><link name="l"><pose relative_to="m">0 0 0 0 0 0</pose></link></model></sdf>"#,
        )
        .unwrap();
        let model = tree.children(tree.root())[0];
        let link = tree.children(model)[0];
        let rendered = render_element(&tree, link, Some(&schema), "");
        assert_eq!(
            rendered,
            "<link name='l'>\n  <pose relative_to='m'>0 0 0 0 0 0</pose>\n</link>\n"
        );
    }

    #[test]
    fn test_describe_prologue() {
        let schema = schema_17();
        let description = describe(&schema);
        assert!(description.starts_with("<element name ='sdf' required ='1'>\n"));
        assert!(description.contains("<attribute name ='version' type ='string'"));
        assert!(description.contains("<element copy_data ='true' required ='*'></element>"));
        assert!(description.contains("ref ='model'"));
        assert!(description.ends_with("</element>\n"));
    }
}
