//! Go type extraction.
//!
//! Walks the tree-sitter syntax tree of one Go source file and records the
//! package name, the imports and every top-level `type` declaration.
//! Type expressions are classified by syntactic shape only; shapes without
//! a counterpart in the IR become the `unknown` primitive.

use super::ParseError;
use super::tags::{parse_tag, tag_literal_text};
use crate::ir::{CompilationUnit, Field, FieldTags, Import, TypeDeclaration, TypeRef};
use tree_sitter::{Node, Parser, Tree};

/// Parse Go source and extract its type declarations.
pub fn parse_go_source(source: &str) -> Result<CompilationUnit, ParseError> {
    let mut parser = Parser::new();
    parser
        .set_language(&arborium_go::language().into())
        .map_err(|e| ParseError::Grammar(format!("tree-sitter init: {}", e)))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ParseError::Grammar("parser returned no tree".into()))?;

    let ctx = ExtractContext::new(source);
    ctx.check_syntax(&tree)?;
    ctx.extract_unit(&tree)
}

/// Like [`parse_go_source`], recording `path` on the resulting unit.
pub fn parse_go_file(path: &str, source: &str) -> Result<CompilationUnit, ParseError> {
    let mut unit = parse_go_source(source)?;
    unit.path = path.to_string();
    Ok(unit)
}

struct ExtractContext<'a> {
    source: &'a str,
}

/// Collects comment nodes until the next declaration so that a comment
/// block directly above it can be used as its documentation.
#[derive(Default)]
struct PendingDoc<'t> {
    comments: Vec<Node<'t>>,
    /// Row on which the previous non-comment sibling ended.
    last_code_row: Option<usize>,
}

impl<'t> PendingDoc<'t> {
    fn comment(&mut self, node: Node<'t>) {
        // `Name string // trailing` documents the line it is on, not the next one.
        if self.last_code_row == Some(node.start_position().row) {
            self.comments.clear();
            return;
        }
        self.comments.push(node);
    }

    /// Comments forming a contiguous block ending on the line above `node`.
    fn take_for(&mut self, node: Node<'t>) -> Vec<Node<'t>> {
        let mut group = Vec::new();
        let mut next_row = node.start_position().row;
        for comment in self.comments.iter().rev() {
            if comment.end_position().row + 1 != next_row {
                break;
            }
            group.push(*comment);
            next_row = comment.start_position().row;
        }
        group.reverse();
        self.code(node);
        group
    }

    fn code(&mut self, node: Node<'t>) {
        // Punctuation and newline terminators neither end nor break a block.
        if !node.is_named() {
            return;
        }
        self.comments.clear();
        self.last_code_row = Some(node.end_position().row);
    }
}

impl<'a> ExtractContext<'a> {
    fn new(source: &'a str) -> Self {
        Self { source }
    }

    fn node_text(&self, node: Node) -> &'a str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn check_syntax(&self, tree: &Tree) -> Result<(), ParseError> {
        let root = tree.root_node();
        if root.has_error() {
            let node = first_error(root).unwrap_or(root);
            let message = if node.is_missing() {
                format!("missing `{}`", node.kind())
            } else {
                let text = self.node_text(node);
                let snippet: String = text.lines().next().unwrap_or("").chars().take(24).collect();
                format!("unexpected `{}`", snippet)
            };
            return Err(ParseError::syntax_at(node, message));
        }

        let mut cursor = root.walk();
        let has_package = root
            .children(&mut cursor)
            .any(|child| child.kind() == "package_clause");
        if !has_package {
            return Err(ParseError::Syntax {
                line: 1,
                column: 1,
                message: "expected package clause".into(),
            });
        }
        Ok(())
    }

    fn extract_unit(&self, tree: &Tree) -> Result<CompilationUnit, ParseError> {
        let root = tree.root_node();
        let mut unit = CompilationUnit::default();
        let mut pending = PendingDoc::default();

        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            match child.kind() {
                "comment" => pending.comment(child),
                "package_clause" => {
                    let mut inner = child.walk();
                    if let Some(name) = child.named_children(&mut inner).next() {
                        unit.package_name = self.node_text(name).to_string();
                    }
                    pending.code(child);
                }
                "import_declaration" => {
                    self.extract_imports(child, &mut unit.imports);
                    pending.code(child);
                }
                "type_declaration" => {
                    let doc = self.doc_text(&pending.take_for(child));
                    self.extract_type_declaration(child, &doc, &mut unit);
                }
                _ => pending.code(child),
            }
        }

        tracing::debug!(
            package = %unit.package_name,
            declarations = unit.declarations.len(),
            imports = unit.imports.len(),
            "extracted compilation unit"
        );
        Ok(unit)
    }

    fn extract_imports(&self, node: Node, out: &mut Vec<Import>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "import_spec" => out.extend(self.extract_import_spec(child)),
                "import_spec_list" => self.extract_imports(child, out),
                _ => {}
            }
        }
    }

    fn extract_import_spec(&self, node: Node) -> Option<Import> {
        let path = node.child_by_field_name("path")?;
        let path = self
            .node_text(path)
            .trim_matches(|c| c == '"' || c == '`')
            .to_string();
        let alias = node
            .child_by_field_name("name")
            .map(|n| self.node_text(n).to_string());
        Some(Import { alias, path })
    }

    /// Handles both `type X ...` and grouped `type ( ... )` declarations.
    /// Specs inside a group use their own doc comment, falling back to the
    /// group's.
    fn extract_type_declaration(&self, node: Node, group_doc: &str, unit: &mut CompilationUnit) {
        let mut pending = PendingDoc::default();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "comment" => pending.comment(child),
                "type_spec" | "type_alias" => {
                    let own_doc = self.doc_text(&pending.take_for(child));
                    let doc = if own_doc.is_empty() { group_doc } else { &own_doc };
                    unit.add(self.extract_type_spec(child, doc));
                }
                _ => pending.code(child),
            }
        }
    }

    fn extract_type_spec(&self, spec: Node, doc: &str) -> TypeDeclaration {
        let name = spec
            .child_by_field_name("name")
            .map(|n| self.node_text(n))
            .unwrap_or_default();
        let is_alias = spec.kind() == "type_alias";

        let declaration = match spec.child_by_field_name("type") {
            Some(body) if body.kind() == "struct_type" => {
                TypeDeclaration::record(name, self.extract_struct_fields(body))
            }
            Some(body) if body.kind() == "interface_type" => {
                // Method sets are not extracted.
                TypeDeclaration::interface(name)
            }
            Some(body) => {
                let underlying = self.type_ref(body);
                if is_alias {
                    TypeDeclaration::alias(name, underlying)
                } else {
                    TypeDeclaration::named(name, underlying)
                }
            }
            None if is_alias => TypeDeclaration::alias(name, TypeRef::unknown()),
            None => TypeDeclaration::named(name, TypeRef::unknown()),
        };

        tracing::trace!(name, kind = %declaration.kind, "extracted declaration");
        declaration.with_doc(doc)
    }

    fn extract_struct_fields(&self, struct_type: Node) -> Vec<Field> {
        let mut fields = Vec::new();
        let mut cursor = struct_type.walk();
        let Some(list) = struct_type
            .named_children(&mut cursor)
            .find(|c| c.kind() == "field_declaration_list")
        else {
            return fields;
        };

        let mut pending = PendingDoc::default();
        let mut cursor = list.walk();
        for child in list.children(&mut cursor) {
            match child.kind() {
                "comment" => pending.comment(child),
                "field_declaration" => {
                    let doc = self.doc_text(&pending.take_for(child));
                    self.extract_field_declaration(child, &doc, &mut fields);
                }
                _ => pending.code(child),
            }
        }
        fields
    }

    fn extract_field_declaration(&self, node: Node, doc: &str, out: &mut Vec<Field>) {
        let tags = node
            .child_by_field_name("tag")
            .map(|t| parse_tag(&tag_literal_text(self.node_text(t))))
            .unwrap_or_else(FieldTags::default);

        let mut ty = node
            .child_by_field_name("type")
            .map(|t| self.type_ref(t))
            .unwrap_or_else(TypeRef::unknown);

        let mut cursor = node.walk();
        let names: Vec<&str> = node
            .children_by_field_name("name", &mut cursor)
            .map(|n| self.node_text(n))
            .collect();

        if names.is_empty() {
            // Embedded: `Base` or `*Base`, the star is a bare token child.
            let mut cursor = node.walk();
            let starred = node
                .children(&mut cursor)
                .any(|c| !c.is_named() && c.kind() == "*");
            if starred {
                ty = TypeRef::pointer(ty);
            }
            out.push(Field::embedded(ty).with_tags(tags).with_doc(doc));
            return;
        }

        for name in names {
            out.push(
                Field::new(name, ty.clone())
                    .with_tags(tags.clone())
                    .with_doc(doc),
            );
        }
    }

    /// Convert a type expression. Total: every node kind yields a reference,
    /// unsupported shapes become `unknown`.
    fn type_ref(&self, node: Node) -> TypeRef {
        match node.kind() {
            "type_identifier" | "identifier" => TypeRef::primitive(self.node_text(node)),

            "qualified_type" => {
                let package = node
                    .child_by_field_name("package")
                    .map(|n| self.node_text(n))
                    .unwrap_or_default();
                let name = node
                    .child_by_field_name("name")
                    .map(|n| self.node_text(n))
                    .unwrap_or_default();
                TypeRef::named(package, name)
            }

            "pointer_type" => match first_named_child(node) {
                Some(inner) => TypeRef::pointer(self.type_ref(inner)),
                None => TypeRef::unknown(),
            },

            "slice_type" => match node.child_by_field_name("element") {
                Some(element) => TypeRef::sequence(self.type_ref(element)),
                None => TypeRef::unknown(),
            },

            "array_type" => {
                let length = node
                    .child_by_field_name("length")
                    .map(|n| self.node_text(n))
                    .unwrap_or("...");
                match node.child_by_field_name("element") {
                    Some(element) => TypeRef::fixed_array(length, self.type_ref(element)),
                    None => TypeRef::unknown(),
                }
            }

            "implicit_length_array_type" => match node.child_by_field_name("element") {
                Some(element) => TypeRef::fixed_array("...", self.type_ref(element)),
                None => TypeRef::unknown(),
            },

            "map_type" => {
                let key = node.child_by_field_name("key");
                let value = node.child_by_field_name("value");
                match (key, value) {
                    (Some(key), Some(value)) => {
                        TypeRef::dictionary(self.type_ref(key), self.type_ref(value))
                    }
                    _ => TypeRef::unknown(),
                }
            }

            // Only parameter lists contain this node, and those are never
            // converted; the arm keeps the conversion total over type nodes.
            "variadic_parameter_declaration" => match node.child_by_field_name("type") {
                Some(element) => TypeRef::variadic(self.type_ref(element)),
                None => TypeRef::unknown(),
            },

            "interface_type" => TypeRef::interface(),

            "parenthesized_type" => match first_named_child(node) {
                Some(inner) => self.type_ref(inner),
                None => TypeRef::unknown(),
            },

            "channel_type" => {
                let element = node
                    .child_by_field_name("value")
                    .map(|v| self.type_ref(v))
                    .unwrap_or_else(TypeRef::unknown);
                TypeRef::opaque("chan", format!("chan {}", element.raw))
            }

            "function_type" => TypeRef::opaque("func", "func"),

            other => {
                tracing::debug!(
                    kind = other,
                    text = self.node_text(node),
                    "unsupported type expression, using unknown"
                );
                TypeRef::unknown()
            }
        }
    }

    /// Text of a comment group, with markers stripped and compiler
    /// directives (`//go:generate`, ...) removed.
    fn doc_text(&self, comments: &[Node]) -> String {
        let mut lines: Vec<&str> = Vec::new();
        for comment in comments {
            let text = self.node_text(*comment);
            if let Some(line) = text.strip_prefix("//") {
                if is_directive(line) {
                    continue;
                }
                lines.push(line.strip_prefix(' ').unwrap_or(line).trim_end());
            } else if let Some(block) = text
                .strip_prefix("/*")
                .and_then(|s| s.strip_suffix("*/"))
            {
                lines.extend(block.lines().map(str::trim_end));
            }
        }
        lines.join("\n").trim().to_string()
    }
}

fn first_named_child(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).next()
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error(child) {
            return Some(found);
        }
    }
    None
}

/// `//go:generate ...`, `//line ...` and friends: `[a-z0-9]+:[a-z0-9]...`,
/// plus the `line `, `extern ` and `export ` prefixes.
fn is_directive(line: &str) -> bool {
    if ["line ", "extern ", "export "]
        .iter()
        .any(|prefix| line.starts_with(prefix))
    {
        return true;
    }
    let lower_or_digit = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    match line.split_once(':') {
        Some((prefix, rest)) => {
            !prefix.is_empty()
                && prefix.chars().all(lower_or_digit)
                && rest.chars().next().is_some_and(lower_or_digit)
        }
        None => false,
    }
}
