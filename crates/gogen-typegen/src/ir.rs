//! Intermediate representation for parsed Go type declarations.
//!
//! The Go extractor produces a [`CompilationUnit`]; the resolver and the
//! template surface read it. Field flattening is the only rewrite, and it
//! works on copies of the declarations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The category of a declaration or type reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// A struct with named fields.
    Record,
    /// `type A = B`.
    Alias,
    /// `type A B`, or a package-qualified reference such as `time.Time`.
    Named,
    /// A bare identifier (`string`, `int64`, `User`).
    Primitive,
    /// `[]T` (and variadic `...T`).
    Sequence,
    /// `[N]T`.
    FixedArray,
    /// `map[K]V`.
    Dictionary,
    /// `*T`.
    Pointer,
    /// `interface{...}`.
    Interface,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Record => "record",
            TypeKind::Alias => "alias",
            TypeKind::Named => "named",
            TypeKind::Primitive => "primitive",
            TypeKind::Sequence => "sequence",
            TypeKind::FixedArray => "fixed_array",
            TypeKind::Dictionary => "dictionary",
            TypeKind::Pointer => "pointer",
            TypeKind::Interface => "interface",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed Go source file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilationUnit {
    /// Package name from the `package` clause.
    pub package_name: String,
    /// Path the source was read from (empty for in-memory sources).
    pub path: String,
    pub imports: Vec<Import>,
    /// Type declarations in source order.
    pub declarations: Vec<TypeDeclaration>,
}

/// An import spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    pub alias: Option<String>,
    pub path: String,
}

/// A top-level `type` declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDeclaration {
    pub name: String,
    pub kind: TypeKind,
    /// Documentation comment, empty when absent.
    pub doc: String,
    /// Fields, only populated for [`TypeKind::Record`].
    pub fields: Vec<Field>,
    /// Underlying type, only populated for [`TypeKind::Alias`] and [`TypeKind::Named`].
    pub underlying: Option<TypeRef>,
    pub is_exported: bool,
}

/// A struct field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Field name. Embedded fields reuse the referenced type's bare name.
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub tags: FieldTags,
    pub doc: String,
    pub is_exported: bool,
    pub is_embedded: bool,
}

/// Parsed struct tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldTags {
    /// The tag text without its delimiters.
    pub raw: String,
    /// Values for the recognized tag keys.
    pub values: BTreeMap<String, String>,
}

/// A reference to a type, as spelled at its use site.
///
/// Internally a closed sum type ([`TypeShape`]); at the serde boundary (and
/// therefore inside templates) it is a flat record with a `kind`
/// discriminant and optional `element`/`key`/`value` children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "FlatTypeRef", try_from = "FlatTypeRef")]
pub struct TypeRef {
    /// Canonical Go spelling, e.g. `map[string]*time.Time`.
    pub raw: String,
    pub shape: TypeShape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    Primitive {
        name: String,
    },
    Named {
        qualifier: String,
        name: String,
    },
    Sequence {
        element: Box<TypeRef>,
    },
    FixedArray {
        length: String,
        element: Box<TypeRef>,
    },
    Dictionary {
        key: Box<TypeRef>,
        value: Box<TypeRef>,
    },
    Pointer {
        element: Box<TypeRef>,
    },
    Interface,
}

/// Name used for every reference whose Go spelling is not supported.
pub const UNKNOWN_TYPE: &str = "unknown";

/// Name and raw spelling of the empty-interface sentinel.
pub const INTERFACE_TYPE: &str = "interface{}";

impl CompilationUnit {
    pub fn new(package_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            ..Self::default()
        }
    }

    pub fn add(&mut self, declaration: TypeDeclaration) {
        self.declarations.push(declaration);
    }

    /// Find a declaration by name. The last declaration wins on duplicates.
    pub fn get(&self, name: &str) -> Option<&TypeDeclaration> {
        self.declarations.iter().rev().find(|d| d.name == name)
    }
}

impl TypeDeclaration {
    fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        let name = name.into();
        Self {
            is_exported: is_exported(&name),
            name,
            kind,
            doc: String::new(),
            fields: Vec::new(),
            underlying: None,
        }
    }

    pub fn record(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            fields,
            ..Self::new(name, TypeKind::Record)
        }
    }

    pub fn named(name: impl Into<String>, underlying: TypeRef) -> Self {
        Self {
            underlying: Some(underlying),
            ..Self::new(name, TypeKind::Named)
        }
    }

    pub fn alias(name: impl Into<String>, underlying: TypeRef) -> Self {
        Self {
            underlying: Some(underlying),
            ..Self::new(name, TypeKind::Alias)
        }
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Interface)
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }
}

impl Field {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        let name = name.into();
        Self {
            is_exported: is_exported(&name),
            name,
            ty,
            tags: FieldTags::default(),
            doc: String::new(),
            is_embedded: false,
        }
    }

    /// An embedded field; its name is the bare name of the embedded type.
    pub fn embedded(ty: TypeRef) -> Self {
        let name = ty.bare_name().to_string();
        Self {
            is_embedded: true,
            ..Self::new(name, ty)
        }
    }

    pub fn with_tags(mut self, tags: FieldTags) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }
}

impl FieldTags {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

impl TypeRef {
    pub fn primitive(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            raw: name.clone(),
            shape: TypeShape::Primitive { name },
        }
    }

    pub fn named(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        let qualifier = qualifier.into();
        let name = name.into();
        Self {
            raw: format!("{}.{}", qualifier, name),
            shape: TypeShape::Named { qualifier, name },
        }
    }

    pub fn sequence(element: TypeRef) -> Self {
        Self {
            raw: format!("[]{}", element.raw),
            shape: TypeShape::Sequence {
                element: Box::new(element),
            },
        }
    }

    /// A variadic `...T` parameter, which is a sequence with its own spelling.
    pub fn variadic(element: TypeRef) -> Self {
        Self {
            raw: format!("...{}", element.raw),
            shape: TypeShape::Sequence {
                element: Box::new(element),
            },
        }
    }

    pub fn fixed_array(length: impl Into<String>, element: TypeRef) -> Self {
        let length = length.into();
        Self {
            raw: format!("[{}]{}", length, element.raw),
            shape: TypeShape::FixedArray {
                length,
                element: Box::new(element),
            },
        }
    }

    pub fn dictionary(key: TypeRef, value: TypeRef) -> Self {
        Self {
            raw: format!("map[{}]{}", key.raw, value.raw),
            shape: TypeShape::Dictionary {
                key: Box::new(key),
                value: Box::new(value),
            },
        }
    }

    pub fn pointer(element: TypeRef) -> Self {
        Self {
            raw: format!("*{}", element.raw),
            shape: TypeShape::Pointer {
                element: Box::new(element),
            },
        }
    }

    pub fn interface() -> Self {
        Self {
            raw: INTERFACE_TYPE.to_string(),
            shape: TypeShape::Interface,
        }
    }

    /// The fallback for spellings the extractor does not understand.
    pub fn unknown() -> Self {
        Self::primitive(UNKNOWN_TYPE)
    }

    /// A primitive with a custom raw spelling (`chan T`, `func(...)`).
    pub(crate) fn opaque(name: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            shape: TypeShape::Primitive { name: name.into() },
        }
    }

    pub fn kind(&self) -> TypeKind {
        match &self.shape {
            TypeShape::Primitive { .. } => TypeKind::Primitive,
            TypeShape::Named { .. } => TypeKind::Named,
            TypeShape::Sequence { .. } => TypeKind::Sequence,
            TypeShape::FixedArray { .. } => TypeKind::FixedArray,
            TypeShape::Dictionary { .. } => TypeKind::Dictionary,
            TypeShape::Pointer { .. } => TypeKind::Pointer,
            TypeShape::Interface => TypeKind::Interface,
        }
    }

    /// The type name; empty for structural shapes.
    pub fn name(&self) -> &str {
        match &self.shape {
            TypeShape::Primitive { name } | TypeShape::Named { name, .. } => name,
            TypeShape::Interface => INTERFACE_TYPE,
            _ => "",
        }
    }

    /// The package qualifier of a [`TypeKind::Named`] reference.
    pub fn qualifier(&self) -> Option<&str> {
        match &self.shape {
            TypeShape::Named { qualifier, .. } if !qualifier.is_empty() => Some(qualifier),
            _ => None,
        }
    }

    /// Element type of sequences, fixed arrays and pointers.
    pub fn element(&self) -> Option<&TypeRef> {
        match &self.shape {
            TypeShape::Sequence { element }
            | TypeShape::FixedArray { element, .. }
            | TypeShape::Pointer { element } => Some(element),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<&TypeRef> {
        match &self.shape {
            TypeShape::Dictionary { key, .. } => Some(key),
            _ => None,
        }
    }

    pub fn value(&self) -> Option<&TypeRef> {
        match &self.shape {
            TypeShape::Dictionary { value, .. } => Some(value),
            _ => None,
        }
    }

    /// `qualifier.name` for qualified references, `name` otherwise.
    pub fn full_name(&self) -> String {
        match self.qualifier() {
            Some(qualifier) => format!("{}.{}", qualifier, self.name()),
            None => self.name().to_string(),
        }
    }

    /// Name with one level of pointer stripped (`*Base` → `Base`).
    pub fn bare_name(&self) -> &str {
        match &self.shape {
            TypeShape::Pointer { element } => element.name(),
            _ => self.name(),
        }
    }
}

/// Go's visibility rule: an identifier is exported if it starts with an
/// upper-case letter.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Serde form of [`TypeRef`].
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlatTypeRef {
    kind: TypeKind,
    #[serde(default)]
    name: String,
    #[serde(default)]
    qualifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    length: Option<String>,
    #[serde(default)]
    element: Option<Box<TypeRef>>,
    #[serde(default)]
    key: Option<Box<TypeRef>>,
    #[serde(default)]
    value: Option<Box<TypeRef>>,
    raw: String,
}

impl From<TypeRef> for FlatTypeRef {
    fn from(ty: TypeRef) -> Self {
        let mut flat = FlatTypeRef {
            kind: ty.kind(),
            name: ty.name().to_string(),
            qualifier: ty.qualifier().map(str::to_string),
            length: None,
            element: None,
            key: None,
            value: None,
            raw: ty.raw,
        };
        match ty.shape {
            TypeShape::Sequence { element } | TypeShape::Pointer { element } => {
                flat.element = Some(element);
            }
            TypeShape::FixedArray { length, element } => {
                flat.length = Some(length);
                flat.element = Some(element);
            }
            TypeShape::Dictionary { key, value } => {
                flat.key = Some(key);
                flat.value = Some(value);
            }
            TypeShape::Primitive { .. } | TypeShape::Named { .. } | TypeShape::Interface => {}
        }
        flat
    }
}

impl TryFrom<FlatTypeRef> for TypeRef {
    type Error = String;

    fn try_from(flat: FlatTypeRef) -> Result<Self, Self::Error> {
        let missing = |child: &str| format!("{} reference without {}", flat.kind, child);
        let shape = match flat.kind {
            TypeKind::Primitive => TypeShape::Primitive { name: flat.name },
            TypeKind::Named => TypeShape::Named {
                qualifier: flat.qualifier.unwrap_or_default(),
                name: flat.name,
            },
            TypeKind::Sequence => TypeShape::Sequence {
                element: flat.element.ok_or_else(|| missing("element"))?,
            },
            TypeKind::FixedArray => TypeShape::FixedArray {
                length: flat.length.unwrap_or_default(),
                element: flat.element.ok_or_else(|| missing("element"))?,
            },
            TypeKind::Dictionary => TypeShape::Dictionary {
                key: flat.key.ok_or_else(|| missing("key"))?,
                value: flat.value.ok_or_else(|| missing("value"))?,
            },
            TypeKind::Pointer => TypeShape::Pointer {
                element: flat.element.ok_or_else(|| missing("element"))?,
            },
            TypeKind::Interface => TypeShape::Interface,
            TypeKind::Record | TypeKind::Alias => {
                return Err(format!("{} is not a type reference kind", flat.kind));
            }
        };
        Ok(TypeRef {
            raw: flat.raw,
            shape,
        })
    }
}
