//! Declaration filtering, type mapping and embedded-field flattening.

use crate::config::Config;
use crate::ir::{CompilationUnit, Field, TypeDeclaration, TypeKind, TypeRef, TypeShape};
use std::collections::{HashMap, HashSet};

/// Declarations by name. Later declarations shadow earlier ones.
pub type DeclarationIndex<'a> = HashMap<&'a str, &'a TypeDeclaration>;

/// Select the declarations to generate and flatten their embedded fields.
///
/// Declaration order is preserved. Embedded fields that cannot be resolved
/// within `unit` are dropped.
pub fn resolve(unit: &CompilationUnit, config: &Config) -> Vec<TypeDeclaration> {
    let index = index_declarations(unit);

    let resolved: Vec<TypeDeclaration> = unit
        .declarations
        .iter()
        .filter(|d| config.should_include(&d.name, d.is_exported))
        .map(|d| {
            let mut declaration = d.clone();
            if declaration.kind == TypeKind::Record {
                declaration.fields = flatten(&d.name, &d.fields, &index);
            }
            declaration
        })
        .collect();

    tracing::info!(
        parsed = unit.declarations.len(),
        eligible = resolved.len(),
        "resolved declarations"
    );
    resolved
}

pub fn index_declarations(unit: &CompilationUnit) -> DeclarationIndex<'_> {
    unit.declarations
        .iter()
        .map(|d| (d.name.as_str(), d))
        .collect()
}

/// Inline the fields of embedded records, recursively.
///
/// `owner` is the record the fields belong to. It never inlines itself,
/// directly or through other records.
pub fn flatten(owner: &str, fields: &[Field], index: &DeclarationIndex<'_>) -> Vec<Field> {
    let mut seen = HashSet::from([owner.to_string()]);
    flatten_into(fields, index, &mut seen)
}

/// `seen` holds the records on the current embedding path. A name is only
/// in it for the duration of its own recursive call, so siblings may embed
/// the same record independently.
fn flatten_into(
    fields: &[Field],
    index: &DeclarationIndex<'_>,
    seen: &mut HashSet<String>,
) -> Vec<Field> {
    let mut result = Vec::with_capacity(fields.len());

    for field in fields {
        if !field.is_embedded {
            result.push(field.clone());
            continue;
        }

        let Some(name) = embedded_record_name(&field.ty) else {
            tracing::debug!(field = %field.name, ty = %field.ty.raw, "dropping embedded field from another package");
            continue;
        };

        if seen.contains(name) {
            tracing::debug!(embedded = name, "embedding cycle, dropping field");
            continue;
        }

        let Some(embedded) = index.get(name).filter(|d| d.kind == TypeKind::Record) else {
            tracing::debug!(embedded = name, "embedded type is not a known record, dropping field");
            continue;
        };

        seen.insert(name.to_string());
        result.extend(flatten_into(&embedded.fields, index, seen));
        seen.remove(name);
    }

    result
}

/// The declaration an embedded field refers to: `Base` and `*Base` both
/// name `Base`. Package-qualified embeddings cannot be resolved locally.
fn embedded_record_name(ty: &TypeRef) -> Option<&str> {
    match &ty.shape {
        TypeShape::Primitive { name } => Some(name),
        TypeShape::Pointer { element } => match &element.shape {
            TypeShape::Primitive { name } => Some(name),
            _ => None,
        },
        _ => None,
    }
}

/// Map a type reference to its target spelling.
///
/// Tried in order, first hit wins: the raw spelling, `qualifier.name`,
/// the bare name, then a structural rule for composite kinds, and finally
/// the bare name unchanged. A mapping entry that maps a key to itself does
/// not count as a hit.
pub fn map_reference(config: &Config, ty: &TypeRef) -> String {
    if let Some(mapped) = mapped(config, &ty.raw) {
        return mapped.to_string();
    }

    if let Some(qualifier) = ty.qualifier() {
        let full_name = format!("{}.{}", qualifier, ty.name());
        if let Some(mapped) = mapped(config, &full_name) {
            return mapped.to_string();
        }
    }

    if let Some(mapped) = mapped(config, ty.name()) {
        return mapped.to_string();
    }

    match &ty.shape {
        TypeShape::Sequence { element } | TypeShape::FixedArray { element, .. } => {
            format!("{}[]", map_reference(config, element))
        }
        TypeShape::Dictionary { key, value } => format!(
            "Record<{}, {}>",
            map_reference(config, key),
            map_reference(config, value)
        ),
        TypeShape::Pointer { element } => format!("{} | null", map_reference(config, element)),
        TypeShape::Interface => "unknown".to_string(),
        TypeShape::Primitive { name } | TypeShape::Named { name, .. } => name.clone(),
    }
}

fn mapped<'a>(config: &'a Config, key: &str) -> Option<&'a str> {
    config.lookup(key).filter(|m| *m != key)
}
