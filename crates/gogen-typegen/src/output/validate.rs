//! `validate` tag rules and Valibot form-field expressions.
//!
//! A `validate` tag is a comma-separated list of rules, each a name with an
//! optional `=value`: `"required,min=1,max=45"`.

use crate::ir::{Field, TypeRef, TypeShape};
use serde::Serialize;

/// One rule from a `validate` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidateRule {
    pub name: String,
    /// Empty for flag rules such as `required`.
    pub value: String,
}

/// The field's `validate` rules, in tag order.
pub fn validate_rules(field: &Field) -> Vec<ValidateRule> {
    let Some(tag) = field.tags.get("validate") else {
        return Vec::new();
    };

    tag.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| match part.find('=') {
            Some(idx) if idx > 0 => ValidateRule {
                name: part[..idx].to_string(),
                value: part[idx + 1..].to_string(),
            },
            _ => ValidateRule {
                name: part.to_string(),
                value: String::new(),
            },
        })
        .collect()
}

pub fn has_validate_rule(field: &Field, rule: &str) -> bool {
    validate_rules(field).iter().any(|r| r.name == rule)
}

/// Value of the first rule named `rule`, empty when absent.
pub fn validate_value(field: &Field, rule: &str) -> String {
    validate_rules(field)
        .into_iter()
        .find(|r| r.name == rule)
        .map(|r| r.value)
        .unwrap_or_default()
}

/// A Valibot schema entry for a form field: optional with a default value,
/// piped through validators derived from the `validate` tag.
pub fn valibot_form_field(field: &Field) -> String {
    let ty = &field.ty;
    let (base, default, numeric) = match &ty.shape {
        TypeShape::Primitive { name } => match primitive_class(name) {
            Primitive::String => ("v.string()", "''", false),
            Primitive::Boolean => ("v.boolean()", "false", false),
            Primitive::Number => ("v.number()", "0", true),
            Primitive::Other => ("v.unknown()", "undefined", false),
        },
        TypeShape::Named { name, .. } => {
            if is_string_like(ty) {
                ("v.string()", "''", false)
            } else {
                return format!("{}Schema", name);
            }
        }
        TypeShape::Sequence { element } | TypeShape::FixedArray { element, .. } => {
            return format!("v.optional(v.array({}), [])", valibot_type(element));
        }
        TypeShape::Dictionary { key, value } => {
            return format!(
                "v.optional(v.record({}, {}), {{}})",
                valibot_type(key),
                valibot_type(value)
            );
        }
        TypeShape::Pointer { element } => {
            return format!("v.nullable({})", valibot_type(element));
        }
        TypeShape::Interface => ("v.unknown()", "undefined", false),
    };

    let validators: Vec<String> = validate_rules(field)
        .iter()
        .filter_map(|rule| match rule.name.as_str() {
            "min" if numeric => Some(format!("v.minValue({})", rule.value)),
            "min" => Some(format!("v.minLength({})", rule.value)),
            "max" if numeric => Some(format!("v.maxValue({})", rule.value)),
            "max" => Some(format!("v.maxLength({})", rule.value)),
            "email" => Some("v.email()".to_string()),
            "url" => Some("v.url()".to_string()),
            "uuid" => Some("v.uuid()".to_string()),
            _ => None,
        })
        .collect();

    let optional = format!("v.optional({}, {})", base, default);
    if validators.is_empty() {
        optional
    } else {
        format!("v.pipe({}, {})", optional, validators.join(", "))
    }
}

/// Valibot schema for a nested type reference.
pub fn valibot_type(ty: &TypeRef) -> String {
    match &ty.shape {
        TypeShape::Primitive { name } => match primitive_class(name) {
            Primitive::String => "v.string()".to_string(),
            Primitive::Boolean => "v.boolean()".to_string(),
            Primitive::Number => "v.number()".to_string(),
            Primitive::Other => "v.unknown()".to_string(),
        },
        TypeShape::Named { name, .. } => match ty.raw.as_str() {
            "time.Time" => "v.pipe(v.string(), v.isoDateTime())".to_string(),
            "uuid.UUID" => "v.pipe(v.string(), v.uuid())".to_string(),
            _ => format!("{}Schema", name),
        },
        TypeShape::Sequence { element } | TypeShape::FixedArray { element, .. } => {
            format!("v.array({})", valibot_type(element))
        }
        TypeShape::Dictionary { key, value } => {
            format!("v.record({}, {})", valibot_type(key), valibot_type(value))
        }
        TypeShape::Pointer { element } => format!("v.nullable({})", valibot_type(element)),
        TypeShape::Interface => "v.unknown()".to_string(),
    }
}

enum Primitive {
    String,
    Boolean,
    Number,
    Other,
}

fn primitive_class(name: &str) -> Primitive {
    match name {
        "string" => Primitive::String,
        "bool" => Primitive::Boolean,
        "byte" | "rune" => Primitive::Number,
        _ if name.starts_with("int") || name.starts_with("uint") || name.starts_with("float") => {
            Primitive::Number
        }
        _ => Primitive::Other,
    }
}

fn is_string_like(ty: &TypeRef) -> bool {
    matches!(ty.raw.as_str(), "time.Time" | "uuid.UUID")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::parse_tag;

    fn field(ty: TypeRef, tag: &str) -> Field {
        Field::new("F", ty).with_tags(parse_tag(tag))
    }

    #[test]
    fn rules_keep_tag_order() {
        let f = field(TypeRef::primitive("string"), r#"validate:"required, min=1,max=45,,""#);
        assert_eq!(
            validate_rules(&f),
            vec![
                ValidateRule { name: "required".into(), value: String::new() },
                ValidateRule { name: "min".into(), value: "1".into() },
                ValidateRule { name: "max".into(), value: "45".into() },
            ]
        );
        assert!(has_validate_rule(&f, "required"));
        assert!(!has_validate_rule(&f, "email"));
        assert_eq!(validate_value(&f, "max"), "45");
        assert_eq!(validate_value(&f, "len"), "");
    }

    #[test]
    fn no_tag_no_rules() {
        assert!(validate_rules(&field(TypeRef::primitive("int"), "")).is_empty());
    }

    #[test]
    fn string_with_length_rules() {
        let f = field(TypeRef::primitive("string"), r#"validate:"required,min=2,email""#);
        assert_eq!(
            valibot_form_field(&f),
            "v.pipe(v.optional(v.string(), ''), v.minLength(2), v.email())"
        );
    }

    #[test]
    fn numeric_bounds() {
        let f = field(TypeRef::primitive("int32"), r#"validate:"min=1,max=10""#);
        assert_eq!(
            valibot_form_field(&f),
            "v.pipe(v.optional(v.number(), 0), v.minValue(1), v.maxValue(10))"
        );
    }

    #[test]
    fn plain_shapes() {
        let bare = |ty| valibot_form_field(&field(ty, ""));
        assert_eq!(bare(TypeRef::primitive("bool")), "v.optional(v.boolean(), false)");
        assert_eq!(bare(TypeRef::named("time", "Time")), "v.optional(v.string(), '')");
        assert_eq!(bare(TypeRef::primitive("Custom")), "v.optional(v.unknown(), undefined)");
        assert_eq!(bare(TypeRef::named("geo", "Point")), "PointSchema");
        assert_eq!(
            bare(TypeRef::sequence(TypeRef::named("uuid", "UUID"))),
            "v.optional(v.array(v.pipe(v.string(), v.uuid())), [])"
        );
        assert_eq!(
            bare(TypeRef::dictionary(
                TypeRef::primitive("string"),
                TypeRef::primitive("float64")
            )),
            "v.optional(v.record(v.string(), v.number()), {})"
        );
        assert_eq!(
            bare(TypeRef::pointer(TypeRef::named("time", "Time"))),
            "v.nullable(v.pipe(v.string(), v.isoDateTime()))"
        );
    }
}
