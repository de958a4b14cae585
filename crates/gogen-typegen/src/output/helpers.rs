//! Helper functions exposed to templates.
//!
//! Every helper is registered under a stable name. The [`HelperRegistry`]
//! remembers those names so that a template can be checked for unknown
//! names before anything is rendered.

use super::casing::{camel_case, kebab_case, pascal_case, snake_case};
use super::validate::{
    has_validate_rule, validate_rules, validate_value, valibot_form_field, valibot_type,
};
use crate::config::Config;
use crate::ir::{Field, TypeKind, TypeRef};
use crate::resolve::map_reference;
use minijinja::Environment;
use minijinja::value::{Value, ViaDeserialize};
use std::sync::Arc;

/// Names of the helpers installed into an [`Environment`].
#[derive(Debug, Clone, Default)]
pub struct HelperRegistry {
    names: Vec<&'static str>,
}

macro_rules! register {
    ($env:expr, $registry:expr, { $($name:literal => $f:expr),* $(,)? }) => {
        $(
            $env.add_function($name, $f);
            $registry.names.push($name);
        )*
    };
}

impl HelperRegistry {
    /// Install the full helper library into `env`.
    pub fn install(env: &mut Environment<'static>, config: Arc<Config>) -> Self {
        let mut registry = Self::default();

        let mapping = Arc::clone(&config);
        let tag_key = config.options.tag_key.clone();
        let optional_key = tag_key.clone();

        register!(env, registry, {
            // Type mapping
            "mapType" => move |ty: ViaDeserialize<TypeRef>| map_reference(&mapping, &ty),

            // Casing
            "camelCase" => |s: String| camel_case(&s),
            "pascalCase" => |s: String| pascal_case(&s),
            "snakeCase" => |s: String| snake_case(&s),
            "kebabCase" => |s: String| kebab_case(&s),

            // Strings
            "lower" => |s: String| s.to_lowercase(),
            "upper" => |s: String| s.to_uppercase(),
            "trim" => |s: String| s.trim().to_string(),
            "replace" => |s: String, from: String, to: String| s.replace(&from, &to),
            "hasPrefix" => |s: String, prefix: String| s.starts_with(&prefix),
            "hasSuffix" => |s: String, suffix: String| s.ends_with(&suffix),

            // Tags
            "tag" => |field: ViaDeserialize<Field>, key: String| {
                field.tags.get(&key).unwrap_or_default().to_string()
            },
            "tagOrName" => move |field: ViaDeserialize<Field>| tag_or_name(&field, &tag_key),
            "jsonName" => |field: ViaDeserialize<Field>| tag_or_name(&field, "json"),
            "hasTag" => |field: ViaDeserialize<Field>, key: String| field.tags.contains(&key),
            "isOptional" => move |field: ViaDeserialize<Field>| is_optional(&field, &optional_key),

            // Kind predicates, for references and declarations alike
            "isRecord" => |v: Value| kind_is(&v, TypeKind::Record),
            "isNamed" => |v: Value| kind_is(&v, TypeKind::Named),
            "isAlias" => |v: Value| kind_is(&v, TypeKind::Alias),
            "isPrimitive" => |v: Value| kind_is(&v, TypeKind::Primitive),
            "isSequence" => |v: Value| kind_is(&v, TypeKind::Sequence),
            "isArray" => |v: Value| kind_is(&v, TypeKind::FixedArray),
            "isDictionary" => |v: Value| kind_is(&v, TypeKind::Dictionary),
            "isPointer" => |v: Value| kind_is(&v, TypeKind::Pointer),
            "isInterface" => |v: Value| kind_is(&v, TypeKind::Interface),

            // Structure
            "elemType" => |ty: ViaDeserialize<TypeRef>| Value::from_serialize(ty.element()),
            "keyType" => |ty: ViaDeserialize<TypeRef>| Value::from_serialize(ty.key()),
            "valueType" => |ty: ViaDeserialize<TypeRef>| Value::from_serialize(ty.value()),

            // Lists and conditionals
            "join" => |items: Vec<String>, separator: String| items.join(&separator),
            "contains" => |items: Vec<String>, item: String| items.contains(&item),
            "default" => |value: Option<String>, fallback: String| {
                value.filter(|v| !v.is_empty()).unwrap_or(fallback)
            },
            "ternary" => |condition: bool, a: Value, b: Value| if condition { a } else { b },
            "notLast" => |index: i64, length: i64| index < length - 1,

            // Docs
            "comment" => |text: String, prefix: String| format_comment(&text, &prefix),
            "docComment" => |text: String| format_doc_comment(&text),

            // Validators
            "validateRules" => |field: ViaDeserialize<Field>| {
                Value::from_serialize(validate_rules(&field))
            },
            "hasValidateRule" => |field: ViaDeserialize<Field>, rule: String| {
                has_validate_rule(&field, &rule)
            },
            "getValidateValue" => |field: ViaDeserialize<Field>, rule: String| {
                validate_value(&field, &rule)
            },
            "valibotFormField" => |field: ViaDeserialize<Field>| valibot_form_field(&field),
            "valibotType" => |ty: ViaDeserialize<TypeRef>| valibot_type(&ty),
        });

        tracing::trace!(helpers = registry.names.len(), "installed template helpers");
        registry
    }

    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name)
    }
}

/// The first segment of the field's `key` tag, or the field name when the
/// tag is missing, empty or `-`.
pub fn tag_or_name(field: &Field, key: &str) -> String {
    if let Some(value) = field.tags.get(key) {
        let first = value.split(',').next().unwrap_or_default();
        if !first.is_empty() && first != "-" {
            return first.to_string();
        }
    }
    field.name.clone()
}

/// Pointers are optional, as are fields tagged `omitempty` under `key`.
pub fn is_optional(field: &Field, key: &str) -> bool {
    if field.ty.kind() == TypeKind::Pointer {
        return true;
    }
    field
        .tags
        .get(key)
        .is_some_and(|value| value.split(',').skip(1).any(|opt| opt == "omitempty"))
}

/// Prefix every line of `text`.
pub fn format_comment(text: &str, prefix: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }
    text.lines()
        .map(|line| format!("{}{}", prefix, line.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A JSDoc block: `/** one line */`, or one ` * ` line per input line.
pub fn format_doc_comment(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    if let [line] = lines.as_slice() {
        return format!("/** {} */", line);
    }
    let mut out = vec!["/**".to_string()];
    out.extend(lines.iter().map(|line| format!(" * {}", line)));
    out.push(" */".to_string());
    out.join("\n")
}

fn kind_is(value: &Value, kind: TypeKind) -> bool {
    value
        .get_attr("kind")
        .ok()
        .is_some_and(|k| k.as_str() == Some(kind.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::parse_tag;

    fn tagged(name: &str, ty: TypeRef, tag: &str) -> Field {
        Field::new(name, ty).with_tags(parse_tag(tag))
    }

    #[test]
    fn tag_or_name_uses_first_segment() {
        let s = TypeRef::primitive("string");
        assert_eq!(tag_or_name(&tagged("Age", s.clone(), r#"json:"age,omitempty""#), "json"), "age");
        assert_eq!(tag_or_name(&tagged("Age", s.clone(), r#"json:"-""#), "json"), "Age");
        assert_eq!(tag_or_name(&tagged("Age", s.clone(), r#"json:",omitempty""#), "json"), "Age");
        assert_eq!(tag_or_name(&tagged("Age", s.clone(), r#"yaml:"years""#), "yaml"), "years");
        assert_eq!(tag_or_name(&tagged("Age", s, ""), "json"), "Age");
    }

    #[test]
    fn optional_from_pointer_or_omitempty() {
        let ptr = TypeRef::pointer(TypeRef::named("time", "Time"));
        assert!(is_optional(&tagged("At", ptr, ""), "json"));

        let s = TypeRef::primitive("string");
        assert!(is_optional(&tagged("Zip", s.clone(), r#"json:"zip,omitempty""#), "json"));
        assert!(!is_optional(&tagged("Zip", s.clone(), r#"json:"zip""#), "json"));
        assert!(!is_optional(&tagged("Zip", s, r#"yaml:"zip,omitempty""#), "json"));
    }

    #[test]
    fn doc_comment_forms() {
        assert_eq!(format_doc_comment(""), "");
        assert_eq!(format_doc_comment("  One line. "), "/** One line. */");
        assert_eq!(
            format_doc_comment("First.\n  Second."),
            "/**\n * First.\n * Second.\n */"
        );
        assert_eq!(format_comment("a\nb", "// "), "// a\n// b");
        assert_eq!(format_comment("   ", "// "), "");
    }

    #[test]
    fn registry_knows_its_helpers() {
        let mut env = Environment::new();
        let registry = HelperRegistry::install(&mut env, Arc::new(Config::new()));
        assert!(registry.contains("mapType"));
        assert!(registry.contains("valibotFormField"));
        assert!(!registry.contains("mapTypes"));

        let mut names = registry.names().to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), registry.names().len());
    }

    #[test]
    fn helpers_render() {
        let mut env = Environment::new();
        HelperRegistry::install(&mut env, Arc::new(Config::new()));
        let field = tagged(
            "UpdatedAt",
            TypeRef::pointer(TypeRef::named("time", "Time")),
            r#"json:"updatedAt,omitempty""#,
        );
        let out = env
            .render_str(
                "{{ tagOrName(f) }}{% if isOptional(f) %}?{% endif %}: {{ mapType(f.type) }} \
                 {{ snakeCase(f.name) }} {{ isPointer(f.type) }} {{ elemType(f.type).raw }}",
                minijinja::context! { f => Value::from_serialize(&field) },
            )
            .unwrap();
        assert_eq!(out, "updatedAt?: string | null updated_at true time.Time");
    }
}
