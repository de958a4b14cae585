//! Struct tag parsing.
//!
//! Follows the `key:"value"` convention used by Go's `reflect.StructTag`:
//! pairs are separated by spaces, values are double-quoted Go strings.
//! Scanning stops at the first malformed pair; everything parsed before it
//! is kept. A value whose escapes do not decode drops only its own pair.

use crate::ir::FieldTags;
use std::collections::HashSet;

/// Tag keys kept in [`FieldTags::values`]. Other keys are dropped.
pub const RECOGNIZED_TAG_KEYS: &[&str] = &[
    "json", "yaml", "xml", "db", "form", "validate", "binding", "bson",
];

/// Parse the text of a struct tag (without its backticks).
pub fn parse_tag(raw: &str) -> FieldTags {
    let mut tags = FieldTags {
        raw: raw.to_string(),
        ..FieldTags::default()
    };

    let mut looked_up = HashSet::new();
    for (key, value) in TagPairs::new(raw) {
        if !RECOGNIZED_TAG_KEYS.contains(&key) {
            tracing::trace!(key, "ignoring unrecognized tag key");
            continue;
        }
        // reflect.StructTag.Lookup stops at the first occurrence, even one
        // that fails to decode.
        if !looked_up.insert(key) {
            continue;
        }
        match value {
            Some(value) => {
                tags.values.insert(key.to_string(), value);
            }
            None => tracing::debug!(key, "undecodable tag value, dropping key"),
        }
    }

    tags
}

/// Strip the delimiters from a tag literal as it appears in source:
/// `` `json:"id"` `` or `"json:\"id\""`.
pub fn tag_literal_text(literal: &str) -> String {
    if let Some(inner) = literal
        .strip_prefix('`')
        .and_then(|s| s.strip_suffix('`'))
    {
        return inner.to_string();
    }
    if literal.len() >= 2 && literal.starts_with('"') && literal.ends_with('"') {
        return unquote(literal).unwrap_or_else(|| literal[1..literal.len() - 1].to_string());
    }
    literal.to_string()
}

struct TagPairs<'a> {
    rest: &'a str,
}

impl<'a> TagPairs<'a> {
    fn new(raw: &'a str) -> Self {
        Self { rest: raw }
    }
}

impl<'a> Iterator for TagPairs<'a> {
    /// The value is `None` when its escapes do not decode.
    type Item = (&'a str, Option<String>);

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.rest.trim_start_matches(' ');
        if tag.is_empty() {
            return None;
        }

        let bytes = tag.as_bytes();
        let mut i = 0;
        while i < bytes.len()
            && bytes[i] > b' '
            && bytes[i] != b':'
            && bytes[i] != b'"'
            && bytes[i] != 0x7f
        {
            i += 1;
        }
        if i == 0 || i + 1 >= bytes.len() || bytes[i] != b':' || bytes[i + 1] != b'"' {
            self.rest = "";
            return None;
        }
        let key = &tag[..i];
        let quoted = &tag[i + 1..];

        let qbytes = quoted.as_bytes();
        let mut j = 1;
        while j < qbytes.len() && qbytes[j] != b'"' {
            if qbytes[j] == b'\\' {
                j += 1;
            }
            j += 1;
        }
        if j >= qbytes.len() {
            self.rest = "";
            return None;
        }

        self.rest = &quoted[j + 1..];
        Some((key, unquote(&quoted[..=j])))
    }
}

/// Decode a double-quoted Go string literal.
///
/// Handles the full escape set: the single-character escapes, `\xHH`,
/// octal `\NNN`, `\uHHHH` and `\UHHHHHHHH`. Byte escapes that do not form
/// valid UTF-8 are replaced with U+FFFD.
fn unquote(quoted: &str) -> Option<String> {
    let inner = quoted.strip_prefix('"')?.strip_suffix('"')?;
    let mut out: Vec<u8> = Vec::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            push_char(&mut out, c);
            continue;
        }
        let escaped = match chars.next()? {
            'a' => '\x07',
            'b' => '\x08',
            'f' => '\x0c',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\x0b',
            '\\' => '\\',
            '"' => '"',
            'x' => {
                out.push(u8::try_from(hex_digits(&mut chars, 2)?).ok()?);
                continue;
            }
            first @ '0'..='7' => {
                let mut value = first.to_digit(8)?;
                for _ in 0..2 {
                    value = value * 8 + chars.next()?.to_digit(8)?;
                }
                out.push(u8::try_from(value).ok()?);
                continue;
            }
            'u' => char::from_u32(hex_digits(&mut chars, 4)?)?,
            'U' => char::from_u32(hex_digits(&mut chars, 8)?)?,
            _ => return None,
        };
        push_char(&mut out, escaped);
    }
    Some(String::from_utf8_lossy(&out).into_owned())
}

fn push_char(out: &mut Vec<u8>, c: char) {
    let mut buf = [0; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

fn hex_digits(chars: &mut std::str::Chars<'_>, count: usize) -> Option<u32> {
    let mut value = 0;
    for _ in 0..count {
        value = value * 16 + chars.next()?.to_digit(16)?;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_recognized_keys() {
        let tags = parse_tag(r#"json:"email,omitempty" validate:"required,email" gorm:"index""#);
        assert_eq!(tags.get("json"), Some("email,omitempty"));
        assert_eq!(tags.get("validate"), Some("required,email"));
        assert!(!tags.contains("gorm"));
        assert_eq!(tags.raw, r#"json:"email,omitempty" validate:"required,email" gorm:"index""#);
    }

    #[test]
    fn first_occurrence_wins() {
        let tags = parse_tag(r#"json:"a" json:"b""#);
        assert_eq!(tags.get("json"), Some("a"));
    }

    #[test]
    fn malformed_pair_stops_scanning() {
        let tags = parse_tag(r#"json:"id" broken yaml:"id""#);
        assert_eq!(tags.get("json"), Some("id"));
        assert!(!tags.contains("yaml"));

        let tags = parse_tag(r#"json:"unterminated"#);
        assert!(tags.values.is_empty());
    }

    #[test]
    fn escaped_quotes_in_values() {
        let tags = parse_tag(r#"validate:"oneof=\"a b\" c""#);
        assert_eq!(tags.get("validate"), Some(r#"oneof="a b" c"#));
    }

    #[test]
    fn go_escapes_decode() {
        let tags = parse_tag(r#"json:"a\x41\102é\U0001F600" yaml:"tab\there""#);
        assert_eq!(tags.get("json"), Some("aABé😀"));
        assert_eq!(tags.get("yaml"), Some("tab\there"));

        let tags = parse_tag(r#"xml:"\a\b\f\v""#);
        assert_eq!(tags.get("xml"), Some("\x07\x08\x0c\x0b"));
    }

    #[test]
    fn undecodable_value_skips_only_its_pair() {
        let tags = parse_tag(r#"json:"bad\q" yaml:"kept" db:"\xZZ" form:"also""#);
        assert!(!tags.contains("json"));
        assert_eq!(tags.get("yaml"), Some("kept"));
        assert!(!tags.contains("db"));
        assert_eq!(tags.get("form"), Some("also"));

        // A bad first occurrence still hides later duplicates.
        let tags = parse_tag(r#"json:"\q" json:"second""#);
        assert!(!tags.contains("json"));

        // Surrogates and out-of-range code points are rejected.
        let tags = parse_tag(r#"json:"\uD800" bson:"\U00110000" xml:"ok""#);
        assert!(!tags.contains("json"));
        assert!(!tags.contains("bson"));
        assert_eq!(tags.get("xml"), Some("ok"));
    }

    #[test]
    fn literal_delimiters_are_stripped() {
        assert_eq!(tag_literal_text("`json:\"id\"`"), r#"json:"id""#);
        assert_eq!(tag_literal_text(r#""json:\"id\"""#), r#"json:"id""#);
    }
}
