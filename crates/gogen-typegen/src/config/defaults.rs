//! Default Go → TypeScript mappings and generation options.

use super::Options;
use std::collections::{BTreeMap, BTreeSet};

const DEFAULT_TYPE_MAPPINGS: &[(&str, &str)] = &[
    // Basic types
    ("string", "string"),
    ("bool", "boolean"),
    ("int", "number"),
    ("int8", "number"),
    ("int16", "number"),
    ("int32", "number"),
    ("int64", "number"),
    ("uint", "number"),
    ("uint8", "number"),
    ("uint16", "number"),
    ("uint32", "number"),
    ("uint64", "number"),
    ("float32", "number"),
    ("float64", "number"),
    ("complex64", "number"),
    ("complex128", "number"),
    ("byte", "number"),
    ("rune", "number"),
    ("uintptr", "number"),
    // Special types
    ("[]byte", "string"), // base64 on the wire
    ("time.Time", "string"), // RFC 3339
    ("time.Duration", "number"), // nanoseconds
    ("interface{}", "unknown"),
    ("any", "unknown"),
    ("error", "string"),
    // UUIDs
    ("uuid.UUID", "string"),
    ("github.com/google/uuid.UUID", "string"),
    ("github.com/gofrs/uuid.UUID", "string"),
    ("github.com/satori/go.uuid.UUID", "string"),
    // Decimals
    ("decimal.Decimal", "string"),
    ("github.com/shopspring/decimal.Decimal", "string"),
    // JSON
    ("json.RawMessage", "unknown"),
];

/// The built-in type mapping table.
pub fn default_type_mappings() -> BTreeMap<String, String> {
    DEFAULT_TYPE_MAPPINGS
        .iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect()
}

/// Built-in options: one render over all types, exported types only,
/// field names from `json` tags.
pub fn default_options() -> Options {
    Options {
        per_type: false,
        exported_only: true,
        tag_key: "json".to_string(),
        include_types: BTreeSet::new(),
        exclude_types: BTreeSet::new(),
    }
}
