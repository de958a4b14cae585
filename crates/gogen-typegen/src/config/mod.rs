//! Type mapping configuration.
//!
//! A [`Config`] starts from the built-in defaults and can be merged once
//! with a YAML or JSON document:
//!
//! ```yaml
//! typeMappings:
//!   time.Time: Date
//!   decimal.Decimal: number
//! options:
//!   perType: false
//!   exportedOnly: true
//!   tagKey: json
//!   includeTypes: [User, Order]
//!   excludeTypes: [InternalConfig]
//! ```

pub mod defaults;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

pub use defaults::{default_options, default_type_mappings};

/// Generation configuration: the type mapping table plus options.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Go spelling → target spelling.
    pub type_mappings: BTreeMap<String, String>,
    pub options: Options,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    /// Render the template once per declaration instead of once overall.
    pub per_type: bool,
    /// Skip unexported declarations.
    pub exported_only: bool,
    /// Tag key used for field names (`tagOrName`).
    pub tag_key: String,
    /// When non-empty, only these declarations are generated.
    pub include_types: BTreeSet<String>,
    /// Declarations that are never generated.
    pub exclude_types: BTreeSet<String>,
}

/// Syntax of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    /// Try YAML, then JSON.
    Auto,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config file {}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The document is neither valid YAML nor valid JSON.
    #[error("{0}")]
    Format(String),
}

/// The document as written. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ConfigFile {
    type_mappings: BTreeMap<String, String>,
    options: OptionsFile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct OptionsFile {
    #[serde(alias = "perTypeEmission")]
    per_type: bool,
    exported_only: bool,
    #[serde(alias = "metadataKey")]
    tag_key: String,
    #[serde(alias = "includeNames")]
    include_types: Vec<String>,
    #[serde(alias = "excludeNames")]
    exclude_types: Vec<String>,
}

impl ConfigFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("yaml" | "yml") => ConfigFormat::Yaml,
            Some("json") => ConfigFormat::Json,
            _ => ConfigFormat::Auto,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            type_mappings: default_type_mappings(),
            options: default_options(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `path` and merge it onto this configuration.
    pub fn load_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let bytes = std::fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_overrides(&bytes, ConfigFormat::from_path(path))?;
        tracing::debug!(path = %path.display(), "merged config file");
        Ok(())
    }

    /// Parse a configuration document and merge it onto this configuration.
    pub fn load_overrides(&mut self, bytes: &[u8], format: ConfigFormat) -> Result<(), ConfigError> {
        let loaded: ConfigFile = match format {
            ConfigFormat::Yaml => serde_yaml::from_slice(bytes)
                .map_err(|e| ConfigError::Format(format!("parsing YAML config: {}", e)))?,
            ConfigFormat::Json => serde_json::from_slice(bytes)
                .map_err(|e| ConfigError::Format(format!("parsing JSON config: {}", e)))?,
            ConfigFormat::Auto => match serde_yaml::from_slice(bytes) {
                Ok(loaded) => loaded,
                Err(_) => serde_json::from_slice(bytes).map_err(|_| {
                    ConfigError::Format("unable to parse config as YAML or JSON".into())
                })?,
            },
        };
        self.merge(loaded);
        Ok(())
    }

    /// Merge a loaded document.
    ///
    /// Mappings merge key by key. `perType` can only be switched on and
    /// `tagKey` only replaced by a non-empty value, while `exportedOnly`
    /// and the include/exclude lists always take the document's value, so
    /// a document that omits `exportedOnly` turns it off.
    fn merge(&mut self, loaded: ConfigFile) {
        self.type_mappings.extend(loaded.type_mappings);

        let options = loaded.options;
        if !options.tag_key.is_empty() {
            self.options.tag_key = options.tag_key;
        }
        if options.per_type {
            self.options.per_type = true;
        }
        self.options.exported_only = options.exported_only;
        self.options.include_types = options.include_types.into_iter().collect();
        self.options.exclude_types = options.exclude_types.into_iter().collect();
    }

    /// The mapping entry for `spelling`, if any.
    pub fn lookup(&self, spelling: &str) -> Option<&str> {
        self.type_mappings.get(spelling).map(String::as_str)
    }

    /// Map a Go spelling to its target spelling, returning the input
    /// unchanged when there is no entry.
    pub fn map_type<'a>(&'a self, spelling: &'a str) -> &'a str {
        self.lookup(spelling).unwrap_or(spelling)
    }

    pub fn set_mapping(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.type_mappings.insert(from.into(), to.into());
    }

    /// Whether a declaration is generated.
    ///
    /// The exported-only gate applies first, a non-empty include list must
    /// contain the name, and the exclude list always vetoes.
    pub fn should_include(&self, name: &str, is_exported: bool) -> bool {
        let options = &self.options;
        if options.exported_only && !is_exported {
            return false;
        }
        if !options.include_types.is_empty() && !options.include_types.contains(name) {
            return false;
        }
        !options.exclude_types.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults() {
        let config = Config::new();
        assert!(!config.options.per_type);
        assert!(config.options.exported_only);
        assert_eq!(config.options.tag_key, "json");
        assert_eq!(config.map_type("int64"), "number");
        assert_eq!(config.map_type("time.Time"), "string");
        assert_eq!(config.map_type("[]byte"), "string");
    }

    #[test]
    fn map_type_falls_back_to_identity() {
        let config = Config::new();
        assert_eq!(config.map_type("Address"), "Address");
        assert_eq!(config.lookup("Address"), None);
    }

    #[test]
    fn yaml_overrides_merge_by_key() {
        let mut config = Config::new();
        config
            .load_overrides(
                b"typeMappings:\n  time.Time: Date\n  Money: bigint\noptions:\n  exportedOnly: true\n",
                ConfigFormat::Yaml,
            )
            .unwrap();
        assert_eq!(config.map_type("time.Time"), "Date");
        assert_eq!(config.map_type("Money"), "bigint");
        assert_eq!(config.map_type("bool"), "boolean");
        assert_eq!(config.options.tag_key, "json");
        assert!(config.options.exported_only);
    }

    #[test]
    fn json_overrides_and_option_aliases() {
        let mut config = Config::new();
        config
            .load_overrides(
                br#"{"options": {"perTypeEmission": true, "metadataKey": "yaml", "exportedOnly": true, "includeNames": ["User"]}, "unrelated": 1}"#,
                ConfigFormat::Json,
            )
            .unwrap();
        assert!(config.options.per_type);
        assert_eq!(config.options.tag_key, "yaml");
        assert_eq!(config.options.include_types, names(&["User"]));
    }

    #[test]
    fn absent_exported_only_replaces_default() {
        // exportedOnly is replaced by the document's value even when the
        // document does not mention it.
        let mut config = Config::new();
        config
            .load_overrides(b"options:\n  perType: true\n", ConfigFormat::Yaml)
            .unwrap();
        assert!(!config.options.exported_only);

        let mut config = Config::new();
        config
            .load_overrides(b"{\"options\": {\"exportedOnly\": false}}", ConfigFormat::Json)
            .unwrap();
        assert!(!config.options.exported_only);
    }

    #[test]
    fn per_type_cannot_be_switched_off() {
        let mut config = Config::new();
        config.options.per_type = true;
        config
            .load_overrides(b"options:\n  perType: false\n", ConfigFormat::Yaml)
            .unwrap();
        assert!(config.options.per_type);
    }

    #[test]
    fn auto_format_falls_back_to_json() {
        let mut config = Config::new();
        config
            .load_overrides(br#"{"typeMappings": {"uuid.UUID": "UUID"}}"#, ConfigFormat::Auto)
            .unwrap();
        assert_eq!(config.map_type("uuid.UUID"), "UUID");
    }

    #[test]
    fn unparseable_document_is_a_format_error() {
        let mut config = Config::new();
        let err = config
            .load_overrides(b"typeMappings: [unclosed", ConfigFormat::Auto)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Format(_)));
        assert!(err.to_string().contains("YAML or JSON"));

        let err = config
            .load_overrides(b"{", ConfigFormat::Json)
            .unwrap_err();
        assert!(err.to_string().starts_with("parsing JSON config"));
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(ConfigFormat::from_path(Path::new("gogen.YML")), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("gogen.json")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("gogen.conf")), ConfigFormat::Auto);
        assert_eq!(ConfigFormat::from_path(Path::new("gogen")), ConfigFormat::Auto);
    }

    #[test]
    fn exported_only_gate_comes_first() {
        let mut config = Config::new();
        config.options.include_types = names(&["Internal"]);
        assert!(!config.should_include("Internal", false));
    }

    #[test]
    fn exclusion_dominates_inclusion() {
        let mut config = Config::new();
        config.options.include_types = names(&["User"]);
        config.options.exclude_types = names(&["User"]);
        assert!(!config.should_include("User", true));
    }

    #[test]
    fn include_list_narrows() {
        let mut config = Config::new();
        config.options.include_types = names(&["User", "Order"]);
        assert!(config.should_include("Order", true));
        assert!(!config.should_include("Product", true));

        config.options.include_types.clear();
        config.options.exported_only = false;
        assert!(config.should_include("internal", false));
    }
}
