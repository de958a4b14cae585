//! Template-driven code generation from Go type declarations.
//!
//! `gogen-typegen` reads the `type` declarations of a Go source file, maps
//! their Go type spellings to a target language, and renders them through
//! a user-supplied template.
//!
//! # Architecture
//!
//! ```text
//! Go source ──> CompilationUnit ──> resolve ──> template
//! (input::go)   (ir.rs)             (filter,    (output::template,
//!                                    flatten)    output::helpers)
//!                     ▲
//!                  Config (type mappings + options)
//! ```
//!
//! # Example
//!
//! ```
//! use gogen_typegen::{Config, Generator, input};
//!
//! let unit = input::parse_go_source(r#"
//! package models
//!
//! type User struct {
//!     ID   int64    `json:"id"`
//!     Tags []string `json:"tags"`
//! }
//! "#).unwrap();
//!
//! let mut generator = Generator::new(Config::new());
//! generator
//!     .load_template(
//!         "ts",
//!         "{% for t in types %}interface {{ t.name }} {\n\
//!          {% for f in t.fields %}  {{ tagOrName(f) }}: {{ mapType(f.type) }};\n{% endfor %}\
//!          }\n{% endfor %}",
//!     )
//!     .unwrap();
//!
//! let ts = generator.generate_to_string(&unit).unwrap();
//! assert!(ts.contains("  tags: string[];"));
//! ```

pub mod config;
pub mod input;
pub mod ir;
pub mod output;
pub mod resolve;

pub use config::{Config, ConfigError, ConfigFormat, Options};
pub use input::ParseError;
pub use ir::{CompilationUnit, Field, FieldTags, TypeDeclaration, TypeKind, TypeRef, TypeShape};
pub use output::{GenerateError, Generator};

/// Any failure of the parse → configure → generate pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Generate(#[from] GenerateError),
}

/// Parse `source` and render it with `template` in one step.
pub fn generate_source(source: &str, template: &str, config: Config) -> Result<String, Error> {
    let unit = input::parse_go_source(source)?;
    let mut generator = Generator::new(config);
    generator.load_template("template", template)?;
    Ok(generator.generate_to_string(&unit)?)
}
