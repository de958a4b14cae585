//! Template-driven code generation.

pub mod casing;
pub mod helpers;
pub mod template;
pub mod validate;

pub use helpers::HelperRegistry;
pub use template::Generator;

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("reading template {}", path.display())]
    TemplateRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parsing template {name}")]
    TemplateLoad {
        name: String,
        source: minijinja::Error,
    },

    /// The template refers to names that are neither context keys nor helpers.
    #[error("template {name} uses unknown names: {}", names.join(", "))]
    UnknownNames { name: String, names: Vec<String> },

    #[error("executing template{}", type_name.as_ref().map(|n| format!(" for {}", n)).unwrap_or_default())]
    TemplateExecution {
        /// The declaration being rendered in per-type mode.
        type_name: Option<String>,
        source: minijinja::Error,
    },

    #[error("writing output")]
    Output(#[from] std::io::Error),
}
