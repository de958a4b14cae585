//! Rendering a compilation unit through a user template.

use super::GenerateError;
use super::helpers::HelperRegistry;
use crate::config::Config;
use crate::ir::{CompilationUnit, TypeDeclaration};
use crate::resolve::resolve;
use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Top-level names a template may read.
pub const CONTEXT_NAMES: &[&str] = &["file", "types", "type", "config", "typeMappings"];

/// Names the engine itself provides.
const ENGINE_NAMES: &[&str] = &[
    "range", "dict", "namespace", "debug", "loop", "self", "super", "caller", "varargs", "kwargs",
];

/// The data handed to a template.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TemplateData<'a> {
    file: &'a CompilationUnit,
    types: &'a [TypeDeclaration],
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    current: Option<&'a TypeDeclaration>,
    config: &'a Config,
    type_mappings: &'a BTreeMap<String, String>,
}

/// A loaded template plus the configuration it renders with.
pub struct Generator {
    config: Arc<Config>,
    env: Environment<'static>,
    helpers: HelperRegistry,
    template: Option<String>,
}

impl Generator {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::SemiStrict);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        let helpers = HelperRegistry::install(&mut env, Arc::clone(&config));
        Self {
            config,
            env,
            helpers,
            template: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn helpers(&self) -> &HelperRegistry {
        &self.helpers
    }

    /// Read and load the template at `path`, named after its file name.
    pub fn load_template_file(&mut self, path: &Path) -> Result<(), GenerateError> {
        let source = std::fs::read_to_string(path).map_err(|source| GenerateError::TemplateRead {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.load_template(name, source)
    }

    /// Compile `source` and check that every free name it uses is known.
    pub fn load_template(&mut self, name: impl Into<String>, source: impl Into<String>) -> Result<(), GenerateError> {
        let name = name.into();
        self.env
            .add_template_owned(name.clone(), source.into())
            .map_err(|source| GenerateError::TemplateLoad {
                name: name.clone(),
                source,
            })?;

        let template = self
            .env
            .get_template(&name)
            .map_err(|source| GenerateError::TemplateLoad {
                name: name.clone(),
                source,
            })?;

        let mut unknown: Vec<String> = template
            .undeclared_variables(false)
            .into_iter()
            .filter(|n| !self.is_known(n))
            .collect();
        if !unknown.is_empty() {
            unknown.sort();
            return Err(GenerateError::UnknownNames {
                name,
                names: unknown,
            });
        }

        tracing::debug!(template = %name, "loaded template");
        self.template = Some(name);
        Ok(())
    }

    fn is_known(&self, name: &str) -> bool {
        CONTEXT_NAMES.contains(&name) || ENGINE_NAMES.contains(&name) || self.helpers.contains(name)
    }

    /// Render `unit` and write the result to `out`.
    ///
    /// Nothing is written unless every render succeeds.
    pub fn generate(&self, unit: &CompilationUnit, out: &mut dyn Write) -> Result<(), GenerateError> {
        let text = self.generate_to_string(unit)?;
        out.write_all(text.as_bytes())?;
        out.flush()?;
        Ok(())
    }

    /// Resolve `unit` and render it, once overall or once per declaration.
    pub fn generate_to_string(&self, unit: &CompilationUnit) -> Result<String, GenerateError> {
        let types = resolve(unit, &self.config);
        let text = if self.config.options.per_type {
            let mut text = String::new();
            for declaration in &types {
                text.push_str(&self.render(unit, &types, Some(declaration))?);
            }
            text
        } else {
            self.render(unit, &types, None)?
        };
        tracing::info!(
            declarations = types.len(),
            per_type = self.config.options.per_type,
            "generated output"
        );
        Ok(text)
    }

    fn render(
        &self,
        unit: &CompilationUnit,
        types: &[TypeDeclaration],
        current: Option<&TypeDeclaration>,
    ) -> Result<String, GenerateError> {
        let failed = |source: minijinja::Error| GenerateError::TemplateExecution {
            type_name: current.map(|d| d.name.clone()),
            source,
        };
        let name = self.template.as_deref().ok_or_else(|| {
            failed(minijinja::Error::new(
                minijinja::ErrorKind::TemplateNotFound,
                "no template loaded",
            ))
        })?;
        let template = self.env.get_template(name).map_err(failed)?;
        let data = TemplateData {
            file: unit,
            types,
            current,
            config: &self.config,
            type_mappings: &self.config.type_mappings,
        };
        template.render(&data).map_err(failed)
    }
}
