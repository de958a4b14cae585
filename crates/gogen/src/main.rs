//! `gogen`: render Go type declarations through a template.

use anyhow::Context;
use clap::Parser;
use gogen_typegen::{Config, Generator, input};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Generate code from Go type declarations using templates
#[derive(Parser, Debug)]
#[command(name = "gogen", version)]
struct Cli {
    /// Go source file to read
    #[arg(short, long)]
    input: PathBuf,

    /// Template file (Jinja syntax)
    #[arg(short, long)]
    template: PathBuf,

    /// Config file with type mappings (YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Render the template once per type
    #[arg(long)]
    per_type: bool,

    /// Only generate exported types [default: true]
    #[arg(long, value_name = "BOOL")]
    exported: Option<bool>,

    /// Tag key used for field names [default: json]
    #[arg(long, value_name = "KEY")]
    tag: Option<String>,

    /// Only generate these types (comma-separated)
    #[arg(short = 'T', long, value_name = "LIST")]
    types: Option<String>,

    /// Never generate these types (comma-separated)
    #[arg(short = 'X', long, value_name = "LIST")]
    exclude: Option<String>,

    /// Report parsed types and progress on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "warn,gogen=info,gogen_typegen=info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli)?;

    let source = std::fs::read_to_string(&cli.input)
        .with_context(|| format!("reading input file {}", cli.input.display()))?;
    let unit = input::parse_go_file(&cli.input.to_string_lossy(), &source)
        .with_context(|| format!("parsing {}", cli.input.display()))?;

    if cli.verbose {
        eprintln!(
            "Parsed {} types from package {}",
            unit.declarations.len(),
            unit.package_name
        );
        for declaration in &unit.declarations {
            eprintln!("  - {} ({})", declaration.name, declaration.kind);
        }
    }

    let mut generator = Generator::new(config);
    generator
        .load_template_file(&cli.template)
        .context("loading template")?;

    // Nothing is written until every render has succeeded.
    let text = generator.generate_to_string(&unit).context("generating")?;

    match &cli.output {
        Some(path) => {
            std::fs::write(path, &text)
                .with_context(|| format!("writing output file {}", path.display()))?;
            if cli.verbose {
                eprintln!("Output written to {}", path.display());
            }
        }
        None => {
            let mut out = std::io::stdout().lock();
            out.write_all(text.as_bytes())
                .and_then(|()| out.flush())
                .context("writing output")?;
        }
    }
    Ok(())
}

/// Defaults, then the config file, then command-line overrides.
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = Config::new();
    if let Some(path) = &cli.config {
        config.load_file(path).context("loading config")?;
    }

    let options = &mut config.options;
    if cli.per_type {
        options.per_type = true;
    }
    if let Some(exported) = cli.exported {
        options.exported_only = exported;
    }
    if let Some(tag) = cli.tag.as_deref().filter(|t| !t.is_empty()) {
        options.tag_key = tag.to_string();
    }
    if let Some(types) = cli.types.as_deref().map(split_list).filter(|l| !l.is_empty()) {
        options.include_types = types.into_iter().collect();
    }
    if let Some(exclude) = cli.exclude.as_deref().map(split_list).filter(|l| !l.is_empty()) {
        options.exclude_types = exclude.into_iter().collect();
    }
    Ok(config)
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
