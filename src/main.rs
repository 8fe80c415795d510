//! Command-line interface for sdformat

#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand};

#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};
#[cfg(feature = "cli")]
use std::process::ExitCode;

#[cfg(feature = "cli")]
use sdformat::{Config, ElementTree, Loader, Schema, SchemaRegistry, ValidationError};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "sdf")]
#[command(author, version, about = "SDFormat validation and printing tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Args, Debug)]
struct SchemaOptions {
    /// Check against this format version instead of the declared one
    #[arg(long, value_name = "VERSION")]
    force_version: Option<String>,

    /// Extra directory of schema definitions (repeatable)
    #[arg(long, value_name = "DIR")]
    schema_path: Vec<PathBuf>,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a description document for validity
    Check {
        /// Path to the document
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        schema: SchemaOptions,

        /// Output the result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Print the rules of a format version
    Describe {
        #[command(flatten)]
        schema: SchemaOptions,
    },

    /// Print the canonical form of a valid document
    Print {
        /// Path to the document
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        schema: SchemaOptions,
    },
}

#[cfg(feature = "cli")]
fn main() -> ExitCode {
    use tracing_subscriber::EnvFilter;

    // Results go to stdout, diagnostics to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SDF_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { file, schema, json } => cmd_check(file, schema, json),
        Commands::Describe { schema } => cmd_describe(schema),
        Commands::Print { file, schema } => cmd_print(file, schema),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(feature = "cli")]
type CliResult = Result<ExitCode, Box<dyn std::error::Error>>;

/// Environment configuration with the command-line options applied on top
#[cfg(feature = "cli")]
fn load_config(options: SchemaOptions) -> sdformat::Result<Config> {
    let mut config = Config::from_env()?;
    for path in options.schema_path {
        config = config.with_schema_path(path);
    }
    if let Some(version) = options.force_version {
        config = config.with_forced_version(version);
    }
    Ok(config)
}

/// Load, parse and validate `file`; returns the tree, its errors and the version used
#[cfg(feature = "cli")]
fn load_and_validate(
    file: &Path,
    config: &Config,
    registry: &SchemaRegistry,
) -> sdformat::Result<(ElementTree, Vec<ValidationError>, String)> {
    let mut tree = Loader::new()
        .with_limits(config.limits.clone())
        .load_tree(file)?;
    let schema = registry.resolve(&tree, config.forced_version.as_deref())?;
    let version = schema.version().to_string();
    let errors = sdformat::validate(&mut tree, schema);
    Ok((tree, errors, version))
}

#[cfg(feature = "cli")]
fn report_errors(errors: &[ValidationError]) {
    for error in errors {
        eprintln!("{}", error);
    }
}

#[cfg(feature = "cli")]
fn cmd_check(file: PathBuf, options: SchemaOptions, json: bool) -> CliResult {
    let config = load_config(options)?;
    let registry = config.registry()?;
    let (_, errors, version) = load_and_validate(&file, &config, &registry)?;

    if json {
        let report = serde_json::json!({
            "file": file.display().to_string(),
            "version": version,
            "valid": errors.is_empty(),
            "errors": errors,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if errors.is_empty() {
        println!("Valid.");
    } else {
        report_errors(&errors);
    }

    Ok(if errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[cfg(feature = "cli")]
fn cmd_describe(options: SchemaOptions) -> CliResult {
    let config = load_config(options)?;
    let registry = config.registry()?;
    let schema: &Schema = match config.forced_version.as_deref() {
        Some(version) => registry.require(version)?,
        None => registry
            .latest()
            .ok_or_else(|| sdformat::Error::UnsupportedVersion("<none>".to_string()))?,
    };

    print!("{}", schema.describe());
    Ok(ExitCode::SUCCESS)
}

#[cfg(feature = "cli")]
fn cmd_print(file: PathBuf, options: SchemaOptions) -> CliResult {
    let config = load_config(options)?;
    let registry = config.registry()?;
    let (tree, errors, version) = load_and_validate(&file, &config, &registry)?;

    if !errors.is_empty() {
        report_errors(&errors);
        return Ok(ExitCode::FAILURE);
    }

    let schema = registry.require(&version)?;
    print!("{}", schema.render(&tree));
    Ok(ExitCode::SUCCESS)
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
