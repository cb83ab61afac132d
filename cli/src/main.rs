use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use schema_dto_core::{Pointer, Value};
use schema_dto_registry::{SchemaRegistry, read_schema_file};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

/// Output encodings for hydrated data and resolved schema nodes.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "schema-dto")]
#[command(about = "Hydrate and check data against schema-driven DTOs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Hydrate data through a schema and print the typed result.
    Hydrate(HydrateArgs),
    /// Check that one or more data files hydrate without errors.
    Validate(ValidateArgs),
    /// Follow `$ref` chains and print the concrete schema node.
    Resolve(ResolveArgs),
    /// Check schema documents for broken references and impossible types.
    Lint(LintArgs),
}

/// Where the schema comes from: a single file, or a registry config plus a name.
#[derive(Debug, Args)]
struct SchemaArgs {
    /// Schema file (JSON or YAML).
    #[arg(long, conflicts_with = "registry", required_unless_present = "registry")]
    schema: Option<PathBuf>,
    /// Registry configuration file (YAML).
    #[arg(long)]
    registry: Option<PathBuf>,
    /// Schema name within the registry.
    #[arg(long, requires = "registry")]
    name: Option<String>,
}

#[derive(Debug, Args)]
struct HydrateArgs {
    #[command(flatten)]
    schema: SchemaArgs,
    /// Data file (JSON or YAML). Reads stdin when omitted.
    #[arg(long)]
    input: Option<PathBuf>,
    /// Output format.
    #[arg(long, value_enum, default_value = "json")]
    format: CliOutputFormat,
    /// Pretty-print JSON output.
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    #[command(flatten)]
    schema: SchemaArgs,
    /// Data files (JSON or YAML). Reads stdin when none are given.
    inputs: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct ResolveArgs {
    #[command(flatten)]
    schema: SchemaArgs,
    /// Reference to resolve, e.g. `#/definitions/person`. Defaults to the root.
    #[arg(long)]
    pointer: Option<String>,
    /// Output format.
    #[arg(long, value_enum, default_value = "json")]
    format: CliOutputFormat,
    /// Pretty-print JSON output.
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Args)]
struct LintArgs {
    #[command(flatten)]
    schema: SchemaArgs,
}

fn main() {
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    debug!(command = ?cli.command, "Dispatching command");

    let result = match cli.command {
        Command::Hydrate(args) => run_hydrate(args),
        Command::Validate(args) => run_validate(args),
        Command::Resolve(args) => run_resolve(args),
        Command::Lint(args) => run_lint(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run_hydrate(args: HydrateArgs) -> Result<(), String> {
    let (registry, name) = load_named_schema(&args.schema)?;
    let data = read_data(args.input.as_deref())?;
    let dto = registry
        .instantiate(&name, data)
        .map_err(|err| format!("Failed to hydrate '{name}': {err}"))?;
    emit(&dto.to_json(), args.format, args.pretty)
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let (registry, name) = load_named_schema(&args.schema)?;

    if args.inputs.is_empty() {
        let data = read_data(None)?;
        registry
            .instantiate(&name, data)
            .map_err(|err| format!("<stdin>: {err}"))?;
        println!("Validated 1 document against '{name}'.");
        return Ok(());
    }

    let mut failures = 0usize;
    for input in &args.inputs {
        let outcome = read_data(Some(input.as_path())).and_then(|data| {
            registry
                .instantiate(&name, data)
                .map(|_| ())
                .map_err(|err| err.to_string())
        });
        match outcome {
            Ok(()) => println!("ok: {}", input.display()),
            Err(err) => {
                failures += 1;
                println!("FAILED: {}: {err}", input.display());
            }
        }
    }

    if failures > 0 {
        return Err(format!(
            "{failures} of {} document(s) failed validation against '{name}'",
            args.inputs.len()
        ));
    }
    println!(
        "Validated {} document(s) against '{name}'.",
        args.inputs.len()
    );
    Ok(())
}

fn run_resolve(args: ResolveArgs) -> Result<(), String> {
    let (registry, name) = load_named_schema(&args.schema)?;
    let document = registry
        .get(&name)
        .ok_or_else(|| format!("schema not found: {name}"))?;
    let resolver = registry.engine().resolver(document);

    let start = match &args.pointer {
        Some(reference) => {
            let pointer = Pointer::parse(reference).map_err(|err| err.to_string())?;
            resolver.lookup(&pointer).map_err(|err| err.to_string())?
        }
        None => document.root().clone(),
    };
    let node = resolver.resolve(&start).map_err(|err| err.to_string())?;

    let json = serde_json::to_value(&*node)
        .map_err(|err| format!("Failed to serialize schema node: {err}"))?;
    emit(&json, args.format, args.pretty)
}

fn run_lint(args: LintArgs) -> Result<(), String> {
    let registry = load_registry(&args.schema)?;
    let issues: Vec<_> = match &args.schema.name {
        Some(name) => {
            if !registry.contains(name) {
                return Err(format!("schema not found: {name}"));
            }
            registry
                .lint()
                .into_iter()
                .filter(|(schema, _)| schema == name)
                .collect()
        }
        None => registry.lint(),
    };

    for (schema, issue) in &issues {
        println!("{schema}: {issue}");
    }
    if !issues.is_empty() {
        return Err(format!("{} schema issue(s) found", issues.len()));
    }

    let checked = if args.schema.name.is_some() { 1 } else { registry.len() };
    println!("No issues found in {checked} schema(s).");
    Ok(())
}

/// Loads the registry the arguments describe. A single schema file becomes
/// a one-entry registry named after its `id` or file stem.
fn load_registry(args: &SchemaArgs) -> Result<SchemaRegistry, String> {
    match (&args.schema, &args.registry) {
        (Some(path), _) => {
            let document = read_schema_file(path)
                .map_err(|err| format!("Failed to load schema '{}': {err}", path.display()))?;
            let name = document
                .id()
                .map(str::to_string)
                .unwrap_or_else(|| file_stem(path));
            let mut registry = SchemaRegistry::new();
            registry.insert(name, document);
            Ok(registry)
        }
        (None, Some(config)) => SchemaRegistry::from_config_file(config)
            .map_err(|err| format!("Failed to load registry '{}': {err}", config.display())),
        (None, None) => Err("either --schema or --registry is required".to_string()),
    }
}

fn load_named_schema(args: &SchemaArgs) -> Result<(SchemaRegistry, String), String> {
    let registry = load_registry(args)?;
    let name = match (&args.name, args.schema.is_some()) {
        (Some(name), _) => name.clone(),
        (None, true) => registry
            .names()
            .next()
            .map(str::to_string)
            .ok_or_else(|| "schema file produced no schema".to_string())?,
        (None, false) => return Err("--name is required with --registry".to_string()),
    };
    if !registry.contains(&name) {
        return Err(format!("schema not found: {name}"));
    }
    Ok((registry, name))
}

/// Reads JSON or YAML data from `path`, or from stdin when `None`.
fn read_data(path: Option<&Path>) -> Result<Value, String> {
    let (text, yaml) = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?;
            let yaml = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("yaml" | "yml")
            );
            (text, yaml)
        }
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|err| format!("Failed to read stdin: {err}"))?;
            (text, false)
        }
    };

    let json: serde_json::Value = if yaml {
        serde_yaml::from_str(&text).map_err(|err| format!("Invalid YAML data: {err}"))?
    } else {
        match serde_json::from_str(&text) {
            Ok(json) => json,
            Err(json_err) if path.is_none() => serde_yaml::from_str(&text)
                .map_err(|_| format!("Invalid JSON data on stdin: {json_err}"))?,
            Err(err) => return Err(format!("Invalid JSON data: {err}")),
        }
    };
    Ok(Value::from(json))
}

fn emit(value: &serde_json::Value, format: CliOutputFormat, pretty: bool) -> Result<(), String> {
    let rendered = match format {
        CliOutputFormat::Json if pretty => serde_json::to_string_pretty(value)
            .map_err(|err| format!("Failed to serialize JSON: {err}"))?,
        CliOutputFormat::Json => serde_json::to_string(value)
            .map_err(|err| format!("Failed to serialize JSON: {err}"))?,
        CliOutputFormat::Yaml => serde_yaml::to_string(value)
            .map_err(|err| format!("Failed to serialize YAML: {err}"))?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
