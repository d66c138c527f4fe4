use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use docshape_core::{SchemaType, ValidationError, Value};
use docshape_mapper::{ParseResult, parse};
use docshape_registry::{RegistrySource, ReportFormat, SchemaRegistry, ValidatorConfig};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// CLI-specific report format with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

impl From<CliOutputFormat> for ReportFormat {
    fn from(fmt: CliOutputFormat) -> Self {
        match fmt {
            CliOutputFormat::Json => Self::Json,
            CliOutputFormat::Yaml => Self::Yaml,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "docshape", version)]
#[command(about = "Schema-driven structural validation of JSON and XML documents")]
struct Cli {
    /// Raise log verbosity (-v, -vv, -vvv). RUST_LOG applies when not given.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile schema definition files and list the schemas they declare.
    Check(CheckArgs),
    /// Validate documents against a named schema.
    Validate(ValidateArgs),
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Definition files and/or directories containing definition files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Name of the schema each document must satisfy.
    #[arg(long)]
    schema: String,
    /// Definition files or directories (repeatable; adds to the config file's list).
    #[arg(long = "schemas", value_delimiter = ',')]
    schemas: Vec<PathBuf>,
    /// Path to a validator configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Report format (default: from config, else json).
    #[arg(long)]
    format: Option<CliOutputFormat>,
    /// Reject documents larger than this many bytes.
    #[arg(long)]
    max_bytes: Option<usize>,
    /// Number of parallel validation jobs (default: number of CPUs).
    #[arg(long)]
    jobs: Option<usize>,
    /// Omit the parsed value from reports.
    #[arg(long)]
    no_value: bool,
    /// Documents to validate; stdin when none are given.
    inputs: Vec<PathBuf>,
}

/// Outcome of validating one input.
#[derive(Debug, Serialize)]
struct Report {
    input: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    errors: Vec<ValidationError>,
}

impl Report {
    fn new(input: String, result: ParseResult, include_value: bool) -> Self {
        Self {
            input,
            valid: result.is_valid(),
            value: include_value.then_some(result.value),
            errors: result.errors,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Check(args) => run_check(args),
        Command::Validate(args) => run_validate(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_check(args: CheckArgs) -> Result<(), String> {
    let registry = build_registry(&args.inputs)?;
    for name in registry.names() {
        println!("{name}");
    }
    println!(
        "Compiled {} schema(s) from {} source(s).",
        registry.len(),
        args.inputs.len()
    );
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    use rayon::prelude::*;

    let config = match &args.config {
        Some(path) => ValidatorConfig::load(path)
            .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?,
        None => ValidatorConfig::default(),
    };

    let mut sources = config.schemas.clone();
    sources.extend(args.schemas.iter().cloned());
    if sources.is_empty() {
        return Err("no schema definitions given (use --schemas or a config file)".into());
    }
    let registry = build_registry(&sources)?;
    let schema = registry
        .get(&args.schema)
        .ok_or_else(|| {
            format!(
                "unknown schema '{}' (available: {})",
                args.schema,
                registry.names().join(", ")
            )
        })?
        .clone();

    let max_bytes = args.max_bytes.unwrap_or(config.limits.max_document_bytes);
    let include_value = !args.no_value && config.output.include_value;
    let format = args
        .format
        .map(ReportFormat::from)
        .unwrap_or(config.output.format);
    let jobs = args.jobs.unwrap_or(config.jobs);

    let reports: Vec<Report> = if args.inputs.is_empty() {
        vec![validate_reader(
            &schema,
            "-".to_string(),
            io::stdin().lock(),
            max_bytes,
            include_value,
        )]
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .map_err(|e| format!("Failed to create thread pool: {e}"))?;
        pool.install(|| {
            args.inputs
                .par_iter()
                .map(|input| validate_file(&schema, input, max_bytes, include_value))
                .collect()
        })
    };

    print_reports(&reports, format)?;

    let invalid = reports.iter().filter(|r| !r.valid).count();
    info!(documents = reports.len(), invalid, "Validation finished");
    if invalid > 0 {
        return Err(format!(
            "{invalid} of {} document(s) failed validation",
            reports.len()
        ));
    }
    Ok(())
}

fn build_registry(paths: &[PathBuf]) -> Result<SchemaRegistry, String> {
    paths
        .iter()
        .fold(SchemaRegistry::builder(), |builder, path| {
            builder.with_source(RegistrySource::detect(path))
        })
        .build()
        .map_err(|err| format!("Failed to load schema definitions: {err}"))
}

fn validate_file(
    schema: &SchemaType,
    input: &Path,
    max_bytes: usize,
    include_value: bool,
) -> Report {
    let name = input.display().to_string();
    match fs::File::open(input) {
        Ok(file) => validate_reader(schema, name, file, max_bytes, include_value),
        Err(err) => unreadable(schema, name, &err),
    }
}

fn validate_reader(
    schema: &SchemaType,
    input: String,
    reader: impl Read,
    max_bytes: usize,
    include_value: bool,
) -> Report {
    match read_bounded(reader, max_bytes) {
        Ok(Some(text)) => {
            debug!(input = %input, bytes = text.len(), "Validating document");
            let result = parse(schema, &text);
            Report::new(input, result, include_value)
        }
        Ok(None) => {
            debug!(input = %input, max_bytes, "Document over size limit");
            Report::new(
                input,
                ParseResult::rejected(
                    schema.format(),
                    format!("document exceeds the limit of {max_bytes} bytes"),
                ),
                false,
            )
        }
        Err(err) => unreadable(schema, input, &err),
    }
}

fn unreadable(schema: &SchemaType, input: String, err: &io::Error) -> Report {
    Report::new(
        input,
        ParseResult::rejected(schema.format(), format!("cannot read input: {err}")),
        false,
    )
}

/// Reads UTF-8 text of at most `max_bytes`. `None` when the input is
/// longer; nothing past the limit is read.
fn read_bounded(reader: impl Read, max_bytes: usize) -> io::Result<Option<String>> {
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX).saturating_add(1);
    let mut bytes = Vec::new();
    reader.take(limit).read_to_end(&mut bytes)?;
    if bytes.len() > max_bytes {
        return Ok(None);
    }
    String::from_utf8(bytes)
        .map(Some)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

fn print_reports(reports: &[Report], format: ReportFormat) -> Result<(), String> {
    let raw = match format {
        ReportFormat::Json => serde_json::to_string_pretty(reports)
            .map_err(|err| format!("Failed to serialize reports: {err}"))?,
        ReportFormat::Yaml => serde_yaml::to_string(reports)
            .map_err(|err| format!("Failed to serialize reports: {err}"))?,
    };
    println!("{raw}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_bounded_stops_past_the_limit() {
        assert_eq!(read_bounded(&b"12345678"[..], 8).unwrap().as_deref(), Some("12345678"));
        assert_eq!(read_bounded(&b"123456789"[..], 8).unwrap(), None);
        assert_eq!(read_bounded(io::repeat(b'x'), 16).unwrap(), None);
        assert_eq!(read_bounded(&b""[..], 0).unwrap().as_deref(), Some(""));
    }

    #[test]
    fn test_read_bounded_rejects_invalid_utf8() {
        let err = read_bounded(&[0xff, 0xfe][..], 8).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
