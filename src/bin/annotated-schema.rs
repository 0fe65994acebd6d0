//! Annotated Schema CLI
//!
//! Command-line interface for looking up schema annotations and validating
//! payloads with owner/priority context.

use std::path::PathBuf;
use std::process::ExitCode;

use annotated_schema::{
    instance_path_segments, load_fragments, load_schema, load_schema_auto, search, Schema,
    SchemaOptions, TreeBuilder, DEFAULT_OWNER_FIELD, DEFAULT_PRIORITY_FIELD,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "annotated-schema")]
#[command(about = "Look up JSON Schema annotations by document path")]
#[command(version)]
struct Cli {
    /// Enable verbose logging. Repeat for more (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the annotation closest to a document path
    Search {
        /// Schema source: file path or URL (http:// or https://)
        schema: String,

        /// Additional schema fragment addressable by its $id (repeatable)
        #[arg(long = "ref", value_name = "FILE")]
        refs: Vec<PathBuf>,

        /// Annotation field to look up (e.g. $example)
        #[arg(long, short)]
        field: String,

        /// Document path as a JSON Pointer (e.g. /items/0/name)
        #[arg(long, conflicts_with = "segments")]
        pointer: Option<String>,

        /// Document path segments (object keys and array indices)
        segments: Vec<String>,
    },

    /// Validate a payload and report problems with owner and priority
    Validate {
        /// Payload file to validate
        payload: PathBuf,

        /// Schema source: file path or URL (http:// or https://)
        #[arg(long)]
        schema: String,

        /// Additional schema fragment addressable by its $id (repeatable)
        #[arg(long = "ref", value_name = "FILE")]
        refs: Vec<PathBuf>,

        /// Annotation field naming the owner of a field
        #[arg(long, default_value = DEFAULT_OWNER_FIELD)]
        owner_field: String,

        /// Annotation field holding an integer priority
        #[arg(long, default_value = DEFAULT_PRIORITY_FIELD)]
        priority_field: String,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,

        /// Pretty-print JSON output
        #[arg(long, requires = "json")]
        pretty: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Search {
            schema,
            refs,
            field,
            pointer,
            segments,
        } => run_search(&schema, &refs, &field, pointer, segments),

        Commands::Validate {
            payload,
            schema,
            refs,
            owner_field,
            priority_field,
            json,
            pretty,
        } => run_validate(ValidateArgs {
            payload,
            schema,
            refs,
            options: SchemaOptions::new()
                .owner_field(owner_field)
                .priority_field(priority_field),
            json_output: json,
            pretty,
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run_search(
    schema_source: &str,
    refs: &[PathBuf],
    field: &str,
    pointer: Option<String>,
    segments: Vec<String>,
) -> Result<(), u8> {
    let schema = load_schema_auto(schema_source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;
    let fragments = load_fragments(refs).map_err(|e| {
        eprintln!("Error loading fragment: {}", e);
        e.exit_code() as u8
    })?;

    let tree = TreeBuilder::new(&fragments)
        .build(&schema, field)
        .map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;

    let path = match pointer {
        Some(pointer) => instance_path_segments(&pointer),
        None => segments,
    };

    match search(tree.as_ref(), &path) {
        Some(value) => {
            println!("{}", value);
            Ok(())
        }
        None => {
            eprintln!("No '{}' annotation applies to this path", field);
            Err(1)
        }
    }
}

struct ValidateArgs {
    payload: PathBuf,
    schema: String,
    refs: Vec<PathBuf>,
    options: SchemaOptions,
    json_output: bool,
    pretty: bool,
}

fn run_validate(args: ValidateArgs) -> Result<(), u8> {
    let ValidateArgs {
        payload: payload_path,
        schema: schema_source,
        refs,
        options,
        json_output,
        pretty,
    } = args;

    let payload = load_schema(&payload_path).map_err(|e| {
        report_error(json_output, &format!("loading payload: {}", e));
        e.exit_code() as u8
    })?;
    let root = load_schema_auto(&schema_source).map_err(|e| {
        report_error(json_output, &format!("loading schema: {}", e));
        e.exit_code() as u8
    })?;
    let fragments = load_fragments(&refs).map_err(|e| {
        report_error(json_output, &format!("loading fragment: {}", e));
        e.exit_code() as u8
    })?;

    let schema = Schema::with_options(&root, &fragments, &options).map_err(|e| {
        report_error(json_output, &e.to_string());
        e.exit_code() as u8
    })?;

    let result = schema.validate(&payload);
    let valid = result.is_valid();

    if json_output {
        let output = if pretty {
            serde_json::to_string_pretty(&result)
        } else {
            serde_json::to_string(&result)
        }
        .map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", output);
    } else if valid {
        println!("Valid");
    } else {
        let (label, problems) = if result.identity.matches {
            ("Validation failed", &result.schema.problems)
        } else {
            ("Identity check failed", &result.identity.problems)
        };
        eprintln!("{}:", label);
        for problem in problems {
            eprintln!("  {}", problem);
        }
    }

    if valid {
        Ok(())
    } else {
        Err(1)
    }
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", serde_json::json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}
