use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use oas_preprocess_core::{
    preprocess_loaded, DuplicateOptionPolicy, PreprocessError, PreprocessOptions, Preprocessed,
    SchemaDraft, SpecLoader,
};
use serde_json::{json, Map, Value};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "oas-preprocess")]
#[command(about = "Annotate OpenAPI schemas for request/response validator compilation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Preprocess an OpenAPI document (JSON or YAML)
    Preprocess {
        /// Input OpenAPI document
        input: PathBuf,

        /// Output request-side document (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output response-side document (implies --dedicated-response-doc)
        #[arg(long)]
        response_output: Option<PathBuf>,

        /// Process a separately loaded response-side document
        #[arg(long)]
        dedicated_response_doc: bool,

        /// What to do when two discriminator branches share an option name
        #[arg(long, value_enum, default_value_t = DuplicateArg::Warn)]
        duplicate_options: DuplicateArg,

        /// JSON Schema draft for compiled discriminator validators
        #[arg(long, value_enum, default_value_t = DraftArg::Auto)]
        draft: DraftArg,

        /// Maximum `$ref` hops followed at a root boundary
        #[arg(long, default_value_t = 32)]
        max_ref_hops: usize,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },

    /// List the discriminators found in a document and their compiled options
    Discriminators {
        /// Input OpenAPI document
        input: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum DuplicateArg {
    Warn,
    Reject,
}

impl From<DuplicateArg> for DuplicateOptionPolicy {
    fn from(val: DuplicateArg) -> Self {
        match val {
            DuplicateArg::Warn => DuplicateOptionPolicy::Warn,
            DuplicateArg::Reject => DuplicateOptionPolicy::Reject,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum DraftArg {
    Auto,
    #[value(name = "draft4")]
    Draft4,
    #[value(name = "draft202012")]
    Draft202012,
}

impl From<DraftArg> for SchemaDraft {
    fn from(val: DraftArg) -> Self {
        match val {
            DraftArg::Auto => SchemaDraft::Auto,
            DraftArg::Draft4 => SchemaDraft::Draft4,
            DraftArg::Draft202012 => SchemaDraft::Draft202012,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    Pretty,
    Compact,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for JSON
    let log_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = execute(cli.command) {
        // Machine-readable envelope first; anyhow's report follows.
        if let Some(cause) = err.downcast_ref::<PreprocessError>() {
            eprintln!("{}", cause.to_json());
        }
        return Err(err);
    }
    Ok(())
}

fn execute(command: Commands) -> Result<()> {
    match command {
        Commands::Preprocess {
            input,
            output,
            response_output,
            dedicated_response_doc,
            duplicate_options,
            draft,
            max_ref_hops,
            format,
        } => {
            let options = PreprocessOptions {
                use_dedicated_response_doc: dedicated_response_doc || response_output.is_some(),
                duplicate_options: duplicate_options.into(),
                draft: draft.into(),
                max_ref_hops,
            };
            let result = run(&input, &options)?;
            tracing::info!(
                visited = result.stats.visited,
                closed = result.stats.closed,
                unresolved = result.stats.unresolved,
                "preprocessed {}",
                input.display()
            );

            write_json(result.request.value(), output.as_deref(), format)?;
            if let Some(path) = response_output {
                write_json(
                    result.response_document().value(),
                    Some(path.as_path()),
                    format,
                )?;
            }
        }
        Commands::Discriminators { input, format } => {
            let result = run(&input, &PreprocessOptions::default())?;

            let mut listing = Map::new();
            for (path, descriptor) in result.request.discriminators() {
                let mut entry = descriptor.to_value();
                entry["compiled"] = json!(descriptor.compiled_options().collect::<Vec<_>>());
                listing.insert(path.to_pointer(), entry);
            }
            write_json(&Value::Object(listing), None, format)?;
        }
    }

    Ok(())
}

fn run(input: &Path, options: &PreprocessOptions) -> Result<Preprocessed> {
    let spec = SpecLoader::new(options)
        .load_path(input)
        .with_context(|| format!("Failed to load document: {}", input.display()))?;
    preprocess_loaded(spec, options)
        .map_err(|e| anyhow::Error::from(e).context("Preprocessing failed"))
}

fn write_json<T: serde::Serialize>(
    val: &T,
    path: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let mut writer: Box<dyn Write> = if let Some(p) = path {
        let file = File::create(p)
            .with_context(|| format!("Failed to create output file: {}", p.display()))?;
        Box::new(BufWriter::new(file))
    } else {
        Box::new(BufWriter::new(io::stdout()))
    };

    match format {
        OutputFormat::Pretty => {
            serde_json::to_writer_pretty(&mut writer, val).context("Failed to write JSON")?;
        }
        OutputFormat::Compact => {
            serde_json::to_writer(&mut writer, val).context("Failed to write JSON")?;
        }
    }

    // Ensure trailing newline
    writeln!(writer).context("Failed to write trailing newline")?;
    writer.flush().context("Failed to flush output")?;

    Ok(())
}
