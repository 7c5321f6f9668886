//! Command-line interface for xmlschema-inventory

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand, ValueEnum};

#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
use serde::Serialize;
#[cfg(feature = "cli")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "cli")]
use xmlschema_inventory::publish::{JupyterConverter, PublishConfig, Publisher};
#[cfg(feature = "cli")]
use xmlschema_inventory::{enumerate_with, EnumerateOptions, Inventory, OverlayReport, SchemaDocument};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "xmlschema-inventory")]
#[command(author, version, about = "Element inventory of an XML Schema", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify every element declared by an XSD schema
    Analyse {
        /// Path to the XSD schema file
        #[arg(value_name = "SCHEMA")]
        schema: PathBuf,

        /// A second schema whose classifications take precedence
        #[arg(long = "override", value_name = "SCHEMA")]
        override_schema: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Tsv)]
        format: Format,

        /// Order entries by qualified name instead of declaration order
        #[arg(long)]
        sort: bool,

        /// Also list abstract element declarations
        #[arg(long)]
        include_abstract: bool,

        /// Only list elements reachable from global element declarations
        #[arg(long)]
        reachable_only: bool,
    },

    /// Convert a directory of notebooks into a static HTML tree
    Publish {
        /// Directory containing the notebooks
        #[arg(value_name = "INPUT_DIR")]
        input: PathBuf,

        /// Directory receiving the HTML pages
        #[arg(value_name = "OUTPUT_DIR")]
        output: PathBuf,

        /// Remove the output directory first
        #[arg(long)]
        clean: bool,

        /// The jupyter executable
        #[arg(long, default_value = "jupyter")]
        jupyter: PathBuf,
    },
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Tsv,
    Json,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct AnalyseOutput<'a> {
    #[serde(flatten)]
    inventory: &'a Inventory,
    #[serde(skip_serializing_if = "Option::is_none")]
    overlay: Option<&'a OverlayReport>,
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();

    let fallback = match cli.verbose {
        0 => "warn",
        1 => "xmlschema_inventory=debug",
        _ => "xmlschema_inventory=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Analyse {
            schema,
            override_schema,
            format,
            sort,
            include_abstract,
            reachable_only,
        } => {
            let options = EnumerateOptions::new()
                .with_abstract(include_abstract)
                .with_unreferenced(!reachable_only);
            cmd_analyse(&schema, override_schema.as_deref(), format, sort, &options)
        }
        Commands::Publish {
            input,
            output,
            clean,
            jupyter,
        } => cmd_publish(&input, &output, clean, jupyter),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn load(path: &Path, options: &EnumerateOptions) -> xmlschema_inventory::Result<Inventory> {
    let schema = SchemaDocument::from_file(path)?;
    enumerate_with(&schema, options)
}

#[cfg(feature = "cli")]
fn cmd_analyse(
    schema_path: &Path,
    override_path: Option<&Path>,
    format: Format,
    sort: bool,
    options: &EnumerateOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut inventory = load(schema_path, options)?;

    let overlay = match override_path {
        Some(path) => {
            let overriding = load(path, options)?;
            Some(inventory.overlay(&overriding))
        }
        None => None,
    };

    if sort {
        inventory = inventory.sorted();
    }

    match format {
        Format::Tsv => {
            print!("{}", inventory.to_tsv());
            for warning in inventory.warnings() {
                eprintln!("warning: {}", warning);
            }
            eprintln!("{} elements defined", inventory.len());
            if let Some(report) = &overlay {
                for transition in &report.overrides {
                    eprintln!("override {}", transition);
                }
                eprintln!("{} identical overrides", report.identical);
                eprintln!("{} changing overrides", report.overrides.len());
                eprintln!("{} added elements", report.added);
            }
        }
        Format::Json => {
            let output = AnalyseOutput {
                inventory: &inventory,
                overlay: overlay.as_ref(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_publish(
    input: &Path,
    output: &Path,
    clean: bool,
    jupyter: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let publisher = Publisher::new(JupyterConverter::new().with_program(jupyter))
        .with_config(PublishConfig::new().with_clean_output(clean));
    let report = publisher.publish(input, output)?;

    println!(
        "Published {} notebook(s), copied {} file(s), rewrote {} link(s)",
        report.converted, report.copied, report.rewritten_links
    );
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
