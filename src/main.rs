//! Event Tally CLI
//!
//! Filters a stream of event records through nested boolean selections and
//! summarizes the survivors into binned yield tables and cutflow files.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use event_tally::commands::{execute_run, validate_args, RunArgs};
use event_tally::config::AnalysisConfig;
use event_tally::pipeline::Pipeline;
use event_tally::utils::config::SCHEMA_VERSION;

/// Event Tally - cutflow selection and binned yield tables
#[derive(Parser, Debug)]
#[command(name = "event-tally")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the analysis pipeline over an event file
    Run {
        /// Path to the analysis configuration JSON
        #[arg(short, long)]
        config: PathBuf,

        /// Path to the JSON-lines events file
        #[arg(short, long)]
        events: PathBuf,

        /// Output directory for tables and reports
        #[arg(short, long, default_value = "tbl")]
        outdir: PathBuf,

        /// Maximum number of events to process
        #[arg(short = 'n', long)]
        max_events: Option<u64>,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Validate an analysis configuration without processing events
    Validate {
        /// Path to the analysis configuration JSON
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Display configuration schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Run {
            config,
            events,
            outdir,
            max_events,
            summary,
        } => {
            let args = RunArgs {
                config,
                events,
                outdir,
                max_events,
                print_summary: summary,
            };

            // Validate args first
            validate_args(&args)?;

            // Execute run
            execute_run(args)?;
        }

        Commands::Validate { config } => {
            validate_config_file(config)?;
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}

/// Validate an analysis configuration file
///
/// **Private** - internal command implementation
fn validate_config_file(config_path: PathBuf) -> Result<()> {
    println!("Validating configuration: {}", config_path.display());

    let config = AnalysisConfig::from_path(&config_path)?;
    let pipeline = Pipeline::from_config(&config)?;

    println!("✓ Valid analysis configuration");
    println!("  Derivations: {}", config.derive.len());
    println!("  Stages: {}", pipeline.stages().len());
    for (i, stage) in pipeline.stages().iter().enumerate() {
        println!(
            "  Stage {} '{}': {} selection nodes, {} tables",
            i + 1,
            stage.name(),
            stage.tree().len(),
            stage.tables().len()
        );
        for table in stage.tables() {
            println!("    table {} ({} columns)", table.name(), table.columns().len());
        }
    }

    Ok(())
}

/// Display schema information
///
/// **Private** - internal command implementation
fn display_schema(show_details: bool) {
    println!("Event Tally Configuration Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Schema Structure:");
        println!("  derive: array?            - Derived attributes computed per event");
        println!("    out: string             - Name of the attribute to attach");
        println!("    ratio: [string, string] - Numerator and denominator references");
        println!("  stages: array             - Pipeline stages, applied in order");
        println!("    name: string            - Stage label");
        println!("    selection: node         - Nested selection literal:");
        println!("      \"ev : <expr>\"         - A cut (comparison chain over ev.<attr>)");
        println!("      {{\"All\": [...]}}        - Every child must pass (empty: passes)");
        println!("      {{\"Any\": [...]}}        - Some child must pass (empty: fails)");
        println!("      {{\"Not\": node}}         - Negates its child");
        println!("    tables: array?          - Yield tables filled from survivors");
        println!("      attrs: [string]       - Attribute references (`name` or `name[i]`)");
        println!("      columns: [string]     - Output column names, one per attribute");
        println!("      binnings: [binning]   - One of:");
        println!("        \"identity\"          - Value unchanged");
        println!("        {{\"round\": {{width, max}}}}     - Linear floor bins, clipped at max");
        println!("        {{\"round_log\": {{width, max}}}} - Geometric bins (log10 space)");
        println!("        {{\"combine\": {{pieces}}}}       - Splice binnings over value ranges");
        println!("      weight: string?       - Optional weight attribute (default 1)");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
///
/// **Private** - internal command implementation
fn display_version() {
    println!("Event Tally v{}", env!("CARGO_PKG_VERSION"));
    println!("Configuration Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Cutflow selection and binned yield tables for batch event analysis.");
}
