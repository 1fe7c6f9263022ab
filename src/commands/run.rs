//! Run command implementation.
//!
//! The run command:
//! 1. Loads the analysis configuration
//! 2. Builds the pipeline (fail fast, before any event is read)
//! 3. Writes per-stage selection snapshots for provenance
//! 4. Streams events through the pipeline
//! 5. Writes cutflows, yield tables, and the run summary

use crate::config::AnalysisConfig;
use crate::output::{
    cutflow_file_name, snapshot_file_name, table_file_name, write_cutflow, write_run_summary,
    write_selection_snapshot, write_table,
};
use crate::pipeline::Pipeline;
use crate::source::EventReader;
use crate::utils::config::RUN_SUMMARY_FILE;
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::PathBuf;
use std::time::Instant;

/// Arguments for the run command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct RunArgs {
    /// Path to the analysis configuration JSON
    pub config: PathBuf,

    /// Path to the JSON-lines events file
    pub events: PathBuf,

    /// Directory receiving all output files
    pub outdir: PathBuf,

    /// Maximum number of events to read (None = all)
    pub max_events: Option<u64>,

    /// Print a text summary to stdout at the end
    pub print_summary: bool,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            config: PathBuf::from("analysis.json"),
            events: PathBuf::from("events.jsonl"),
            outdir: PathBuf::from("tbl"),
            max_events: None,
            print_summary: false,
        }
    }
}

/// Validate run arguments
///
/// **Public** - can be called before execute_run for early validation
pub fn validate_args(args: &RunArgs) -> Result<()> {
    if !args.config.exists() {
        anyhow::bail!("configuration file not found: {}", args.config.display());
    }
    if !args.events.exists() {
        anyhow::bail!("events file not found: {}", args.events.display());
    }
    if args.outdir.as_os_str().is_empty() {
        anyhow::bail!("output directory cannot be empty");
    }
    if args.outdir.exists() && !args.outdir.is_dir() {
        anyhow::bail!("output path is not a directory: {}", args.outdir.display());
    }
    if args.max_events == Some(0) {
        anyhow::bail!("--max-events must be greater than 0");
    }
    Ok(())
}

/// Execute the run command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Configuration load/build failures
/// * Event-file open failures
/// * Output write failures
pub fn execute_run(args: RunArgs) -> Result<()> {
    let start_time = Instant::now();

    info!("Starting analysis run");
    info!("Configuration: {}", args.config.display());
    info!("Events: {}", args.events.display());

    // Step 1: Load configuration
    info!("Step 1/5: Loading configuration...");
    let config = AnalysisConfig::from_path(&args.config)
        .context("Failed to load analysis configuration")?;

    // Step 2: Build pipeline
    info!("Step 2/5: Building pipeline...");
    let mut pipeline = Pipeline::from_config(&config)
        .context("Failed to build pipeline from configuration")?;

    for (i, stage) in pipeline.stages().iter().enumerate() {
        debug!(
            "stage {} '{}': {} selection nodes, {} tables",
            i + 1,
            stage.name(),
            stage.tree().len(),
            stage.tables().len()
        );
    }

    // Step 3: Write provenance snapshots before any event flows, so even an
    // interrupted run leaves a record of what was being applied.
    info!("Step 3/5: Writing selection snapshots...");
    for (i, stage_cfg) in config.stages.iter().enumerate() {
        let path = args.outdir.join(snapshot_file_name(i + 1));
        write_selection_snapshot(&stage_cfg.selection, &path)
            .with_context(|| format!("Failed to write selection snapshot for stage {}", i + 1))?;
    }

    // Step 4: Stream events
    info!("Step 4/5: Processing events...");
    let reader = EventReader::open(&args.events).context("Failed to open events file")?;
    let stats = pipeline.run(reader, args.max_events);

    // Step 5: Write outputs
    info!("Step 5/5: Writing output files...");
    for (i, stage) in pipeline.stages().iter().enumerate() {
        let stage_no = i + 1;

        let cutflow_path = args.outdir.join(cutflow_file_name(stage_no));
        write_cutflow(&stage.tree().cutflow(), &cutflow_path)
            .with_context(|| format!("Failed to write cutflow for stage {}", stage_no))?;
        info!("✓ Cutflow written to: {}", cutflow_path.display());

        for table in stage.tables() {
            let table_path = args.outdir.join(table_file_name(stage_no, table.name()));
            write_table(table, &table_path)
                .with_context(|| format!("Failed to write table '{}'", table.name()))?;
            info!("✓ Table written to: {}", table_path.display());
        }
    }

    let summary = pipeline.summary(&stats);
    let summary_path = args.outdir.join(RUN_SUMMARY_FILE);
    write_run_summary(&summary, &summary_path).context("Failed to write run summary")?;
    info!("✓ Run summary written to: {}", summary_path.display());

    if args.print_summary {
        println!("\n{}", "=".repeat(80));
        println!("RUN SUMMARY");
        println!("{}", "=".repeat(80));
        println!("Events read:      {}", stats.events_read);
        println!("Events failed:    {}", stats.events_failed);
        println!("Events surviving: {}", stats.events_surviving);
        for stage in &summary.stages {
            println!(
                "\nStage '{}': pass {} / total {}",
                stage.name, stage.selection_pass, stage.selection_total
            );
            for table in &stage.tables {
                println!("  table {} -> {} keys", table.name, table.distinct_keys);
            }
        }
        println!("{}", "=".repeat(80));
    }

    let elapsed = start_time.elapsed();
    info!("Run completed in {:.2}s", elapsed.as_secs_f64());

    Ok(())
}
