//! Command-line boundary: read input, run the pipeline, emit records.
//!
//! Fatal pipeline errors bubble up undecorated; the binary prints them
//! to stderr and exits non-zero. Diagnostics go through `tracing` on
//! stderr so stdout stays clean for the rendered output.

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ConvertConfig;
use crate::model::Task;
use crate::{export, ingest, merge, track};

/// Reconstruct connection intervals from Added/Removed connection logs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Input CSV file (reads stdin when omitted)
    pub input: Option<PathBuf>,

    /// Output file (writes stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Threshold in seconds for combining same-named intervals
    /// (0 disables combining; overrides the config file)
    #[arg(short = 'c', long)]
    pub combine_threshold: Option<i64>,

    /// Input is already task-shaped (Name,start_timestamp,end_timestamp
    /// or the legacy task_name layout); skip connection reconstruction
    #[arg(long)]
    pub tasks: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "csv")]
    pub format: OutputFormat,

    /// Enable verbose diagnostics
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum OutputFormat {
    Csv,
    Json,
}

/// Initialise the tracing / logging subsystem.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "conntrail=debug"
    } else {
        "conntrail=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

pub fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConvertConfig::load()?;
    config.validate()?;

    let threshold = cli
        .combine_threshold
        .unwrap_or_else(|| config.effective_threshold());
    if threshold < 0 {
        return Err("combine threshold must be >= 0".into());
    }

    let content = read_input(&cli.input)?;
    tracing::debug!(
        bytes = content.len(),
        lines = content.lines().count(),
        "read input"
    );

    let mut tasks: Vec<Task> = if cli.tasks {
        ingest::parse_tasks(&content)?
    } else {
        let events = ingest::parse_events(&content)?;
        let records = track::reconstruct(events);
        records.iter().map(Task::from_record).collect()
    };

    if threshold > 0 {
        tracing::debug!(threshold_secs = threshold, "combining tasks with equal names");
        tasks = merge::combine_tasks_by_name(tasks, threshold);
    }

    let rendered = match cli.format {
        OutputFormat::Csv => export::tasks_to_csv(&tasks),
        OutputFormat::Json => export::tasks_to_json(&tasks)?,
    };

    match &cli.output {
        Some(path) => {
            tracing::debug!(path = %path.display(), "writing output file");
            fs::write(path, rendered)?;
        }
        None => println!("{rendered}"),
    }

    Ok(())
}

fn read_input(input: &Option<PathBuf>) -> Result<String, Box<dyn std::error::Error>> {
    match input {
        Some(path) => {
            tracing::debug!(path = %path.display(), "reading input file");
            Ok(fs::read_to_string(path)?)
        }
        None => {
            tracing::debug!("reading input from stdin");
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}
