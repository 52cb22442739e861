pub mod analyze;
pub mod demo;
pub mod detect;
pub mod export;
pub mod init;

use std::path::Path;

use clap::{Parser, Subcommand, ValueEnum};

use crate::agent;
use crate::error::Result;
use crate::pipeline::{self, PipelineContext};
use crate::settings::Settings;

#[derive(Parser)]
#[command(name = "sleuth", about = "Flag unusual transactions and report on batch risk.")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Text,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Pdf => "pdf",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write settings and create the export directory.
    Init {
        /// Directory for exported reports (default: ~/Documents/sleuth/exports)
        #[arg(long = "export-dir")]
        export_dir: Option<String>,
        /// Field delimiter, a single character or `tab`
        #[arg(long)]
        delimiter: Option<String>,
        /// Name printed on exported reports
        #[arg(long)]
        analyst: Option<String>,
        /// External narrative agent command; pass an empty string to go offline
        #[arg(long = "agent-command")]
        agent_command: Option<String>,
    },
    /// Show the effective settings.
    Config,
    /// Parse a transaction file and list detected anomalies.
    Detect {
        /// Path to the delimited transaction file
        file: String,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Run the full analysis and print the report.
    Analyze {
        /// Path to the delimited transaction file
        file: String,
        /// Also export the report to this path
        #[arg(long)]
        export: Option<String>,
        /// Export format
        #[arg(long, value_enum, default_value = "text")]
        format: ExportFormat,
    },
    /// Run the full analysis and export the report.
    Export {
        /// Path to the delimited transaction file
        file: String,
        /// Output file path (default: <export_dir>/anomaly-report-<date>.<ext>)
        #[arg(long)]
        output: Option<String>,
        /// Export format
        #[arg(long, value_enum, default_value = "text")]
        format: ExportFormat,
    },
    /// Write a sample transaction batch to explore sleuth.
    Demo {
        /// Output path (default: ./sample-transactions.csv)
        #[arg(long)]
        output: Option<String>,
    },
}

/// Run the whole pipeline for one file with the configured agent.
pub(crate) fn analyze_file(file: &str, settings: &Settings) -> Result<PipelineContext> {
    let delimiter = settings.delimiter_byte()?;
    let agent = agent::build(settings)?;
    let mut ctx = PipelineContext::new();
    ctx.select_file(Path::new(file));
    pipeline::run(&mut ctx, agent.as_ref(), delimiter)?;
    Ok(ctx)
}
