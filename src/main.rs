mod agent;
mod cli;
mod detector;
mod error;
mod fmt;
mod models;
mod narrative;
mod parser;
#[cfg(feature = "pdf")]
mod pdf;
mod pipeline;
mod report;
mod risk;
mod settings;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sleuth={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Init {
            export_dir,
            delimiter,
            analyst,
            agent_command,
        } => cli::init::run(export_dir, delimiter, analyst, agent_command),
        Commands::Config => cli::init::show(),
        Commands::Detect { file, json } => cli::detect::run(&file, json),
        Commands::Analyze {
            file,
            export,
            format,
        } => cli::analyze::run(&file, export, format),
        Commands::Export {
            file,
            output,
            format,
        } => cli::export::run(&file, output, format),
        Commands::Demo { output } => cli::demo::run(output),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
