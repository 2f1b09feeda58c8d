use clap::{Parser, Subcommand};
use miette::{miette, Result};
use std::path::PathBuf;

use throw_trace_rs::cli;

#[derive(Parser)]
#[command(name = "throw-trace-rs")]
#[command(about = "Exception-propagation analyzer for parsed program snapshots")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze every function in a snapshot and report escaping exceptions
    Report {
        /// Input program snapshot (JSON)
        input: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Qualified exception type name to ignore (repeatable)
        #[arg(long = "ignore", value_name = "NAME")]
        ignore: Vec<String>,

        /// Keep allocation-failure exceptions in the results
        #[arg(long)]
        keep_alloc_failure: bool,
    },

    /// Export the call graph annotated with throw states as DOT
    Graph {
        /// Input program snapshot (JSON)
        input: PathBuf,

        /// Output DOT file (defaults to stdout)
        #[arg(short, long)]
        dot: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            input,
            format,
            ignore,
            keep_alloc_failure,
        } => {
            let args = cli::report::ReportArgs {
                input,
                format,
                ignore,
                keep_alloc_failure,
            };
            cli::report::report(&args).map_err(|e| miette!("{}", e))
        }
        Commands::Graph { input, dot } => {
            cli::graph::graph(&input, dot.as_deref()).map_err(|e| miette!("{}", e))
        }
    }
}
