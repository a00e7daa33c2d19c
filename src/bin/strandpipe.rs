//! CLI front-end: parses `<queue_capacity> <stage_name>...`, assembles a
//! pipeline from the registry, feeds standard input to it, and waits for
//! orderly shutdown.

use std::io::{self, BufRead};
use std::process::ExitCode;

use clap::Parser;

use strandpipe::{Pipeline, REGISTERED_NAMES};

/// A bounded, condition-variable-based string-processing pipeline.
#[derive(Parser, Debug)]
#[command(
    name = "strandpipe",
    about = "Chains registered string transforms into a pipeline fed from stdin",
    after_help = registered_names_help()
)]
struct Cli {
    /// Maximum number of items buffered in each stage's inbox. Must be a
    /// positive decimal integer with no leading zero.
    queue_capacity: String,

    /// One or more registered transform names, in pipeline order.
    #[arg(required = true, num_args = 1..)]
    stage_names: Vec<String>,
}

fn registered_names_help() -> String {
    format!("Available transforms:\n  {}", REGISTERED_NAMES.join(", "))
}

fn parse_capacity(raw: &str) -> Option<usize> {
    if raw.is_empty() || raw == "0" {
        return None;
    }
    let mut chars = raw.chars();
    let first = chars.next()?;
    if !('1'..='9').contains(&first) {
        return None;
    }
    if !chars.clone().all(|c| c.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            use clap::error::ErrorKind;
            if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                e.exit();
            }
            eprintln!("Invalid input.");
            print_usage();
            return ExitCode::from(1);
        }
    };

    let Some(capacity) = parse_capacity(&cli.queue_capacity) else {
        eprintln!("Invalid input.");
        print_usage();
        return ExitCode::from(1);
    };

    let stage_specs: Vec<(&str, &str)> = cli
        .stage_names
        .iter()
        .map(|name| (name.as_str(), name.as_str()))
        .collect();

    let pipeline = match Pipeline::build(&stage_specs, capacity) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            eprintln!("Invalid input.");
            print_usage();
            tracing::error!("{e}");
            return ExitCode::from(1);
        }
    };

    let stdin = io::stdin();
    if let Err(e) = pipeline.feed(stdin.lock()) {
        tracing::error!("[ERROR][feeder] {e}");
        return ExitCode::from(1);
    }

    if let Err(e) = pipeline.await_completion() {
        tracing::error!("{e}");
        return ExitCode::from(1);
    }

    if let Err(e) = pipeline.finalize() {
        tracing::error!("{e}");
        return ExitCode::from(1);
    }

    println!("Pipeline shutdown complete");
    ExitCode::from(0)
}

fn print_usage() {
    println!("Usage: strandpipe <queue_capacity> <stage_name> [<stage_name> ...]\n");
    println!("Arguments:");
    println!("  queue_capacity   Maximum number of items in each stage's queue");
    println!("  stage_name       Names of transforms to chain (without instance suffix)\n");
    println!("{}", registered_names_help());
    println!("\nExample:\n  strandpipe 20 uppercase rotate-right-1 identity-log");
}
