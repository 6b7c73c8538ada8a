//! MirrorSync CLI
//!
//! Command-line tools for inspecting encoded sync messages.
//!
//! # Commands
//!
//! - `dump` - Print a message as an indented tree or as JSON
//! - `verify` - Check that a file holds one canonical message
//! - `encode` - Turn a JSON document into a canonical message

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// MirrorSync message tools.
#[derive(Parser)]
#[command(name = "mirrorsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a message
    Dump {
        /// Encoded message file
        file: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Only print these roots
        #[arg(short, long)]
        root: Vec<String>,
    },

    /// Check that a file holds one canonical message
    Verify {
        /// Encoded message file
        file: PathBuf,

        /// Largest accepted message in bytes
        #[arg(long, default_value_t = mirrorsync_core::DEFAULT_MAX_MESSAGE_SIZE)]
        max_size: usize,
    },

    /// Encode a JSON document as a canonical message
    Encode {
        /// JSON input file
        input: PathBuf,

        /// Output file
        output: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Dump { file, format, root } => {
            commands::dump::run(&file, &format, &root)?;
        }
        Commands::Verify { file, max_size } => {
            commands::verify::run(&file, max_size)?;
        }
        Commands::Encode { input, output } => {
            commands::encode::run(&input, &output)?;
        }
        Commands::Version => {
            println!("MirrorSync CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("MirrorSync Core v{}", mirrorsync_core::VERSION);
        }
    }

    Ok(())
}
