//! S3 mini test suite
//!
//! Runs the built-in test units against an S3-compatible endpoint for every
//! scenario of a scenario file and exits with the verdict's code.

use clap::Parser;
use commands::Commands;
use minitest::{cli, commands, common::logging};

#[derive(Parser)]
#[command(name = "minitest", about = "Mini test suite for S3-compatible object storage")]
#[command(version, long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    logging::init_cli(cli.verbose);

    match cli::dispatch(cli.command).await {
        Ok(code) => std::process::exit(code),
        Err(e) if e.is_fatal_configuration() => {
            eprintln!("{e}");
            std::process::exit(cli::EXIT_CONFIGURATION);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
