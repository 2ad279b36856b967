// Copyright 2026 Bingrab Contributors
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use bingrab::cli;
use bingrab::config::Config;
use bingrab::retry::RetryPolicy;

#[derive(Parser)]
#[command(
    name = "bingrab",
    about = "Bulk-save image search results into a dated ZIP archive",
    version,
    after_help = "Run 'bingrab <command> --help' for details on each command."
)]
struct Cli {
    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Suppress per-item progress output
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve, download, and archive every image in the clipboard export
    Run {
        /// Clipboard export listing result-page URLs
        #[arg(long, default_value = "images_clipboard.txt")]
        input: PathBuf,
        /// Directory for downloaded images and the archive
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
        /// Maximum simultaneous downloads
        #[arg(long, default_value_t = 4)]
        concurrency: usize,
        /// Seconds to wait for the image element on each page
        #[arg(long, default_value_t = 20)]
        wait_timeout: u64,
        /// Per-download timeout in seconds
        #[arg(long, default_value_t = 30)]
        download_timeout: u64,
        /// Attempts per page before giving up on it
        #[arg(long, default_value_t = 3)]
        max_attempts: u32,
        /// Remove loose image files after the archive is written
        #[arg(long)]
        clean: bool,
    },
    /// Check environment readiness (browser binary, input file)
    Doctor {
        /// Clipboard export to check for
        #[arg(long, default_value = "images_clipboard.txt")]
        input: PathBuf,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Run {
            input,
            output_dir,
            concurrency,
            wait_timeout,
            download_timeout,
            max_attempts,
            clean,
        } => {
            let config = Config {
                input_path: input,
                output_dir,
                concurrency,
                wait_timeout: Duration::from_secs(wait_timeout),
                download_timeout: Duration::from_secs(download_timeout),
                retry: RetryPolicy::with_max_attempts(max_attempts),
                clean_after_archive: clean,
            };
            cli::run_cmd::run(config, cli.quiet).await
        }
        Commands::Doctor { input } => {
            let config = Config {
                input_path: input,
                ..Config::default()
            };
            cli::doctor::run(&config).await
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "bingrab", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
