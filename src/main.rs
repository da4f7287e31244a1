// src/main.rs
//! rverflow - CLI entry point

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;

use commands::OutputFormat;

// =============================================================================
// CLI Definitions
// =============================================================================

#[derive(Parser)]
#[command(name = "rverflow")]
#[command(version)]
#[command(about = "Resolve R package dependency stacks across CRAN, Bioconductor, and GitHub", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve package versions for a project manifest
    Solve {
        /// Path to the project manifest
        config: PathBuf,

        /// Directory where metadata cache files are stored
        #[arg(long, default_value = "cache")]
        cache_root: PathBuf,

        /// Lock the R version during resolution
        #[arg(long, value_name = "VERSION")]
        lock_r: Option<String>,

        /// Preferred Bioconductor release
        #[arg(long = "prefer-bioc", value_name = "RELEASE")]
        prefer_bioc: Option<String>,

        /// Include Suggests dependencies
        #[arg(long)]
        include_optional: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Prime the metadata cache for selected sources
    UpdateCache {
        /// Project manifest to scan for targets
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory where metadata cache files are stored
        #[arg(long, default_value = "cache")]
        cache_root: PathBuf,

        /// CRAN package to fetch metadata for (repeatable)
        #[arg(long = "package")]
        packages: Vec<String>,

        /// Bioconductor release to cache (repeatable)
        #[arg(long = "bioc-release")]
        bioc_releases: Vec<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Solve {
            config,
            cache_root,
            lock_r,
            prefer_bioc,
            include_optional,
            format,
        }) => commands::cmd_solve(
            &config,
            &cache_root,
            lock_r.as_deref(),
            prefer_bioc.as_deref(),
            include_optional,
            format,
        ),

        Some(Commands::UpdateCache {
            config,
            cache_root,
            packages,
            bioc_releases,
        }) => commands::cmd_update_cache(
            config.as_deref(),
            &cache_root,
            &packages,
            &bioc_releases,
        ),

        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "rverflow", &mut io::stdout());
            Ok(())
        }

        None => {
            println!("rverflow v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'rverflow --help' for usage information");
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {:#}", error);
            let code = error
                .downcast_ref::<rverflow::Error>()
                .map(rverflow::Error::exit_code)
                .unwrap_or(2);
            ExitCode::from(code as u8)
        }
    }
}
