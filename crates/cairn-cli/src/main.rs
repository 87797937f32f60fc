//! Cairn CLI - Command-line interface for the Cairn asset pipeline

mod commands;

use anyhow::{Context, Result};
use cairn_asset::CairnConfig;
use clap::{ArgAction, Parser, Subcommand};
use commands::{info, publish, render};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cairn")]
#[command(about = "Publish namespaced assets under content-fingerprinted names", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the config file
    #[arg(long, global = true, default_value = "cairn.toml")]
    config: PathBuf,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish assets and print where they went
    Import {
        /// Asset references (e.g., "@app/css/app.css")
        #[arg(required = true)]
        references: Vec<String>,

        /// Manifest to reuse previous imports from and update afterwards
        #[arg(long)]
        manifest: Option<PathBuf>,
    },

    /// Print HTML markup linking the given assets
    Link {
        /// Asset references, linked in order
        #[arg(required = true)]
        references: Vec<String>,
    },

    /// Print the public URL of an asset
    Url {
        /// Asset reference
        reference: String,
    },

    /// Print the source content of an asset
    Inline {
        /// Asset reference
        reference: String,
    },

    /// Show asset details
    Info {
        /// Asset reference
        reference: String,

        /// Output format (json or toml)
        #[arg(long, default_value = "toml")]
        format: String,
    },

    /// Delete all published assets
    Clear,

    /// Delete all published assets and republish every namespace
    Reset {
        /// Write a manifest of the published assets
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = CairnConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config {}", cli.config.display()))?;
    let services = config.build()?;

    match cli.command {
        Commands::Import {
            references,
            manifest,
        } => publish::run_import(&services, &references, manifest.as_deref()),
        Commands::Link { references } => render::run_link(&services, &references),
        Commands::Url { reference } => render::run_url(&services, &reference),
        Commands::Inline { reference } => render::run_inline(&services, &reference),
        Commands::Info { reference, format } => info::run(&services, &reference, &format),
        Commands::Clear => publish::run_clear(&services),
        Commands::Reset { manifest } => publish::run_reset(&services, manifest.as_deref()),
    }
}
