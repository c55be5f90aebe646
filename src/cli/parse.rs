//! CLI parse: clap types for Brandline. No behavior; definitions only.

use crate::types::StageId;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Brandline CLI - voice-consistent campaigns from one product description
#[derive(Parser)]
#[command(name = "brandline")]
#[command(about = "Generate a voice card, campaign assets and a consistency audit with an LLM")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (where brandline.toml lives)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the pipeline for one product
    Run(RunArgs),
    /// List configured providers
    Providers,
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Brand name
    #[arg(long, default_value = "")]
    pub brand: String,

    /// Target audience
    #[arg(long, default_value = "")]
    pub audience: String,

    /// Campaign objective
    #[arg(long, default_value = "")]
    pub objective: String,

    /// Product description text
    #[arg(long, conflicts_with = "product_file")]
    pub product: Option<String>,

    /// Read the product description from a file
    #[arg(long)]
    pub product_file: Option<PathBuf>,

    /// Last stage to run (voice_card, assets, audit)
    #[arg(long, default_value = "audit")]
    pub through: StageId,

    /// Provider entry to use (overrides pipeline.provider)
    #[arg(long)]
    pub provider: Option<String>,

    /// Model override
    #[arg(long)]
    pub model: Option<String>,

    /// Write the session snapshot as JSON to this path
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration with API keys masked
    Show,
    /// Validate the configuration
    Validate,
}
