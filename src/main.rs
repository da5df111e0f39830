//! tola-bundle - combine page scripts and stylesheets into cached bundles.

use anyhow::Result;
use clap::{ColorChoice, Parser};
use tola_bundle::{
    BundleConfig,
    cli::{self, Cli, Commands},
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = BundleConfig::load(&cli)?;

    match &cli.command {
        Commands::Rewrite { args } => cli::rewrite::rewrite_pages(args, &config),
        Commands::Serve { .. } => cli::serve::serve(&config),
        Commands::Clean => cli::clean::clean_bundles(&config),
    }
}
