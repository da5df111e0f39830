//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::CompressMethod;

/// Combine page scripts and stylesheets into cached bundles
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: bundle.toml)
    #[arg(short = 'C', long, global = true, default_value = "bundle.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Rewrite pages to reference combined bundles
    #[command(visible_alias = "r")]
    Rewrite {
        #[command(flatten)]
        args: RewriteArgs,
    },

    /// Serve rewritten pages and their bundles
    #[command(visible_alias = "s")]
    Serve {
        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<std::net::IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Remove persisted bundles
    Clean,
}

/// Rewrite command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct RewriteArgs {
    /// Pages to rewrite (files, or directories searched for *.html)
    #[arg(required = true, value_hint = clap::ValueHint::AnyPath)]
    pub files: Vec<PathBuf>,

    /// Output directory path (relative to project root)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Directory that `/` maps to
    #[arg(short = 'r', long, value_hint = clap::ValueHint::DirPath)]
    pub web_root: Option<PathBuf>,

    /// Prefix of emitted bundle URLs (e.g. /app)
    #[arg(long)]
    pub context_path: Option<String>,

    /// Script compression method
    #[arg(short, long, value_enum)]
    pub method: Option<CompressMethod>,

    /// Compressor options (`key=value`, separated by `;`)
    #[arg(long)]
    pub options: Option<String>,

    /// Base path for relative references
    #[arg(short, long)]
    pub basepath: Option<String>,

    /// Treat all pages as one request: resources emitted by an earlier page
    /// are dropped from later ones
    #[arg(long)]
    pub shared_request: bool,

    /// Print rewritten pages to stdout instead of writing them
    #[arg(long)]
    pub stdout: bool,
}
