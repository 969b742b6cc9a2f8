use std::path::PathBuf;

use clap::{ArgAction, Parser};
use mapsync_fetch::Variant;

#[derive(Clone, Debug, Default, Parser)]
#[command(name = "mapsync", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Read settings from this file instead of searching for one
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Game installation directory
    #[arg(long, value_name = "DIR")]
    pub game_path: Option<PathBuf>,

    /// Where archives are placed [default: <game>/Songs]
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Parallel downloads
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Seconds between downloads
    #[arg(short, long, value_name = "SECONDS")]
    pub delay: Option<f64>,

    /// full, novideo or mini
    #[arg(long)]
    pub variant: Option<Variant>,

    /// Metadata API key used to look up set ids
    #[arg(long, value_name = "KEY")]
    pub token: Option<String>,

    #[arg(long, value_name = "URL")]
    pub proxy: Option<String>,

    /// Mirror URL template with {variant} and {id}; repeat to add fallbacks
    #[arg(long = "mirror", value_name = "TEMPLATE")]
    pub mirrors: Vec<String>,

    /// Stop after resolving and list the set ids that would be fetched
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Log filter forced by `-v`/`-q`, if any.
    pub fn log_override(&self) -> Option<&'static str> {
        match (self.quiet, self.verbose) {
            (true, _) => Some("warn"),
            (false, 0) => None,
            (false, 1) => Some("debug"),
            (false, _) => Some("trace"),
        }
    }
}
