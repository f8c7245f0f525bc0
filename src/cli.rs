//! Command-line interface definitions using clap

use clap::Parser;

/// snaplink - a small URL shortener service
#[derive(Parser, Debug)]
#[command(name = "snaplink")]
#[command(version)]
#[command(about = "A small URL shortener service", long_about = None)]
pub struct Cli {
    /// Configuration file (TOML); missing files fall back to defaults
    #[arg(long, short = 'c')]
    pub config: Option<String>,

    /// Write a sample configuration to PATH and exit
    #[arg(long, value_name = "PATH")]
    pub generate_config: Option<String>,
}
