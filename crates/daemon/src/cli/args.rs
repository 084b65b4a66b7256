pub use clap::Parser;

use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "vantage")]
#[command(about = "Hash web content from many vantage points at once")]
pub struct Args {
    /// API of the local daemon (defaults to the configured api_port)
    #[arg(long, global = true)]
    pub remote: Option<Url>,

    /// Path to the vantage config directory (defaults to ~/.vantage)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
