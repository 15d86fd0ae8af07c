//! Command-line arguments

use clap::Parser;
use std::path::{Path, PathBuf};

/// Replay a landmark recording through the drowsiness classifier
#[derive(Parser, Debug)]
#[command(name = "drowsiness-monitor", version)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, value_name = "PATH", conflicts_with = "path")]
    pub config: Option<PathBuf>,

    /// TOML configuration file (same as --config)
    #[arg(value_name = "CONFIG")]
    pub path: Option<PathBuf>,
}

impl Cli {
    /// The configuration file to load, if one was named
    pub fn config_path(&self) -> Option<&Path> {
        self.config.as_deref().or(self.path.as_deref())
    }
}
