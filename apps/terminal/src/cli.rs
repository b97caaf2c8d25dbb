//! Command-line arguments for the terminal.

use clap::Parser;
use std::path::PathBuf;

/// Keyboard-wedge POS terminal: scan barcodes, see products.
///
/// Reads one barcode per line from stdin (handheld scanners type them) and
/// resolves each distinct scan against the store's cached inventory. Lines
/// starting with `:` are commands; type `:help` for the list.
#[derive(Debug, Parser)]
#[command(name = "tillpoint-terminal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to terminal.toml (defaults to the platform config directory)
    #[arg(short, long, value_name = "PATH", env = "TILLPOINT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Store to load inventory for (overrides config and environment)
    #[arg(short, long, value_name = "STORE_ID")]
    pub store: Option<String>,

    /// Write the effective configuration to the config path and exit
    #[arg(long)]
    pub write_config: bool,

    /// Silence the confirmation bell
    #[arg(long)]
    pub no_beep: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_overrides() {
        let cli = Cli::try_parse_from([
            "tillpoint-terminal",
            "--store",
            "store-7",
            "--config",
            "/tmp/t.toml",
            "--no-beep",
        ])
        .unwrap();
        assert_eq!(cli.store.as_deref(), Some("store-7"));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/t.toml")));
        assert!(cli.no_beep);
        assert!(!cli.write_config);
    }
}
