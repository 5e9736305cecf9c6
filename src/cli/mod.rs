use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
pub use commands::*;

#[derive(Parser)]
#[command(name = "btsink")]
#[command(about = "Now-playing display and advertisement muting for a Bluetooth A2DP sink")]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to ~/.config/btsink/config.toml)
    #[arg(long, global = true, env = "BTSINK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Snapshot file shared between collector and presenter
    #[arg(long, global = true, env = "BTSINK_SNAPSHOT")]
    pub snapshot: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll the Bluetooth media player and publish the current track
    Collect,

    /// Display the published track in the terminal
    Present,

    /// Print the published track once and exit
    Status,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_overrides() {
        let cli = Cli::try_parse_from([
            "btsink",
            "present",
            "--snapshot",
            "/run/track.json",
            "--config",
            "/etc/btsink.toml",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Present));
        assert_eq!(cli.snapshot, Some(PathBuf::from("/run/track.json")));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/btsink.toml")));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["btsink"]).is_err());
        assert!(Cli::try_parse_from(["btsink", "collect"]).is_ok());
    }
}
