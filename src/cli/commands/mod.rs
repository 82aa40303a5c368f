//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod config_cmd;
mod extract;
mod fetch;
mod probe;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "web2video")]
#[command(about = "Fetch bot-protected pages and extract the videos they reference")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check for the verbose flag before clap runs, so logging can be set up first.
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a page through the bypass tiers and list its videos
    Fetch {
        /// Page URL
        url: String,
        /// Print JSON instead of a listing
        #[arg(long)]
        json: bool,
    },

    /// Extract videos from a saved HTML file
    Extract {
        /// HTML file
        file: PathBuf,
        /// URL the page was served from, for resolving relative links
        #[arg(long)]
        base: String,
        /// Print JSON instead of a listing
        #[arg(long)]
        json: bool,
    },

    /// Probe size and container format of a video URL
    Probe {
        /// Video URL
        url: String,
    },

    /// Start the JSON API server
    Serve {
        /// Bind address: port, host, or host:port (defaults to 0.0.0.0 and the configured port)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Print the effective configuration as YAML
    Config,
}

/// Load configuration from `--config` or by discovery.
async fn load_config(path: Option<&PathBuf>) -> Config {
    match path {
        Some(path) => Config::load_or_default(path).await,
        None => Config::load().await,
    }
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref()).await;

    match cli.command {
        Commands::Fetch { url, json } => fetch::cmd_fetch(&config, &url, json).await,
        Commands::Extract { file, base, json } => {
            extract::cmd_extract(&config, &file, &base, json).await
        }
        Commands::Probe { url } => probe::cmd_probe(&config, &url).await,
        Commands::Serve { bind } => serve::cmd_serve(config, bind.as_deref()).await,
        Commands::Config => config_cmd::cmd_config_show(&config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_extract() {
        let cli = Cli::try_parse_from([
            "web2video",
            "-v",
            "extract",
            "page.html",
            "--base",
            "https://x.test/",
            "--json",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Extract { file, base, json } => {
                assert_eq!(file, PathBuf::from("page.html"));
                assert_eq!(base, "https://x.test/");
                assert!(json);
            }
            _ => panic!("expected extract"),
        }
    }

    #[test]
    fn test_global_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["web2video", "config", "--config", "alt.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("alt.toml")));
    }
}
