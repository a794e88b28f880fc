//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod cookie;
mod helpers;
mod process;
mod resolve;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings, LoadOptions};

#[derive(Parser)]
#[command(name = "teradrop")]
#[command(about = "Resolve share links and video pages into downloadable media")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true, env = "TERADROP_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory (downloads and stored cookie)
    #[arg(short, long, global = true, env = "TERADROP_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Address to bind: PORT, HOST or HOST:PORT
        #[arg(default_value = "0.0.0.0:8000")]
        bind: String,
    },

    /// Resolve a link and print the result as JSON
    Resolve {
        url: String,
        /// Session cookie (token or "name=value; ..."); defaults to the stored one
        #[arg(long)]
        cookie: Option<String>,
    },

    /// Merge a format with the best audio and print the file path
    Process {
        /// Page URL (the `webpage_url` of a resolve result)
        url: String,
        /// Format to merge (a `format_id` from the resolve result)
        format_id: String,
    },

    /// Manage the stored session cookie
    Cookie {
        #[command(subcommand)]
        command: CookieCommands,
    },
}

#[derive(Subcommand)]
enum CookieCommands {
    /// Show the stored cookie (masked)
    Show,
    /// Replace the stored cookie
    Set { token: String },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = load_settings(LoadOptions {
        config_path: cli.config,
        data_dir: cli.data_dir,
    })
    .await?;

    match cli.command {
        Commands::Serve { bind } => serve::cmd_serve(&settings, &bind).await,
        Commands::Resolve { url, cookie } => {
            resolve::cmd_resolve(&settings, &url, cookie.as_deref()).await
        }
        Commands::Process { url, format_id } => {
            process::cmd_process(&settings, &url, &format_id).await
        }
        Commands::Cookie { command } => match command {
            CookieCommands::Show => cookie::cmd_show(&settings).await,
            CookieCommands::Set { token } => cookie::cmd_set(&settings, &token).await,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_resolve_with_cookie() {
        let cli = Cli::try_parse_from([
            "teradrop",
            "-v",
            "resolve",
            "https://terabox.com/s/1abc",
            "--cookie",
            "tok",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Resolve { url, cookie } => {
                assert_eq!(url, "https://terabox.com/s/1abc");
                assert_eq!(cookie.as_deref(), Some("tok"));
            }
            _ => panic!("expected resolve"),
        }
    }

    #[test]
    fn test_serve_default_bind() {
        let cli = Cli::try_parse_from(["teradrop", "serve"]).unwrap();
        match cli.command {
            Commands::Serve { bind } => assert_eq!(bind, "0.0.0.0:8000"),
            _ => panic!("expected serve"),
        }
    }
}
