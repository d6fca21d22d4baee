//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Address to listen on, overriding `server.bind`
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<String>,
}

/// Sweep command arguments.
#[derive(Debug, Args)]
pub struct SweepCommand {
    /// Retention window in seconds, overriding `cleanup.max_age_secs`
    #[arg(long, value_name = "SECS")]
    pub max_age_secs: Option<u64>,

    /// Output the report as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Files command arguments.
#[derive(Debug, Args)]
pub struct FilesCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Render command arguments.
#[derive(Debug, Args)]
pub struct RenderCommand {
    /// Collected order as JSON, in the shape the assistant emits
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Where to write the PDF
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Logo image for the page header (PNG or JPEG)
    #[arg(short, long, value_name = "FILE")]
    pub logo: Option<PathBuf>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_command_debug() {
        let cmd = ServeCommand {
            bind: Some("127.0.0.1:8080".to_string()),
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("bind"));
        assert!(debug_str.contains("8080"));
    }

    #[test]
    fn test_render_command_debug() {
        let cmd = RenderCommand {
            input: PathBuf::from("order.json"),
            output: PathBuf::from("out.pdf"),
            logo: None,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("order.json"));
        assert!(debug_str.contains("out.pdf"));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }
}
