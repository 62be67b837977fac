//! CLI module - Command-line interface for gramguard
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// gramguard - photo sharing backend with bullying-aware comment moderation
#[derive(Parser)]
#[command(name = "gramguard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the web server (default)
    Serve,

    /// Write a default config.toml to the current directory
    #[command(alias = "--init")]
    Init,

    /// Reset a user's reputation to the initial score
    Restore {
        /// Username to restore
        username: String,
    },

    /// Print the normalized text and bullying score for a comment
    Score {
        /// Comment text
        #[arg(required = true)]
        text: Vec<String>,
    },
}

pub use commands::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["gramguard"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["gramguard", "restore", "alice"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Restore { username }) if username == "alice"));

        let cli = Cli::try_parse_from(["gramguard", "score", "you", "are", "mean"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Score { text }) if text.len() == 3));

        assert!(Cli::try_parse_from(["gramguard", "score"]).is_err());
    }
}
