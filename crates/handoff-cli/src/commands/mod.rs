//! CLI command definitions and handlers.

use clap::{Parser, Subcommand};

/// Load configuration with graceful fallback to defaults.
///
/// A missing or unreadable config file falls back to defaults, with a warning
/// for the unreadable case.
pub fn load_config() -> handoff_core::config::Config {
    handoff_core::config::Config::load().unwrap_or_else(|e| {
        tracing::warn!("Ignoring configuration: {}", e);
        handoff_core::config::Config::default()
    })
}

/// Print a core error with its code and suggestion.
pub fn handle_error(err: &handoff_core::Error) {
    match err.code() {
        Some(code) => eprintln!("Error [{code}]: {err}"),
        None => eprintln!("Error: {err}"),
    }

    if let Some(suggestion) = err.suggestion() {
        eprintln!();
        eprintln!("Suggestion:");
        for line in suggestion.lines() {
            eprintln!("  {line}");
        }
    }
}

pub mod accounts;
pub mod config;
pub mod link;

/// Handoff - cross-device login via short-lived transfer tokens
#[derive(Parser)]
#[command(name = "handoff")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand)]
pub enum Command {
    /// Manage account slots on this device
    Accounts(AccountsArgs),

    /// Work with login links
    Link(LinkArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for the accounts command
#[derive(Parser)]
pub struct AccountsArgs {
    /// Accounts subcommand
    #[command(subcommand)]
    pub action: AccountsAction,
}

/// Accounts subcommands
#[derive(Subcommand)]
pub enum AccountsAction {
    /// List account slots
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Remove an account slot
    Remove {
        /// Account ID
        account: String,
    },
}

/// Arguments for the link command
#[derive(Parser)]
pub struct LinkArgs {
    /// Link subcommand
    #[command(subcommand)]
    pub action: LinkAction,
}

/// Link subcommands
#[derive(Subcommand)]
pub enum LinkAction {
    /// Decode a scanned login link
    Decode {
        /// The login link
        link: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

/// Arguments for the config command
#[derive(Parser)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,

        /// Value to set
        value: String,
    },

    /// Show all configuration
    Show,

    /// Print the configuration file path
    Path,

    /// Reset to defaults
    Reset,
}
