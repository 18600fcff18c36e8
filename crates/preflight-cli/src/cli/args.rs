use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Backup validation and restore risk assessment for Home Assistant.
#[derive(Parser, Debug)]
#[command(name = "preflight", version, about, long_about = None)]
pub struct Cli {
    /// Supervisor API base URL
    #[arg(long, env = "SUPERVISOR_URL", default_value = "http://supervisor")]
    pub supervisor_url: String,

    /// Supervisor API token
    #[arg(long, env = "SUPERVISOR_TOKEN", default_value = "", hide_env_values = true)]
    pub token: String,

    /// Directory holding the change database and add-on configuration
    #[arg(long, env = "PREFLIGHT_DATA_DIR", default_value = "/data")]
    pub data_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available backups, newest first
    List,
    /// Show details for one backup
    Show { backup_id: String },
    /// Create a new full backup
    Create {
        name: String,
        /// Encrypt the backup with a password
        #[arg(long)]
        password: Option<String>,
    },
    /// Validate a backup against the running system
    Validate { backup_id: String },
    /// Validate, then restore a backup
    Restore {
        backup_id: String,
        /// Password for an encrypted backup
        #[arg(long)]
        password: Option<String>,
    },
    /// Delete a backup
    Delete { backup_id: String },
    /// Manage the breaking-change database
    Changes {
        #[command(subcommand)]
        action: ChangesAction,
    },
    /// Show or edit the add-on configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Supervisor reachability and disk usage
    Status,
}

#[derive(Subcommand, Debug)]
pub enum ChangesAction {
    /// Pull the curated change feed into the local database
    Update,
    /// Print every stored change record
    List,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the current configuration
    Show,
    /// Reset the configuration to defaults
    Reset,
    /// Replace the configuration from a JSON string
    Import { json: String },
}
