/// CLI argument parsing and command handling

use clap::{Parser, Subcommand};

// Build timestamp injected at compile time
pub const VERSION_WITH_BUILD: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (built: ",
    env!("BUILD_TIMESTAMP"),
    ")"
);

#[derive(Parser)]
#[command(name = "backrest-cli")]
#[command(author, version = VERSION_WITH_BUILD, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show backup status for all instances
    Status,

    /// Run a backup for an instance
    Backup {
        /// Instance id (the tool's stanza name)
        instance: String,

        /// Backup type: full, incr or diff
        #[arg(short = 't', long = "type", default_value = "incr")]
        backup_type: String,
    },

    /// Expire backups past the retention policy
    Cleanup {
        /// Instance id
        instance: String,
    },

    /// Run the tool's stanza consistency check
    Check {
        /// Instance id
        instance: String,
    },

    /// Show the tool's raw info report
    Info {
        /// Instance id
        instance: String,
    },

    /// Show parsed backup history
    History {
        /// Instance id
        instance: String,
    },

    /// Instance management
    Instances {
        #[command(subcommand)]
        command: InstanceCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Show the tail of the backup tool's log file
    Logs {
        /// Number of lines to show from the end of the log
        #[arg(short = 'n', long, default_value = "100")]
        tail: usize,
    },

    /// Run the cron scheduler in the foreground
    Schedule,

    /// Run HTTP API server mode
    #[cfg(feature = "server")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Enable CORS for cross-origin requests
        #[arg(long)]
        cors: bool,
    },
}

#[derive(Subcommand)]
pub enum InstanceCommands {
    /// List configured instances and their policies
    List,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// View the backup tool's configuration
    View,

    /// Validate the application configuration
    Validate,
}
