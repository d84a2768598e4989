use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "ucgator")]
#[command(about = "UCGator client tools: connectivity watch and notification badge")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to the client config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Watch network reachability and print connectivity alerts
    WatchNetwork {
        /// URL to probe (defaults to the configured probe or API URL)
        #[arg(long, value_name = "URL")]
        probe_url: Option<String>,
    },
    /// Print the unread notification count
    Unread {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a notification as read
    Read {
        /// Notification ID
        id: String,
    },
    /// Mark every notification as read
    ReadAll,
    /// Sync the unread badge for a user
    Badge {
        /// Signed-in user ID
        #[arg(long)]
        user: String,
        /// Keep running and apply push events read from stdin (one JSON object per line)
        #[arg(long)]
        watch: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage the API access token
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Manage the client config file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Store an access token in the system keyring
    SetToken {
        /// Token value (read from stdin when omitted)
        token: Option<String>,
    },
    /// Show where the access token comes from
    Status,
    /// Remove the stored access token
    Clear,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Set the notification API base URL
    SetApiUrl {
        /// Base URL, e.g. https://api.ucgator.app
        url: String,
    },
    /// Set the URL probed for reachability
    SetProbeUrl {
        /// Probe URL, e.g. https://api.ucgator.app/health
        url: String,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
