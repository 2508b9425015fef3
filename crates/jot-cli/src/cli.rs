use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "jot")]
#[command(about = "Read and write notes from the command line, online or off")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend base URL (overrides JOT_BASE_URL and the config file)
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Optional path to the local note cache
    #[arg(long, global = true, value_name = "PATH")]
    pub cache_path: Option<PathBuf>,

    /// Optional path to the CLI config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the session in the OS keychain
    Login {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Forget the stored session and clear local data
    Logout,
    /// Show one note
    Get {
        /// Note path, e.g. docs/todo.md
        path: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List notes under a path prefix
    #[command(alias = "ls")]
    List {
        /// Path prefix; lists everything when omitted
        #[arg(default_value = "")]
        prefix: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a note
    #[command(alias = "new")]
    Create {
        /// Note path, e.g. docs/todo.md
        path: String,
        /// Note title
        #[arg(long)]
        title: String,
        /// Note content (read from piped stdin when omitted)
        #[arg(long)]
        content: Option<String>,
    },
    /// Change the title or content of a note
    #[command(alias = "edit")]
    Update {
        /// Note path
        path: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New content
        #[arg(long)]
        content: Option<String>,
    },
    /// Delete a note
    #[command(alias = "rm")]
    Delete {
        /// Note path
        path: String,
    },
    /// Show writes waiting to be synced
    Pending {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replay queued writes against the backend
    Sync,
    /// Inspect or change CLI configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Interactive session that keeps the pending queue across commands
    Shell,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the resolved configuration
    Show,
    /// Save the backend base URL to the config file
    SetUrl {
        /// Backend base URL, e.g. https://notes.example.com
        url: String,
    },
}

/// One line typed into `jot shell`.
#[derive(Parser)]
#[command(name = "jot", no_binary_name = true, disable_version_flag = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: Commands,
}
