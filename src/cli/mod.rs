pub mod onboard;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "habitrack",
    about = "Local habit tracking with streak statistics"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Interactive first-run setup
    Init,
    /// Track a new habit
    Add {
        name: String,
        /// Track as a bad habit (streaks count clean days)
        #[arg(long, default_value_t = false)]
        bad: bool,
    },
    /// Stop tracking a habit and drop its history
    Remove { name: String },
    /// Show all habits with their completion state for a date
    List {
        #[arg(long)]
        date: Option<String>,
    },
    /// Flip a habit's completion for a date (defaults to today)
    Toggle {
        name: String,
        #[arg(long)]
        date: Option<String>,
    },
    /// Full streak and period statistics for one habit
    Stats {
        name: String,
        #[arg(long)]
        date: Option<String>,
    },
    /// Run the local JSON API server
    Serve,
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    Status,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    Set { key: String, value: String },
    Get { key: String },
}
