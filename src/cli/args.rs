//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Interactive behavior-tree manipulation for human-robot experiment sessions
#[derive(Parser, Debug)]
#[command(name = "normtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug level (-d, -dd, -ddd)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an experiment session for a robot profile
    Run {
        /// Name of the robot profile (loads <robot>-resource-file.json)
        robot: String,

        /// File where the experimental results will be written
        #[arg(long)]
        db_file: Option<PathBuf>,

        /// Skip narration pauses
        #[arg(long)]
        no_delay: bool,
    },

    /// Show the behavior trees of a resource file
    Show {
        /// Resource file to display
        file: PathBuf,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init,

    /// Show config paths
    Path,
}
