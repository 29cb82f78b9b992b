//! CLI module for Tubecoach.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Tubecoach - YouTube Analysis Assistant
///
/// Reviews a video transcript or document with an LLM: summary, titles, tags,
/// thumbnail idea, improvements and the most shareable segment.
#[derive(Parser, Debug)]
#[command(name = "tubecoach")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check system requirements and configuration
    Doctor,

    /// Start an interactive session (/video, /file, /reset inside the session)
    Chat {
        /// Chat profile from the config (e.g. "focused")
        #[arg(short, long)]
        profile: Option<String>,
    },

    /// Analyze one video or document and print the review
    Analyze {
        /// YouTube URL/ID, or path to a text document
        input: String,

        /// Chat profile from the config
        #[arg(short, long)]
        profile: Option<String>,

        /// Where to save the thumbnail illustration (defaults to the data directory)
        #[arg(long)]
        image_out: Option<String>,
    },

    /// Fetch a video's transcript and save it as plain text
    Transcript {
        /// YouTube URL or video ID
        video: String,

        /// Output file (defaults to the export directory, '-' for stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Start HTTP API server with one isolated conversation per session
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Chat profile from the config
        #[arg(long)]
        profile: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
