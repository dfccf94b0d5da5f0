//! CLI argument parsing using clap 4.x derive macros

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use studio_core::studio::{ImageStyle, Tone};

/// LinkedIn content studio
///
/// Sends a topic, tone and image style to hosted AI agents and prints the
/// post and image they produce, with live agent activity while they work.
#[derive(Parser, Debug)]
#[command(name = "studio")]
#[command(author, about, long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// The command to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print version information
    #[arg(long)]
    pub version: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a post and a matching image through the content coordinator
    Generate {
        #[command(flatten)]
        form: FormArgs,

        /// Copy the post to the clipboard
        #[arg(long)]
        copy: bool,

        /// Download the image to this path
        #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = "linkedin-image.png")]
        save_image: Option<PathBuf>,

        /// Fail on agent responses of unknown shape
        #[arg(long)]
        strict: bool,
    },

    /// Write a new post with the post writer agent
    Post {
        #[command(flatten)]
        form: FormArgs,

        /// Copy the post to the clipboard
        #[arg(long)]
        copy: bool,
    },

    /// Create a new image with the image creator agent
    Image {
        #[command(flatten)]
        form: FormArgs,

        /// Download the image to this path
        #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = "linkedin-image.png")]
        save_image: Option<PathBuf>,
    },

    /// Show the bundled example post and image
    Sample,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommand>,
    },

    /// Show recent debug log lines
    Logs {
        /// Number of lines to show
        #[arg(short = 'n', long, default_value_t = 50)]
        lines: usize,
    },
}

/// What to write about and how
#[derive(Args, Debug, Clone)]
pub struct FormArgs {
    /// Topic of the post
    #[arg(short, long)]
    pub topic: String,

    /// Writing tone (professional, inspirational, educational, conversational, bold)
    #[arg(long, default_value = "professional")]
    pub tone: Tone,

    /// Image style (minimal, abstract, illustrated, photo-realistic)
    #[arg(long, default_value = "minimal")]
    pub style: ImageStyle,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Print the configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
