//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "firewatch")]
#[command(author, version, about = "Dashboard for the Firewatch fire-detection sensor network", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Backend base URL (e.g. http://192.168.1.20:8000)
    #[arg(long, global = true, env = "FIREWATCH_API_URL")]
    pub api_url: Option<String>,

    /// Poll interval in milliseconds
    #[arg(long, global = true, env = "FIREWATCH_POLL_INTERVAL_MS")]
    pub interval_ms: Option<u64>,

    /// Request timeout in seconds
    #[arg(short = 'T', long, global = true)]
    pub timeout: Option<u64>,

    /// Output as JSON (shorthand for --format json)
    #[arg(long, global = true)]
    pub json: bool,

    /// Output compact JSON (no pretty-printing)
    #[arg(long, global = true)]
    pub compact: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Use a simulated backend instead of a real one
    #[arg(long, global = true)]
    pub demo: bool,

    /// Write output to file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// The format requested by `--json`, otherwise text.
    pub fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Continuously monitor the sensor node
    Watch {
        /// Stop after this many dashboard updates
        #[arg(short, long)]
        count: Option<u32>,
    },

    /// Print the current dashboard once
    Status,

    /// Show or change alert thresholds
    Thresholds {
        #[command(subcommand)]
        action: ThresholdsAction,
    },

    /// Manage configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Threshold subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum ThresholdsAction {
    /// Show the thresholds confirmed by the backend
    Show,

    /// Change one or both thresholds
    Set {
        /// Maximum temperature in °C before alerting
        #[arg(long)]
        temperature_max: Option<String>,

        /// Maximum gas level before alerting
        #[arg(long)]
        gas_max: Option<String>,
    },
}

/// Configuration subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init,
}
