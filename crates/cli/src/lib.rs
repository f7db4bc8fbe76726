use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub const DEFAULT_CONFIG: &str = "niftyx.yaml";

#[derive(Parser, Debug)]
#[command(name = "niftyx")]
#[command(about = "NiftyX - NIFTY options-chain analytics")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Log output format; overrides `logging.format` from the config
    #[arg(long, global = true, value_enum, env = "NIFTYX_LOG_FORMAT")]
    pub log_format: Option<LogFormatArg>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll the configured sources and log a summary per cycle
    Watch {
        /// Path to the configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },

    /// Run one cycle and print the strike, zone, pivot and greeks tables
    Analyze {
        /// Path to the configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,

        /// Read the option chain from this JSON file instead of the configured source
        #[arg(long)]
        chain: Option<PathBuf>,

        /// Read the previous-session index OHLC from this JSON file
        #[arg(long)]
        prev_ohlc: Option<PathBuf>,

        /// Write the strike table as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Validate configuration without polling
    Validate {
        /// Path to the configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },

    /// Initialize a new configuration file with all defaults
    Init {
        /// Output path for the new configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        output: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormatArg {
    /// Human-readable, colored
    Pretty,
    /// One JSON object per line
    Json,
    /// Single line per event
    Compact,
}

impl LogFormatArg {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormatArg::Pretty => "pretty",
            LogFormatArg::Json => "json",
            LogFormatArg::Compact => "compact",
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
