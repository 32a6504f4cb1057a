//! CLI command definitions and subcommands

use clap::builder::NonEmptyStringValueParser;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// walkbridge - walk session event bridge
#[derive(Parser)]
#[command(
    name = "wb",
    about = "Bridge walk start/end events between a wearable and a handheld",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Receive walk events and print them as JSON lines (handheld role)
    Listen {
        /// Socket to listen on (overrides config)
        #[arg(short, long)]
        socket: Option<PathBuf>,
    },

    /// Send a walk started event to every reachable peer (wearable role)
    Start {
        /// Walk intensity label
        #[arg(short, long, value_parser = NonEmptyStringValueParser::new())]
        intensity: String,

        /// Start time in epoch milliseconds (defaults to now)
        #[arg(long)]
        at: Option<u64>,

        /// Peer socket to send to (repeatable, overrides config)
        #[arg(short, long)]
        peer: Vec<PathBuf>,
    },

    /// Send a walk ended event to every reachable peer (wearable role)
    End {
        /// Walk intensity label
        #[arg(short, long, value_parser = NonEmptyStringValueParser::new())]
        intensity: String,

        /// Walk duration in seconds
        #[arg(short, long)]
        duration: u32,

        /// End time in epoch milliseconds (defaults to now)
        #[arg(long)]
        at: Option<u64>,

        /// Peer socket to send to (repeatable, overrides config)
        #[arg(short, long)]
        peer: Vec<PathBuf>,
    },

    /// Decode a payload for a topic and print the event
    Decode {
        /// Payload topic (/walk/start or /walk/end)
        #[arg(short, long)]
        topic: String,

        /// JSON payload text
        payload: String,
    },
}
