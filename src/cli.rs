use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "kimaaka")]
#[command(version = concat!("Ver:", env!("CARGO_PKG_VERSION")))]
#[command(about = "Kimaaka client: multi-server failover, shared key cache and screenshot analysis")]
pub struct Cli {
    /// Write the default configuration file
    #[arg(long = "init")]
    pub init: bool,

    /// Print the effective configuration
    #[arg(long = "print")]
    pub print: bool,

    /// Validate the configuration
    #[arg(long = "check")]
    pub check: bool,

    /// Use this configuration file instead of ~/.kimaaka/config.toml
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List configured candidate servers
    Servers,
    /// Select a working server
    Resolve {
        /// Pick randomly among healthy candidates instead of in order
        #[arg(long)]
        random: bool,
    },
    /// Show the shared API key (masked)
    Key,
    /// Fetch a new shared API key, ignoring the cache
    RefreshKey,
    /// Analyze a PNG screenshot
    Analyze {
        image: PathBuf,
        /// Print errors instead of an empty answer
        #[arg(long)]
        strict: bool,
    },
    /// Aggregated admin statistics
    Stats {
        /// Bearer token; defaults to the saved admin session
        #[arg(long)]
        token: Option<String>,
    },
    /// Health of every candidate server
    Status,
    /// Server to send donated keys to
    DonationServer,
    /// Forget the sticky server and release quarantined servers
    Reset,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
