//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Recorded Future API client CLI
#[derive(Parser, Debug)]
#[command(name = "rfapi")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// API token, `auto` (the default) reads RF_TOKEN from the environment
    #[arg(short, long, global = true)]
    pub token: Option<String>,

    /// Client configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Look up an IP address
    #[command(name = "iplookup")]
    IpLookup {
        /// IP address
        ip: String,
    },

    /// Look up a domain name
    #[command(name = "domainnamelookup")]
    DomainNameLookup {
        /// Domain name
        domain: String,
    },

    /// Run a raw query and print every item, one JSON document per line
    Query {
        /// Query as JSON, ex '{"reference": {"type": "CyberAttack"}}'
        json: String,

        /// Maximum number of items
        #[arg(short, long)]
        limit: Option<usize>,

        /// Dot-separated path of the items in each page, ex "instances"
        #[arg(short, long)]
        field: Option<String>,

        /// Items per request
        #[arg(long, default_value = "1000")]
        batch_size: usize,

        /// Drop items already seen on earlier pages
        #[arg(long)]
        unique: bool,
    },

    /// Show API status
    Status {
        /// Include usage statistics
        #[arg(long)]
        statistics: bool,
    },
}
