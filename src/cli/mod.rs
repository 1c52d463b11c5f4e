//! CLI module
//!
//! Command-line interface over the query and connect clients.
//!
//! # Commands
//!
//! - `iplookup` - Connect API lookup of an IP address
//! - `domainnamelookup` - Connect API lookup of a domain
//! - `query` - Paged raw query
//! - `status` - API status

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
