//! Connect API module
//!
//! `ConnectClient` talks to the GET based connect API: entity search and
//! lookup per category, extensions, risk lists and risk rules, demo events,
//! alert rules and fusion files. It shares the transport, app id, retry
//! budget and error classification with the query client; only the token
//! header differs.

mod client;
mod params;
mod response;

pub use client::{ConnectClient, DEFAULT_RISKLIST_FORMAT};
pub use params::{Direction, LookupParams, SearchParams};
pub use response::{ConnectResponse, FileResponse};

#[cfg(test)]
mod tests;
