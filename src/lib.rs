// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # rfapi
//!
//! Async client for the Recorded Future threat-intelligence APIs.
//!
//! ## Features
//!
//! - **Raw query API**: POST JSON queries, decode JSON/CSV/XML responses
//! - **Transparent paging**: cursor-driven item streams with limit, unique and field selection
//! - **Connect API**: lookups, searches, risk lists and fusion file sync
//! - **Auth**: API token (explicit or from `RF_TOKEN`) or HMAC request signing
//! - **Retries**: immediate resend on 502/503 and read timeouts
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rfapi::{ApiClient, AuthConfig, ClientConfig, PageOptions, Query, Result};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = ApiClient::new(AuthConfig::Auto, ClientConfig::default())?;
//!
//!     let query = Query::reference(json!({"type": "CyberAttack"}));
//!     let options = PageOptions::new().field("instances").limit(100);
//!
//!     let mut pager = client.paged_query(&query, options)?;
//!     while let Some(item) = pager.next().await {
//!         println!("{:?}", item?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────┬──────────────────────────────┐
//! │   ApiClient (POST /query/)   │  ConnectClient (GET /v2/...) │
//! │   query / paged_query        │  lookup / search / risklist  │
//! ├──────────────────────────────┴──────────────────────────────┤
//! │  PagedQuery  →  decode (dot-path, CSV)  →  QueryResponse    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  HttpClient: app-id, auth, gzip, retries, error mapping     │
//! └─────────────────────────────────────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Client configuration and app-id
pub mod config;

/// Token and signature authentication
pub mod auth;

/// HTTP transport with retries
pub mod http;

/// Response wrapper and paging metadata
pub mod response;

/// Query documents and result models
pub mod query;

/// Item extraction from response bodies
pub mod decode;

/// Paged query iteration
pub mod pagination;

/// Raw query API client
pub mod client;

/// Connect API client
pub mod connect;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use auth::AuthConfig;
pub use client::ApiClient;
pub use config::ClientConfig;
pub use connect::ConnectClient;
pub use error::{Error, Result};
pub use pagination::{PageOptions, PagedItem, PagedQuery};
pub use query::Query;
pub use response::QueryResponse;
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
