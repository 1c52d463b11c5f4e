//! Authentication module
//!
//! Supports: RF token (explicit or from the environment) and signed requests.
//!
//! Credentials are resolved lazily. Building an `Authenticator` never fails,
//! so a client can exist before any token is available; `resolve()` runs right
//! before each request and reports `Error::MissingAuth` when nothing is found.

mod authenticator;
mod types;

pub use authenticator::{http_date, signature_hash, Authenticator};
pub use types::{AuthConfig, Credentials, LEGACY_TOKEN_ENV, TOKEN_ENV};
