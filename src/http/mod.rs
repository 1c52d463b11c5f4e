//! HTTP client module
//!
//! Shared transport for both API surfaces.
//!
//! # Features
//!
//! - **App id**: sent as `User-Agent` and as the `app_id` query parameter
//! - **Retries**: 502/503 and timeouts are resent right away, within a budget
//! - **Error classification**: 401, JSON error bodies, plain HTTP statuses
//! - **Authentication**: credentials resolved and applied per request

mod client;

pub use client::{read_response, HttpClient, RequestConfig};
