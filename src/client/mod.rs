//! Query client module
//!
//! `ApiClient` talks to the raw query API: one POST per query, JSON body,
//! app-id in the query string. On top of `query` it offers a paging helper
//! and typed wrappers for references, events, entities, status and metadata.

mod api;

pub use api::ApiClient;
