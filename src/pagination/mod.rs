//! Pagination module
//!
//! Supports: cursor paging over JSON (whole pages or dot-path fields), CSV,
//! and raw responses
//!
//! # Overview
//!
//! `PagedQuery` turns one query into a lazy, finite sequence of items. Each
//! step awaits at most one HTTP call; the cursor (`page_start`) is copied from
//! each response into the query before the next call. Dropping the pager is
//! the only way to cancel it.

mod pager;
mod types;

pub use pager::PagedQuery;
pub use types::{PageOptions, PagedItem, PaginationState, DEFAULT_BATCH_SIZE};

#[cfg(test)]
mod tests;
