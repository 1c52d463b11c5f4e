//! Response wrapper module
//!
//! `QueryResponse` wraps one HTTP response (status, headers, decoded body) and
//! normalizes access to paging metadata across JSON, CSV and XML bodies.
//!
//! # Metadata resolution
//!
//! Counts resolve in a fixed order: dedicated `X-RF-*` response headers first,
//! then aggregate objects embedded in a JSON body (`counts` or `count`), then
//! plain numeric fields (`count` / `total_count`). When nothing matches the
//! value is `None`, never zero. The cursor prefers the JSON `next_page_start`
//! field and falls back to the `X-RF-NEXT-PAGE-START` header.

mod wrapper;

pub use wrapper::{
    QueryResponse, ResponseBody, CONTENT_SHA256_HEADER, NEXT_PAGE_START_HEADER,
    RETURNED_COUNT_HEADER, TOTAL_COUNT_HEADER,
};
