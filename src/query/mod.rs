//! Query module
//!
//! `Query` is a value object over the JSON mapping sent to the raw API. The
//! single top-level key names its kind; an optional `output` mapping selects
//! the response format and aggregation. Typed models for entities,
//! references and events live here too.

mod builder;
mod models;

pub use builder::{Output, Query};
pub use models::{Entity, Event, Reference};

#[cfg(test)]
mod tests;
