//! Response decoder module
//!
//! Supports: JSON (with dot-path field extraction), CSV
//!
//! # Overview
//!
//! The decode module turns one page of a query response into records. JSON
//! bodies are either taken whole or narrowed with a dot path such as
//! `events.attributes.entities`; CSV bodies become a header row followed by
//! one column→value mapping per data row.

mod decoders;
mod types;

pub use decoders::{dot_index, CsvDecoder, JsonDecoder};
pub use types::{FieldPath, Record, RecordDecoder};
