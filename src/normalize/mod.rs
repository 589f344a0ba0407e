//! Normalize module
//!
//! Loads raw pipe-delimited export output into Arrow and cleans it.
//!
//! # Overview
//!
//! - [`load_raw`] reads a raw file with caller-declared columns and types,
//!   retrying once as Latin-1 when UTF-8 fails or yields no rows
//! - [`normalize`] trims text, parses date columns, keeps identifier columns
//!   as text and drops columns that are entirely missing

mod cleaner;
mod loader;
mod table;

pub use cleaner::normalize;
pub use loader::{load_raw, parse_delimited};
pub use table::NormalizedTable;

#[cfg(test)]
mod tests;
