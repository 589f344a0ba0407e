//! Output module
//!
//! Serializes a normalized table, or writes it back as raw text.
//!
//! # Overview
//!
//! - [`TableSink`] is the seam to the serialization step
//! - [`FileSerializer`] writes Arrow IPC (`.feather`) or JSON lines (`.jsonl`)
//! - [`write_delimited`] writes `|`-separated text with `?` for missing values

mod writer;

pub use writer::{
    write_columnar, write_delimited, write_generic, FileSerializer, TableSink, MISSING_TOKEN,
};

#[cfg(test)]
mod tests;
