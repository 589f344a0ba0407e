//! Common types used throughout tdexport
//!
//! This module contains shared type definitions and type aliases
//! used across multiple modules.

use crate::error::{Error, Result};
use arrow::datatypes::DataType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Type Aliases
// ============================================================================

/// Declared column-name to column-type mapping
pub type DtypeMap = HashMap<String, ColumnType>;

/// Tokens the export tool writes for a missing value
pub const MISSING_MARKERS: [&str; 5] = ["?", "", "~", "!", "null"];

/// Check whether a raw field is one of the missing-value markers
pub fn is_missing_marker(value: &str) -> bool {
    MISSING_MARKERS.contains(&value)
}

// ============================================================================
// Column Types
// ============================================================================

/// Declared type of a raw column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Free text
    #[serde(alias = "str", alias = "string", alias = "utf8")]
    Text,
    /// 64-bit signed integer
    #[serde(alias = "int", alias = "int64", alias = "integer")]
    Integer,
    /// 64-bit float
    #[serde(alias = "float64", alias = "double", alias = "decimal")]
    Float,
    /// Calendar date in `YYYY-MM-DD`
    Date,
}

impl ColumnType {
    /// Arrow type this column is materialized as
    pub fn data_type(self) -> DataType {
        match self {
            ColumnType::Text => DataType::Utf8,
            ColumnType::Integer => DataType::Int64,
            ColumnType::Float => DataType::Float64,
            ColumnType::Date => DataType::Date32,
        }
    }
}

// ============================================================================
// Column Naming Conventions
// ============================================================================

fn name_tokens(name: &str) -> impl Iterator<Item = String> + '_ {
    name.split(|c: char| c == '_' || c == ' ' || c == '-')
        .filter(|t| !t.is_empty())
        .map(str::to_ascii_lowercase)
}

/// Whether a column name follows the identifier/key/code convention
/// (`id`, `cust_id`, `acct_key`, `state_cd`, ...)
pub fn is_identifier_column(name: &str) -> bool {
    name_tokens(name).any(|t| matches!(t.as_str(), "id" | "key" | "cd" | "code"))
}

/// Whether a column name follows the date-suffix convention (`sale_dt`, `open_date`)
pub fn is_date_column(name: &str) -> bool {
    name_tokens(name).any(|t| matches!(t.as_str(), "dt" | "date"))
}

// ============================================================================
// Serialize Mode
// ============================================================================

/// Output format handed to the serialization step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerializeMode {
    /// Zero-copy columnar file (Arrow IPC / Feather v2)
    #[serde(alias = "feather")]
    Columnar,
    /// Generic object serialization (JSON lines)
    #[serde(alias = "pickle")]
    Generic,
}

impl SerializeMode {
    /// File extension of the serialized artifact
    pub fn extension(self) -> &'static str {
        match self {
            SerializeMode::Columnar => "feather",
            SerializeMode::Generic => "jsonl",
        }
    }

    /// Whether this is the zero-copy columnar mode
    pub fn is_columnar(self) -> bool {
        self == SerializeMode::Columnar
    }
}

impl FromStr for SerializeMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "columnar" | "feather" => Ok(SerializeMode::Columnar),
            "generic" | "pickle" => Ok(SerializeMode::Generic),
            other => Err(Error::config(format!(
                "Serialize mode must be either 'columnar' or 'generic', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for SerializeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializeMode::Columnar => write!(f, "columnar"),
            SerializeMode::Generic => write!(f, "generic"),
        }
    }
}

// ============================================================================
// Elapsed Time
// ============================================================================

/// Format a duration as `H hours M minutes S seconds`
pub fn format_elapsed(elapsed: std::time::Duration) -> String {
    let total = elapsed.as_secs();
    let (m, s) = (total / 60, total % 60);
    let (h, m) = (m / 60, m % 60);
    format!("{h} hours {m} minutes {s} seconds")
}
