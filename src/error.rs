//! Error types for tdexport
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use std::panic::Location;
use std::path::Path;
use thiserror::Error;

/// The main error type for tdexport
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Setup Errors (fatal before any extraction starts)
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to create storage directory '{path}': {message}")]
    DirectorySetup { path: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid extraction plan: {message}")]
    Plan { message: String },

    // ============================================================================
    // Extraction Errors
    // ============================================================================
    #[error("Extraction process failed: {message} (at {file}:{line})")]
    ExtractionProcess {
        message: String,
        file: &'static str,
        line: u32,
    },

    #[error("Malformed progress line '{line}': {message}")]
    ProgressParse { line: String, message: String },

    #[error("Extraction cancelled by interrupt")]
    Cancelled,

    // ============================================================================
    // Data Processing Errors
    // ============================================================================
    #[error("Failed to load raw data file '{path}': {message}")]
    LoadEncoding { path: String, message: String },

    #[error("Malformed raw data at line {line}: {message}")]
    RawParse { line: usize, message: String },

    #[error("Failed to coerce column '{column}': {message}")]
    TypeCoercion { column: String, message: String },

    #[error("Failed to combine partitions: {message}")]
    Combine { message: String },

    // ============================================================================
    // Arrow Errors
    // ============================================================================
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Output error: {message}")]
    Output { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a plan error
    pub fn plan(message: impl Into<String>) -> Self {
        Self::Plan {
            message: message.into(),
        }
    }

    /// Create a directory setup error
    pub fn directory_setup(path: impl AsRef<Path>, message: impl ToString) -> Self {
        Self::DirectorySetup {
            path: path.as_ref().display().to_string(),
            message: message.to_string(),
        }
    }

    /// Create an extraction process error tagged with the caller's location
    #[track_caller]
    pub fn process(message: impl Into<String>) -> Self {
        let location = Location::caller();
        Self::ExtractionProcess {
            message: message.into(),
            file: location.file(),
            line: location.line(),
        }
    }

    /// Create a progress parse error
    pub fn progress_parse(line: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProgressParse {
            line: line.into(),
            message: message.into(),
        }
    }

    /// Create a load error for a raw data file
    pub fn load(path: impl AsRef<Path>, message: impl ToString) -> Self {
        Self::LoadEncoding {
            path: path.as_ref().display().to_string(),
            message: message.to_string(),
        }
    }

    /// Create a raw parse error
    pub fn raw_parse(line: usize, message: impl Into<String>) -> Self {
        Self::RawParse {
            line,
            message: message.into(),
        }
    }

    /// Create a type coercion error
    pub fn coercion(column: impl Into<String>, message: impl ToString) -> Self {
        Self::TypeCoercion {
            column: column.into(),
            message: message.to_string(),
        }
    }

    /// Create a combine error
    pub fn combine(message: impl Into<String>) -> Self {
        Self::Combine {
            message: message.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Short name of the error category, used when logging trapped failures
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config { .. } | Error::YamlParse(_) | Error::JsonParse(_) => {
                "ConfigurationError"
            }
            Error::DirectorySetup { .. } => "DirectorySetupFailure",
            Error::Plan { .. } => "PlanFailure",
            Error::ExtractionProcess { .. } => "ExtractionProcessFailure",
            Error::ProgressParse { .. } => "ProgressParseFailure",
            Error::Cancelled => "Cancelled",
            Error::LoadEncoding { .. } | Error::RawParse { .. } => "LoadEncodingFailure",
            Error::TypeCoercion { .. } => "TypeCoercionFailure",
            Error::Combine { .. } => "CombineFailure",
            Error::Arrow(_) | Error::Output { .. } => "OutputFailure",
            Error::Io(_) => "IoFailure",
            Error::Other(_) => "Other",
        }
    }

    /// Source location recorded when the error was raised, if any
    pub fn location(&self) -> Option<(&'static str, u32)> {
        match self {
            Error::ExtractionProcess { file, line, .. } => Some((file, *line)),
            _ => None,
        }
    }

    /// Whether this error must abort the export before any extraction work.
    ///
    /// Everything else is trapped at the top level and turned into an empty result.
    pub fn is_fatal_before_work(&self) -> bool {
        matches!(
            self,
            Error::Config { .. }
                | Error::DirectorySetup { .. }
                | Error::YamlParse(_)
                | Error::JsonParse(_)
        )
    }
}

/// Result type alias for tdexport
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
