//! Error types for IFC Fargelegger.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading IFC files.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Failed to read the IFC file from disk.
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The STEP format is invalid or malformed.
    #[error("invalid STEP format: {message}")]
    InvalidStep { message: String },

    /// The file is valid STEP but does not carry an IFC schema.
    #[error("unsupported schema '{schema}', expected an IFC schema")]
    UnsupportedSchema { schema: String },
}

/// Errors raised while selecting and marking elements.
#[derive(Debug, Error)]
pub enum TagError {
    /// No element satisfied the filter.
    #[error("no elements match {filter}")]
    EmptySelection { filter: String },

    /// The requested color is not in the palette.
    #[error("unknown color '{name}'")]
    UnknownColor { name: String },
}

/// Errors that can occur when exporting data.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Failed to create the output file.
    #[error("failed to create file '{path}': {source}")]
    FileCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write data to the file.
    #[error("failed to write data: {message}")]
    WriteError { message: String },

    /// An entity points at an entity that is not in the model.
    #[error("entity #{entity} references missing entity #{target}")]
    DanglingReference { entity: u64, target: u64 },

    /// The finished temporary file could not be moved into place.
    #[error("failed to move output into '{path}': {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to serialize data to JSON.
    #[error("JSON serialization failed: {source}")]
    JsonSerialize {
        #[from]
        source: serde_json::Error,
    },

    /// Failed to write CSV data.
    #[error("CSV write failed: {source}")]
    CsvWrite {
        #[from]
        source: csv::Error,
    },
}

/// Errors that can occur when loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}
