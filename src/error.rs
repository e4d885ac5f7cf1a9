//! # Error Handling
//!
//! This module defines the centralized error handling mechanism for the
//! `component-vault` application. It uses the `thiserror` library to create a
//! comprehensive `Error` enum that covers all anticipated failure modes,
//! providing clear and descriptive error messages.
//!
//! ## Propagation policy
//!
//! Errors fall into two classes with different propagation rules:
//!
//! - **Per-item errors** (`NotFound`, `MergeFragment`): collected and
//!   returned alongside successes in batch reports, so every failure stays
//!   attributable to its component Id and never suppresses the rest of the
//!   batch.
//! - **Fatal errors** (`Parse`, `Transport`, `Save`, `Network`, `Config`):
//!   abort the remaining operation and propagate directly to the caller via
//!   `?`.
//!
//! The `Result` type alias is used to return `Result<T, Error>` from
//! functions, making it easy to handle errors and propagate them up the
//! call stack.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for component-vault operations
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration document is not well-formed XML or is missing the
    /// required `ConnectionComponents` collection element.
    ///
    /// Fatal: no partially-parsed document is ever produced.
    #[error("Document parsing error: {message}")]
    Parse { message: String },

    /// A requested component Id does not exist in the source document.
    ///
    /// Reported per Id; never aborts the rest of an extraction batch.
    #[error("Connection component not found: {id}")]
    NotFound { id: String },

    /// A single candidate fragment could not be absorbed into the target
    /// document (duplicate within the batch, or a candidate that fails to
    /// re-parse).
    ///
    /// Reported per fragment; the rest of the batch continues and the save
    /// reflects the fragments that did merge.
    #[error("Cannot merge component '{id}': {message}")]
    MergeFragment { id: String, message: String },

    /// A fetch or store through the vault transport failed (connectivity,
    /// authentication, container locking).
    #[error("Vault transport error during {operation}: {message}")]
    Transport { operation: String, message: String },

    /// Persisting the document failed. The previous on-disk state is left
    /// untouched (the write goes to a temporary file that is renamed into
    /// place only on success).
    #[error("Failed to save document to '{}': {message}", path.display())]
    Save { path: PathBuf, message: String },

    /// An error occurred while reading or parsing the connection profile or
    /// a parameter file.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The credential-provider REST call failed or returned an unusable
    /// response.
    #[error("Network operation error: {url} - {message}")]
    Network { url: String, message: String },

    /// No parameter file matching the requested pattern appeared before the
    /// polling deadline.
    #[error("Timed out waiting for parameter file matching '{pattern}' in '{}'", dir.display())]
    WatchTimeout { pattern: String, dir: PathBuf },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for errors that are reported per item within a batch rather than
    /// aborting the whole operation.
    pub fn is_per_item(&self) -> bool {
        matches!(self, Error::NotFound { .. } | Error::MergeFragment { .. })
    }
}
