//! Error types for audiostream
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation.
//!
//! Errors at open time propagate to the caller; errors inside a running
//! sweep degrade to termination of that sweep without caller notification
//! (callers poll [`crate::stream::AudioStream::query_state`] if they need to
//! notice end-of-stream).

use thiserror::Error;

/// Main error type for audiostream
#[derive(Error, Debug)]
pub enum Error {
    /// The filesystem found no file matching the logical name.
    ///
    /// `open` preserves the previous stream state when this is returned.
    #[error("File not found: {filename}")]
    FileNotFound { filename: String },

    /// A matching file was located but could not be read (I/O layer).
    ///
    /// `open` closes the previous stream before returning this error.
    #[error("Failed to open {filename}: {source}")]
    FileOpen {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    /// A decoder constructor rejected the stream during setup.
    ///
    /// The opener captures the constructor's message; `open` logs a
    /// diagnostic and leaves the stream closed with no source installed.
    #[error("Audio decode setup error: {0}")]
    DecoderSetup(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using audiostream Error
pub type Result<T> = std::result::Result<T, Error>;
