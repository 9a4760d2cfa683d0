//! Virtual filesystem seam
//!
//! The driver never opens files itself; a host-provided [`FileSystem`]
//! resolves logical names (possibly trying several candidate extensions) and
//! hands each candidate's byte stream to an [`OpenHandler`]. The handler
//! decides whether it could make use of the stream; returning `false` lets
//! the filesystem move on to the next candidate.

use crate::error::Result;
use std::io::{Read, Seek};

/// Seekable byte stream handed to an open handler.
///
/// Ownership transfers to the handler; dropping the box closes the stream.
pub trait MediaStream: Read + Seek + Send {}

impl<T: Read + Seek + Send> MediaStream for T {}

/// Callback invoked by the filesystem for each candidate file.
pub trait OpenHandler {
    /// Inspect one candidate stream.
    ///
    /// `ext` is the candidate's extension hint, when the filesystem knows
    /// one. Return `true` to accept (stops the candidate search), `false` to
    /// let the filesystem try the next candidate.
    fn try_read(&mut self, stream: Box<dyn MediaStream>, ext: Option<&str>) -> bool;
}

/// Logical-name file resolution.
///
/// Fails with [`crate::Error::FileNotFound`] when no candidate matches the
/// name, or [`crate::Error::FileOpen`] when a match exists but cannot be
/// read. The two are distinguished by `open`: the first preserves the
/// current stream, the second closes it.
pub trait FileSystem: Send + Sync {
    fn open_read(&self, handler: &mut dyn OpenHandler, filename: &str) -> Result<()>;
}
