//! Decoder source contract
//!
//! A [`DataSource`] decodes one audio stream incrementally, one buffer at a
//! time, and knows its own loop semantics. Concrete decoders (Vorbis, MIDI
//! synthesis, container formats) live outside this crate behind a
//! [`SourceFactory`]; the driver and the opener only consume these traits.

pub mod opener;

pub use opener::SourceOpenHandler;

use crate::error::Result;
use crate::fs::MediaStream;
use crate::sink::BufferId;

/// Outcome of one [`DataSource::fill_buffer`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillStatus {
    /// Chunk produced, more to come
    Normal,
    /// Chunk produced; no more data will ever come
    EndOfStream,
    /// Chunk produced; it spans the loop boundary and is the last chunk of
    /// the pre-wrap iteration
    WrapAround,
    /// Unrecoverable decoder failure
    Error,
}

/// Incremental decoder consumed by the stream driver.
///
/// `fill_buffer` attaches the decoded chunk to `buf` through the source's
/// own backend binding; the sink later reports that chunk's format via its
/// buffer introspection calls.
pub trait DataSource: Send {
    /// Decode the next chunk and attach it to `buf`
    fn fill_buffer(&mut self, buf: BufferId) -> FillStatus;

    /// Re-position the decode cursor
    fn seek_to_offset(&mut self, seconds: f64);

    /// Frames per second
    fn sample_rate(&self) -> u32;

    /// Frame index where the loop point begins (often 0)
    fn loop_start_frames(&self) -> u64;

    /// Apply pitch inside the source.
    ///
    /// Returns `true` when the source absorbed the pitch itself (it
    /// pre-resamples); the mixer's own pitch must then stay at 1.0. Returns
    /// `false` when the mixer has to apply it.
    fn set_pitch(&mut self, pitch: f32) -> bool;
}

/// Constructor seam for the out-of-scope decoder implementations.
///
/// Every constructor consumes the stream: on success it is owned by the
/// returned source, on failure it is dropped before the error is returned.
pub trait SourceFactory: Send + Sync {
    /// Build the Ogg/Vorbis source
    fn create_vorbis(
        &self,
        stream: Box<dyn MediaStream>,
        looped: bool,
    ) -> Result<Box<dyn DataSource>>;

    /// Build the MIDI synthesizer source
    fn create_midi(
        &self,
        stream: Box<dyn MediaStream>,
        looped: bool,
    ) -> Result<Box<dyn DataSource>>;

    /// Build the generic container source
    fn create_generic(
        &self,
        stream: Box<dyn MediaStream>,
        ext: Option<&str>,
        chunk_size: usize,
        looped: bool,
    ) -> Result<Box<dyn DataSource>>;

    /// Initialize the synthesizer global state if it has not been yet.
    ///
    /// Returns whether a synthesizer backend is available at all; when it is
    /// not, MIDI files fall through to the generic source.
    fn init_midi(&self) -> bool;
}
