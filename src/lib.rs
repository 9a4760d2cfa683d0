//! # audiostream
//!
//! Streaming audio playback engine: decode a compressed or structured audio
//! file incrementally and feed a hardware mixer through a small circular
//! buffer queue.
//!
//! The core is the stream driver ([`stream::AudioStream`]): a
//! Closed/Stopped/Playing/Paused state machine coordinating a decoder
//! producer thread against the mixer draining the sink's buffer ring, with
//! loop-aware offset accounting, silent underrun recovery, and pause
//! requests that win races against startup latency.
//!
//! Decoders, the mixer binding, and the virtual filesystem are host-provided
//! collaborators behind the [`source::DataSource`], [`sink::AudioSink`], and
//! [`fs::FileSystem`] traits.

pub mod config;
pub mod error;
pub mod flag;
pub mod fs;
pub mod player;
pub mod sink;
pub mod source;
pub mod stream;

pub use config::StreamConfig;
pub use error::{Error, Result};
pub use player::Player;
pub use sink::{AudioSink, BufferId, SinkState};
pub use source::{DataSource, FillStatus, SourceFactory};
pub use stream::{AudioStream, StreamState, SyncPoint};
