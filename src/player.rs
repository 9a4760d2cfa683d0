//! Public control surface
//!
//! [`Player`] bundles a stream driver with the host's filesystem and decoder
//! factory so callers hold a single handle: open a logical filename, then
//! drive playback through the usual controls. Everything delegates to the
//! driver; this layer only adds the wiring and operation-level logging.

use crate::config::StreamConfig;
use crate::error::Result;
use crate::fs::FileSystem;
use crate::sink::AudioSink;
use crate::source::SourceFactory;
use crate::stream::{AudioStream, StreamState, SyncPoint};
use std::sync::Arc;
use tracing::info;

/// One playable stream with its collaborators attached.
pub struct Player {
    stream: AudioStream,
    fs: Arc<dyn FileSystem>,
    factory: Arc<dyn SourceFactory>,
}

impl Player {
    pub fn new(
        sink: Box<dyn AudioSink>,
        fs: Arc<dyn FileSystem>,
        factory: Arc<dyn SourceFactory>,
        loop_mode: bool,
        stream_id: &str,
        config: &StreamConfig,
    ) -> Self {
        Self::new_with_sync(sink, fs, factory, loop_mode, stream_id, config, None)
    }

    pub fn new_with_sync(
        sink: Box<dyn AudioSink>,
        fs: Arc<dyn FileSystem>,
        factory: Arc<dyn SourceFactory>,
        loop_mode: bool,
        stream_id: &str,
        config: &StreamConfig,
        sync_point: Option<Arc<dyn SyncPoint>>,
    ) -> Self {
        Self {
            stream: AudioStream::new_with_sync(sink, loop_mode, stream_id, config, sync_point),
            fs,
            factory,
        }
    }

    /// Resolve and open `filename`, replacing whatever was open before.
    pub fn open(&mut self, filename: &str) -> Result<()> {
        info!("Opening audio stream: {filename}");
        self.stream
            .open(self.fs.as_ref(), self.factory.as_ref(), filename)
    }

    pub fn close(&mut self) {
        self.stream.close();
    }

    /// Start playback at `offset` seconds, or resume after a pause.
    pub fn play(&mut self, offset: f64) {
        self.stream.play(offset);
    }

    pub fn pause(&mut self) {
        self.stream.pause();
    }

    pub fn stop(&mut self) {
        self.stream.stop();
    }

    pub fn set_volume(&self, value: f32) {
        self.stream.set_volume(value);
    }

    pub fn set_pitch(&mut self, value: f32) {
        self.stream.set_pitch(value);
    }

    pub fn pitch(&self) -> f32 {
        self.stream.pitch()
    }

    pub fn state(&mut self) -> StreamState {
        self.stream.query_state()
    }

    /// Playback position in seconds within the current loop iteration
    pub fn offset(&self) -> f64 {
        self.stream.query_offset()
    }
}
