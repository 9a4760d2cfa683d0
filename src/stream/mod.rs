//! Stream driver
//!
//! Coordinates a decoder producer thread against the hardware mixer draining
//! the sink's buffer ring. One producer thread exists per play sweep; it is
//! spawned by `play` from Stopped and joined by the stop protocol.
//!
//! State machine:
//!
//! ```text
//! Closed --open--> Stopped --play--> Playing <--play/pause--> Paused
//!   ^                 ^                 |
//!   +-----close-------+------stop-------+
//! ```
//!
//! `Closed -> Playing` is impossible without an intervening `open`; forbidden
//! transitions are silent no-ops.

mod producer;

use crate::config::StreamConfig;
use crate::error::{Error, Result};
use crate::flag::Flag;
use crate::fs::FileSystem;
use crate::sink::{AudioSink, BufferId, SinkState};
use crate::source::{DataSource, SourceFactory, SourceOpenHandler};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Control-surface state of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamState {
    Closed,
    Stopped,
    Playing,
    Paused,
}

impl std::fmt::Display for StreamState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamState::Closed => write!(f, "closed"),
            StreamState::Stopped => write!(f, "stopped"),
            StreamState::Playing => write!(f, "playing"),
            StreamState::Paused => write!(f, "paused"),
        }
    }
}

/// External coordination barrier passed by the producer once per refill
/// iteration. Hosts that gate worker threads at known points install one;
/// everyone else leaves it out.
pub trait SyncPoint: Send + Sync {
    fn pass(&self);
}

/// Everything both the control thread and the producer thread touch.
pub(crate) struct StreamShared {
    pub(crate) sink: Box<dyn AudioSink>,

    /// Exclusively owned decoder while the stream is open. Locked per call:
    /// fill/seek on the producer side, rate/pitch/loop queries on the
    /// control side.
    pub(crate) source: Mutex<Option<Box<dyn DataSource>>>,

    /// Frames consumed within the current loop iteration. Preset to
    /// `offset * rate` at sweep start, reset to the source's loop start when
    /// the marked pre-wrap buffer is recycled, zeroed by the stop protocol.
    pub(crate) proc_frames: AtomicU64,

    /// True iff a pause arrived before playback actually started. Guarded by
    /// its own mutex: the pause/resume decision must read the sink state and
    /// act on it atomically.
    pub(crate) preempt_pause: Mutex<bool>,

    /// Control thread asks the producer to exit
    pub(crate) term_req: Flag,
    /// Producer has queued its first buffer
    pub(crate) inited: Flag,
    /// Decoder returned EndOfStream or failed mid-sweep
    pub(crate) exhausted: Flag,
    /// Next start must seek even if the offset is unchanged
    pub(crate) needs_rewind: Flag,

    /// The sink's buffer ring, in queue order
    pub(crate) ring: Vec<BufferId>,

    pub(crate) sync_point: Option<Arc<dyn SyncPoint>>,
    pub(crate) refill_sleep: Duration,
}

impl StreamShared {
    /// Pause, resolving the startup race: if the sink never reached Playing,
    /// the producer hasn't started it yet, so record the intent instead of
    /// issuing a mixer pause that would be lost.
    pub(crate) fn pause_stream(&self) {
        let mut preempt = self.preempt_pause.lock().unwrap();

        if self.sink.state() != SinkState::Playing {
            *preempt = true;
        } else {
            self.sink.pause();
        }
    }

    /// Resume, honoring a pending preemptive pause: the user's pause wins
    /// over the producer's initial start.
    pub(crate) fn resume_stream(&self) {
        let mut preempt = self.preempt_pause.lock().unwrap();

        if *preempt {
            *preempt = false;
        } else {
            self.sink.play();
        }
    }
}

/// Streaming playback driver over one decoder source and one mixer sink.
pub struct AudioStream {
    looped: bool,
    state: StreamState,
    pitch: f32,
    start_offset: f64,
    thread_name: String,
    chunk_size: usize,
    shared: Arc<StreamShared>,
    producer: Option<JoinHandle<()>>,
}

impl AudioStream {
    /// Create a closed stream over `sink`.
    ///
    /// `loop_mode` is fixed for the stream's lifetime and selects looping
    /// decode on every source built for it. `stream_id` names the producer
    /// thread.
    pub fn new(
        sink: Box<dyn AudioSink>,
        loop_mode: bool,
        stream_id: &str,
        config: &StreamConfig,
    ) -> Self {
        Self::new_with_sync(sink, loop_mode, stream_id, config, None)
    }

    /// Like [`AudioStream::new`], with an external sync barrier the producer
    /// passes once per refill iteration.
    pub fn new_with_sync(
        sink: Box<dyn AudioSink>,
        loop_mode: bool,
        stream_id: &str,
        config: &StreamConfig,
        sync_point: Option<Arc<dyn SyncPoint>>,
    ) -> Self {
        sink.set_volume(1.0);
        sink.set_pitch(1.0);
        sink.detach_buffer();

        let ring = sink.buffers();

        let shared = Arc::new(StreamShared {
            sink,
            source: Mutex::new(None),
            proc_frames: AtomicU64::new(0),
            preempt_pause: Mutex::new(false),
            term_req: Flag::new(),
            inited: Flag::new(),
            exhausted: Flag::new(),
            needs_rewind: Flag::new(),
            ring,
            sync_point,
            refill_sleep: config.refill_sleep(),
        });

        Self {
            looped: loop_mode,
            state: StreamState::Closed,
            pitch: 1.0,
            start_offset: 0.0,
            thread_name: format!("audio_stream ({stream_id})"),
            chunk_size: config.chunk_size,
            shared,
            producer: None,
        }
    }

    /// Resolve `filename` through the filesystem and install the source the
    /// opener builds for it.
    ///
    /// A missing file leaves the current stream untouched. A located but
    /// unreadable file closes it. A file that no decoder accepts closes it
    /// too, logs a diagnostic, and returns `Ok` with no source installed, so
    /// later `play` calls are silent no-ops.
    pub fn open(
        &mut self,
        fs: &dyn FileSystem,
        factory: &dyn SourceFactory,
        filename: &str,
    ) -> Result<()> {
        let mut handler = SourceOpenHandler::new(factory, self.looped, self.chunk_size);

        if let Err(e) = fs.open_read(&mut handler, filename) {
            if !matches!(e, Error::FileNotFound { .. }) {
                self.close();
            }
            return Err(e);
        }

        self.close();

        match handler.source {
            Some(source) => {
                *self.shared.source.lock().unwrap() = Some(source);
                self.state = StreamState::Stopped;
            }
            None => {
                warn!(
                    "Unable to decode audio stream: {}: {}",
                    filename,
                    handler.error.as_deref().unwrap_or("no decoder matched")
                );
            }
        }

        self.shared.needs_rewind.clear();
        Ok(())
    }

    /// Stop any sweep, destroy the source, end Closed. Idempotent.
    pub fn close(&mut self) {
        self.check_stopped();

        match self.state {
            StreamState::Playing | StreamState::Paused => {
                self.stop_stream();
                self.close_source();
                self.state = StreamState::Closed;
            }
            StreamState::Stopped => {
                self.close_source();
                self.state = StreamState::Closed;
            }
            StreamState::Closed => {}
        }
    }

    /// Start a sweep at `offset` seconds, or resume a paused one.
    ///
    /// No-op when Closed, already Playing, or no source is installed.
    pub fn play(&mut self, offset: f64) {
        if self.shared.source.lock().unwrap().is_none() {
            return;
        }

        self.check_stopped();

        match self.state {
            StreamState::Closed | StreamState::Playing => return,
            StreamState::Stopped => self.start_stream(offset),
            StreamState::Paused => self.shared.resume_stream(),
        }

        self.state = StreamState::Playing;
    }

    /// Pause a running sweep. No-op unless Playing.
    pub fn pause(&mut self) {
        self.check_stopped();

        match self.state {
            StreamState::Closed | StreamState::Stopped | StreamState::Paused => return,
            StreamState::Playing => self.shared.pause_stream(),
        }

        self.state = StreamState::Paused;
    }

    /// End the current sweep. No-op when Closed or already Stopped.
    pub fn stop(&mut self) {
        self.check_stopped();

        match self.state {
            StreamState::Closed | StreamState::Stopped => return,
            StreamState::Playing | StreamState::Paused => self.stop_stream(),
        }

        self.state = StreamState::Stopped;
    }

    pub fn set_volume(&self, value: f32) {
        self.shared.sink.set_volume(value);
    }

    /// Apply pitch where it belongs: sources that pre-resample absorb it and
    /// the mixer stays at 1.0; otherwise the mixer applies it.
    pub fn set_pitch(&mut self, value: f32) {
        self.pitch = value;

        let mut source = self.shared.source.lock().unwrap();
        let absorbed = source.as_mut().map(|s| s.set_pitch(value)).unwrap_or(false);
        drop(source);

        if absorbed {
            self.shared.sink.set_pitch(1.0);
        } else {
            self.shared.sink.set_pitch(value);
        }
    }

    /// Last requested pitch
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Current state, after folding in a sweep that ended on its own.
    pub fn query_state(&mut self) -> StreamState {
        self.check_stopped();
        self.state
    }

    /// Wall seconds within the current loop iteration.
    ///
    /// Combines the frames already recycled through the ring with the sink's
    /// own position inside the still-queued data. Resets at loop wrap when
    /// the marked pre-wrap buffer is recycled.
    pub fn query_offset(&self) -> f64 {
        if self.state == StreamState::Closed {
            return 0.0;
        }

        let source = self.shared.source.lock().unwrap();
        let Some(source) = source.as_ref() else {
            return 0.0;
        };

        let proc_offset =
            self.shared.proc_frames.load(Ordering::Relaxed) as f64 / source.sample_rate() as f64;

        proc_offset + self.shared.sink.seconds_offset() as f64
    }

    /// Offset the current sweep started at, in seconds
    pub fn start_offset(&self) -> f64 {
        self.start_offset
    }

    fn close_source(&mut self) {
        *self.shared.source.lock().unwrap() = None;
    }

    /// Start protocol: clean ring, fresh flags, preset frame counter, spawn
    /// the producer.
    fn start_stream(&mut self, offset: f64) {
        self.shared.sink.clear_queue();

        *self.shared.preempt_pause.lock().unwrap() = false;
        self.shared.inited.clear();
        self.shared.exhausted.clear();
        self.shared.term_req.clear();

        self.start_offset = offset;

        let rate = {
            let source = self.shared.source.lock().unwrap();
            source.as_ref().map(|s| s.sample_rate()).unwrap_or(0)
        };
        self.shared
            .proc_frames
            .store((offset * rate as f64) as u64, Ordering::Relaxed);

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || producer::stream_data(shared, offset));

        match spawned {
            Ok(handle) => self.producer = Some(handle),
            Err(e) => error!("Failed to spawn producer thread {}: {}", self.thread_name, e),
        }
    }

    /// Stop protocol: ask the producer to exit, join it, and only then stop
    /// the mixer. Stopping first would race: the producer could have
    /// restarted the sink (underrun recovery, initial resume) after our stop
    /// but before seeing the term request.
    fn stop_stream(&mut self) {
        self.shared.term_req.set();

        if let Some(handle) = self.producer.take() {
            if handle.join().is_err() {
                warn!("Producer thread {} panicked", self.thread_name);
            }
            self.shared.needs_rewind.set();
        }

        self.shared.sink.stop();

        self.shared.proc_frames.store(0, Ordering::Relaxed);
    }

    /// Self-healing transition: notice that a sweep genuinely finished (EOF
    /// reached and hardware drained) and fold Playing into Stopped.
    ///
    /// A sink that is not playing while the source is NOT exhausted is just
    /// an underrun, and a producer that has not queued anything yet gives the
    /// sink state no meaning; both leave the state alone.
    fn check_stopped(&mut self) {
        if self.state != StreamState::Playing {
            return;
        }

        if !self.shared.inited.get() {
            return;
        }

        if !self.shared.exhausted.get() {
            return;
        }

        if self.shared.sink.state() == SinkState::Playing {
            return;
        }

        debug!("Stream {} drained, folding into Stopped", self.thread_name);
        self.stop_stream();
        self.state = StreamState::Stopped;
    }
}

impl Drop for AudioStream {
    fn drop(&mut self) {
        self.close();
        self.shared.sink.clear_queue();
    }
}
