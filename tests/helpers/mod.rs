//! Test helper doubles for stream driver integration tests
//!
//! Provides reusable test infrastructure components:
//! - MockMixer: a scripted mixer backend with test-side drain control
//! - ScriptedSource: a DataSource following a scripted status sequence
//! - OneShotFactory / ScriptedFs: wiring for the open path
//! - Gate / wait_until: synchronization for timing-sensitive scenarios

// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use audiostream::error::Error;
use audiostream::fs::{FileSystem, MediaStream, OpenHandler};
use audiostream::sink::{AudioSink, BufferId, SinkState};
use audiostream::source::{DataSource, FillStatus, SourceFactory};
use audiostream::Result;
use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

/// Format of a chunk attached to a mixer buffer
#[derive(Debug, Clone, Copy)]
pub struct BufferData {
    pub bits: u32,
    pub channels: u32,
    pub size: u32,
}

impl BufferData {
    /// 16-bit stereo chunk holding `frames` frames
    pub fn stereo16(frames: u32) -> Self {
        Self {
            bits: 16,
            channels: 2,
            size: frames * 4,
        }
    }
}

struct MixerInner {
    state: SinkState,
    queued: VecDeque<BufferId>,
    processed: VecDeque<BufferId>,
    data: HashMap<BufferId, BufferData>,
    volume: f32,
    pitch: f32,
    play_calls: usize,
    pause_calls: usize,
    stop_calls: usize,
    ops: usize,
}

/// Mixer backend double.
///
/// The driver sees an [`AudioSink`]; the test sees drain control and call
/// counters. `drain(n)` plays the test's part of the hardware: it moves the
/// n oldest queued buffers into the processed set the producer recycles.
#[derive(Clone)]
pub struct MockMixer {
    inner: Arc<Mutex<MixerInner>>,
    ring: Vec<BufferId>,
}

impl MockMixer {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MixerInner {
                state: SinkState::Initial,
                queued: VecDeque::new(),
                processed: VecDeque::new(),
                data: HashMap::new(),
                volume: 0.0,
                pitch: 0.0,
                play_calls: 0,
                pause_calls: 0,
                stop_calls: 0,
                ops: 0,
            })),
            ring: vec![BufferId(1), BufferId(2), BufferId(3)],
        }
    }

    /// Pretend the hardware finished playing the `n` oldest queued buffers.
    pub fn drain(&self, n: usize) {
        let mut inner = self.inner.lock().unwrap();
        for _ in 0..n {
            match inner.queued.pop_front() {
                Some(buf) => inner.processed.push_back(buf),
                None => break,
            }
        }
    }

    /// Force the mixer channel state (e.g. Stopped, to simulate a drain
    /// the driver has not caused).
    pub fn force_state(&self, state: SinkState) {
        self.inner.lock().unwrap().state = state;
    }

    /// Attach chunk format data to a buffer (called by the scripted source,
    /// standing in for the decoder backend's upload).
    pub fn attach(&self, buf: BufferId, data: BufferData) {
        self.inner.lock().unwrap().data.insert(buf, data);
    }

    pub fn queued_len(&self) -> usize {
        self.inner.lock().unwrap().queued.len()
    }

    pub fn processed_len(&self) -> usize {
        self.inner.lock().unwrap().processed.len()
    }

    pub fn play_calls(&self) -> usize {
        self.inner.lock().unwrap().play_calls
    }

    pub fn pause_calls(&self) -> usize {
        self.inner.lock().unwrap().pause_calls
    }

    pub fn stop_calls(&self) -> usize {
        self.inner.lock().unwrap().stop_calls
    }

    pub fn volume(&self) -> f32 {
        self.inner.lock().unwrap().volume
    }

    pub fn pitch(&self) -> f32 {
        self.inner.lock().unwrap().pitch
    }

    /// Total count of sink operations the driver has issued
    pub fn ops(&self) -> usize {
        self.inner.lock().unwrap().ops
    }
}

impl AudioSink for MockMixer {
    fn set_volume(&self, value: f32) {
        let mut inner = self.inner.lock().unwrap();
        inner.ops += 1;
        inner.volume = value;
    }

    fn set_pitch(&self, value: f32) {
        let mut inner = self.inner.lock().unwrap();
        inner.ops += 1;
        inner.pitch = value;
    }

    fn play(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.ops += 1;
        inner.play_calls += 1;
        inner.state = SinkState::Playing;
    }

    fn pause(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.ops += 1;
        inner.pause_calls += 1;
        inner.state = SinkState::Paused;
    }

    fn stop(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.ops += 1;
        inner.stop_calls += 1;
        inner.state = SinkState::Stopped;
    }

    fn state(&self) -> SinkState {
        let mut inner = self.inner.lock().unwrap();
        inner.ops += 1;
        inner.state
    }

    fn seconds_offset(&self) -> f32 {
        let mut inner = self.inner.lock().unwrap();
        inner.ops += 1;
        0.0
    }

    fn queue_buffer(&self, buf: BufferId) {
        let mut inner = self.inner.lock().unwrap();
        inner.ops += 1;
        inner.queued.push_back(buf);
    }

    fn unqueue_buffer(&self) -> Option<BufferId> {
        let mut inner = self.inner.lock().unwrap();
        inner.ops += 1;
        inner.processed.pop_front()
    }

    fn processed_buffer_count(&self) -> usize {
        let mut inner = self.inner.lock().unwrap();
        inner.ops += 1;
        inner.processed.len()
    }

    fn clear_queue(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.ops += 1;
        inner.queued.clear();
        inner.processed.clear();
    }

    fn detach_buffer(&self) {
        self.inner.lock().unwrap().ops += 1;
    }

    fn buffers(&self) -> Vec<BufferId> {
        self.inner.lock().unwrap().ops += 1;
        self.ring.clone()
    }

    fn bits(&self, buf: BufferId) -> u32 {
        let mut inner = self.inner.lock().unwrap();
        inner.ops += 1;
        inner.data.get(&buf).map(|d| d.bits).unwrap_or(0)
    }

    fn size(&self, buf: BufferId) -> u32 {
        let mut inner = self.inner.lock().unwrap();
        inner.ops += 1;
        inner.data.get(&buf).map(|d| d.size).unwrap_or(0)
    }

    fn channels(&self, buf: BufferId) -> u32 {
        let mut inner = self.inner.lock().unwrap();
        inner.ops += 1;
        inner.data.get(&buf).map(|d| d.channels).unwrap_or(0)
    }
}

/// Reusable open/wait latch for holding the producer at a known point
pub struct Gate {
    open: Mutex<bool>,
    cv: Condvar,
}

impl Gate {
    pub fn closed() -> Arc<Self> {
        Arc::new(Self {
            open: Mutex::new(false),
            cv: Condvar::new(),
        })
    }

    pub fn open(&self) {
        let mut open = self.open.lock().unwrap();
        *open = true;
        self.cv.notify_all();
    }

    pub fn wait(&self) {
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.cv.wait(open).unwrap();
        }
    }
}

/// DataSource double following a scripted status sequence.
///
/// Each fill attaches a fixed-format chunk to the target buffer through the
/// shared mixer (the stand-in for the decoder backend's buffer upload) and
/// returns the next scripted status; once the script runs out, every further
/// fill returns `Normal`.
pub struct ScriptedSource {
    mixer: MockMixer,
    statuses: VecDeque<FillStatus>,
    chunk: BufferData,
    sample_rate: u32,
    loop_start: u64,
    absorbs_pitch: bool,
    fills: Arc<AtomicUsize>,
    seeks: Arc<Mutex<Vec<f64>>>,
    gate: Option<Arc<Gate>>,
}

impl ScriptedSource {
    pub fn new(mixer: MockMixer) -> Self {
        Self {
            mixer,
            statuses: VecDeque::new(),
            chunk: BufferData::stereo16(4410),
            sample_rate: 44100,
            loop_start: 0,
            absorbs_pitch: false,
            fills: Arc::new(AtomicUsize::new(0)),
            seeks: Arc::new(Mutex::new(Vec::new())),
            gate: None,
        }
    }

    pub fn with_statuses(mut self, statuses: Vec<FillStatus>) -> Self {
        self.statuses = statuses.into();
        self
    }

    pub fn with_loop_start(mut self, frames: u64) -> Self {
        self.loop_start = frames;
        self
    }

    pub fn absorbing_pitch(mut self) -> Self {
        self.absorbs_pitch = true;
        self
    }

    /// Block the first fill until `gate` opens
    pub fn with_gate(mut self, gate: Arc<Gate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Shared fill counter, valid after the source moved into the driver
    pub fn fill_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.fills)
    }

    /// Shared seek log, valid after the source moved into the driver
    pub fn seek_log(&self) -> Arc<Mutex<Vec<f64>>> {
        Arc::clone(&self.seeks)
    }
}

impl DataSource for ScriptedSource {
    fn fill_buffer(&mut self, buf: BufferId) -> FillStatus {
        if let Some(gate) = self.gate.take() {
            gate.wait();
        }

        let status = self.statuses.pop_front().unwrap_or(FillStatus::Normal);
        if status != FillStatus::Error {
            self.mixer.attach(buf, self.chunk);
        }
        self.fills.fetch_add(1, Ordering::SeqCst);
        status
    }

    fn seek_to_offset(&mut self, seconds: f64) {
        self.seeks.lock().unwrap().push(seconds);
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn loop_start_frames(&self) -> u64 {
        self.loop_start
    }

    fn set_pitch(&mut self, _pitch: f32) -> bool {
        self.absorbs_pitch
    }
}

/// Factory handing out pre-built sources, one per successful open
pub struct OneShotFactory {
    sources: Mutex<VecDeque<Box<dyn DataSource>>>,
    fail_message: Option<&'static str>,
}

impl OneShotFactory {
    pub fn with_source(source: ScriptedSource) -> Arc<Self> {
        Self::with_sources(vec![source])
    }

    pub fn with_sources(sources: Vec<ScriptedSource>) -> Arc<Self> {
        let boxed = sources
            .into_iter()
            .map(|s| Box::new(s) as Box<dyn DataSource>)
            .collect();
        Arc::new(Self {
            sources: Mutex::new(boxed),
            fail_message: None,
        })
    }

    pub fn failing(message: &'static str) -> Arc<Self> {
        Arc::new(Self {
            sources: Mutex::new(VecDeque::new()),
            fail_message: Some(message),
        })
    }

    fn next(&self) -> Result<Box<dyn DataSource>> {
        if let Some(msg) = self.fail_message {
            return Err(Error::DecoderSetup(msg.to_string()));
        }
        self.sources
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::DecoderSetup("factory exhausted".to_string()))
    }
}

impl SourceFactory for OneShotFactory {
    fn create_vorbis(
        &self,
        _stream: Box<dyn MediaStream>,
        _looped: bool,
    ) -> Result<Box<dyn DataSource>> {
        self.next()
    }

    fn create_midi(
        &self,
        _stream: Box<dyn MediaStream>,
        _looped: bool,
    ) -> Result<Box<dyn DataSource>> {
        self.next()
    }

    fn create_generic(
        &self,
        _stream: Box<dyn MediaStream>,
        _ext: Option<&str>,
        _chunk_size: usize,
        _looped: bool,
    ) -> Result<Box<dyn DataSource>> {
        self.next()
    }

    fn init_midi(&self) -> bool {
        false
    }
}

/// How the scripted filesystem treats one logical name
pub enum FsEntry {
    Content(Vec<u8>, Option<&'static str>),
    OpenError,
}

/// Filesystem double resolving logical names from a fixed table.
///
/// Names absent from the table fail with FileNotFound; `OpenError` entries
/// fail with FileOpen; content entries hand the handler a cursor over the
/// bytes (the handler's verdict does not fail the call, matching a search
/// that simply found no decoder).
pub struct ScriptedFs {
    entries: HashMap<String, FsEntry>,
}

impl ScriptedFs {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn with_file(mut self, name: &str, bytes: &[u8], ext: Option<&'static str>) -> Self {
        self.entries
            .insert(name.to_string(), FsEntry::Content(bytes.to_vec(), ext));
        self
    }

    pub fn with_unreadable(mut self, name: &str) -> Self {
        self.entries.insert(name.to_string(), FsEntry::OpenError);
        self
    }
}

impl FileSystem for ScriptedFs {
    fn open_read(&self, handler: &mut dyn OpenHandler, filename: &str) -> Result<()> {
        match self.entries.get(filename) {
            None => Err(Error::FileNotFound {
                filename: filename.to_string(),
            }),
            Some(FsEntry::OpenError) => Err(Error::FileOpen {
                filename: filename.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "unreadable"),
            }),
            Some(FsEntry::Content(bytes, ext)) => {
                handler.try_read(Box::new(Cursor::new(bytes.clone())), *ext);
                Ok(())
            }
        }
    }
}

/// Install the test log subscriber; repeated calls are no-ops.
///
/// Run with `RUST_LOG=audiostream=trace` to watch the driver's diagnostics
/// (underrun restarts, decoder-rejection warnings) while a test runs.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "audiostream=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Poll `cond` until it holds or a two-second deadline passes.
pub fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if cond() {
            return;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    panic!("timed out waiting for {what}");
}
