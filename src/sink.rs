//! Hardware mixer sink contract
//!
//! An [`AudioSink`] owns one mixer playback channel ("source") and a small
//! fixed ring of buffer handles that decoded chunks are queued onto. The
//! concrete binding (OpenAL, a test double, ...) lives outside this crate;
//! the driver only consumes this trait.
//!
//! All operations take `&self`: the binding is expected to be internally
//! synchronized, since the control thread and the producer thread both issue
//! calls against the same sink.

use serde::{Deserialize, Serialize};

/// Handle to one buffer in the sink's ring.
///
/// Handles are opaque to the driver; they are only compared and passed back
/// to the sink (and to the data source, whose backend shares the same handle
/// namespace).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

/// Mixer-side playback state of the sink's source channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkState {
    /// Channel created, never played
    Initial,
    Playing,
    Paused,
    /// Drained or explicitly stopped
    Stopped,
}

impl std::fmt::Display for SinkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkState::Initial => write!(f, "initial"),
            SinkState::Playing => write!(f, "playing"),
            SinkState::Paused => write!(f, "paused"),
            SinkState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Mixer binding consumed by the stream driver.
pub trait AudioSink: Send + Sync + 'static {
    fn set_volume(&self, value: f32);

    fn set_pitch(&self, value: f32);

    /// Start or restart the channel
    fn play(&self);

    fn pause(&self);

    fn stop(&self);

    fn state(&self) -> SinkState;

    /// Playback position within the currently queued data, in seconds
    fn seconds_offset(&self) -> f32;

    /// Append a filled buffer to the channel's queue
    fn queue_buffer(&self, buf: BufferId);

    /// Remove the oldest processed buffer from the queue.
    ///
    /// Returns `None` when the mixer has nothing to hand back yet (the null
    /// handle); callers retry on a later pass.
    fn unqueue_buffer(&self) -> Option<BufferId>;

    /// Number of queued buffers the mixer has finished playing
    fn processed_buffer_count(&self) -> usize;

    /// Drop all queued buffers
    fn clear_queue(&self);

    /// Detach any statically attached buffer from the channel
    fn detach_buffer(&self);

    /// The fixed buffer ring this sink owns, in queue order
    fn buffers(&self) -> Vec<BufferId>;

    /// Bits per sample of the data attached to `buf`
    fn bits(&self, buf: BufferId) -> u32;

    /// Byte size of the data attached to `buf`
    fn size(&self, buf: BufferId) -> u32;

    /// Channel count of the data attached to `buf`
    fn channels(&self, buf: BufferId) -> u32;
}
