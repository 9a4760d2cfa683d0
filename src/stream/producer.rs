//! Producer thread
//!
//! Runs once per play sweep. Phase 1 seeks the source and fills the whole
//! ring; phase 2 recycles buffers as the mixer finishes them, keeping the
//! frame accounting current, until the control thread requests termination
//! or the decoder fails.
//!
//! The thread never exits on EndOfStream: the mixer still has to drain what
//! is already queued, and `query_state` finalizes the sweep afterwards.

use crate::sink::{BufferId, SinkState};
use crate::source::FillStatus;
use crate::stream::StreamShared;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use tracing::{debug, trace, warn};

pub(crate) fn stream_data(shared: Arc<StreamShared>, start_offset: f64) {
    let mut first_buffer = true;
    let mut last_buf: Option<BufferId> = None;

    if shared.term_req.get() {
        return;
    }

    {
        let mut source = shared.source.lock().unwrap();
        let Some(source) = source.as_mut() else {
            return;
        };
        source.seek_to_offset(start_offset);
    }

    debug!("Producer started at offset {start_offset}s");

    // Phase 1: fill the whole ring up front.
    for &buf in &shared.ring {
        if shared.term_req.get() {
            return;
        }

        let status = fill(&shared, buf);

        if status == FillStatus::Error {
            return;
        }

        shared.sink.queue_buffer(buf);

        if first_buffer {
            // Through the pause mutex: a pause issued since `play` returned
            // must win over this initial start.
            shared.resume_stream();

            first_buffer = false;
            shared.inited.set();
        }

        if shared.term_req.get() {
            return;
        }

        if status == FillStatus::EndOfStream {
            shared.exhausted.set();
            break;
        }
    }

    // Phase 2: recycle buffers as the mixer finishes them.
    loop {
        if let Some(sync) = &shared.sync_point {
            sync.pass();
        }

        let mut proc_bufs = shared.sink.processed_buffer_count();

        while proc_bufs > 0 {
            proc_bufs -= 1;

            if shared.term_req.get() {
                break;
            }

            // Null handle: the mixer gave nothing back, try again later.
            let Some(buf) = shared.sink.unqueue_buffer() else {
                break;
            };

            if last_buf == Some(buf) {
                // The last pre-wrap buffer came back: the offset query
                // restarts at the loop point from here on.
                let loop_start = {
                    let source = shared.source.lock().unwrap();
                    source.as_ref().map(|s| s.loop_start_frames()).unwrap_or(0)
                };
                shared.proc_frames.store(loop_start, Ordering::Relaxed);
                last_buf = None;
                trace!("Loop wrap: frame counter reset to {loop_start}");
            } else {
                let bits = shared.sink.bits(buf);
                let size = shared.sink.size(buf);
                let chans = shared.sink.channels(buf);

                let bytes_per_sample = bits / 8;
                if bytes_per_sample != 0 && chans != 0 {
                    let frames = (size / bytes_per_sample) / chans;
                    shared.proc_frames.fetch_add(frames as u64, Ordering::Relaxed);
                }
            }

            if shared.exhausted.get() {
                continue;
            }

            let status = fill(&shared, buf);

            if status == FillStatus::Error {
                shared.exhausted.set();
                return;
            }

            shared.sink.queue_buffer(buf);

            if shared.sink.state() == SinkState::Stopped {
                // Underrun: the mixer drained while we were refilling.
                warn!("Mixer underrun, restarting playback");
                shared.sink.play();
            }

            if status == FillStatus::WrapAround {
                last_buf = Some(buf);
            }

            if status == FillStatus::EndOfStream {
                shared.exhausted.set();
            }
        }

        if shared.term_req.get() {
            break;
        }

        thread::sleep(shared.refill_sleep);
    }

    debug!("Producer exiting on termination request");
}

fn fill(shared: &StreamShared, buf: BufferId) -> FillStatus {
    let mut source = shared.source.lock().unwrap();
    match source.as_mut() {
        Some(source) => source.fill_buffer(buf),
        None => FillStatus::Error,
    }
}
