//! Source selection by content signature
//!
//! Given an open byte stream, decide which decoder backend to hand it to:
//! the first four bytes select Ogg/Vorbis (`OggS`) or MIDI (`MThd`); anything
//! else goes to the generic container source with the extension hint. MIDI
//! additionally requires a synthesizer backend, falling through to the
//! generic source without one.
//!
//! Constructor failures are captured as a message rather than propagated:
//! the filesystem may still offer further candidates, and `open` turns a
//! fully failed search into a logged diagnostic.

use crate::error::Error;
use crate::fs::{MediaStream, OpenHandler};
use crate::source::{DataSource, SourceFactory};
use std::io::{Seek, SeekFrom};

const OGG_SIGNATURE: &[u8; 4] = b"OggS";
const MIDI_SIGNATURE: &[u8; 4] = b"MThd";

/// Read up to four signature bytes, zero-padding on short or failed reads.
fn read_signature(stream: &mut dyn MediaStream) -> [u8; 4] {
    let mut sig = [0u8; 4];
    let mut filled = 0;
    while filled < sig.len() {
        match stream.read(&mut sig[filled..]) {
            Ok(0) | Err(_) => break,
            Ok(n) => filled += n,
        }
    }
    sig
}

/// Open handler that sniffs the stream signature and builds the matching
/// [`DataSource`] through a [`SourceFactory`].
pub struct SourceOpenHandler<'a> {
    factory: &'a dyn SourceFactory,
    looped: bool,
    chunk_size: usize,

    /// The constructed source, once a candidate succeeded
    pub source: Option<Box<dyn DataSource>>,

    /// Message captured from the last failed constructor
    pub error: Option<String>,
}

impl<'a> SourceOpenHandler<'a> {
    pub fn new(factory: &'a dyn SourceFactory, looped: bool, chunk_size: usize) -> Self {
        Self {
            factory,
            looped,
            chunk_size,
            source: None,
            error: None,
        }
    }
}

impl OpenHandler for SourceOpenHandler<'_> {
    fn try_read(&mut self, mut stream: Box<dyn MediaStream>, ext: Option<&str>) -> bool {
        let sig = read_signature(stream.as_mut());
        let _ = stream.seek(SeekFrom::Start(0));

        let built = if &sig == OGG_SIGNATURE {
            self.factory.create_vorbis(stream, self.looped)
        } else if &sig == MIDI_SIGNATURE && self.factory.init_midi() {
            self.factory.create_midi(stream, self.looped)
        } else {
            self.factory
                .create_generic(stream, ext, self.chunk_size, self.looped)
        };

        // Constructors consume the stream on both paths, so there is nothing
        // left to close here.
        match built {
            Ok(source) => {
                self.source = Some(source);
                true
            }
            Err(Error::DecoderSetup(msg)) => {
                self.error = Some(msg);
                false
            }
            Err(e) => {
                self.error = Some(e.to_string());
                false
            }
        }
    }
}
