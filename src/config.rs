//! Stream driver configuration
//!
//! All tunables have built-in defaults; hosts may embed [`StreamConfig`] in
//! their own TOML configuration and override individual fields.
//!
//! # Configuration Philosophy
//!
//! - **Built-in defaults**: Defined in code, not external files
//! - **Minimal by design**: Only knobs the driver actually consults

use serde::Deserialize;
use std::time::Duration;

fn default_chunk_size() -> usize {
    32768
}

fn default_refill_sleep_ms() -> u64 {
    10
}

/// Driver tunables.
///
/// `chunk_size` is handed to the generic source constructor as its decode
/// chunk length; `refill_sleep_ms` is the pause between refill passes of the
/// producer thread.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    /// Byte length of each decode chunk for the generic source path
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Producer sleep between refill passes, in milliseconds
    #[serde(default = "default_refill_sleep_ms")]
    pub refill_sleep_ms: u64,
}

impl StreamConfig {
    /// Refill sleep as a [`Duration`]
    pub fn refill_sleep(&self) -> Duration {
        Duration::from_millis(self.refill_sleep_ms)
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            refill_sleep_ms: default_refill_sleep_ms(),
        }
    }
}
