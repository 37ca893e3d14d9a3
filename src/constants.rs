// SPDX-License-Identifier: GPL-3.0-only

//! Crate-wide constants

/// Number of samples the consumer queue holds before the relay blocks
pub const SAMPLE_QUEUE_CAPACITY: usize = 100;

/// Sink element names are this prefix followed by the codec kind
pub const APPSINK_PREFIX: &str = "appsink";

/// Pipeline-side settings
pub mod pipeline {
    /// Samples buffered between the appsink callback and the relay thread
    pub const STREAM_CAPACITY: usize = 8;
}

/// Timing constants
pub mod timing {
    /// Pipeline state change timeout on stop
    pub const STOP_TIMEOUT_SECS: u64 = 2;

    /// How often a blocked appsink callback re-checks whether the stream was closed
    pub const STREAM_SEND_POLL_MS: u64 = 50;

    /// Sample counter modulo for periodic logging
    pub const SAMPLE_LOG_INTERVAL: u64 = 300;
}
