// SPDX-License-Identifier: GPL-3.0-only

//! stream-sink - shared capture pipeline lifecycle manager
//!
//! Many consumers ("listeners") share one capture pipeline. The pipeline is
//! built when the first listener arrives and destroyed when the last one
//! leaves, while a background relay moves its samples into a bounded queue.
//!
//! # Architecture
//!
//! - [`capture`]: listener counting, pipeline lifecycle, relay and queue
//! - [`pipeline`]: engine abstraction plus GStreamer and in-memory engines
//! - [`codec`]: codec descriptors
//! - [`config`]: JSON configuration
//!
//! # Example
//!
//! ```ignore
//! let engine = Arc::new(GstEngine::new()?);
//! let manager = StreamSinkManager::from_config(&StreamSinkConfig::default(), engine);
//! manager.add_listener()?;
//! while let Some(sample) = manager.sample_queue().recv() {
//!     // hand off to the transport
//! }
//! ```

pub mod capture;
pub mod codec;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipeline;
pub mod sample;

// Re-export commonly used types
pub use capture::{SampleQueue, StreamSinkManager};
pub use codec::{Codec, CodecKind};
pub use config::StreamSinkConfig;
pub use errors::{CaptureError, CaptureResult};
pub use pipeline::{PipelineEngine, PipelineHandle};
pub use sample::Sample;
