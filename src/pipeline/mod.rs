// SPDX-License-Identifier: GPL-3.0-only

//! Pipeline engine abstraction
//!
//! The stream sink never touches a media framework directly. It asks a
//! [`PipelineEngine`] to build a pipeline from a textual description and then
//! drives the returned [`PipelineHandle`] through its lifecycle:
//!
//! ```text
//! create(description) ─► attach_sink(name) ─► samples() ─► play()
//!                                                            │
//!                             stream closes ◄── destroy() ◄──┘
//! ```
//!
//! # Modules
//!
//! - [`gst`]: GStreamer engine (`parse::launch` + appsink)
//! - [`fake`]: in-memory engine used by tests and dry runs
//! - [`stream`]: closable bounded sample stream shared by both engines

pub mod fake;
pub mod gst;
pub mod stream;

pub use stream::{SampleStream, StreamWriter};

use crate::errors::CaptureResult;

/// A constructed capture pipeline
///
/// Owned exclusively by the lifecycle controller.
pub trait PipelineHandle: Send {
    /// Connect the named sink element to the sample stream
    fn attach_sink(&mut self, name: &str) -> CaptureResult<()>;

    /// Start playback
    fn play(&mut self) -> CaptureResult<()>;

    /// Stop and release the pipeline
    ///
    /// Closes the sample stream. Best-effort: anomalies are logged, never
    /// returned. Calling it twice is harmless.
    fn destroy(&mut self);

    /// Take the receiving end of the sample stream
    ///
    /// Returns `None` once taken.
    fn samples(&mut self) -> Option<SampleStream>;
}

/// Factory for pipelines
pub trait PipelineEngine: Send + Sync {
    /// Build a pipeline from its textual description
    fn create(&self, description: &str) -> CaptureResult<Box<dyn PipelineHandle>>;
}
