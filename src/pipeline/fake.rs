// SPDX-License-Identifier: GPL-3.0-only

//! In-memory pipeline engine
//!
//! Records every lifecycle call and lets the caller inject samples into the
//! live pipeline. Used by the test suite and by `stream-sink run --dry-run`.

use super::stream::{SampleStream, StreamWriter};
use super::{PipelineEngine, PipelineHandle};
use crate::constants::pipeline;
use crate::errors::{CaptureError, CaptureResult};
use crate::sample::Sample;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;

#[derive(Default)]
struct EngineState {
    creates: AtomicUsize,
    destroys: AtomicUsize,
    plays: AtomicUsize,
    descriptions: Mutex<Vec<String>>,
    sinks: Mutex<Vec<String>>,
    /// Writer of the most recently created pipeline
    current: Mutex<Option<StreamWriter>>,
    fail_with: Mutex<Option<String>>,
    fail_attach: AtomicBool,
    fail_play: AtomicBool,
    create_delay: Mutex<Option<Duration>>,
}

impl EngineState {
    fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
        m.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Engine that builds recording, in-memory pipelines
#[derive(Clone, Default)]
pub struct FakeEngine {
    state: Arc<EngineState>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `create` calls fail with the given message
    pub fn fail_with(&self, message: impl Into<String>) {
        *EngineState::lock(&self.state.fail_with) = Some(message.into());
    }

    /// Let `create` succeed again
    pub fn clear_failure(&self) {
        *EngineState::lock(&self.state.fail_with) = None;
    }

    /// Make `attach_sink` on new pipelines fail
    pub fn fail_attach(&self, fail: bool) {
        self.state.fail_attach.store(fail, Ordering::SeqCst);
    }

    /// Make `play` on new pipelines fail
    pub fn fail_play(&self, fail: bool) {
        self.state.fail_play.store(fail, Ordering::SeqCst);
    }

    /// Sleep inside `create`, simulating slow resource allocation
    pub fn set_create_delay(&self, delay: Duration) {
        *EngineState::lock(&self.state.create_delay) = Some(delay);
    }

    /// Number of pipelines successfully constructed
    pub fn create_count(&self) -> usize {
        self.state.creates.load(Ordering::SeqCst)
    }

    /// Number of pipelines destroyed
    pub fn destroy_count(&self) -> usize {
        self.state.destroys.load(Ordering::SeqCst)
    }

    /// Number of pipelines that reached playback
    pub fn play_count(&self) -> usize {
        self.state.plays.load(Ordering::SeqCst)
    }

    /// Descriptions passed to `create`, in call order
    pub fn descriptions(&self) -> Vec<String> {
        EngineState::lock(&self.state.descriptions).clone()
    }

    /// Sink names passed to `attach_sink`, in call order
    pub fn sinks(&self) -> Vec<String> {
        EngineState::lock(&self.state.sinks).clone()
    }

    /// Push a sample out of the most recent pipeline
    ///
    /// Blocks while that pipeline's stream is full. Returns `false` if there
    /// is no pipeline or it was destroyed.
    pub fn push(&self, sample: Sample) -> bool {
        let writer = EngineState::lock(&self.state.current).clone();
        match writer {
            Some(writer) => writer.push(sample),
            None => false,
        }
    }
}

impl PipelineEngine for FakeEngine {
    fn create(&self, description: &str) -> CaptureResult<Box<dyn PipelineHandle>> {
        EngineState::lock(&self.state.descriptions).push(description.to_string());

        let delay = *EngineState::lock(&self.state.create_delay);
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        if let Some(message) = EngineState::lock(&self.state.fail_with).clone() {
            return Err(CaptureError::PipelineConstructionFailed(message));
        }

        let (writer, stream) = StreamWriter::channel(pipeline::STREAM_CAPACITY);
        *EngineState::lock(&self.state.current) = Some(writer.clone());
        self.state.creates.fetch_add(1, Ordering::SeqCst);
        debug!(description, "Fake pipeline created");

        Ok(Box::new(FakePipeline {
            engine: Arc::clone(&self.state),
            writer,
            stream: Some(stream),
            destroyed: false,
        }))
    }
}

struct FakePipeline {
    engine: Arc<EngineState>,
    writer: StreamWriter,
    stream: Option<SampleStream>,
    destroyed: bool,
}

impl PipelineHandle for FakePipeline {
    fn attach_sink(&mut self, name: &str) -> CaptureResult<()> {
        EngineState::lock(&self.engine.sinks).push(name.to_string());
        if self.engine.fail_attach.load(Ordering::SeqCst) {
            return Err(CaptureError::PipelineConstructionFailed(format!(
                "No element named {}",
                name
            )));
        }
        Ok(())
    }

    fn play(&mut self) -> CaptureResult<()> {
        if self.engine.fail_play.load(Ordering::SeqCst) {
            return Err(CaptureError::PipelineConstructionFailed(
                "Failed to start pipeline".to_string(),
            ));
        }
        self.engine.plays.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.writer.close();
        self.engine.destroys.fetch_add(1, Ordering::SeqCst);
    }

    fn samples(&mut self) -> Option<SampleStream> {
        self.stream.take()
    }
}

impl Drop for FakePipeline {
    fn drop(&mut self) {
        self.destroy();
    }
}
