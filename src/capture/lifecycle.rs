// SPDX-License-Identifier: GPL-3.0-only

//! Pipeline lifecycle controller
//!
//! Owns the single pipeline handle of a stream sink and serializes its
//! creation and destruction:
//!
//! ```text
//!              create_pipeline() ok
//!   NoPipeline ────────────────────► Running
//!       ▲                               │
//!       └────── destroy_pipeline() ─────┘
//! ```
//!
//! `create_pipeline()` while running returns
//! [`CaptureError::PipelineAlreadyExists`]; `destroy_pipeline()` while idle
//! does nothing. Every successful creation starts one relay thread, and
//! `shutdown()` joins all of them.

use super::framerate::FramerateSettings;
use super::queue::QueueWriter;
use super::relay::RelayTask;
use crate::codec::Codec;
use crate::errors::{CaptureError, CaptureResult};
use crate::pipeline::{PipelineEngine, PipelineHandle};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Produces the pipeline description for each creation
pub type DescriptionProvider = Box<dyn Fn() -> CaptureResult<String> + Send + Sync>;

/// Wrap a fallible closure as a [`DescriptionProvider`]
///
/// The closure's error message is kept verbatim.
pub fn description_provider<F, E>(provider: F) -> DescriptionProvider
where
    F: Fn() -> Result<String, E> + Send + Sync + 'static,
    E: fmt::Display,
{
    Box::new(move || {
        provider().map_err(|e| CaptureError::DescriptionProviderFailed(e.to_string()))
    })
}

#[derive(Default)]
struct LifecycleState {
    handle: Option<Box<dyn PipelineHandle>>,
    description: Option<String>,
}

/// Controller guaranteeing at most one live pipeline
pub struct PipelineLifecycle {
    engine: Arc<dyn PipelineEngine>,
    codec: Codec,
    provider: DescriptionProvider,
    framerate: FramerateSettings,
    queue: QueueWriter,
    state: Mutex<LifecycleState>,
    /// Relays not yet joined by shutdown
    relays: Mutex<Vec<RelayTask>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl PipelineLifecycle {
    pub(crate) fn new(
        engine: Arc<dyn PipelineEngine>,
        codec: Codec,
        provider: DescriptionProvider,
        queue: QueueWriter,
    ) -> Self {
        Self {
            engine,
            codec,
            provider,
            framerate: FramerateSettings::new(),
            queue,
            state: Mutex::new(LifecycleState::default()),
            relays: Mutex::new(Vec::new()),
        }
    }

    /// Framerate override applied at the next creation
    pub fn framerate(&self) -> &FramerateSettings {
        &self.framerate
    }

    /// Build and start the pipeline
    pub fn create_pipeline(&self) -> CaptureResult<()> {
        let mut state = lock(&self.state);

        if state.handle.is_some() {
            return Err(CaptureError::PipelineAlreadyExists);
        }

        let description = (self.provider)()?;
        let description = self.framerate.apply(&description).into_owned();

        info!(
            codec = %self.codec.name,
            src = %description,
            "creating pipeline"
        );

        let mut handle = self.engine.create(&description)?;

        if let Err(e) = self.start(handle.as_mut()) {
            handle.destroy();
            return Err(e);
        }

        state.handle = Some(handle);
        state.description = Some(description);
        Ok(())
    }

    /// Attach the sink, start playback and launch the relay
    fn start(&self, handle: &mut dyn PipelineHandle) -> CaptureResult<()> {
        let sink = self.codec.appsink_name();
        handle.attach_sink(&sink)?;

        let stream = handle.samples().ok_or_else(|| {
            CaptureError::PipelineConstructionFailed("Sample stream already taken".to_string())
        })?;

        handle.play()?;

        let relay = RelayTask::spawn(&format!("relay-{}", sink), stream, self.queue.clone())
            .map_err(|e| {
                CaptureError::PipelineConstructionFailed(format!("Failed to spawn relay: {}", e))
            })?;

        let mut relays = lock(&self.relays);
        relays.retain(RelayTask::is_running);
        relays.push(relay);
        debug!(relays = relays.len(), "relay registered");

        Ok(())
    }

    /// Destroy the pipeline if one is running
    pub fn destroy_pipeline(&self) {
        let mut state = lock(&self.state);

        let Some(mut handle) = state.handle.take() else {
            return;
        };

        handle.destroy();
        state.description = None;
        info!("destroying pipeline");
    }

    /// Destroy the pipeline and wait for every relay thread to exit
    pub fn shutdown(&self) {
        info!("shutdown");

        self.destroy_pipeline();

        let relays = std::mem::take(&mut *lock(&self.relays));
        for mut relay in relays {
            relay.join();
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.state).handle.is_some()
    }

    /// Description the live pipeline was built from
    pub fn description(&self) -> Option<String> {
        lock(&self.state).description.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::queue::{SampleQueue, sample_queue};
    use crate::pipeline::fake::FakeEngine;
    use crate::sample::Sample;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn lifecycle(engine: &FakeEngine, codec: Codec) -> (PipelineLifecycle, SampleQueue) {
        let (writer, queue) = sample_queue(100);
        let provider = description_provider(|| {
            Ok::<_, String>("src ! video/x-raw,framerate=30/1 ! appsink".to_string())
        });
        let lifecycle = PipelineLifecycle::new(Arc::new(engine.clone()), codec, provider, writer);
        (lifecycle, queue)
    }

    #[test]
    fn test_create_then_already_exists() {
        let engine = FakeEngine::new();
        let (lifecycle, _queue) = lifecycle(&engine, Codec::vp8());

        lifecycle.create_pipeline().unwrap();
        assert!(lifecycle.is_running());
        assert_eq!(
            lifecycle.create_pipeline(),
            Err(CaptureError::PipelineAlreadyExists)
        );
        assert_eq!(engine.create_count(), 1);

        lifecycle.shutdown();
        assert!(!lifecycle.is_running());
        assert_eq!(engine.destroy_count(), 1);
    }

    #[test]
    fn test_sink_named_after_codec_kind() {
        let engine = FakeEngine::new();
        let (lifecycle, _queue) = lifecycle(&engine, Codec::opus());
        lifecycle.create_pipeline().unwrap();
        assert_eq!(engine.sinks(), vec!["appsinkaudio".to_string()]);
        lifecycle.shutdown();
    }

    #[test]
    fn test_destroy_when_idle_is_noop() {
        let engine = FakeEngine::new();
        let (lifecycle, _queue) = lifecycle(&engine, Codec::vp8());
        lifecycle.destroy_pipeline();
        lifecycle.shutdown();
        assert_eq!(engine.destroy_count(), 0);
    }

    #[test]
    fn test_provider_failure_leaves_no_pipeline() {
        let engine = FakeEngine::new();
        let (writer, _queue) = sample_queue(100);
        let provider = description_provider(|| Err::<String, _>("display unavailable"));
        let lifecycle = PipelineLifecycle::new(Arc::new(engine.clone()), Codec::vp8(), provider, writer);

        assert_eq!(
            lifecycle.create_pipeline(),
            Err(CaptureError::DescriptionProviderFailed(
                "display unavailable".into()
            ))
        );
        assert!(!lifecycle.is_running());
        assert!(engine.descriptions().is_empty());
    }

    #[test]
    fn test_provider_called_once_per_creation() {
        let engine = FakeEngine::new();
        let (writer, _queue) = sample_queue(100);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let provider = description_provider(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>("src ! appsink".to_string())
        });
        let lifecycle = PipelineLifecycle::new(Arc::new(engine.clone()), Codec::vp8(), provider, writer);

        lifecycle.create_pipeline().unwrap();
        let _ = lifecycle.create_pipeline();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        lifecycle.destroy_pipeline();
        lifecycle.create_pipeline().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        lifecycle.shutdown();
    }

    #[test]
    fn test_framerate_rewrite_applies_on_next_creation() {
        let engine = FakeEngine::new();
        let (lifecycle, _queue) = lifecycle(&engine, Codec::vp8());

        lifecycle.create_pipeline().unwrap();
        lifecycle.framerate().set_change(15);
        lifecycle.framerate().set_adaptive(true);
        assert!(lifecycle.description().unwrap().contains("framerate=30/1"));

        lifecycle.destroy_pipeline();
        lifecycle.create_pipeline().unwrap();
        assert!(lifecycle.description().unwrap().contains("framerate=15/1"));
        assert!(engine.descriptions()[1].contains("framerate=15/1"));
        lifecycle.shutdown();
    }

    #[test]
    fn test_attach_failure_destroys_half_built_pipeline() {
        let engine = FakeEngine::new();
        let (lifecycle, _queue) = lifecycle(&engine, Codec::vp8());
        engine.fail_attach(true);

        assert!(matches!(
            lifecycle.create_pipeline(),
            Err(CaptureError::PipelineConstructionFailed(_))
        ));
        assert!(!lifecycle.is_running());
        assert!(lifecycle.description().is_none());
        assert_eq!(engine.create_count(), 1);
        assert_eq!(engine.destroy_count(), 1);

        engine.fail_attach(false);
        lifecycle.create_pipeline().unwrap();
        assert!(lifecycle.is_running());
        lifecycle.shutdown();
        assert_eq!(engine.destroy_count(), 2);
    }

    #[test]
    fn test_play_failure_destroys_half_built_pipeline() {
        let engine = FakeEngine::new();
        let (lifecycle, queue) = lifecycle(&engine, Codec::vp8());
        engine.fail_play(true);

        assert!(matches!(
            lifecycle.create_pipeline(),
            Err(CaptureError::PipelineConstructionFailed(_))
        ));
        assert!(!lifecycle.is_running());
        assert_eq!(engine.destroy_count(), 1);
        assert_eq!(engine.play_count(), 0);
        // No relay was started for the failed pipeline
        assert!(!engine.push(Sample::new(vec![1u8], Duration::ZERO)));

        engine.fail_play(false);
        lifecycle.create_pipeline().unwrap();
        assert!(engine.push(Sample::new(vec![2u8], Duration::ZERO)));
        assert_eq!(
            queue.recv_timeout(Duration::from_secs(1)).unwrap().data[0],
            2
        );
        lifecycle.shutdown();
    }

    #[test]
    fn test_shutdown_joins_relay() {
        let engine = FakeEngine::new();
        let (lifecycle, queue) = lifecycle(&engine, Codec::vp8());
        lifecycle.create_pipeline().unwrap();

        assert!(engine.push(Sample::new(vec![7u8], Duration::ZERO)));
        assert_eq!(
            queue.recv_timeout(Duration::from_secs(1)).unwrap().data[0],
            7
        );

        lifecycle.shutdown();
        assert!(!engine.push(Sample::new(vec![8u8], Duration::ZERO)));
        assert!(queue.recv_timeout(Duration::from_millis(50)).is_none());
    }
}
