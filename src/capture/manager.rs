// SPDX-License-Identifier: GPL-3.0-only

//! Stream sink manager
//!
//! Multiplexes any number of listeners onto one capture pipeline. The first
//! listener builds the pipeline, the last one tears it down, and samples flow
//! into a single queue that consumers read through [`SampleQueue`].
//!
//! Two locks are ordered, always acquired in this order:
//!
//! 1. the façade lock, serializing add/remove listener
//! 2. the lifecycle lock inside [`PipelineLifecycle`]
//!
//! The listener counter has its own independent lock and is never held
//! together with either of them, so count queries stay cheap while a
//! pipeline is being built.

use super::lifecycle::{DescriptionProvider, PipelineLifecycle, description_provider};
use super::listeners::ListenerCounter;
use super::queue::{SampleQueue, sample_queue};
use crate::codec::Codec;
use crate::config::StreamSinkConfig;
use crate::constants::SAMPLE_QUEUE_CAPACITY;
use crate::errors::{CaptureError, CaptureResult};
use crate::pipeline::PipelineEngine;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, info_span, warn};

/// Shared capture pipeline with listener reference counting
pub struct StreamSinkManager {
    id: String,
    span: tracing::Span,
    codec: Codec,
    facade: Mutex<()>,
    listeners: ListenerCounter,
    lifecycle: PipelineLifecycle,
    queue: SampleQueue,
}

impl StreamSinkManager {
    /// Create a manager; no pipeline is built until the first listener
    ///
    /// # Arguments
    /// * `id` - Stream identifier, attached to every log line
    /// * `codec` - Codec the pipeline produces
    /// * `engine` - Engine that builds pipelines
    /// * `provider` - Called once per pipeline creation for its description
    pub fn new<F, E>(
        id: impl Into<String>,
        codec: Codec,
        engine: Arc<dyn PipelineEngine>,
        provider: F,
    ) -> Self
    where
        F: Fn() -> Result<String, E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        Self::with_provider(id, codec, engine, description_provider(provider))
    }

    /// Create a manager from an already boxed provider
    pub fn with_provider(
        id: impl Into<String>,
        codec: Codec,
        engine: Arc<dyn PipelineEngine>,
        provider: DescriptionProvider,
    ) -> Self {
        let id = id.into();
        let span = info_span!("stream_sink", id = %id);
        let (writer, queue) = sample_queue(SAMPLE_QUEUE_CAPACITY);
        let lifecycle = PipelineLifecycle::new(engine, codec.clone(), provider, writer);

        Self {
            id,
            span,
            codec,
            facade: Mutex::new(()),
            listeners: ListenerCounter::new(),
            lifecycle,
            queue,
        }
    }

    /// Create a manager whose provider returns the configured description
    pub fn from_config(config: &StreamSinkConfig, engine: Arc<dyn PipelineEngine>) -> Self {
        let description = config.pipeline.clone();
        let manager = Self::new(config.id.clone(), config.codec.clone(), engine, move || {
            Ok::<_, CaptureError>(description.clone())
        });
        manager.set_adaptive_framerate(config.adaptive_framerate);
        manager.set_change_framerate(config.change_framerate);
        manager
    }

    /// Register a listener, building the pipeline if it is the first
    ///
    /// On failure the listener is not counted and the pipeline stays absent.
    pub fn add_listener(&self) -> CaptureResult<()> {
        let _span = self.span.enter();
        let _guard = self.facade.lock().unwrap_or_else(PoisonError::into_inner);

        if self.listeners.count() == 0 {
            match self.lifecycle.create_pipeline() {
                Ok(()) => {}
                Err(e) if e.is_already_exists() => {}
                Err(e) => {
                    warn!(error = %e, "failed to start pipeline");
                    return Err(e);
                }
            }
            info!("first listener, starting");
        }

        let count = self.listeners.add();
        debug!(listeners = count, "listener added");
        Ok(())
    }

    /// Unregister a listener, destroying the pipeline if it was the last
    pub fn remove_listener(&self) -> CaptureResult<()> {
        let _span = self.span.enter();
        let _guard = self.facade.lock().unwrap_or_else(PoisonError::into_inner);

        let count = self.listeners.remove();
        debug!(listeners = count, "listener removed");

        if count == 0 {
            self.lifecycle.destroy_pipeline();
            info!("last listener, stopping");
        }

        Ok(())
    }

    pub fn listeners_count(&self) -> usize {
        self.listeners.count()
    }

    /// True while at least one listener is registered
    pub fn started(&self) -> bool {
        self.listeners.started()
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Framerate the next pipeline is rewritten to (when adaptive)
    pub fn set_change_framerate(&self, rate: i16) {
        self.lifecycle.framerate().set_change(rate);
    }

    /// Enable framerate rewriting for the next pipeline
    pub fn set_adaptive_framerate(&self, enabled: bool) {
        self.lifecycle.framerate().set_adaptive(enabled);
    }

    /// Read end of the sample queue
    ///
    /// Every call returns a handle to the same queue.
    pub fn sample_queue(&self) -> SampleQueue {
        self.queue.clone()
    }

    /// Whether a pipeline currently exists
    pub fn pipeline_running(&self) -> bool {
        self.lifecycle.is_running()
    }

    /// Description of the live pipeline, after any framerate rewrite
    pub fn pipeline_description(&self) -> Option<String> {
        self.lifecycle.description()
    }

    /// Destroy the pipeline and wait until no relay thread is left
    pub fn shutdown(&self) {
        let _span = self.span.enter();
        self.lifecycle.shutdown();
    }
}

impl fmt::Debug for StreamSinkManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSinkManager")
            .field("id", &self.id)
            .field("codec", &self.codec)
            .field("listeners", &self.listeners.count())
            .field("running", &self.lifecycle.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::fake::FakeEngine;

    fn manager(engine: &FakeEngine) -> StreamSinkManager {
        StreamSinkManager::new("test", Codec::vp8(), Arc::new(engine.clone()), || {
            Ok::<_, String>("videotestsrc ! appsink name=appsinkvideo".to_string())
        })
    }

    #[test]
    fn test_failed_add_does_not_count() {
        let engine = FakeEngine::new();
        engine.fail_with("no camera");
        let manager = manager(&engine);

        let err = manager.add_listener().unwrap_err();
        assert_eq!(err, CaptureError::PipelineConstructionFailed("no camera".into()));
        assert_eq!(manager.listeners_count(), 0);
        assert!(!manager.pipeline_running());

        engine.clear_failure();
        manager.add_listener().unwrap();
        assert_eq!(manager.listeners_count(), 1);
        assert!(manager.pipeline_running());
        manager.shutdown();
    }

    #[test]
    fn test_remove_without_listeners() {
        let engine = FakeEngine::new();
        let manager = manager(&engine);
        assert!(manager.remove_listener().is_ok());
        assert_eq!(manager.listeners_count(), 0);
        assert_eq!(engine.destroy_count(), 0);
    }

    #[test]
    fn test_queue_identity_is_stable() {
        let engine = FakeEngine::new();
        let manager = manager(&engine);
        let before = manager.sample_queue();
        manager.add_listener().unwrap();
        manager.remove_listener().unwrap();
        assert!(before.same_queue(&manager.sample_queue()));
        assert_eq!(before.capacity(), SAMPLE_QUEUE_CAPACITY);
    }

    #[test]
    fn test_from_config_applies_framerate() {
        let engine = FakeEngine::new();
        let config = StreamSinkConfig {
            adaptive_framerate: true,
            change_framerate: 10,
            ..StreamSinkConfig::default()
        };
        let manager = StreamSinkManager::from_config(&config, Arc::new(engine.clone()));
        manager.add_listener().unwrap();
        assert!(engine.descriptions()[0].contains("framerate=10/1"));
        manager.shutdown();
    }
}
