// SPDX-License-Identifier: GPL-3.0-only

//! GStreamer pipeline engine
//!
//! Descriptions are `gst-launch` syntax and must name an appsink after the
//! codec kind, e.g.
//! `videotestsrc ! vp8enc ! appsink name=appsinkvideo`.

use super::stream::{SampleStream, StreamWriter};
use super::{PipelineEngine, PipelineHandle};
use crate::constants::{pipeline, timing};
use crate::errors::{CaptureError, CaptureResult};
use crate::sample::Sample;
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Engine that builds pipelines with `gstreamer::parse::launch`
#[derive(Debug, Clone, Copy)]
pub struct GstEngine;

impl GstEngine {
    /// Initialize GStreamer and return the engine
    pub fn new() -> CaptureResult<Self> {
        debug!("Initializing GStreamer");
        gstreamer::init().map_err(|e| {
            CaptureError::PipelineConstructionFailed(format!("GStreamer init failed: {}", e))
        })?;
        Ok(Self)
    }
}

impl PipelineEngine for GstEngine {
    fn create(&self, description: &str) -> CaptureResult<Box<dyn PipelineHandle>> {
        let pipeline = GstPipeline::launch(description)?;
        Ok(Box::new(pipeline))
    }
}

/// A parsed GStreamer pipeline feeding one appsink
pub struct GstPipeline {
    pipeline: gstreamer::Pipeline,
    appsink: Option<AppSink>,
    writer: StreamWriter,
    stream: Option<SampleStream>,
    destroyed: bool,
}

impl GstPipeline {
    /// Parse a description into a pipeline (state stays NULL)
    pub fn launch(description: &str) -> CaptureResult<Self> {
        let element = gstreamer::parse::launch(description).map_err(|e| {
            error!(error = %e, pipeline = %description, "Failed to parse pipeline");
            CaptureError::PipelineConstructionFailed(e.to_string())
        })?;

        let pipeline = element
            .dynamic_cast::<gstreamer::Pipeline>()
            .map_err(|_| {
                CaptureError::PipelineConstructionFailed("Failed to cast to pipeline".to_string())
            })?;

        let (writer, stream) = StreamWriter::channel(pipeline::STREAM_CAPACITY);

        Ok(Self {
            pipeline,
            appsink: None,
            writer,
            stream: Some(stream),
            destroyed: false,
        })
    }

    fn check_bus_for_errors(&self) {
        if let Some(bus) = self.pipeline.bus()
            && let Some(msg) = bus.timed_pop_filtered(
                gstreamer::ClockTime::from_mseconds(100),
                &[gstreamer::MessageType::Error],
            )
            && let gstreamer::MessageView::Error(err) = msg.view()
        {
            error!(
                error = %err.error(),
                debug = ?err.debug(),
                source = ?err.src().map(|s| s.name()),
                "GStreamer ERROR during pipeline start"
            );
        }
    }
}

impl PipelineHandle for GstPipeline {
    fn attach_sink(&mut self, name: &str) -> CaptureResult<()> {
        let appsink = self
            .pipeline
            .by_name(name)
            .ok_or_else(|| {
                CaptureError::PipelineConstructionFailed(format!("No element named {}", name))
            })?
            .dynamic_cast::<AppSink>()
            .map_err(|_| {
                CaptureError::PipelineConstructionFailed(format!("{} is not an appsink", name))
            })?;

        appsink.set_property("sync", false);
        appsink.set_property("enable-last-sample", false);

        let writer = self.writer.clone();
        let counter = Arc::new(AtomicU64::new(0));
        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    let sample = appsink
                        .pull_sample()
                        .map_err(|_| gstreamer::FlowError::Eos)?;
                    let buffer = sample.buffer().ok_or(gstreamer::FlowError::Error)?;
                    let map = buffer
                        .map_readable()
                        .map_err(|_| gstreamer::FlowError::Error)?;

                    let duration = buffer
                        .duration()
                        .map(|d| Duration::from_nanos(d.nseconds()))
                        .unwrap_or_default();

                    let out = Sample {
                        data: Arc::from(map.as_slice()),
                        duration,
                        timestamp: Instant::now(),
                        delta_unit: buffer.flags().contains(gstreamer::BufferFlags::DELTA_UNIT),
                    };

                    // Blocks while the relay is behind; gives up once destroyed
                    if !writer.push(out) {
                        return Err(gstreamer::FlowError::Flushing);
                    }

                    let n = counter.fetch_add(1, Ordering::Relaxed);
                    if n % timing::SAMPLE_LOG_INTERVAL == 0 {
                        debug!(sample = n, size = map.len(), "Appsink sample");
                    }

                    Ok(gstreamer::FlowSuccess::Ok)
                })
                .build(),
        );

        debug!(sink = %name, "Appsink attached");
        self.appsink = Some(appsink);
        Ok(())
    }

    fn play(&mut self) -> CaptureResult<()> {
        debug!("Setting pipeline to PLAYING state");
        if let Err(e) = self.pipeline.set_state(gstreamer::State::Playing) {
            self.check_bus_for_errors();
            return Err(CaptureError::PipelineConstructionFailed(format!(
                "Failed to start pipeline: {}",
                e
            )));
        }
        Ok(())
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;

        // Unblock any callback waiting on a full stream before stopping
        self.writer.close();

        if let Some(appsink) = self.appsink.take() {
            appsink.set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());
        }

        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            warn!(error = %e, "Failed to set pipeline to NULL");
            return;
        }

        let (result, state, _) = self.pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::STOP_TIMEOUT_SECS,
        ));
        match result {
            Ok(_) => info!(state = ?state, "Pipeline stopped"),
            Err(e) => warn!(error = ?e, state = ?state, "Pipeline state change had issues"),
        }
    }

    fn samples(&mut self) -> Option<SampleStream> {
        self.stream.take()
    }
}

impl Drop for GstPipeline {
    fn drop(&mut self) {
        if !self.destroyed {
            debug!("Dropping live pipeline - explicitly stopping");
            self.destroy();
        }
    }
}
