// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! - `run`: drive a stream sink end to end
//! - `rewrite`: show the adaptive framerate rewrite

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use stream_sink::capture::rewrite_framerate;
use stream_sink::pipeline::fake::FakeEngine;
use stream_sink::pipeline::gst::GstEngine;
use stream_sink::{Codec, PipelineEngine, Sample, StreamSinkConfig, StreamSinkManager};
use tracing::{info, warn};

/// Options for the `run` command
pub struct RunOptions {
    pub config: Option<PathBuf>,
    pub pipeline: Option<String>,
    pub codec: Option<String>,
    pub listeners: usize,
    pub duration: u64,
    pub framerate: Option<i16>,
    pub dry_run: bool,
}

/// Build the config from the file (if any) and command-line overrides
fn resolve_config(options: &RunOptions) -> Result<StreamSinkConfig, Box<dyn std::error::Error>> {
    let mut config = match &options.config {
        Some(path) => StreamSinkConfig::load(path)?,
        None => StreamSinkConfig::default(),
    };

    if let Some(pipeline) = &options.pipeline {
        config.pipeline = pipeline.clone();
    }
    if let Some(name) = &options.codec {
        config.codec =
            Codec::from_name(name).ok_or_else(|| format!("Unknown codec: {}", name))?;
    }
    if let Some(rate) = options.framerate {
        config.adaptive_framerate = true;
        config.change_framerate = rate;
    }

    Ok(config)
}

/// Run a stream sink for the requested duration and report what arrived
pub fn run(options: RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(&options)?;

    let stop = Arc::new(AtomicBool::new(false));
    let stop_handler = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        stop_handler.store(true, Ordering::SeqCst);
    })?;

    let fake = options.dry_run.then(FakeEngine::new);
    let engine: Arc<dyn PipelineEngine> = match &fake {
        Some(fake) => Arc::new(fake.clone()),
        None => Arc::new(GstEngine::new()?),
    };

    let manager = StreamSinkManager::from_config(&config, engine);
    println!("Codec: {}", manager.codec());

    for _ in 0..options.listeners.max(1) {
        manager.add_listener()?;
    }
    if let Some(description) = manager.pipeline_description() {
        println!("Pipeline: {}", description);
    }
    println!("Listeners: {}", manager.listeners_count());

    // Synthetic ~30 fps producer for the in-memory engine
    let feeder = fake.map(|fake| {
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let frame = Duration::from_millis(33);
            let mut n = 0u64;
            while !stop.load(Ordering::SeqCst) {
                // Keyframe once a second
                let sample = Sample::new(vec![0u8; 1024], frame).with_delta_unit(n % 30 != 0);
                if !fake.push(sample) {
                    break;
                }
                n += 1;
                thread::sleep(frame);
            }
        })
    });

    let queue = manager.sample_queue();
    let deadline = Instant::now() + Duration::from_secs(options.duration);
    let mut samples = 0u64;
    let mut bytes = 0usize;
    let mut keyframes = 0u64;

    while Instant::now() < deadline && !stop.load(Ordering::SeqCst) {
        if let Some(sample) = queue.recv_timeout(Duration::from_millis(100)) {
            samples += 1;
            bytes += sample.len();
            if !sample.delta_unit {
                keyframes += 1;
            }
        }
    }
    stop.store(true, Ordering::SeqCst);

    for _ in 0..manager.listeners_count() {
        manager.remove_listener()?;
    }

    // Keep draining while shutdown waits, so a relay blocked on a full
    // queue can finish
    thread::scope(|scope| {
        let shutdown = scope.spawn(|| manager.shutdown());
        while !shutdown.is_finished() {
            let _ = queue.recv_timeout(Duration::from_millis(10));
        }
    });

    if let Some(feeder) = feeder
        && feeder.join().is_err()
    {
        warn!("Sample feeder panicked");
    }

    info!(samples, bytes, "Run finished");
    println!();
    println!("Samples:   {}", samples);
    // Audio frames are all independently decodable
    if manager.codec().is_video() {
        println!("Keyframes: {}", keyframes);
    }
    println!("Bytes:     {}", bytes);

    Ok(())
}

/// Print the rewritten description
pub fn rewrite(framerate: i16, description: &str) {
    println!("{}", rewrite_framerate(description, framerate));
}
