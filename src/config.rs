// SPDX-License-Identifier: GPL-3.0-only

use crate::codec::Codec;
use crate::errors::CaptureResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default description: a live VP8 test pattern
pub const DEFAULT_PIPELINE: &str = "videotestsrc is-live=true ! \
    video/x-raw,width=640,height=480,framerate=30/1 ! \
    vp8enc deadline=1 cpu-used=8 ! \
    appsink name=appsinkvideo";

/// Stream sink settings, loadable from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSinkConfig {
    /// Stream identifier used in logs
    pub id: String,
    /// Codec produced by the pipeline
    pub codec: Codec,
    /// Pipeline description handed to the engine
    pub pipeline: String,
    /// Rewrite the description's framerate at creation
    pub adaptive_framerate: bool,
    /// Target framerate for the rewrite (0 = none)
    pub change_framerate: i16,
}

impl Default for StreamSinkConfig {
    fn default() -> Self {
        Self {
            id: "main".to_string(),
            codec: Codec::vp8(),
            pipeline: DEFAULT_PIPELINE.to_string(),
            adaptive_framerate: false, // Disabled by default
            change_framerate: 0,
        }
    }
}

impl StreamSinkConfig {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> CaptureResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON config file
    pub fn load(path: impl AsRef<Path>) -> CaptureResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&contents)
    }
}
