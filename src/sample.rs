// SPDX-License-Identifier: GPL-3.0-only

//! Encoded media samples produced by a capture pipeline

use std::sync::Arc;
use std::time::{Duration, Instant};

/// One unit of encoded media output
///
/// The payload is reference counted so handing a sample to a consumer never
/// copies the encoded bytes.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Encoded payload
    pub data: Arc<[u8]>,
    /// Presentation duration reported by the pipeline
    pub duration: Duration,
    /// When the sample left the pipeline
    pub timestamp: Instant,
    /// Non-keyframe (delta unit) flag
    pub delta_unit: bool,
}

impl Sample {
    /// Create a sample stamped with the current instant
    pub fn new(data: impl Into<Arc<[u8]>>, duration: Duration) -> Self {
        Self {
            data: data.into(),
            duration,
            timestamp: Instant::now(),
            delta_unit: false,
        }
    }

    /// Mark the sample as a delta unit
    pub fn with_delta_unit(mut self, delta_unit: bool) -> Self {
        self.delta_unit = delta_unit;
        self
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
