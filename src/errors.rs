// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the stream sink

use std::fmt;

/// Result type alias using CaptureError
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Errors raised while managing the capture pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// A pipeline is already running for this manager.
    ///
    /// Expected when two first listeners race; callers of the lifecycle
    /// layer treat it as success.
    PipelineAlreadyExists,
    /// The description provider failed (message kept verbatim)
    DescriptionProviderFailed(String),
    /// The pipeline engine could not build or start the pipeline
    PipelineConstructionFailed(String),
    /// Configuration could not be loaded
    Config(String),
}

impl CaptureError {
    /// Check whether this is the "already exists" signal
    pub fn is_already_exists(&self) -> bool {
        matches!(self, CaptureError::PipelineAlreadyExists)
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::PipelineAlreadyExists => write!(f, "Capture pipeline already exists"),
            CaptureError::DescriptionProviderFailed(msg) => write!(f, "{}", msg),
            CaptureError::PipelineConstructionFailed(msg) => {
                write!(f, "Pipeline construction failed: {}", msg)
            }
            CaptureError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for CaptureError {}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        CaptureError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for CaptureError {
    fn from(err: serde_json::Error) -> Self {
        CaptureError::Config(err.to_string())
    }
}
