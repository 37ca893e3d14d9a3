// SPDX-License-Identifier: GPL-3.0-only

//! Codec descriptors for captured streams

use crate::constants::APPSINK_PREFIX;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Media kind of a codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    Audio,
    Video,
}

impl CodecKind {
    /// Lowercase name used in sink element names
    pub fn as_str(&self) -> &'static str {
        match self {
            CodecKind::Audio => "audio",
            CodecKind::Video => "video",
        }
    }
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RTP codec descriptor
///
/// Read-only once handed to a stream sink manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Codec {
    /// Codec name (e.g., "vp8", "opus")
    pub name: String,
    /// Audio or video
    pub kind: CodecKind,
    /// RTP payload type
    pub payload_type: u8,
    /// RTP clock rate in Hz
    pub clock_rate: u32,
    /// Channel count (0 for video)
    pub channels: u16,
}

impl Codec {
    pub fn vp8() -> Self {
        Self::video("vp8", 96)
    }

    pub fn vp9() -> Self {
        Self::video("vp9", 98)
    }

    pub fn h264() -> Self {
        Self::video("h264", 102)
    }

    pub fn opus() -> Self {
        Self {
            name: "opus".to_string(),
            kind: CodecKind::Audio,
            payload_type: 111,
            clock_rate: 48_000,
            channels: 2,
        }
    }

    pub fn g722() -> Self {
        Self::audio("g722", 9, 8_000)
    }

    pub fn pcmu() -> Self {
        Self::audio("pcmu", 0, 8_000)
    }

    pub fn pcma() -> Self {
        Self::audio("pcma", 8, 8_000)
    }

    /// Look up a well-known codec by (case-insensitive) name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "vp8" => Some(Self::vp8()),
            "vp9" => Some(Self::vp9()),
            "h264" => Some(Self::h264()),
            "opus" => Some(Self::opus()),
            "g722" => Some(Self::g722()),
            "pcmu" => Some(Self::pcmu()),
            "pcma" => Some(Self::pcma()),
            _ => None,
        }
    }

    fn video(name: &str, payload_type: u8) -> Self {
        Self {
            name: name.to_string(),
            kind: CodecKind::Video,
            payload_type,
            clock_rate: 90_000,
            channels: 0,
        }
    }

    fn audio(name: &str, payload_type: u8, clock_rate: u32) -> Self {
        Self {
            name: name.to_string(),
            kind: CodecKind::Audio,
            payload_type,
            clock_rate,
            channels: 1,
        }
    }

    pub fn is_video(&self) -> bool {
        self.kind == CodecKind::Video
    }

    /// Name of the sink element the pipeline description must declare
    /// (`appsinkaudio` or `appsinkvideo`)
    pub fn appsink_name(&self) -> String {
        format!("{}{}", APPSINK_PREFIX, self.kind.as_str())
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::vp8()
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)
    }
}
