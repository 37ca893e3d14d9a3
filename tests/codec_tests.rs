// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for codec descriptors

use stream_sink::constants::SAMPLE_QUEUE_CAPACITY;
use stream_sink::{Codec, CodecKind};

#[test]
fn test_presets_have_expected_kinds() {
    for codec in [Codec::vp8(), Codec::vp9(), Codec::h264()] {
        assert_eq!(codec.kind, CodecKind::Video, "{} should be video", codec.name);
        assert_eq!(codec.clock_rate, 90_000);
    }
    for codec in [Codec::opus(), Codec::g722(), Codec::pcmu(), Codec::pcma()] {
        assert_eq!(codec.kind, CodecKind::Audio, "{} should be audio", codec.name);
    }
}

#[test]
fn test_display_includes_kind() {
    assert_eq!(Codec::h264().to_string(), "h264 (video)");
    assert_eq!(Codec::pcmu().to_string(), "pcmu (audio)");
}

#[test]
fn test_queue_capacity() {
    assert_eq!(SAMPLE_QUEUE_CAPACITY, 100);
}
