// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use std::io::Write;
use stream_sink::{CaptureError, Codec, CodecKind, StreamSinkConfig};

#[test]
fn test_config_default() {
    let config = StreamSinkConfig::default();

    assert_eq!(config.codec, Codec::vp8());
    assert!(
        !config.adaptive_framerate,
        "Adaptive framerate should be disabled by default"
    );
    assert!(
        config.pipeline.contains("appsink name=appsinkvideo"),
        "Default pipeline must expose the video appsink"
    );
}

#[test]
fn test_partial_json_uses_defaults() {
    let config = StreamSinkConfig::from_json(r#"{ "id": "screen", "change_framerate": 20 }"#)
        .unwrap();
    assert_eq!(config.id, "screen");
    assert_eq!(config.change_framerate, 20);
    assert_eq!(config.codec, Codec::vp8());
}

#[test]
fn test_codec_from_json() {
    let json = r#"{
        "codec": { "name": "opus", "kind": "audio", "payload_type": 111, "clock_rate": 48000, "channels": 2 },
        "pipeline": "pulsesrc ! opusenc ! appsink name=appsinkaudio"
    }"#;
    let config = StreamSinkConfig::from_json(json).unwrap();
    assert_eq!(config.codec.kind, CodecKind::Audio);
    assert_eq!(config.codec, Codec::opus());
}

#[test]
fn test_invalid_json_is_config_error() {
    let err = StreamSinkConfig::from_json("{ not json").unwrap_err();
    assert!(matches!(err, CaptureError::Config(_)));
}

#[test]
fn test_load_from_file() {
    let path = std::env::temp_dir().join(format!("stream-sink-config-{}.json", std::process::id()));
    {
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"{{ "id": "file", "adaptive_framerate": true }}"#).unwrap();
    }

    let config = StreamSinkConfig::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.id, "file");
    assert!(config.adaptive_framerate);
}

#[test]
fn test_missing_file_is_config_error() {
    let err = StreamSinkConfig::load("/nonexistent/stream-sink.json").unwrap_err();
    assert!(matches!(err, CaptureError::Config(_)));
}
