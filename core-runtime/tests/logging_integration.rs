//! Integration tests for the logging system

use bridge_traits::LogLevel;
use core_runtime::logging::{init_logging, strip_path, LogFormat, LoggingConfig};
use core_runtime::Error;

#[test]
fn test_logging_initializes_once() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug);

    assert!(init_logging(config.clone()).is_ok());

    // The global subscriber is already installed.
    assert!(matches!(init_logging(config), Err(Error::Config(_))));

    tracing::warn!(target: "core_playback::facade", "logging works after init");
}

#[test]
fn test_invalid_filter_is_rejected_before_install() {
    let config = LoggingConfig::default().with_filter("core_playback=verbose");
    assert!(matches!(init_logging(config), Err(Error::Config(_))));
}

#[test]
fn test_path_stripping() {
    // Unix paths
    assert_eq!(strip_path("/storage/emulated/0/Music/song.mp3"), "song.mp3");
    assert_eq!(strip_path("file:///var/mobile/Media/clip.m4a"), "clip.m4a");

    // Windows paths
    assert_eq!(strip_path("C:\\Users\\John\\Music\\song.mp3"), "song.mp3");

    // Already basename
    assert_eq!(strip_path("song.mp3"), "song.mp3");

    // Edge cases
    assert_eq!(strip_path("/var/log/"), "");
    assert_eq!(strip_path(""), "");
}

#[test]
fn test_format_selection() {
    #[cfg(debug_assertions)]
    assert_eq!(LogFormat::default(), LogFormat::Pretty);

    #[cfg(not(debug_assertions))]
    assert_eq!(LogFormat::default(), LogFormat::Json);
}
