//! # Input Normalization
//!
//! Pure helpers applied to caller input before it reaches the store or a
//! backend: range clamping, volume rounding, local path canonicalization,
//! asset resolution and track shape validation.
//!
//! Clamping helpers return a [`Clamped`] value so the caller decides how to
//! report out-of-range input (the facade logs a warning).

use crate::error::{PlaybackError, Result};
use bridge_traits::playback::{
    DEFAULT_PLAYBACK_SPEED, MAX_PLAYBACK_SPEED, MAX_PROGRESS_INTERVAL_MS, MIN_PLAYBACK_SPEED,
    MIN_PROGRESS_INTERVAL_MS,
};
use bridge_traits::{AssetResolver, Track, TrackUrl};

/// A normalized value and whether the input had to be clamped into range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clamped<T> {
    pub value: T,
    pub clamped: bool,
}

impl<T> Clamped<T> {
    fn exact(value: T) -> Self {
        Self {
            value,
            clamped: false,
        }
    }

    fn clamped(value: T) -> Self {
        Self {
            value,
            clamped: true,
        }
    }
}

/// Clamp to `0.0..=1.0` and round to two decimals.
///
/// Values below `0.001` snap to `0.0` and values above `0.995` snap to `1.0`
/// so float noise never leaks into the stored volume.
pub fn normalize_volume(volume: f32) -> Clamped<f32> {
    if volume.is_nan() {
        return Clamped::clamped(0.0);
    }

    let (value, clamped) = if volume < 0.0 {
        (0.0, true)
    } else if volume > 1.0 {
        (1.0, true)
    } else {
        (volume, false)
    };

    let value = if value < 0.001 {
        0.0
    } else if value > 0.995 {
        1.0
    } else {
        (value * 100.0).round() / 100.0
    };

    Clamped { value, clamped }
}

/// Clamp to the supported playback rate range. Non-finite input falls back
/// to normal speed.
pub fn clamp_playback_speed(speed: f32) -> Clamped<f32> {
    if !speed.is_finite() {
        return Clamped::clamped(DEFAULT_PLAYBACK_SPEED);
    }
    if speed < MIN_PLAYBACK_SPEED {
        Clamped::clamped(MIN_PLAYBACK_SPEED)
    } else if speed > MAX_PLAYBACK_SPEED {
        Clamped::clamped(MAX_PLAYBACK_SPEED)
    } else {
        Clamped::exact(speed)
    }
}

pub fn clamp_progress_interval(interval_ms: u64) -> Clamped<u64> {
    if interval_ms < MIN_PROGRESS_INTERVAL_MS {
        Clamped::clamped(MIN_PROGRESS_INTERVAL_MS)
    } else if interval_ms > MAX_PROGRESS_INTERVAL_MS {
        Clamped::clamped(MAX_PROGRESS_INTERVAL_MS)
    } else {
        Clamped::exact(interval_ms)
    }
}

/// Prefix absolute local paths with `file://`.
///
/// Anything that already carries a scheme (`https://`, `file://`,
/// `content://`, `rtsp://`, ...) and relative paths are returned unchanged.
pub fn normalize_file_path(url: &str) -> String {
    if url.contains("://") || !url.starts_with('/') {
        return url.to_string();
    }
    format!("file://{}", url)
}

/// Resolve an asset handle through `resolver` and canonicalize the result.
///
/// Without a resolver, or when resolution fails, the handle is returned
/// untouched; backends that only understand URIs reject it later.
pub fn resolve_track_url(url: &TrackUrl, resolver: Option<&dyn AssetResolver>) -> TrackUrl {
    match url {
        TrackUrl::Uri(uri) => TrackUrl::Uri(normalize_file_path(uri)),
        TrackUrl::Asset(handle) => {
            let Some(resolver) = resolver else {
                return url.clone();
            };
            match resolver.resolve(*handle) {
                Ok(uri) => TrackUrl::Uri(normalize_file_path(&uri)),
                Err(err) => {
                    tracing::warn!(asset = handle.0, error = %err, "failed to resolve asset");
                    url.clone()
                }
            }
        }
    }
}

/// Resolve and canonicalize the audio and artwork locations of `track`.
pub fn resolve_track(track: &Track, resolver: Option<&dyn AssetResolver>) -> Track {
    Track {
        url: resolve_track_url(&track.url, resolver),
        artwork: resolve_track_url(&track.artwork, resolver),
        ..track.clone()
    }
}

/// Check that every required field of `track` is present and non-blank.
pub fn validate_track(track: &Track) -> Result<()> {
    if track.id.trim().is_empty() {
        return Err(PlaybackError::InvalidTrack("id must be a non-empty string".into()));
    }
    if track.url.is_blank() {
        return Err(PlaybackError::InvalidTrack(format!(
            "url of track '{}' must be a non-empty string or an asset reference",
            track.id
        )));
    }
    if track.title.trim().is_empty() {
        return Err(PlaybackError::InvalidTrack(format!(
            "title of track '{}' must be a non-empty string",
            track.id
        )));
    }
    if track.artwork.is_blank() {
        return Err(PlaybackError::InvalidTrack(format!(
            "artwork of track '{}' must be a non-empty string or an asset reference",
            track.id
        )));
    }
    Ok(())
}

pub fn validate_ambient_url(url: &TrackUrl) -> Result<()> {
    if url.is_blank() {
        return Err(PlaybackError::InvalidAmbientUrl(
            "url must be a non-empty string or an asset reference".into(),
        ));
    }
    Ok(())
}
