//! Abstraction of a single browser media element.
//!
//! The browser backend drives playback exclusively through this trait, which
//! mirrors the subset of `HTMLMediaElement` it needs. Times are expressed in
//! seconds, as the element does; the backend converts to milliseconds.

use crate::platform::{MediaEventHandler, PlatformSendSync, PlayCallback};
use serde::{Deserialize, Serialize};

/// Low-level notifications raised by a media element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaElementEvent {
    LoadStart,
    CanPlay,
    Playing,
    Pause,
    Ended,
    Seeked,
    Error,
}

impl MediaElementEvent {
    /// DOM event name.
    pub fn dom_name(&self) -> &'static str {
        match self {
            MediaElementEvent::LoadStart => "loadstart",
            MediaElementEvent::CanPlay => "canplay",
            MediaElementEvent::Playing => "playing",
            MediaElementEvent::Pause => "pause",
            MediaElementEvent::Ended => "ended",
            MediaElementEvent::Seeked => "seeked",
            MediaElementEvent::Error => "error",
        }
    }

    pub const ALL: [MediaElementEvent; 7] = [
        MediaElementEvent::LoadStart,
        MediaElementEvent::CanPlay,
        MediaElementEvent::Playing,
        MediaElementEvent::Pause,
        MediaElementEvent::Ended,
        MediaElementEvent::Seeked,
        MediaElementEvent::Error,
    ];
}

/// Details of the element's current `error` attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaErrorInfo {
    pub message: Option<String>,
    pub code: Option<i32>,
}

pub trait MediaElement: PlatformSendSync {
    fn set_src(&self, src: &str);

    fn src(&self) -> String;

    /// Drop the source attribute so the element releases its resource.
    fn remove_src(&self);

    fn load(&self);

    /// Start playback. The outcome is deferred; `on_settled` runs once the
    /// attempt resolves or is rejected (or immediately if it throws).
    fn play(&self, on_settled: PlayCallback);

    fn pause(&self);

    fn paused(&self) -> bool;

    fn current_time(&self) -> f64;

    fn set_current_time(&self, seconds: f64);

    /// `NaN` while unknown.
    fn duration(&self) -> f64;

    fn set_playback_rate(&self, rate: f64);

    fn set_volume(&self, volume: f64);

    fn set_loop(&self, looping: bool);

    fn error(&self) -> Option<MediaErrorInfo>;

    /// Install the single handler receiving every [`MediaElementEvent`].
    /// Replaces any previously installed handler.
    fn set_event_handler(&self, handler: MediaEventHandler);
}
