//! Playback value types and the backend command interface.
//!
//! Every layer of the player speaks in terms of the types defined here: the
//! store keeps a [`PlayerState`] and the active [`Track`], the command facade
//! builds [`BackendPlayOptions`], and each backend implements
//! [`PlaybackBackend`] (plus [`AmbientBackend`] for the secondary lane).
//!
//! Backend calls are fire-and-forget. Completion and failure are reported
//! only through events emitted by the backend, never through a return value.

use crate::platform::PlatformSendSync;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Default amount used by seek-forward/seek-back when the caller has no preference.
pub const DEFAULT_SEEK_MS: u64 = 30_000;
/// Default interval between PROGRESS events.
pub const DEFAULT_PROGRESS_INTERVAL_MS: u64 = 1_000;
pub const MIN_PROGRESS_INTERVAL_MS: u64 = 100;
pub const MAX_PROGRESS_INTERVAL_MS: u64 = 10_000;
pub const DEFAULT_PLAYBACK_SPEED: f32 = 1.0;
pub const MIN_PLAYBACK_SPEED: f32 = 0.25;
pub const MAX_PLAYBACK_SPEED: f32 = 2.0;
pub const DEFAULT_VOLUME: f32 = 1.0;

/// Playback lifecycle state. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerState {
    /// Nothing loaded yet, or the player was cleared.
    #[default]
    Idle,
    Stopped,
    Loading,
    Playing,
    Paused,
    Buffering,
    Error,
}

impl PlayerState {
    /// Whether transport commands (pause, resume, seek, speed, volume) make
    /// sense in this state. A player that never loaded a track or that hit a
    /// fatal error has nothing to act on.
    pub fn accepts_transport_commands(&self) -> bool {
        !matches!(self, PlayerState::Idle | PlayerState::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerState::Idle => "IDLE",
            PlayerState::Stopped => "STOPPED",
            PlayerState::Loading => "LOADING",
            PlayerState::Playing => "PLAYING",
            PlayerState::Paused => "PAUSED",
            PlayerState::Buffering => "BUFFERING",
            PlayerState::Error => "ERROR",
        }
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audio session category hint for the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentType {
    #[default]
    Music,
    Speech,
}

/// Opaque reference to a resource bundled with the host application.
///
/// Hosts hand these out for packaged audio and artwork; they must be resolved
/// through an [`AssetResolver`](crate::assets::AssetResolver) before a backend
/// that only understands URIs can use them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetHandle(pub u32);

/// Location of a track's audio or artwork.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrackUrl {
    /// Remote URL, streaming URL or local path.
    Uri(String),
    /// Bundled resource that has not been resolved yet.
    Asset(AssetHandle),
}

impl TrackUrl {
    pub fn as_uri(&self) -> Option<&str> {
        match self {
            TrackUrl::Uri(uri) => Some(uri),
            TrackUrl::Asset(_) => None,
        }
    }

    pub fn is_asset(&self) -> bool {
        matches!(self, TrackUrl::Asset(_))
    }

    /// A URI made only of whitespace is treated as missing.
    pub fn is_blank(&self) -> bool {
        match self {
            TrackUrl::Uri(uri) => uri.trim().is_empty(),
            TrackUrl::Asset(_) => false,
        }
    }
}

impl From<&str> for TrackUrl {
    fn from(value: &str) -> Self {
        TrackUrl::Uri(value.to_string())
    }
}

impl From<String> for TrackUrl {
    fn from(value: String) -> Self {
        TrackUrl::Uri(value)
    }
}

impl From<AssetHandle> for TrackUrl {
    fn from(value: AssetHandle) -> Self {
        TrackUrl::Asset(value)
    }
}

impl fmt::Display for TrackUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackUrl::Uri(uri) => f.write_str(uri),
            TrackUrl::Asset(handle) => write!(f, "asset:{}", handle.0),
        }
    }
}

/// One playable audio item. `id` is the identity key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub url: TrackUrl,
    pub title: String,
    pub artwork: TrackUrl,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
}

impl Track {
    pub fn new(
        id: impl Into<String>,
        url: impl Into<TrackUrl>,
        title: impl Into<String>,
        artwork: impl Into<TrackUrl>,
    ) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            title: title.into(),
            artwork: artwork.into(),
            album: None,
            artist: None,
        }
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }
}

/// Extra HTTP headers for fetching audio and artwork.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestHeaders {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub audio: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub artwork: BTreeMap<String, String>,
}

/// Fully resolved options a backend receives alongside a track.
///
/// Built by the command facade from the current configuration, the current
/// speed and volume, and the caller's per-play options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendPlayOptions {
    pub content_type: ContentType,
    pub debug: bool,
    pub debug_include_progress: bool,
    pub progress_interval_ms: u64,
    pub show_next_prev_controls: bool,
    pub playback_speed: f32,
    pub volume: f32,
    pub auto_play: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<RequestHeaders>,
    /// Backend-specific configuration keys passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for BackendPlayOptions {
    fn default() -> Self {
        Self {
            content_type: ContentType::default(),
            debug: false,
            debug_include_progress: false,
            progress_interval_ms: DEFAULT_PROGRESS_INTERVAL_MS,
            show_next_prev_controls: true,
            playback_speed: DEFAULT_PLAYBACK_SPEED,
            volume: DEFAULT_VOLUME,
            auto_play: true,
            start_time_ms: None,
            headers: None,
            extra: Map::new(),
        }
    }
}

/// Options for the ambient lane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbientPlayOptions {
    pub url: TrackUrl,
    #[serde(rename = "loop", default)]
    pub looping: bool,
}

impl AmbientPlayOptions {
    pub fn new(url: impl Into<TrackUrl>) -> Self {
        Self {
            url: url.into(),
            looping: false,
        }
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }
}

/// Which backend family the player drives. Injected at construction; never
/// detected from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeTarget {
    /// Native mobile audio engine reached through [`NativeAudioModule`](crate::native::NativeAudioModule).
    #[default]
    Native,
    /// Browser media element reached through [`MediaElement`](crate::media::MediaElement).
    Browser,
}

/// Command interface implemented identically by every playback backend.
pub trait PlaybackBackend: PlatformSendSync {
    fn play(&self, track: Track, options: BackendPlayOptions);

    fn pause(&self);

    fn resume(&self);

    fn stop(&self);

    /// Stop and release the current track entirely.
    fn clear(&self);

    fn seek_to(&self, position_ms: u64);

    fn seek_forward(&self, amount_ms: u64);

    fn seek_back(&self, amount_ms: u64);

    fn set_playback_speed(&self, speed: f32);

    /// Volume is already normalized to `0.0..=1.0`.
    fn set_volume(&self, volume: f32);
}

/// Command interface of the secondary, independent audio lane.
pub trait AmbientBackend: PlatformSendSync {
    fn ambient_play(&self, options: AmbientPlayOptions);

    fn ambient_stop(&self);

    fn ambient_pause(&self);

    fn ambient_resume(&self);

    fn ambient_seek_to(&self, position_ms: u64);

    fn ambient_set_volume(&self, volume: f32);
}
