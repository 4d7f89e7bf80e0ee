//! # Native Bridge
//!
//! Backend for mobile hosts. Commands are translated one-to-one into
//! [`NativeCommand`] values and handed to the host's [`NativeAudioModule`];
//! the engine's notifications come back as raw JSON-shaped events through a
//! [`NativeEventSink`], which normalizes them before emitting.
//!
//! ## Raw event shape
//!
//! ```json
//! {
//!   "type": "STATE_CHANGED",
//!   "track": { "id": "t1", "url": "https://...", "title": "A", "artwork": "..." },
//!   "payload": { "state": "PLAYING", "position": 0, "duration": 180000 }
//! }
//! ```
//!
//! `track` may be an object, `null` (no track loaded) or omitted. Payload keys
//! are `state`, `position`, `duration`, `speed`, `error` and `errorCode`.
//! Ambient events use the types `AMBIENT_TRACK_ENDED` and `AMBIENT_ERROR`.

use bridge_traits::{
    AmbientBackend, AmbientPlayOptions, BackendPlayOptions, NativeAudioModule, NativeCommand,
    PlaybackBackend, PlayerState, Track,
};
use core_runtime::events::{
    AmbientEvent, AudioProEvent, AudioProEventKind, EventEmitter, EventTrack,
};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

const UNKNOWN_ERROR: &str = "Unknown error";

/// Forwards every command to the host's native audio engine.
pub struct NativeBridge {
    module: Arc<dyn NativeAudioModule>,
}

impl NativeBridge {
    pub fn new(module: Arc<dyn NativeAudioModule>) -> Self {
        Self { module }
    }

    fn send(&self, command: NativeCommand) {
        tracing::trace!(method = command.method_name(), "forwarding to native module");
        self.module.send(command);
    }
}

impl std::fmt::Debug for NativeBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeBridge")
            .field("module", &"NativeAudioModule { ... }")
            .finish()
    }
}

impl PlaybackBackend for NativeBridge {
    fn play(&self, track: Track, options: BackendPlayOptions) {
        self.send(NativeCommand::Play { track, options });
    }

    fn pause(&self) {
        self.send(NativeCommand::Pause);
    }

    fn resume(&self) {
        self.send(NativeCommand::Resume);
    }

    fn stop(&self) {
        self.send(NativeCommand::Stop);
    }

    fn clear(&self) {
        self.send(NativeCommand::Clear);
    }

    fn seek_to(&self, position_ms: u64) {
        self.send(NativeCommand::SeekTo { position_ms });
    }

    fn seek_forward(&self, amount_ms: u64) {
        self.send(NativeCommand::SeekForward { amount_ms });
    }

    fn seek_back(&self, amount_ms: u64) {
        self.send(NativeCommand::SeekBack { amount_ms });
    }

    fn set_playback_speed(&self, speed: f32) {
        self.send(NativeCommand::SetPlaybackSpeed { speed });
    }

    fn set_volume(&self, volume: f32) {
        self.send(NativeCommand::SetVolume { volume });
    }
}

impl AmbientBackend for NativeBridge {
    fn ambient_play(&self, options: AmbientPlayOptions) {
        self.send(NativeCommand::AmbientPlay { options });
    }

    fn ambient_stop(&self) {
        self.send(NativeCommand::AmbientStop);
    }

    fn ambient_pause(&self) {
        self.send(NativeCommand::AmbientPause);
    }

    fn ambient_resume(&self) {
        self.send(NativeCommand::AmbientResume);
    }

    fn ambient_seek_to(&self, position_ms: u64) {
        self.send(NativeCommand::AmbientSeekTo { position_ms });
    }

    fn ambient_set_volume(&self, volume: f32) {
        self.send(NativeCommand::AmbientSetVolume { volume });
    }
}

// ============================================================================
// Event ingress
// ============================================================================

/// Reasons a raw native event is rejected.
#[derive(Error, Debug)]
pub enum NativeEventError {
    #[error("malformed native event: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unknown native event type: {0}")]
    UnknownType(String),

    #[error("{event} event is missing payload.{field}")]
    MissingField {
        event: &'static str,
        field: &'static str,
    },
}

/// A raw event after normalization, tagged with its lane.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeEvent {
    Main(AudioProEvent),
    Ambient(AmbientEvent),
}

#[derive(Debug, Deserialize)]
struct RawNativeEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default, deserialize_with = "present")]
    track: Option<Option<Track>>,
    #[serde(default)]
    payload: Option<RawPayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawPayload {
    state: Option<PlayerState>,
    position: Option<f64>,
    duration: Option<f64>,
    speed: Option<f32>,
    error: Option<String>,
    error_code: Option<i32>,
}

/// Keeps `null` distinct from a missing field: `Some(None)` for `null`.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<Track>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Track>::deserialize(deserializer).map(Some)
}

fn millis(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

/// Normalize one raw native event.
pub fn parse_native_event(value: Value) -> Result<NativeEvent, NativeEventError> {
    let raw: RawNativeEvent = serde_json::from_value(value)?;
    let payload = raw.payload.unwrap_or_default();

    let kind = match raw.event_type.as_str() {
        "AMBIENT_TRACK_ENDED" => return Ok(NativeEvent::Ambient(AmbientEvent::TrackEnded)),
        "AMBIENT_ERROR" => {
            let message = payload.error.unwrap_or_else(|| UNKNOWN_ERROR.to_string());
            return Ok(NativeEvent::Ambient(AmbientEvent::error(message)));
        }
        "STATE_CHANGED" => AudioProEventKind::StateChanged {
            state: payload.state.ok_or(NativeEventError::MissingField {
                event: "STATE_CHANGED",
                field: "state",
            })?,
            position: payload.position.map(millis),
            duration: payload.duration.map(millis),
        },
        "PROGRESS" => AudioProEventKind::Progress {
            position: payload.position.map(millis).ok_or(NativeEventError::MissingField {
                event: "PROGRESS",
                field: "position",
            })?,
            duration: payload.duration.map(millis).unwrap_or(0),
        },
        "TRACK_ENDED" => AudioProEventKind::TrackEnded {
            position: payload.position.map(millis).unwrap_or(0),
            duration: payload.duration.map(millis).unwrap_or(0),
        },
        "SEEK_COMPLETE" => AudioProEventKind::SeekComplete {
            position: payload.position.map(millis),
            duration: payload.duration.map(millis),
        },
        "PLAYBACK_SPEED_CHANGED" => AudioProEventKind::PlaybackSpeedChanged {
            speed: payload.speed.ok_or(NativeEventError::MissingField {
                event: "PLAYBACK_SPEED_CHANGED",
                field: "speed",
            })?,
        },
        "PLAYBACK_ERROR" => AudioProEventKind::PlaybackError {
            error: payload.error.unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
            code: payload.error_code,
        },
        "REMOTE_NEXT" => AudioProEventKind::RemoteNext,
        "REMOTE_PREV" => AudioProEventKind::RemotePrev,
        other => return Err(NativeEventError::UnknownType(other.to_string())),
    };

    let track = match raw.track {
        Some(Some(track)) => EventTrack::Loaded(track),
        Some(None) => EventTrack::Cleared,
        None => EventTrack::Absent,
    };

    Ok(NativeEvent::Main(AudioProEvent::new(track, kind)))
}

/// Entry point for events coming from the native engine.
///
/// Cheap to clone; hosts keep one per registered native listener.
#[derive(Debug, Clone)]
pub struct NativeEventSink {
    emitter: Arc<EventEmitter>,
}

impl NativeEventSink {
    pub fn new(emitter: Arc<EventEmitter>) -> Self {
        Self { emitter }
    }

    /// Parse `raw` as JSON and dispatch it. Malformed input is logged and
    /// dropped.
    pub fn dispatch_json(&self, raw: &str) {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => self.dispatch_value(value),
            Err(err) => {
                tracing::warn!(error = %err, "dropping unparsable native event");
            }
        }
    }

    pub fn dispatch_value(&self, value: Value) {
        match parse_native_event(value) {
            Ok(event) => self.dispatch(&event),
            Err(err) => {
                tracing::warn!(error = %err, "dropping native event");
            }
        }
    }

    pub fn dispatch(&self, event: &NativeEvent) {
        match event {
            NativeEvent::Main(event) => {
                self.emitter.emit(event);
            }
            NativeEvent::Ambient(event) => {
                self.emitter.emit_ambient(event);
            }
        }
    }
}
