//! Contract for the native mobile audio engine.
//!
//! The engine is opaque: the core hands it [`NativeCommand`] values and the
//! host forwards them across its FFI/JNI/Objective-C boundary untouched. The
//! engine's notifications travel the other way as raw event objects, which the
//! core normalizes before they reach any listener.

use crate::platform::PlatformSendSync;
use crate::playback::{AmbientPlayOptions, BackendPlayOptions, Track};
use serde::{Deserialize, Serialize};

/// One command addressed to the native engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum NativeCommand {
    Play {
        track: Track,
        options: BackendPlayOptions,
    },
    Pause,
    Resume,
    Stop,
    Clear,
    #[serde(rename_all = "camelCase")]
    SeekTo { position_ms: u64 },
    #[serde(rename_all = "camelCase")]
    SeekForward { amount_ms: u64 },
    #[serde(rename_all = "camelCase")]
    SeekBack { amount_ms: u64 },
    SetPlaybackSpeed { speed: f32 },
    SetVolume { volume: f32 },
    AmbientPlay { options: AmbientPlayOptions },
    AmbientStop,
    AmbientPause,
    AmbientResume,
    #[serde(rename_all = "camelCase")]
    AmbientSeekTo { position_ms: u64 },
    AmbientSetVolume { volume: f32 },
}

impl NativeCommand {
    /// Name of the native method this command maps to.
    pub fn method_name(&self) -> &'static str {
        match self {
            NativeCommand::Play { .. } => "play",
            NativeCommand::Pause => "pause",
            NativeCommand::Resume => "resume",
            NativeCommand::Stop => "stop",
            NativeCommand::Clear => "clear",
            NativeCommand::SeekTo { .. } => "seekTo",
            NativeCommand::SeekForward { .. } => "seekForward",
            NativeCommand::SeekBack { .. } => "seekBack",
            NativeCommand::SetPlaybackSpeed { .. } => "setPlaybackSpeed",
            NativeCommand::SetVolume { .. } => "setVolume",
            NativeCommand::AmbientPlay { .. } => "ambientPlay",
            NativeCommand::AmbientStop => "ambientStop",
            NativeCommand::AmbientPause => "ambientPause",
            NativeCommand::AmbientResume => "ambientResume",
            NativeCommand::AmbientSeekTo { .. } => "ambientSeekTo",
            NativeCommand::AmbientSetVolume { .. } => "ambientSetVolume",
        }
    }

    pub fn is_ambient(&self) -> bool {
        matches!(
            self,
            NativeCommand::AmbientPlay { .. }
                | NativeCommand::AmbientStop
                | NativeCommand::AmbientPause
                | NativeCommand::AmbientResume
                | NativeCommand::AmbientSeekTo { .. }
                | NativeCommand::AmbientSetVolume { .. }
        )
    }
}

/// Host-provided command sink for the native engine.
///
/// Implementations must not block and must not report failures through the
/// call itself; failures come back later as PLAYBACK_ERROR events.
pub trait NativeAudioModule: PlatformSendSync {
    fn send(&self, command: NativeCommand);
}
