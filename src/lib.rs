//! Workspace umbrella crate.
//!
//! Re-exports the public surface of the individual workspace crates so host
//! applications can depend on `audio-pro-workspace` alone. Enable the `wasm`
//! feature to pull in the browser media bridges.

pub use bridge_traits as bridge;
pub use core_async as timers;
pub use core_playback as playback;
pub use core_runtime as runtime;

#[cfg(feature = "wasm")]
pub use bridge_wasm as wasm;

pub use bridge_traits::{
    AmbientPlayOptions, AssetHandle, ContentType, PlayerState, RuntimeTarget, Track, TrackUrl,
};
pub use core_playback::{AudioPro, AudioProView, PlayOptions, PlaybackError, Timings};
pub use core_runtime::{
    AmbientEvent, AudioProEvent, AudioProEventKind, ConfigureOptions, CoreConfig, Subscription,
};
