//! # Host Bridge Traits
//!
//! Contracts between the playback core and the platforms that host it.
//!
//! ## Overview
//!
//! The core never talks to an audio engine directly. Each capability it
//! needs is expressed as a trait here and implemented per platform:
//!
//! | Capability | Trait | Native | Web |
//! |------------|-------|--------|-----|
//! | Playback commands | [`PlaybackBackend`], [`AmbientBackend`] | `core_playback::NativeBridge` | `core_playback::BrowserBackend` |
//! | Native engine | [`NativeAudioModule`] | host FFI shim | n/a |
//! | Media element | [`MediaElement`] | n/a | `bridge_wasm::HtmlMediaElement` |
//! | Timers | [`TaskScheduler`] | `core_async::IntervalScheduler` | `core_async::IntervalScheduler` |
//! | Bundled assets | [`AssetResolver`] | host | host |
//! | Log forwarding | [`LoggerSink`] | host | host |
//!
//! The value types every layer shares ([`Track`], [`PlayerState`],
//! [`BackendPlayOptions`], ...) live in [`playback`].
//!
//! ## Thread Safety
//!
//! On native targets every trait requires `Send + Sync` through
//! [`PlatformSendSync`](platform::PlatformSendSync); on `wasm32` the bound
//! disappears because browser objects are single-threaded.

pub mod assets;
pub mod error;
pub mod log;
pub mod media;
pub mod native;
pub mod platform;
pub mod playback;
pub mod scheduler;

pub use error::BridgeError;

pub use assets::AssetResolver;
pub use log::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use media::{MediaElement, MediaElementEvent, MediaErrorInfo};
pub use native::{NativeAudioModule, NativeCommand};
pub use playback::{
    AmbientBackend, AmbientPlayOptions, AssetHandle, BackendPlayOptions, ContentType,
    PlaybackBackend, PlayerState, RequestHeaders, RuntimeTarget, Track, TrackUrl,
};
pub use scheduler::{ScheduledTask, TaskScheduler};
