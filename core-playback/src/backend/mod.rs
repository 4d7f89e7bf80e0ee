//! Playback backends.
//!
//! Exactly two implementations of [`PlaybackBackend`](bridge_traits::PlaybackBackend)
//! and [`AmbientBackend`](bridge_traits::AmbientBackend) exist; the facade
//! picks one from the injected [`RuntimeTarget`](bridge_traits::RuntimeTarget).

pub mod browser;
pub mod native;

pub use browser::BrowserBackend;
pub use native::{parse_native_event, NativeBridge, NativeEvent, NativeEventError, NativeEventSink};
