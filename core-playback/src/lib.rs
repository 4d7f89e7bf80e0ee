//! # Playback Core
//!
//! Keeps one authoritative picture of the audio player and drives either a
//! native audio engine or a browser media element behind a single command
//! surface.
//!
//! ## Overview
//!
//! - [`store`]: the player snapshot and the reducer folding events into it
//! - [`facade`]: [`AudioPro`], command validation, guards and forwarding
//! - [`backend`]: the native bridge and the browser media backend
//! - [`normalize`]: clamping, volume rounding, asset and path resolution
//! - [`hook`]: change-filtered observation for UI layers
//!
//! Events flow one way: backends emit on the main or ambient lane of a
//! shared [`EventEmitter`](core_runtime::EventEmitter), the store reducer
//! runs first on the main lane, then caller listeners observe the already
//! updated snapshot.

pub mod backend;
pub mod error;
pub mod facade;
pub mod hook;
pub mod normalize;
pub mod store;

pub use backend::{
    parse_native_event, BrowserBackend, NativeBridge, NativeEvent, NativeEventError,
    NativeEventSink,
};
pub use error::{PlaybackError, Result};
pub use facade::{AudioPro, PlayOptions, Timings};
pub use hook::{select, watch, AudioProView};
pub use normalize::Clamped;
pub use store::{PlaybackErrorInfo, PlayerSnapshot, PlayerStore, StoreChange, StoreFields};
