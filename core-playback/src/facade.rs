//! # Command Facade
//!
//! [`AudioPro`] is the single public control surface. It owns the player
//! store and the event lanes, validates and normalizes every command, applies
//! the transport guards and forwards to whichever backend the injected
//! [`RuntimeTarget`] selected.
//!
//! ## Guards
//!
//! Transport commands (pause, resume, seeks, speed) first require a loaded
//! track; without one they emit `PLAYBACK_ERROR` and stop. They then require
//! a state other than `IDLE`/`ERROR`; otherwise they are dropped silently
//! (logged at debug level when debugging is on). `stop()` and `clear()` are
//! always forwarded.
//!
//! No command returns an error or panics: failures surface as events on the
//! main or ambient lane.
//!
//! ## Usage
//!
//! ```ignore
//! use core_playback::{AudioPro, PlayOptions};
//! use core_runtime::CoreConfig;
//! use bridge_traits::{RuntimeTarget, Track};
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .target(RuntimeTarget::Native)
//!     .native_module(Arc::new(MyNativeModule))
//!     .build()?;
//! let player = AudioPro::new(config)?;
//!
//! let _subscription = player.add_event_listener(|event| println!("{}", event.event_type()));
//! player.play(Track::new("t1", "https://cdn.example.com/a.mp3", "A", "a.jpg"), PlayOptions::default());
//! ```

use crate::backend::{BrowserBackend, NativeBridge, NativeEventSink};
use crate::error::{PlaybackError, Result};
use crate::hook::{self, AudioProView};
use crate::normalize::{
    clamp_playback_speed, clamp_progress_interval, normalize_volume, resolve_track,
    resolve_track_url, validate_ambient_url, validate_track,
};
use crate::store::{PlaybackErrorInfo, PlayerStore};
use bridge_traits::playback::{DEFAULT_SEEK_MS, DEFAULT_VOLUME};
use bridge_traits::{
    AmbientBackend, AmbientPlayOptions, AssetResolver, BackendPlayOptions, PlaybackBackend,
    PlayerState, RequestHeaders, RuntimeTarget, Track,
};
use core_runtime::events::{AmbientEvent, AudioProEvent, EventEmitter};
use core_runtime::{ConfigureOptions, CoreConfig, Error as RuntimeError, Subscription};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Per-call options of [`AudioPro::play`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayOptions {
    /// Start playing as soon as the track is loaded. Defaults to `true`.
    pub auto_play: Option<bool>,
    pub start_time_ms: Option<u64>,
    pub headers: Option<RequestHeaders>,
}

impl PlayOptions {
    pub fn with_auto_play(mut self, auto_play: bool) -> Self {
        self.auto_play = Some(auto_play);
        self
    }

    pub fn with_start_time_ms(mut self, start_time_ms: u64) -> Self {
        self.start_time_ms = Some(start_time_ms);
        self
    }

    pub fn with_headers(mut self, headers: RequestHeaders) -> Self {
        self.headers = Some(headers);
        self
    }
}

/// Position and duration in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timings {
    pub position: u64,
    pub duration: u64,
}

/// Audio player facade.
pub struct AudioPro {
    target: RuntimeTarget,
    store: Arc<PlayerStore>,
    emitter: Arc<EventEmitter>,
    backend: Arc<dyn PlaybackBackend>,
    ambient_backend: Arc<dyn AmbientBackend>,
    asset_resolver: Option<Arc<dyn AssetResolver>>,
    native_events: Option<NativeEventSink>,
    ambient_volume: Mutex<f32>,
    reducer: Subscription,
}

impl AudioPro {
    /// Build a player for the target selected in `config`.
    pub fn new(config: CoreConfig) -> Result<Self> {
        config.validate()?;

        let emitter = Arc::new(EventEmitter::new());

        let mut player = match config.target {
            RuntimeTarget::Native => {
                let module = config
                    .native_module
                    .ok_or_else(|| missing("NativeAudioModule"))?;
                let bridge = Arc::new(NativeBridge::new(module));
                let mut player = Self::with_backends(
                    Arc::clone(&emitter),
                    bridge.clone(),
                    bridge,
                    config.configure_options,
                );
                player.native_events = Some(NativeEventSink::new(emitter));
                player
            }
            RuntimeTarget::Browser => {
                let element = config
                    .media_element
                    .ok_or_else(|| missing("MediaElement"))?;
                let ambient_element = config
                    .ambient_media_element
                    .ok_or_else(|| missing("AmbientMediaElement"))?;
                let scheduler = config
                    .scheduler
                    .ok_or_else(|| missing("TaskScheduler"))?;
                let backend =
                    BrowserBackend::new(element, ambient_element, scheduler, Arc::clone(&emitter));
                Self::with_backends(emitter, backend.clone(), backend, config.configure_options)
            }
        };

        player.target = config.target;
        player.asset_resolver = config.asset_resolver;

        tracing::info!(target_kind = ?player.target, "audio player initialized");
        Ok(player)
    }

    /// Assemble a player around caller-provided backends.
    ///
    /// The store reducer is registered as the first listener of the main
    /// lane, so every later listener observes the already-updated snapshot.
    pub fn with_backends(
        emitter: Arc<EventEmitter>,
        backend: Arc<dyn PlaybackBackend>,
        ambient_backend: Arc<dyn AmbientBackend>,
        options: ConfigureOptions,
    ) -> Self {
        let store = Arc::new(PlayerStore::with_options(clamp_interval_option(options)));

        let reducer_store = Arc::clone(&store);
        let reducer = emitter.add_listener(move |event| reducer_store.update_from_event(event));

        Self {
            target: RuntimeTarget::default(),
            store,
            emitter,
            backend,
            ambient_backend,
            asset_resolver: None,
            native_events: None,
            ambient_volume: Mutex::new(DEFAULT_VOLUME),
            reducer,
        }
    }

    pub fn with_asset_resolver(mut self, resolver: Arc<dyn AssetResolver>) -> Self {
        self.asset_resolver = Some(resolver);
        self
    }

    // ------------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------------

    /// Replace the configuration. Debug flags follow the new options.
    pub fn configure(&self, options: ConfigureOptions) {
        let options = clamp_interval_option(options);
        self.store.set_debug(options.debug);
        self.store.set_debug_include_progress(options.debug_include_progress);
        self.store.set_configure_options(options);
    }

    /// Merge a JSON object over the default options and apply it. Only the
    /// shape is checked; unrecognised keys are kept for the backend.
    pub fn configure_json(&self, options: Value) -> std::result::Result<(), RuntimeError> {
        let options = ConfigureOptions::from_json(options)?;
        self.configure(options);
        Ok(())
    }

    pub fn set_progress_interval(&self, interval_ms: u64) {
        let mut options = self.store.configure_options();
        options.progress_interval_ms = interval_ms;
        self.store.set_configure_options(clamp_interval_option(options));
    }

    // ------------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------------

    pub fn play(&self, track: Track, options: PlayOptions) {
        let track = resolve_track(&track, self.asset_resolver.as_deref());

        if let Err(err) = validate_track(&track) {
            tracing::warn!(error = %err, "rejecting play request");
            self.emit_error(&err);
            return;
        }

        self.store.set_error(None);
        self.store.set_track_playing(Some(track.clone()));

        let snapshot = self.store.snapshot();
        let config = snapshot.configure_options;
        let backend_options = BackendPlayOptions {
            content_type: config.content_type,
            debug: snapshot.debug,
            debug_include_progress: snapshot.debug_include_progress,
            progress_interval_ms: config.progress_interval_ms,
            show_next_prev_controls: config.show_next_prev_controls,
            playback_speed: snapshot.playback_speed,
            volume: normalize_volume(snapshot.volume).value,
            auto_play: options.auto_play.unwrap_or(true),
            start_time_ms: options.start_time_ms,
            headers: options.headers,
            extra: config.extra,
        };

        if snapshot.debug {
            tracing::debug!(track_id = %track.id, options = ?backend_options, "play");
        }
        self.backend.play(track, backend_options);
    }

    pub fn pause(&self) {
        if self.guard("pause") {
            self.backend.pause();
        }
    }

    pub fn resume(&self) {
        if self.guard("resume") {
            self.backend.resume();
        }
    }

    /// Always forwarded; clears any pending error.
    pub fn stop(&self) {
        self.store.set_error(None);
        self.backend.stop();
    }

    /// Always forwarded; clears the error, resets volume and unloads the
    /// track.
    pub fn clear(&self) {
        self.store.set_error(None);
        self.store.set_volume(DEFAULT_VOLUME);
        self.store.set_track_playing(None);
        self.backend.clear();
    }

    /// Negative positions are clamped to `0`.
    pub fn seek_to(&self, position_ms: i64) {
        let position = if position_ms < 0 {
            tracing::warn!(requested = position_ms, "negative seek position; clamped to 0");
            0
        } else {
            position_ms as u64
        };

        if self.guard("seek") {
            self.backend.seek_to(position);
        }
    }

    /// Skip ahead by `amount_ms`, or 30 seconds when `None`.
    pub fn seek_forward(&self, amount_ms: Option<u64>) {
        if self.guard("seek forward") {
            self.backend
                .seek_forward(amount_ms.unwrap_or(DEFAULT_SEEK_MS));
        }
    }

    /// Skip back by `amount_ms`, or 30 seconds when `None`.
    pub fn seek_back(&self, amount_ms: Option<u64>) {
        if self.guard("seek back") {
            self.backend.seek_back(amount_ms.unwrap_or(DEFAULT_SEEK_MS));
        }
    }

    /// The clamped speed is stored even when the command cannot be forwarded.
    pub fn set_playback_speed(&self, speed: f32) {
        let clamped = clamp_playback_speed(speed);
        if clamped.clamped {
            tracing::warn!(
                requested = speed,
                applied = clamped.value,
                "playback speed out of range; clamped"
            );
        }

        self.store.set_playback_speed(clamped.value);

        if self.guard("set playback speed") {
            self.backend.set_playback_speed(clamped.value);
        }
    }

    /// The normalized volume is stored even when no track is loaded; it is
    /// forwarded only while a track is active.
    pub fn set_volume(&self, volume: f32) {
        let normalized = normalize_volume(volume);
        if normalized.clamped {
            tracing::warn!(
                requested = volume,
                applied = normalized.value,
                "volume out of range; clamped"
            );
        }

        self.store.set_volume(normalized.value);

        let snapshot = self.store.snapshot();
        if snapshot.track.is_some() && snapshot.state.accepts_transport_commands() {
            self.backend.set_volume(normalized.value);
        }
    }

    // ------------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------------

    #[cfg(not(target_arch = "wasm32"))]
    pub fn add_event_listener<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&AudioProEvent) + Send + Sync + 'static,
    {
        self.emitter.add_listener(callback)
    }

    #[cfg(target_arch = "wasm32")]
    pub fn add_event_listener<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&AudioProEvent) + 'static,
    {
        self.emitter.add_listener(callback)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn add_ambient_listener<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&AmbientEvent) + Send + Sync + 'static,
    {
        self.emitter.add_ambient_listener(callback)
    }

    #[cfg(target_arch = "wasm32")]
    pub fn add_ambient_listener<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&AmbientEvent) + 'static,
    {
        self.emitter.add_ambient_listener(callback)
    }

    /// Call `on_change` whenever the observable view of the player changes.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn watch<F>(&self, on_change: F) -> Subscription
    where
        F: Fn(&AudioProView) + Send + Sync + 'static,
    {
        hook::watch(&self.store, on_change)
    }

    #[cfg(target_arch = "wasm32")]
    pub fn watch<F>(&self, on_change: F) -> Subscription
    where
        F: Fn(&AudioProView) + 'static,
    {
        hook::watch(&self.store, on_change)
    }

    pub fn view(&self) -> AudioProView {
        AudioProView::from(&self.store.snapshot())
    }

    pub fn get_timings(&self) -> Timings {
        let (position, duration) = self.store.timings();
        Timings { position, duration }
    }

    pub fn get_state(&self) -> PlayerState {
        self.store.state()
    }

    pub fn get_playing_track(&self) -> Option<Track> {
        self.store.track()
    }

    pub fn get_error(&self) -> Option<PlaybackErrorInfo> {
        self.store.error()
    }

    pub fn get_volume(&self) -> f32 {
        self.store.volume()
    }

    pub fn get_playback_speed(&self) -> f32 {
        self.store.playback_speed()
    }

    pub fn get_progress_interval(&self) -> u64 {
        self.store.configure_options().progress_interval_ms
    }

    pub fn get_configure_options(&self) -> ConfigureOptions {
        self.store.configure_options()
    }

    pub fn target(&self) -> RuntimeTarget {
        self.target
    }

    pub fn store(&self) -> &Arc<PlayerStore> {
        &self.store
    }

    pub fn emitter(&self) -> &Arc<EventEmitter> {
        &self.emitter
    }

    /// Ingress for native engine events; `None` on the browser target.
    pub fn native_events(&self) -> Option<&NativeEventSink> {
        self.native_events.as_ref()
    }

    // ------------------------------------------------------------------------
    // Ambient lane
    // ------------------------------------------------------------------------

    pub fn ambient_play(&self, options: AmbientPlayOptions) {
        let url = resolve_track_url(&options.url, self.asset_resolver.as_deref());

        if let Err(err) = validate_ambient_url(&url) {
            tracing::warn!(error = %err, "rejecting ambient play request");
            self.emitter
                .emit_ambient(&AmbientEvent::error(err.to_string()));
            return;
        }

        self.ambient_backend.ambient_play(AmbientPlayOptions {
            url,
            looping: options.looping,
        });
    }

    pub fn ambient_stop(&self) {
        self.ambient_backend.ambient_stop();
    }

    pub fn ambient_pause(&self) {
        self.ambient_backend.ambient_pause();
    }

    pub fn ambient_resume(&self) {
        self.ambient_backend.ambient_resume();
    }

    /// Negative positions are ignored.
    pub fn ambient_seek_to(&self, position_ms: i64) {
        if position_ms < 0 {
            tracing::debug!(requested = position_ms, "ignoring negative ambient seek");
            return;
        }
        self.ambient_backend.ambient_seek_to(position_ms as u64);
    }

    pub fn ambient_set_volume(&self, volume: f32) {
        let normalized = normalize_volume(volume);
        if normalized.clamped {
            tracing::warn!(
                requested = volume,
                applied = normalized.value,
                "ambient volume out of range; clamped"
            );
        }

        *self.ambient_volume.lock() = normalized.value;
        self.ambient_backend.ambient_set_volume(normalized.value);
    }

    pub fn get_ambient_volume(&self) -> f32 {
        *self.ambient_volume.lock()
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    /// Whether a transport command may reach the backend.
    fn guard(&self, operation: &'static str) -> bool {
        let snapshot = self.store.snapshot();

        if snapshot.track.is_none() {
            let err = PlaybackError::NoTrackLoaded { operation };
            tracing::warn!(operation, "{}", err);
            self.emit_error(&err);
            return false;
        }

        if !snapshot.state.accepts_transport_commands() {
            if snapshot.debug {
                tracing::debug!(operation, state = %snapshot.state, "command ignored in current state");
            }
            return false;
        }

        true
    }

    fn emit_error(&self, err: &PlaybackError) {
        self.emitter
            .emit(&AudioProEvent::playback_error(err.to_string(), None));
    }
}

impl Drop for AudioPro {
    fn drop(&mut self) {
        self.reducer.remove();
    }
}

impl std::fmt::Debug for AudioPro {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioPro")
            .field("target", &self.target)
            .field("store", &self.store)
            .field("ambient_volume", &self.get_ambient_volume())
            .finish()
    }
}

fn clamp_interval_option(mut options: ConfigureOptions) -> ConfigureOptions {
    let interval = clamp_progress_interval(options.progress_interval_ms);
    if interval.clamped {
        tracing::warn!(
            requested = options.progress_interval_ms,
            applied = interval.value,
            "progress interval out of range; clamped"
        );
    }
    options.progress_interval_ms = interval.value;
    options
}

fn missing(capability: &str) -> PlaybackError {
    RuntimeError::CapabilityMissing {
        capability: capability.to_string(),
        message: "required by the selected runtime target".to_string(),
    }
    .into()
}
