//! # Browser Media Backend
//!
//! Emulates the native event contract on top of a browser media element.
//!
//! ## Overview
//!
//! The element reports low-level notifications (`playing`, `pause`, `ended`,
//! ...). This backend re-expresses them in the common event vocabulary and
//! drives a progress-polling timer while audio is playing:
//!
//! | Element event | Emitted |
//! |---------------|---------|
//! | `playing` | `STATE_CHANGED(PLAYING)`, polling starts |
//! | `pause` | `STATE_CHANGED(PAUSED)`, polling stops |
//! | `ended` | `TRACK_ENDED`, polling stops |
//! | `error` | `PLAYBACK_ERROR` then `STATE_CHANGED(ERROR)`, polling stops |
//! | `loadstart` | `STATE_CHANGED(LOADING)` |
//! | `canplay` (paused) | `STATE_CHANGED(PAUSED)` |
//! | `seeked` | `SEEK_COMPLETE` |
//!
//! At most one polling task is alive per backend. Every start cancels the
//! previous task, and a generation counter makes ticks from a cancelled task
//! no-ops.
//!
//! A second element carries the ambient lane, which only reports
//! `AMBIENT_TRACK_ENDED` and `AMBIENT_ERROR`.

use bridge_traits::media::MediaErrorInfo;
use bridge_traits::playback::DEFAULT_PROGRESS_INTERVAL_MS;
use bridge_traits::{
    AmbientBackend, AmbientPlayOptions, BackendPlayOptions, BridgeError, MediaElement,
    MediaElementEvent, PlaybackBackend, PlayerState, ScheduledTask, TaskScheduler, Track,
};
use core_runtime::events::{
    AmbientEvent, AudioProEvent, AudioProEventKind, EventEmitter, EventTrack,
};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;

const UNKNOWN_ERROR: &str = "Unknown error";
const UNKNOWN_ERROR_CODE: i32 = -1;
const ASSET_UNSUPPORTED: &str =
    "Local asset references are not supported by the browser backend";

struct MainLane {
    current_track: Option<Track>,
    /// Bumped on every play/clear so late `play()` rejections of an older
    /// load are ignored.
    load_id: u64,
    polling: Option<ScheduledTask>,
    polling_generation: u64,
    playback_rate: f32,
    progress_interval: Duration,
    /// Set by `stop()`/`clear()` on a playing element; swallows the `pause`
    /// notification the element fires in response.
    suppress_pause: bool,
}

impl Default for MainLane {
    fn default() -> Self {
        Self {
            current_track: None,
            load_id: 0,
            polling: None,
            polling_generation: 0,
            playback_rate: 1.0,
            progress_interval: Duration::from_millis(DEFAULT_PROGRESS_INTERVAL_MS),
            suppress_pause: false,
        }
    }
}

#[derive(Default)]
struct AmbientLane {
    looping: bool,
}

/// Backend driving a pair of browser media elements.
pub struct BrowserBackend {
    this: Weak<BrowserBackend>,
    element: Arc<dyn MediaElement>,
    ambient_element: Arc<dyn MediaElement>,
    scheduler: Arc<dyn TaskScheduler>,
    emitter: Arc<EventEmitter>,
    main: Mutex<MainLane>,
    ambient: Mutex<AmbientLane>,
}

impl BrowserBackend {
    /// Create the backend and install its handlers on both elements.
    pub fn new(
        element: Arc<dyn MediaElement>,
        ambient_element: Arc<dyn MediaElement>,
        scheduler: Arc<dyn TaskScheduler>,
        emitter: Arc<EventEmitter>,
    ) -> Arc<Self> {
        let backend = Arc::new_cyclic(|this| Self {
            this: this.clone(),
            element,
            ambient_element,
            scheduler,
            emitter,
            main: Mutex::new(MainLane::default()),
            ambient: Mutex::new(AmbientLane::default()),
        });

        let weak = Arc::downgrade(&backend);
        backend.element.set_event_handler(Arc::new(move |event| {
            if let Some(backend) = weak.upgrade() {
                backend.handle_element_event(event);
            }
        }));

        let weak = Arc::downgrade(&backend);
        backend.ambient_element.set_event_handler(Arc::new(move |event| {
            if let Some(backend) = weak.upgrade() {
                backend.handle_ambient_event(event);
            }
        }));

        backend
    }

    pub fn current_track(&self) -> Option<Track> {
        self.main.lock().current_track.clone()
    }

    pub fn playback_rate(&self) -> f32 {
        self.main.lock().playback_rate
    }

    pub fn is_polling(&self) -> bool {
        self.main
            .lock()
            .polling
            .as_ref()
            .is_some_and(ScheduledTask::is_active)
    }

    // ------------------------------------------------------------------------
    // Main lane
    // ------------------------------------------------------------------------

    fn handle_element_event(&self, event: MediaElementEvent) {
        tracing::trace!(event = event.dom_name(), "media element event");

        match event {
            MediaElementEvent::Playing => {
                self.main.lock().suppress_pause = false;
                self.emit_state(PlayerState::Playing, true);
                self.start_polling();
            }
            MediaElementEvent::Pause => {
                self.stop_polling();
                let suppressed = std::mem::take(&mut self.main.lock().suppress_pause);
                if suppressed {
                    tracing::trace!("ignoring pause raised by stop/clear");
                    return;
                }
                self.emit_state(PlayerState::Paused, true);
            }
            MediaElementEvent::Ended => {
                self.stop_polling();
                let (position, duration) = self.timings();
                self.emit(AudioProEventKind::TrackEnded { position, duration });
            }
            MediaElementEvent::Error => {
                self.stop_polling();
                let MediaErrorInfo { message, code } = self.element.error().unwrap_or_default();
                let message = message
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
                tracing::error!(error = %message, "media element reported an error");
                self.emit(AudioProEventKind::PlaybackError {
                    error: message,
                    code: Some(code.unwrap_or(UNKNOWN_ERROR_CODE)),
                });
                self.emit_state(PlayerState::Error, false);
            }
            MediaElementEvent::LoadStart => {
                if self.has_track() {
                    self.emit_state(PlayerState::Loading, false);
                }
            }
            MediaElementEvent::CanPlay => {
                if self.has_track() && self.element.paused() {
                    self.emit_state(PlayerState::Paused, true);
                }
            }
            MediaElementEvent::Seeked => {
                let (position, duration) = self.timings();
                self.emit(AudioProEventKind::SeekComplete {
                    position: Some(position),
                    duration: Some(duration),
                });
            }
        }
    }

    fn has_track(&self) -> bool {
        self.main.lock().current_track.is_some()
    }

    fn track_slot(&self) -> EventTrack {
        self.main.lock().current_track.clone().into()
    }

    fn emit(&self, kind: AudioProEventKind) {
        let event = AudioProEvent::new(self.track_slot(), kind);
        self.emitter.emit(&event);
    }

    fn emit_state(&self, state: PlayerState, with_timings: bool) {
        let (position, duration) = if with_timings {
            let (position, duration) = self.timings();
            (Some(position), Some(duration))
        } else {
            (None, None)
        };
        self.emit(AudioProEventKind::StateChanged {
            state,
            position,
            duration,
        });
    }

    fn emit_failure(&self, track: EventTrack, message: String) {
        tracing::error!(error = %message, "browser playback failed");
        self.emitter.emit(&AudioProEvent::new(
            track.clone(),
            AudioProEventKind::PlaybackError {
                error: message,
                code: None,
            },
        ));
        self.emitter
            .emit(&AudioProEvent::state_changed(track, PlayerState::Error));
    }

    /// Current position and duration in milliseconds. Unknown durations
    /// read as `0`.
    fn timings(&self) -> (u64, u64) {
        (
            seconds_to_millis(self.element.current_time()),
            seconds_to_millis(self.element.duration()),
        )
    }

    fn duration_ms(&self) -> Option<u64> {
        match seconds_to_millis(self.element.duration()) {
            0 => None,
            duration => Some(duration),
        }
    }

    fn start_playback(&self, load_id: u64) {
        let this = self.this.clone();
        self.element.play(Box::new(move |outcome| {
            let Err(err) = outcome else {
                return;
            };
            let Some(backend) = this.upgrade() else {
                return;
            };
            if backend.main.lock().load_id != load_id {
                tracing::debug!("ignoring play rejection for a replaced track");
                return;
            }
            let message = format!("Failed to play: {}", rejection(&err));
            backend.emit_failure(backend.track_slot(), message);
        }));
    }

    fn start_polling(&self) {
        let (generation, interval, previous) = {
            let mut main = self.main.lock();
            main.polling_generation += 1;
            (
                main.polling_generation,
                main.progress_interval,
                main.polling.take(),
            )
        };
        drop(previous);

        let this = self.this.clone();
        let handle = self.scheduler.schedule_repeating(
            interval,
            Box::new(move || {
                if let Some(backend) = this.upgrade() {
                    backend.poll_progress(generation);
                }
            }),
        );

        let stale = {
            let mut main = self.main.lock();
            if main.polling_generation == generation {
                main.polling = Some(handle);
                None
            } else {
                Some(handle)
            }
        };
        drop(stale);
    }

    fn stop_polling(&self) {
        let previous = {
            let mut main = self.main.lock();
            main.polling_generation += 1;
            main.polling.take()
        };
        drop(previous);
    }

    /// Silence the main element after a failed load: no more polling, no
    /// late pause notification, no rejection from the previous `play()`.
    fn halt_main(&self) {
        self.stop_polling();
        let was_playing = !self.element.paused();
        {
            let mut main = self.main.lock();
            main.suppress_pause |= was_playing;
            main.load_id += 1;
        }
        if was_playing {
            self.element.pause();
        }
    }

    fn poll_progress(&self, generation: u64) {
        let current = {
            let main = self.main.lock();
            main.polling_generation == generation && main.current_track.is_some()
        };
        if !current {
            return;
        }

        let (position, duration) = self.timings();
        self.emit(AudioProEventKind::Progress { position, duration });
    }

    // ------------------------------------------------------------------------
    // Ambient lane
    // ------------------------------------------------------------------------

    fn handle_ambient_event(&self, event: MediaElementEvent) {
        match event {
            MediaElementEvent::Ended => {
                if !self.ambient.lock().looping {
                    self.emitter.emit_ambient(&AmbientEvent::TrackEnded);
                }
            }
            MediaElementEvent::Error => {
                let message = self
                    .ambient_element
                    .error()
                    .and_then(|info| info.message)
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
                tracing::error!(error = %message, "ambient media element reported an error");
                self.emitter.emit_ambient(&AmbientEvent::error(message));
            }
            _ => {}
        }
    }

    fn start_ambient_playback(&self) {
        let emitter = Arc::clone(&self.emitter);
        self.ambient_element.play(Box::new(move |outcome| {
            if let Err(err) = outcome {
                let message = format!("Failed to play ambient audio: {}", rejection(&err));
                tracing::error!(error = %message, "ambient playback rejected");
                emitter.emit_ambient(&AmbientEvent::error(message));
            }
        }));
    }
}

impl std::fmt::Debug for BrowserBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserBackend")
            .field("current_track", &self.current_track())
            .field("playback_rate", &self.playback_rate())
            .field("polling", &self.is_polling())
            .finish()
    }
}

impl PlaybackBackend for BrowserBackend {
    fn play(&self, track: Track, options: BackendPlayOptions) {
        let Some(url) = track.url.as_uri().map(str::to_owned) else {
            self.halt_main();
            self.emit_failure(EventTrack::Loaded(track), ASSET_UNSUPPORTED.to_string());
            return;
        };

        self.stop_polling();
        let load_id = {
            let mut main = self.main.lock();
            main.current_track = Some(track.clone());
            main.load_id += 1;
            main.playback_rate = options.playback_speed;
            main.progress_interval = Duration::from_millis(options.progress_interval_ms.max(1));
            main.suppress_pause = false;
            main.load_id
        };

        self.element.set_src(&url);
        self.element.load();
        self.emitter
            .emit(&AudioProEvent::state_changed(track, PlayerState::Loading));

        self.element
            .set_playback_rate(f64::from(options.playback_speed));
        self.element.set_volume(f64::from(options.volume));
        if let Some(start_ms) = options.start_time_ms {
            self.element.set_current_time(start_ms as f64 / 1000.0);
        }

        if options.auto_play {
            self.start_playback(load_id);
        } else {
            self.emit_state(PlayerState::Paused, false);
        }
    }

    fn pause(&self) {
        self.element.pause();
    }

    fn resume(&self) {
        let load_id = self.main.lock().load_id;
        self.start_playback(load_id);
    }

    fn stop(&self) {
        let was_playing = !self.element.paused();
        self.main.lock().suppress_pause |= was_playing;

        self.element.pause();
        self.element.set_current_time(0.0);
        self.stop_polling();

        let duration = seconds_to_millis(self.element.duration());
        self.emit(AudioProEventKind::StateChanged {
            state: PlayerState::Stopped,
            position: Some(0),
            duration: Some(duration),
        });
    }

    fn clear(&self) {
        let was_playing = !self.element.paused();
        {
            let mut main = self.main.lock();
            main.suppress_pause |= was_playing;
            main.current_track = None;
            main.load_id += 1;
        }

        self.element.pause();
        self.element.set_current_time(0.0);
        self.stop_polling();
        self.element.remove_src();

        self.emitter.emit(&AudioProEvent::new(
            EventTrack::Cleared,
            AudioProEventKind::StateChanged {
                state: PlayerState::Idle,
                position: Some(0),
                duration: Some(0),
            },
        ));
    }

    fn seek_to(&self, position_ms: u64) {
        self.element.set_current_time(position_ms as f64 / 1000.0);
    }

    fn seek_forward(&self, amount_ms: u64) {
        let (position, _) = self.timings();
        let mut target = position.saturating_add(amount_ms);
        if let Some(duration) = self.duration_ms() {
            target = target.min(duration);
        }
        self.seek_to(target);
    }

    fn seek_back(&self, amount_ms: u64) {
        let (position, _) = self.timings();
        self.seek_to(position.saturating_sub(amount_ms));
    }

    fn set_playback_speed(&self, speed: f32) {
        self.main.lock().playback_rate = speed;
        self.element.set_playback_rate(f64::from(speed));
        self.emit(AudioProEventKind::PlaybackSpeedChanged { speed });
    }

    fn set_volume(&self, volume: f32) {
        self.element.set_volume(f64::from(volume));
    }
}

impl AmbientBackend for BrowserBackend {
    fn ambient_play(&self, options: AmbientPlayOptions) {
        let Some(url) = options.url.as_uri() else {
            tracing::error!("ambient asset reference cannot be played in the browser");
            self.emitter
                .emit_ambient(&AmbientEvent::error(ASSET_UNSUPPORTED));
            return;
        };

        self.ambient.lock().looping = options.looping;
        self.ambient_element.set_src(url);
        self.ambient_element.set_loop(options.looping);
        self.ambient_element.load();
        self.start_ambient_playback();
    }

    fn ambient_stop(&self) {
        self.ambient_element.pause();
        self.ambient_element.set_current_time(0.0);
        self.ambient_element.remove_src();
    }

    fn ambient_pause(&self) {
        self.ambient_element.pause();
    }

    fn ambient_resume(&self) {
        self.start_ambient_playback();
    }

    fn ambient_seek_to(&self, position_ms: u64) {
        self.ambient_element
            .set_current_time(position_ms as f64 / 1000.0);
    }

    fn ambient_set_volume(&self, volume: f32) {
        self.ambient_element.set_volume(f64::from(volume));
    }
}

fn seconds_to_millis(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    }
}

fn rejection(err: &BridgeError) -> String {
    match err {
        BridgeError::PlaybackRejected(message)
        | BridgeError::OperationFailed(message)
        | BridgeError::NotAvailable(message)
        | BridgeError::AssetResolution(message) => message.clone(),
    }
}
