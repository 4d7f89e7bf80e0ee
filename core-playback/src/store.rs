//! # Player State Store
//!
//! Single source of truth for the player: lifecycle state, timings, loaded
//! track, speed, volume, last error and the applied configuration.
//!
//! ## Overview
//!
//! All mutation goes through two paths:
//! - [`PlayerStore::update_from_event`], the reducer that folds a normalized
//!   main-lane event into the snapshot.
//! - Dedicated setters used by the command facade for values that do not
//!   originate from a backend (volume, speed, optimistic track, error,
//!   configuration, debug flags).
//!
//! Every mutation that changes at least one field publishes a
//! [`StoreChange`] naming the changed fields. Writes that leave the snapshot
//! untouched publish nothing, so observers can count real changes.
//!
//! The store is explicitly constructed and shared through `Arc`; several
//! independent players can live in one process.

use bitflags::bitflags;
use bridge_traits::playback::{DEFAULT_PLAYBACK_SPEED, DEFAULT_VOLUME};
use bridge_traits::{PlayerState, Track};
use core_runtime::events::{AudioProEvent, AudioProEventKind, EventChannel, EventTrack};
use core_runtime::{ConfigureOptions, Subscription};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Fields touched by a store mutation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StoreFields: u16 {
        const STATE = 1 << 0;
        const POSITION = 1 << 1;
        const DURATION = 1 << 2;
        const TRACK = 1 << 3;
        const SPEED = 1 << 4;
        const VOLUME = 1 << 5;
        const ERROR = 1 << 6;
        const CONFIG = 1 << 7;
        const DEBUG = 1 << 8;
    }
}

/// Notification published after a mutation changed the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreChange {
    pub fields: StoreFields,
}

/// Last unresolved playback error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackErrorInfo {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
}

impl PlaybackErrorInfo {
    pub fn new(message: impl Into<String>, code: Option<i32>) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }
}

/// Owned copy of the player state.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub state: PlayerState,
    /// Milliseconds.
    pub position: u64,
    /// Milliseconds; `0` while unknown.
    pub duration: u64,
    pub track: Option<Track>,
    pub playback_speed: f32,
    pub volume: f32,
    pub error: Option<PlaybackErrorInfo>,
    pub configure_options: ConfigureOptions,
    pub debug: bool,
    pub debug_include_progress: bool,
}

impl Default for PlayerSnapshot {
    fn default() -> Self {
        Self {
            state: PlayerState::Idle,
            position: 0,
            duration: 0,
            track: None,
            playback_speed: DEFAULT_PLAYBACK_SPEED,
            volume: DEFAULT_VOLUME,
            error: None,
            configure_options: ConfigureOptions::default(),
            debug: false,
            debug_include_progress: false,
        }
    }
}

/// Shared, lock-protected player state.
#[derive(Debug)]
pub struct PlayerStore {
    snapshot: RwLock<PlayerSnapshot>,
    changes: EventChannel<StoreChange>,
}

impl Default for PlayerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerStore {
    pub fn new() -> Self {
        Self::with_options(ConfigureOptions::default())
    }

    /// Store whose configuration and debug flags start from `options`.
    pub fn with_options(options: ConfigureOptions) -> Self {
        let snapshot = PlayerSnapshot {
            debug: options.debug,
            debug_include_progress: options.debug_include_progress,
            configure_options: options,
            ..PlayerSnapshot::default()
        };
        Self {
            snapshot: RwLock::new(snapshot),
            changes: EventChannel::new("store"),
        }
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        self.snapshot.read().clone()
    }

    pub fn state(&self) -> PlayerState {
        self.snapshot.read().state
    }

    /// `(position, duration)` in milliseconds.
    pub fn timings(&self) -> (u64, u64) {
        let snapshot = self.snapshot.read();
        (snapshot.position, snapshot.duration)
    }

    pub fn track(&self) -> Option<Track> {
        self.snapshot.read().track.clone()
    }

    pub fn has_track(&self) -> bool {
        self.snapshot.read().track.is_some()
    }

    pub fn playback_speed(&self) -> f32 {
        self.snapshot.read().playback_speed
    }

    pub fn volume(&self) -> f32 {
        self.snapshot.read().volume
    }

    pub fn error(&self) -> Option<PlaybackErrorInfo> {
        self.snapshot.read().error.clone()
    }

    pub fn configure_options(&self) -> ConfigureOptions {
        self.snapshot.read().configure_options.clone()
    }

    pub fn debug(&self) -> bool {
        self.snapshot.read().debug
    }

    /// Channel receiving a [`StoreChange`] after every effective mutation.
    pub fn changes(&self) -> &EventChannel<StoreChange> {
        &self.changes
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn add_change_listener<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&StoreChange) + Send + Sync + 'static,
    {
        self.changes.add_listener(callback)
    }

    #[cfg(target_arch = "wasm32")]
    pub fn add_change_listener<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&StoreChange) + 'static,
    {
        self.changes.add_listener(callback)
    }

    /// Fold a main-lane event into the snapshot.
    pub fn update_from_event(&self, event: &AudioProEvent) {
        let kind = &event.kind;

        {
            let snapshot = self.snapshot.read();
            let is_progress = matches!(kind, AudioProEventKind::Progress { .. });
            if snapshot.debug && (!is_progress || snapshot.debug_include_progress) {
                tracing::debug!(event = kind.event_type(), payload = ?kind, "reducing event");
            }
        }

        if kind.requires_track() && event.track.is_absent() {
            tracing::warn!(
                event = kind.event_type(),
                "event is missing its track field; backends must send the track or null"
            );
        }

        self.mutate(|snapshot| {
            let mut changed = StoreFields::empty();

            match kind {
                AudioProEventKind::StateChanged { state, .. } => {
                    changed |= set_field(&mut snapshot.state, *state, StoreFields::STATE);
                    if *state != PlayerState::Error {
                        changed |= set_field(&mut snapshot.error, None, StoreFields::ERROR);
                    }
                }
                AudioProEventKind::PlaybackError { error, code } => {
                    changed |= set_field(
                        &mut snapshot.error,
                        Some(PlaybackErrorInfo::new(error.clone(), *code)),
                        StoreFields::ERROR,
                    );
                }
                AudioProEventKind::PlaybackSpeedChanged { speed } => {
                    changed |= set_field(&mut snapshot.playback_speed, *speed, StoreFields::SPEED);
                }
                _ => {}
            }

            if let Some(position) = kind.position() {
                changed |= set_field(&mut snapshot.position, position, StoreFields::POSITION);
            }
            if let Some(duration) = kind.duration() {
                changed |= set_field(&mut snapshot.duration, duration, StoreFields::DURATION);
            }

            let touches_track = !matches!(
                kind,
                AudioProEventKind::RemoteNext | AudioProEventKind::RemotePrev
            );
            if touches_track {
                match &event.track {
                    EventTrack::Loaded(track) => {
                        if snapshot.track.as_ref() != Some(track) {
                            snapshot.track = Some(track.clone());
                            changed |= StoreFields::TRACK;
                        }
                    }
                    EventTrack::Cleared => {
                        if !matches!(kind, AudioProEventKind::PlaybackError { .. }) {
                            changed |= set_field(&mut snapshot.track, None, StoreFields::TRACK);
                        }
                    }
                    EventTrack::Absent => {}
                }
            }

            changed
        });
    }

    /// Store an already-normalized volume.
    pub fn set_volume(&self, volume: f32) {
        self.mutate(|snapshot| set_field(&mut snapshot.volume, volume, StoreFields::VOLUME));
    }

    /// Store an already-clamped playback speed.
    pub fn set_playback_speed(&self, speed: f32) {
        self.mutate(|snapshot| set_field(&mut snapshot.playback_speed, speed, StoreFields::SPEED));
    }

    pub fn set_track_playing(&self, track: Option<Track>) {
        self.mutate(|snapshot| set_field(&mut snapshot.track, track, StoreFields::TRACK));
    }

    pub fn set_error(&self, error: Option<PlaybackErrorInfo>) {
        self.mutate(|snapshot| set_field(&mut snapshot.error, error, StoreFields::ERROR));
    }

    /// Replace the configuration wholesale.
    pub fn set_configure_options(&self, options: ConfigureOptions) {
        self.mutate(|snapshot| {
            set_field(&mut snapshot.configure_options, options, StoreFields::CONFIG)
        });
    }

    pub fn set_debug(&self, debug: bool) {
        self.mutate(|snapshot| set_field(&mut snapshot.debug, debug, StoreFields::DEBUG));
    }

    pub fn set_debug_include_progress(&self, include: bool) {
        self.mutate(|snapshot| {
            set_field(
                &mut snapshot.debug_include_progress,
                include,
                StoreFields::DEBUG,
            )
        });
    }

    /// Apply `update` under the write lock, then publish outside of it.
    fn mutate(&self, update: impl FnOnce(&mut PlayerSnapshot) -> StoreFields) {
        let changed = {
            let mut snapshot = self.snapshot.write();
            update(&mut snapshot)
        };

        if !changed.is_empty() {
            self.changes.emit(&StoreChange { fields: changed });
        }
    }
}

fn set_field<T: PartialEq>(slot: &mut T, value: T, field: StoreFields) -> StoreFields {
    if *slot == value {
        StoreFields::empty()
    } else {
        *slot = value;
        field
    }
}
