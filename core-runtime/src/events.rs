//! # Event Channels
//!
//! Synchronous publish/subscribe plumbing between playback backends and the
//! rest of the core.
//!
//! ## Overview
//!
//! The player exposes two isolated lanes:
//! - **main**: transport events ([`AudioProEvent`]) produced by the active
//!   backend and folded into the player store.
//! - **ambient**: events of the secondary audio lane ([`AmbientEvent`]). They
//!   never reach the store and never cross into the main lane.
//!
//! Both lanes are instances of the generic [`EventChannel`], which the store
//! also reuses for its own change notifications.
//!
//! ## Delivery semantics
//!
//! - `emit` runs every listener registered at the start of the emission, in
//!   registration order, on the caller's thread. Nothing is queued or replayed.
//! - A panicking listener is logged and skipped; later listeners still run.
//! - [`Subscription::remove`] takes effect immediately: a listener removed by
//!   an earlier listener of the same emission is not invoked.
//!
//! ```text
//! ┌──────────────┐  emit   ┌────────────────────┐  listeners  ┌─────────────┐
//! │ NativeBridge ├────────>│                    ├────────────>│ PlayerStore │
//! └──────────────┘         │ EventEmitter.main  │             └─────────────┘
//! ┌──────────────┐  emit   │                    ├────────────>│ UI callback │
//! │BrowserBackend├────────>└────────────────────┘             └─────────────┘
//! │              │  emit   ┌────────────────────┐
//! │              ├────────>│ EventEmitter.ambient├──────────> ambient callbacks
//! └──────────────┘         └────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{AudioProEvent, AudioProEventKind, EventEmitter, EventTrack};
//! use bridge_traits::PlayerState;
//!
//! let emitter = EventEmitter::new();
//! let subscription = emitter.add_listener(|event: &AudioProEvent| {
//!     println!("{}", event.event_type());
//! });
//!
//! emitter.emit(&AudioProEvent::new(
//!     EventTrack::Cleared,
//!     AudioProEventKind::StateChanged {
//!         state: PlayerState::Idle,
//!         position: None,
//!         duration: None,
//!     },
//! ));
//!
//! subscription.remove();
//! ```

use bridge_traits::{PlayerState, Track};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize, Serializer};
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// ============================================================================
// Event Types
// ============================================================================

/// Track slot of a main-lane event.
///
/// Backends distinguish "no track" (explicit `null`) from "field not sent";
/// the store clears the current track only for the former.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EventTrack {
    /// The event refers to this track.
    Loaded(Track),
    /// The backend reported that no track is loaded.
    Cleared,
    /// The backend did not say anything about the track.
    #[default]
    Absent,
}

impl EventTrack {
    pub fn track(&self) -> Option<&Track> {
        match self {
            EventTrack::Loaded(track) => Some(track),
            EventTrack::Cleared | EventTrack::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, EventTrack::Absent)
    }
}

impl From<Track> for EventTrack {
    fn from(track: Track) -> Self {
        EventTrack::Loaded(track)
    }
}

impl From<Option<Track>> for EventTrack {
    fn from(track: Option<Track>) -> Self {
        match track {
            Some(track) => EventTrack::Loaded(track),
            None => EventTrack::Cleared,
        }
    }
}

/// Payload of a main-lane event, one variant per event type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioProEventKind {
    StateChanged {
        state: PlayerState,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration: Option<u64>,
    },
    Progress {
        position: u64,
        duration: u64,
    },
    TrackEnded {
        position: u64,
        duration: u64,
    },
    SeekComplete {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration: Option<u64>,
    },
    PlaybackSpeedChanged {
        speed: f32,
    },
    PlaybackError {
        error: String,
        #[serde(rename = "errorCode", default, skip_serializing_if = "Option::is_none")]
        code: Option<i32>,
    },
    RemoteNext,
    RemotePrev,
}

impl AudioProEventKind {
    /// Wire name of the event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            AudioProEventKind::StateChanged { .. } => "STATE_CHANGED",
            AudioProEventKind::Progress { .. } => "PROGRESS",
            AudioProEventKind::TrackEnded { .. } => "TRACK_ENDED",
            AudioProEventKind::SeekComplete { .. } => "SEEK_COMPLETE",
            AudioProEventKind::PlaybackSpeedChanged { .. } => "PLAYBACK_SPEED_CHANGED",
            AudioProEventKind::PlaybackError { .. } => "PLAYBACK_ERROR",
            AudioProEventKind::RemoteNext => "REMOTE_NEXT",
            AudioProEventKind::RemotePrev => "REMOTE_PREV",
        }
    }

    /// Whether backends must say which track the event is about.
    pub fn requires_track(&self) -> bool {
        !matches!(
            self,
            AudioProEventKind::PlaybackError { .. }
                | AudioProEventKind::RemoteNext
                | AudioProEventKind::RemotePrev
        )
    }

    pub fn position(&self) -> Option<u64> {
        match self {
            AudioProEventKind::StateChanged { position, .. }
            | AudioProEventKind::SeekComplete { position, .. } => *position,
            AudioProEventKind::Progress { position, .. }
            | AudioProEventKind::TrackEnded { position, .. } => Some(*position),
            _ => None,
        }
    }

    pub fn duration(&self) -> Option<u64> {
        match self {
            AudioProEventKind::StateChanged { duration, .. }
            | AudioProEventKind::SeekComplete { duration, .. } => *duration,
            AudioProEventKind::Progress { duration, .. }
            | AudioProEventKind::TrackEnded { duration, .. } => Some(*duration),
            _ => None,
        }
    }
}

/// Normalized main-lane event.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioProEvent {
    pub track: EventTrack,
    pub kind: AudioProEventKind,
}

impl AudioProEvent {
    pub fn new(track: impl Into<EventTrack>, kind: AudioProEventKind) -> Self {
        Self {
            track: track.into(),
            kind,
        }
    }

    pub fn state_changed(track: impl Into<EventTrack>, state: PlayerState) -> Self {
        Self::new(
            track,
            AudioProEventKind::StateChanged {
                state,
                position: None,
                duration: None,
            },
        )
    }

    /// `PLAYBACK_ERROR` with an explicit `null` track.
    pub fn playback_error(message: impl Into<String>, code: Option<i32>) -> Self {
        Self::new(
            EventTrack::Cleared,
            AudioProEventKind::PlaybackError {
                error: message.into(),
                code,
            },
        )
    }

    pub fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }
}

impl Serialize for AudioProEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            track: Option<Option<&'a Track>>,
            #[serde(flatten)]
            kind: &'a AudioProEventKind,
        }

        let track = match &self.track {
            EventTrack::Loaded(track) => Some(Some(track)),
            EventTrack::Cleared => Some(None),
            EventTrack::Absent => None,
        };

        Wire {
            track,
            kind: &self.kind,
        }
        .serialize(serializer)
    }
}

/// Event of the ambient lane. Carries no track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum AmbientEvent {
    #[serde(rename = "AMBIENT_TRACK_ENDED")]
    TrackEnded,
    #[serde(rename = "AMBIENT_ERROR")]
    Error { error: String },
}

impl AmbientEvent {
    pub fn error(message: impl Into<String>) -> Self {
        AmbientEvent::Error {
            error: message.into(),
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            AmbientEvent::TrackEnded => "AMBIENT_TRACK_ENDED",
            AmbientEvent::Error { .. } => "AMBIENT_ERROR",
        }
    }
}

// ============================================================================
// EventChannel
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
type ListenerFn<E> = dyn Fn(&E) + Send + Sync + 'static;

#[cfg(target_arch = "wasm32")]
type ListenerFn<E> = dyn Fn(&E) + 'static;

struct ListenerEntry<E> {
    active: Arc<AtomicBool>,
    callback: Box<ListenerFn<E>>,
}

/// Revocation handle returned by [`EventChannel::add_listener`].
///
/// Dropping the handle keeps the listener registered; call
/// [`remove`](Self::remove) to unsubscribe.
#[derive(Debug, Clone)]
pub struct Subscription {
    channel: &'static str,
    active: Arc<AtomicBool>,
}

impl Subscription {
    /// Stop delivery to the listener. Idempotent.
    pub fn remove(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            tracing::trace!(channel = self.channel, "listener removed");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// Fan-out channel delivering `&E` to every registered listener.
pub struct EventChannel<E> {
    name: &'static str,
    listeners: RwLock<Vec<Arc<ListenerEntry<E>>>>,
}

impl<E> EventChannel<E> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Register `callback`. Listeners added while an emission is running
    /// first see the next emission.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn add_listener<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.register(Box::new(callback))
    }

    #[cfg(target_arch = "wasm32")]
    pub fn add_listener<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&E) + 'static,
    {
        self.register(Box::new(callback))
    }

    fn register(&self, callback: Box<ListenerFn<E>>) -> Subscription {
        let active = Arc::new(AtomicBool::new(true));
        let entry = Arc::new(ListenerEntry {
            active: Arc::clone(&active),
            callback,
        });

        let mut listeners = self.listeners.write();
        listeners.retain(|entry| entry.active.load(Ordering::SeqCst));
        listeners.push(entry);

        Subscription {
            channel: self.name,
            active,
        }
    }

    /// Deliver `event` to every active listener. Returns how many listeners
    /// ran to completion.
    pub fn emit(&self, event: &E) -> usize {
        let snapshot: Vec<Arc<ListenerEntry<E>>> = self
            .listeners
            .read()
            .iter()
            .filter(|entry| entry.active.load(Ordering::SeqCst))
            .cloned()
            .collect();

        let mut delivered = 0;
        for entry in snapshot {
            // Re-check: an earlier listener may have removed this one.
            if !entry.active.load(Ordering::SeqCst) {
                continue;
            }

            match catch_unwind(AssertUnwindSafe(|| (entry.callback)(event))) {
                Ok(()) => delivered += 1,
                Err(panic) => {
                    tracing::error!(
                        channel = self.name,
                        panic = %panic_message(panic.as_ref()),
                        "event listener panicked"
                    );
                }
            }
        }
        delivered
    }

    /// Number of listeners that would receive the next emission.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .iter()
            .filter(|entry| entry.active.load(Ordering::SeqCst))
            .count()
    }
}

impl<E> fmt::Debug for EventChannel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("name", &self.name)
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ============================================================================
// EventEmitter
// ============================================================================

/// Name of an [`EventEmitter`] lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelName {
    Main,
    Ambient,
}

impl ChannelName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelName::Main => "main",
            ChannelName::Ambient => "ambient",
        }
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two event lanes shared by the facade, the store and the backends.
#[derive(Debug)]
pub struct EventEmitter {
    main: EventChannel<AudioProEvent>,
    ambient: EventChannel<AmbientEvent>,
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl EventEmitter {
    pub fn new() -> Self {
        Self {
            main: EventChannel::new(ChannelName::Main.as_str()),
            ambient: EventChannel::new(ChannelName::Ambient.as_str()),
        }
    }

    pub fn main(&self) -> &EventChannel<AudioProEvent> {
        &self.main
    }

    pub fn ambient(&self) -> &EventChannel<AmbientEvent> {
        &self.ambient
    }

    pub fn emit(&self, event: &AudioProEvent) -> usize {
        self.main.emit(event)
    }

    pub fn emit_ambient(&self, event: &AmbientEvent) -> usize {
        self.ambient.emit(event)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn add_listener<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&AudioProEvent) + Send + Sync + 'static,
    {
        self.main.add_listener(callback)
    }

    #[cfg(target_arch = "wasm32")]
    pub fn add_listener<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&AudioProEvent) + 'static,
    {
        self.main.add_listener(callback)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn add_ambient_listener<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&AmbientEvent) + Send + Sync + 'static,
    {
        self.ambient.add_listener(callback)
    }

    #[cfg(target_arch = "wasm32")]
    pub fn add_ambient_listener<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&AmbientEvent) + 'static,
    {
        self.ambient.add_listener(callback)
    }

    pub fn listener_count(&self, channel: ChannelName) -> usize {
        match channel {
            ChannelName::Main => self.main.listener_count(),
            ChannelName::Ambient => self.ambient.listener_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;

    fn track() -> Track {
        Track::new("t1", "https://cdn.example.com/a.mp3", "A", "https://cdn.example.com/a.jpg")
    }

    fn playing() -> AudioProEvent {
        AudioProEvent::state_changed(track(), PlayerState::Playing)
    }

    #[test]
    fn test_listeners_run_in_registration_order() {
        let channel = EventChannel::<u32>::new("test");
        let seen = Arc::new(Mutex::new(Vec::new()));

        for id in 0..3 {
            let seen = Arc::clone(&seen);
            let _ = channel.add_listener(move |value: &u32| seen.lock().push((id, *value)));
        }

        assert_eq!(channel.emit(&7), 3);
        assert_eq!(*seen.lock(), vec![(0, 7), (1, 7), (2, 7)]);
    }

    #[test]
    fn test_remove_stops_delivery() {
        let channel = EventChannel::<u32>::new("test");
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let subscription = channel.add_listener(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        channel.emit(&1);
        subscription.remove();
        subscription.remove();
        channel.emit(&2);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!subscription.is_active());
        assert_eq!(channel.listener_count(), 0);
    }

    #[test]
    fn test_removal_during_emission_suppresses_later_listener() {
        let channel = EventChannel::<u32>::new("test");
        let victim: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let victim_calls = Arc::new(AtomicUsize::new(0));

        let slot = Arc::clone(&victim);
        let _remover = channel.add_listener(move |_| {
            if let Some(subscription) = slot.lock().as_ref() {
                subscription.remove();
            }
        });

        let counter = Arc::clone(&victim_calls);
        let subscription = channel.add_listener(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        *victim.lock() = Some(subscription);

        assert_eq!(channel.emit(&1), 1);
        assert_eq!(victim_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_listener_added_during_emission_waits_for_next_emit() {
        let channel = Arc::new(EventChannel::<u32>::new("test"));
        let late_calls = Arc::new(AtomicUsize::new(0));

        let inner_channel = Arc::clone(&channel);
        let counter = Arc::clone(&late_calls);
        let added = Arc::new(AtomicBool::new(false));
        let _ = channel.add_listener(move |_| {
            if !added.swap(true, Ordering::SeqCst) {
                let counter = Arc::clone(&counter);
                let _ = inner_channel.add_listener(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
            }
        });

        channel.emit(&1);
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);
        channel.emit(&2);
        assert_eq!(late_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let channel = EventChannel::<u32>::new("test");
        let calls = Arc::new(AtomicUsize::new(0));

        let _ = channel.add_listener(|_| panic!("listener failure"));
        let counter = Arc::clone(&calls);
        let _ = channel.add_listener(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(channel.emit(&1), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_lanes_never_cross_deliver() {
        let emitter = EventEmitter::new();
        let main_calls = Arc::new(AtomicUsize::new(0));
        let ambient_calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&main_calls);
        let _ = emitter.add_listener(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = Arc::clone(&ambient_calls);
        let _ = emitter.add_ambient_listener(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        emitter.emit_ambient(&AmbientEvent::TrackEnded);
        assert_eq!(main_calls.load(Ordering::SeqCst), 0);
        assert_eq!(ambient_calls.load(Ordering::SeqCst), 1);

        emitter.emit(&playing());
        assert_eq!(main_calls.load(Ordering::SeqCst), 1);
        assert_eq!(ambient_calls.load(Ordering::SeqCst), 1);

        assert_eq!(emitter.listener_count(ChannelName::Main), 1);
        assert_eq!(emitter.listener_count(ChannelName::Ambient), 1);
    }

    #[test]
    fn test_requires_track() {
        assert!(playing().kind.requires_track());
        assert!(AudioProEventKind::Progress {
            position: 1,
            duration: 2
        }
        .requires_track());
        assert!(!AudioProEvent::playback_error("boom", None).kind.requires_track());
        assert!(!AudioProEventKind::RemoteNext.requires_track());
        assert!(!AudioProEventKind::RemotePrev.requires_track());
    }

    #[test]
    fn test_position_and_duration_accessors() {
        let progress = AudioProEventKind::Progress {
            position: 1_500,
            duration: 60_000,
        };
        assert_eq!(progress.position(), Some(1_500));
        assert_eq!(progress.duration(), Some(60_000));

        let speed = AudioProEventKind::PlaybackSpeedChanged { speed: 1.5 };
        assert_eq!(speed.position(), None);
        assert_eq!(speed.duration(), None);
    }

    #[test]
    fn test_event_wire_format() {
        let event = AudioProEvent::new(
            track(),
            AudioProEventKind::Progress {
                position: 1_000,
                duration: 120_000,
            },
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "PROGRESS");
        assert_eq!(json["track"]["id"], "t1");
        assert_eq!(json["payload"]["position"], 1_000);

        let error = serde_json::to_value(AudioProEvent::playback_error("bad", Some(-1))).unwrap();
        assert_eq!(error["type"], "PLAYBACK_ERROR");
        assert!(error["track"].is_null());
        assert_eq!(error["payload"]["errorCode"], -1);

        let remote = serde_json::to_value(AudioProEvent::new(
            EventTrack::Absent,
            AudioProEventKind::RemoteNext,
        ))
        .unwrap();
        assert!(remote.get("track").is_none());

        let ambient = serde_json::to_value(AmbientEvent::error("nope")).unwrap();
        assert_eq!(ambient["type"], "AMBIENT_ERROR");
        assert_eq!(ambient["payload"]["error"], "nope");
    }

    #[test]
    fn test_event_track_conversions() {
        assert_eq!(EventTrack::from(None), EventTrack::Cleared);
        assert_eq!(EventTrack::from(Some(track())).track(), Some(&track()));
        assert!(EventTrack::default().is_absent());
    }
}
