//! # Observation Hook
//!
//! Lets UI layers follow the player without polling. [`watch`] projects the
//! store into an [`AudioProView`] after every store change and calls back
//! only when that projection actually differs from the last one delivered.
//! [`select`] does the same for an arbitrary slice of the snapshot.
//!
//! The listeners hold the store weakly; once the store is dropped they stop
//! firing. Removing the returned [`Subscription`] detaches them.

use crate::store::{PlaybackErrorInfo, PlayerSnapshot, PlayerStore};
use bridge_traits::{PlayerState, Track};
use core_runtime::Subscription;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::{Arc, Weak};

/// The observable fields of the player.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioProView {
    pub state: PlayerState,
    pub position: u64,
    pub duration: u64,
    pub playing_track: Option<Track>,
    pub playback_speed: f32,
    pub volume: f32,
    pub error: Option<PlaybackErrorInfo>,
}

impl From<&PlayerSnapshot> for AudioProView {
    fn from(snapshot: &PlayerSnapshot) -> Self {
        Self {
            state: snapshot.state,
            position: snapshot.position,
            duration: snapshot.duration,
            playing_track: snapshot.track.clone(),
            playback_speed: snapshot.playback_speed,
            volume: snapshot.volume,
            error: snapshot.error.clone(),
        }
    }
}

/// Call `on_change` with the new view whenever it differs from the previous
/// one. Changes to configuration or debug flags alone never fire.
#[cfg(not(target_arch = "wasm32"))]
pub fn watch<F>(store: &Arc<PlayerStore>, on_change: F) -> Subscription
where
    F: Fn(&AudioProView) + Send + Sync + 'static,
{
    select(store, |snapshot: &PlayerSnapshot| AudioProView::from(snapshot), on_change)
}

#[cfg(target_arch = "wasm32")]
pub fn watch<F>(store: &Arc<PlayerStore>, on_change: F) -> Subscription
where
    F: Fn(&AudioProView) + 'static,
{
    select(store, |snapshot: &PlayerSnapshot| AudioProView::from(snapshot), on_change)
}

/// Call `on_change` whenever `selector` yields a value different from the
/// last one seen.
#[cfg(not(target_arch = "wasm32"))]
pub fn select<T, S, F>(store: &Arc<PlayerStore>, selector: S, on_change: F) -> Subscription
where
    T: PartialEq + Clone + Send + 'static,
    S: Fn(&PlayerSnapshot) -> T + Send + Sync + 'static,
    F: Fn(&T) + Send + Sync + 'static,
{
    let watcher = Selection::new(store, selector, on_change);
    store.add_change_listener(move |_| watcher.refresh())
}

#[cfg(target_arch = "wasm32")]
pub fn select<T, S, F>(store: &Arc<PlayerStore>, selector: S, on_change: F) -> Subscription
where
    T: PartialEq + Clone + 'static,
    S: Fn(&PlayerSnapshot) -> T + 'static,
    F: Fn(&T) + 'static,
{
    let watcher = Selection::new(store, selector, on_change);
    store.add_change_listener(move |_| watcher.refresh())
}

struct Selection<T, S, F> {
    store: Weak<PlayerStore>,
    selector: S,
    on_change: F,
    last: Mutex<T>,
}

impl<T, S, F> Selection<T, S, F>
where
    T: PartialEq + Clone,
    S: Fn(&PlayerSnapshot) -> T,
    F: Fn(&T),
{
    fn new(store: &Arc<PlayerStore>, selector: S, on_change: F) -> Self {
        let last = selector(&store.snapshot());
        Self {
            store: Arc::downgrade(store),
            selector,
            on_change,
            last: Mutex::new(last),
        }
    }

    fn refresh(&self) {
        let Some(store) = self.store.upgrade() else {
            return;
        };
        let current = (self.selector)(&store.snapshot());

        {
            let mut last = self.last.lock();
            if *last == current {
                return;
            }
            *last = current.clone();
        }

        // Unlocked: the callback may itself change the store.
        (self.on_change)(&current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_runtime::events::{AudioProEvent, AudioProEventKind};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn track(id: &str) -> Track {
        Track::new(id, "a.mp3", "A", "x.jpg")
    }

    #[test]
    fn test_watch_fires_only_on_view_changes() {
        let store = Arc::new(PlayerStore::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let _subscription = watch(&store, move |view| sink.lock().push(view.clone()));

        store.set_track_playing(Some(track("t1")));
        store.set_track_playing(Some(track("t1")));
        store.set_debug(true);

        let views = seen.lock();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].playing_track.as_ref().map(|t| t.id.as_str()), Some("t1"));
    }

    #[test]
    fn test_watch_follows_reducer_updates() {
        let store = Arc::new(PlayerStore::new());
        let states = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&states);
        let _subscription = watch(&store, move |view| sink.lock().push(view.state));

        let event = AudioProEvent::new(
            track("t1"),
            AudioProEventKind::StateChanged {
                state: PlayerState::Playing,
                position: Some(0),
                duration: Some(1000),
            },
        );
        store.update_from_event(&event);
        store.update_from_event(&event);

        assert_eq!(*states.lock(), vec![PlayerState::Playing]);
    }

    #[test]
    fn test_select_tracks_a_single_field() {
        let store = Arc::new(PlayerStore::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        let _subscription = select(
            &store,
            |snapshot| snapshot.track.as_ref().map(|t| t.id.clone()),
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );

        store.set_volume(0.5);
        store.set_track_playing(Some(track("t1")));
        store.set_playback_speed(1.5);
        store.set_track_playing(Some(track("t2")));
        store.set_track_playing(None);

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_removed_watcher_stops_firing() {
        let store = Arc::new(PlayerStore::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        let subscription = watch(&store, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        store.set_volume(0.4);
        subscription.remove();
        store.set_volume(0.6);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
