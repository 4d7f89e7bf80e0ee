//! Player store observation tests
//!
//! The store publishes a change notification only when a mutation actually
//! alters the snapshot; these tests count notifications the way a UI layer
//! would.

use bridge_traits::{LogEntry, LogLevel, LoggerSink, PlayerState, Track};
use core_playback::{PlayerStore, StoreChange, StoreFields};
use core_runtime::events::{AudioProEvent, AudioProEventKind, EventTrack};
use core_runtime::logging::LoggerSinkLayer;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;

fn track(id: &str) -> Track {
    Track::new(id, format!("https://cdn.example.com/{}.mp3", id), id.to_uppercase(), "x.jpg")
}

fn observe(store: &PlayerStore) -> Arc<Mutex<Vec<StoreChange>>> {
    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&changes);
    store.add_change_listener(move |change| sink.lock().push(*change));
    changes
}

#[derive(Default)]
struct WarningSink {
    entries: Mutex<Vec<LogEntry>>,
}

#[async_trait::async_trait]
impl LoggerSink for WarningSink {
    async fn log(&self, entry: LogEntry) -> bridge_traits::error::Result<()> {
        self.entries.lock().push(entry);
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        LogLevel::Warn
    }
}

fn warnings_during(f: impl FnOnce()) -> Vec<LogEntry> {
    let sink = Arc::new(WarningSink::default());
    let subscriber =
        tracing_subscriber::registry().with(LoggerSinkLayer::new(Some(sink.clone())));

    tracing::subscriber::with_default(subscriber, f);

    let entries = sink.entries.lock().clone();
    entries
}

fn progress(track: &Track, position: u64) -> AudioProEvent {
    AudioProEvent::new(
        track.clone(),
        AudioProEventKind::Progress {
            position,
            duration: 180_000,
        },
    )
}

#[test]
fn test_track_changes_counted_once_per_identity_change() {
    let store = PlayerStore::new();
    let changes = observe(&store);
    let t1 = track("t1");
    let t2 = track("t2");

    store.update_from_event(&progress(&t1, 1_000));
    store.update_from_event(&progress(&t1, 2_000));
    store.update_from_event(&progress(&t2, 0));

    let track_changes = changes
        .lock()
        .iter()
        .filter(|change| change.fields.contains(StoreFields::TRACK))
        .count();
    assert_eq!(track_changes, 2);
    assert_eq!(store.track(), Some(t2));
}

#[test]
fn test_identical_events_publish_nothing() {
    let store = PlayerStore::new();
    let t1 = track("t1");
    store.update_from_event(&progress(&t1, 1_000));

    let changes = observe(&store);
    store.update_from_event(&progress(&t1, 1_000));
    store.set_volume(1.0);
    store.set_playback_speed(1.0);

    assert!(changes.lock().is_empty());
}

#[test]
fn test_change_reports_touched_fields() {
    let store = PlayerStore::new();
    let changes = observe(&store);

    store.update_from_event(&AudioProEvent::new(
        track("t1"),
        AudioProEventKind::StateChanged {
            state: PlayerState::Playing,
            position: Some(0),
            duration: Some(180_000),
        },
    ));

    let changes = changes.lock();
    assert_eq!(changes.len(), 1);
    assert_eq!(
        changes[0].fields,
        StoreFields::STATE | StoreFields::DURATION | StoreFields::TRACK
    );
}

#[test]
fn test_error_cleared_by_any_non_error_state() {
    let store = PlayerStore::new();
    let t1 = track("t1");

    store.update_from_event(&AudioProEvent::playback_error("decoder failed", Some(3)));
    store.update_from_event(&AudioProEvent::state_changed(t1.clone(), PlayerState::Error));
    assert_eq!(store.error().map(|error| error.code), Some(Some(3)));

    store.update_from_event(&AudioProEvent::state_changed(t1, PlayerState::Loading));
    assert!(store.error().is_none());
}

#[test]
fn test_absent_track_leaves_track_untouched() {
    let store = PlayerStore::new();
    store.set_track_playing(Some(track("t1")));

    store.update_from_event(&AudioProEvent::new(
        EventTrack::Absent,
        AudioProEventKind::SeekComplete {
            position: Some(5_000),
            duration: None,
        },
    ));

    assert_eq!(store.track().map(|t| t.id), Some("t1".to_string()));
    assert_eq!(store.timings(), (5_000, 0));
}

#[test]
fn test_independent_stores_do_not_share_state() {
    let first = PlayerStore::new();
    let second = PlayerStore::new();

    first.set_volume(0.3);
    first.set_track_playing(Some(track("t1")));

    assert_eq!(second.volume(), 1.0);
    assert!(second.track().is_none());
}

#[test]
fn test_missing_track_field_warns_only_for_track_bound_events() {
    let store = PlayerStore::new();
    let t1 = track("t1");
    store.set_track_playing(Some(t1.clone()));

    let warnings = warnings_during(|| {
        store.update_from_event(&AudioProEvent::new(
            EventTrack::Absent,
            AudioProEventKind::StateChanged {
                state: PlayerState::Paused,
                position: None,
                duration: None,
            },
        ));
        store.update_from_event(&AudioProEvent::new(
            EventTrack::Absent,
            AudioProEventKind::PlaybackError {
                error: "decoder failed".to_string(),
                code: Some(3),
            },
        ));
        store.update_from_event(&AudioProEvent::new(
            EventTrack::Absent,
            AudioProEventKind::RemoteNext,
        ));
    });

    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].level, LogLevel::Warn);
    assert!(warnings[0].message.contains("missing its track field"));
    assert_eq!(store.state(), PlayerState::Paused);
    assert_eq!(store.track(), Some(t1));
}
