//! Command facade tests
//!
//! Covers:
//! - Transport guards (missing track, IDLE/ERROR states)
//! - Input normalization and clamping warnings
//! - Play option assembly and track validation
//! - Ambient lane isolation
//! - Listener ordering relative to the store reducer

use bridge_traits::{
    AmbientBackend, AmbientPlayOptions, BackendPlayOptions, LogEntry, LogLevel, LoggerSink,
    PlaybackBackend, PlayerState, Track,
};
use core_playback::{AudioPro, PlayOptions};
use core_runtime::events::{AmbientEvent, AudioProEvent, AudioProEventKind, EventTrack};
use core_runtime::logging::LoggerSinkLayer;
use core_runtime::{ConfigureOptions, EventEmitter, Subscription};
use mockall::mock;
use mockall::predicate::eq;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;

// ============================================================================
// Mocks & helpers
// ============================================================================

mock! {
    pub Playback {}

    impl PlaybackBackend for Playback {
        fn play(&self, track: Track, options: BackendPlayOptions);
        fn pause(&self);
        fn resume(&self);
        fn stop(&self);
        fn clear(&self);
        fn seek_to(&self, position_ms: u64);
        fn seek_forward(&self, amount_ms: u64);
        fn seek_back(&self, amount_ms: u64);
        fn set_playback_speed(&self, speed: f32);
        fn set_volume(&self, volume: f32);
    }
}

mock! {
    pub Ambient {}

    impl AmbientBackend for Ambient {
        fn ambient_play(&self, options: AmbientPlayOptions);
        fn ambient_stop(&self);
        fn ambient_pause(&self);
        fn ambient_resume(&self);
        fn ambient_seek_to(&self, position_ms: u64);
        fn ambient_set_volume(&self, volume: f32);
    }
}

fn track(id: &str) -> Track {
    Track::new(id, "https://cdn.example.com/a.mp3", "Song A", "https://cdn.example.com/a.jpg")
}

fn player(playback: MockPlayback, ambient: MockAmbient) -> AudioPro {
    AudioPro::with_backends(
        Arc::new(EventEmitter::new()),
        Arc::new(playback),
        Arc::new(ambient),
        ConfigureOptions::default(),
    )
}

fn record(player: &AudioPro) -> (Arc<Mutex<Vec<AudioProEvent>>>, Subscription) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let subscription = player.add_event_listener(move |event| sink.lock().push(event.clone()));
    (events, subscription)
}

fn record_ambient(player: &AudioPro) -> (Arc<Mutex<Vec<AmbientEvent>>>, Subscription) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let subscription = player.add_ambient_listener(move |event| sink.lock().push(event.clone()));
    (events, subscription)
}

/// Simulate the backend reporting a state for the loaded track.
fn report_state(player: &AudioPro, state: PlayerState) {
    let track = player.get_playing_track();
    player.emitter().emit(&AudioProEvent::new(
        track,
        AudioProEventKind::StateChanged {
            state,
            position: Some(0),
            duration: Some(120_000),
        },
    ));
}

fn loaded_player(mut playback: MockPlayback) -> AudioPro {
    playback.expect_play().times(1).return_const(());
    let player = player(playback, MockAmbient::new());
    player.play(track("t1"), PlayOptions::default());
    report_state(&player, PlayerState::Playing);
    player
}

fn error_messages(events: &[AudioProEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match &event.kind {
            AudioProEventKind::PlaybackError { error, .. } => Some(error.clone()),
            _ => None,
        })
        .collect()
}

/// Sink collecting warnings routed through `LoggerSinkLayer`.
#[derive(Default)]
struct CaptureSink {
    entries: Mutex<Vec<LogEntry>>,
}

#[async_trait::async_trait]
impl LoggerSink for CaptureSink {
    async fn log(&self, entry: LogEntry) -> bridge_traits::error::Result<()> {
        self.entries.lock().push(entry);
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        LogLevel::Warn
    }
}

/// Run `f` with a subscriber forwarding to a capture sink and return the
/// warnings it logged.
fn captured_warnings(f: impl FnOnce()) -> Vec<LogEntry> {
    let sink = Arc::new(CaptureSink::default());
    let subscriber =
        tracing_subscriber::registry().with(LoggerSinkLayer::new(Some(sink.clone())));

    tracing::subscriber::with_default(subscriber, f);

    let entries = sink.entries.lock().clone();
    entries
}

// ============================================================================
// Guards
// ============================================================================

#[test]
fn test_transport_without_track_emits_one_error_each() {
    let mut playback = MockPlayback::new();
    playback.expect_pause().never();
    playback.expect_resume().never();
    playback.expect_seek_to().never();
    playback.expect_seek_forward().never();
    playback.expect_seek_back().never();

    let player = player(playback, MockAmbient::new());
    let (events, _subscription) = record(&player);

    player.pause();
    player.resume();
    player.seek_to(1_000);
    player.seek_forward(None);
    player.seek_back(Some(5_000));

    let events = events.lock();
    assert_eq!(events.len(), 5);
    assert!(events.iter().all(|event| event.track == EventTrack::Cleared));
    assert_eq!(
        error_messages(&events),
        vec![
            "Cannot pause: no track is loaded",
            "Cannot resume: no track is loaded",
            "Cannot seek: no track is loaded",
            "Cannot seek forward: no track is loaded",
            "Cannot seek back: no track is loaded",
        ]
    );
}

#[test]
fn test_pause_without_track_records_store_error() {
    let player = player(MockPlayback::new(), MockAmbient::new());

    player.pause();

    let error = player.get_error().expect("error recorded");
    assert_eq!(error.message, "Cannot pause: no track is loaded");
    assert_eq!(player.get_state(), PlayerState::Idle);
}

#[test]
fn test_commands_in_idle_state_are_dropped_silently() {
    let mut playback = MockPlayback::new();
    playback.expect_play().times(1).return_const(());
    playback.expect_pause().never();
    playback.expect_seek_to().never();

    let player = player(playback, MockAmbient::new());
    player.play(track("t1"), PlayOptions::default());
    assert_eq!(player.get_state(), PlayerState::Idle);

    let (events, _subscription) = record(&player);
    player.pause();
    player.seek_to(5_000);

    assert!(events.lock().is_empty());
}

#[test]
fn test_commands_forwarded_while_playing() {
    let mut playback = MockPlayback::new();
    playback.expect_pause().times(1).return_const(());
    playback.expect_resume().times(1).return_const(());
    playback
        .expect_seek_forward()
        .with(eq(30_000))
        .times(1)
        .return_const(());
    playback
        .expect_seek_back()
        .with(eq(10_000))
        .times(1)
        .return_const(());

    let player = loaded_player(playback);
    player.pause();
    player.resume();
    player.seek_forward(None);
    player.seek_back(Some(10_000));
}

#[test]
fn test_negative_seek_clamps_to_zero_with_warning() {
    let mut playback = MockPlayback::new();
    playback
        .expect_seek_to()
        .with(eq(0))
        .times(1)
        .return_const(());

    let player = loaded_player(playback);
    let warnings = captured_warnings(|| player.seek_to(-2_500));

    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].level, LogLevel::Warn);
    assert!(warnings[0].message.contains("negative seek position"));
    assert_eq!(warnings[0].fields.get("requested").map(String::as_str), Some("-2500"));
}

#[test]
fn test_commands_dropped_in_error_state() {
    let mut playback = MockPlayback::new();
    playback.expect_resume().never();
    playback.expect_set_playback_speed().never();

    let player = loaded_player(playback);
    report_state(&player, PlayerState::Error);

    let (events, _subscription) = record(&player);
    player.resume();
    player.set_playback_speed(1.5);

    assert!(events.lock().is_empty());
    assert_eq!(player.get_playback_speed(), 1.5);
}

// ============================================================================
// Normalization
// ============================================================================

#[test]
fn test_volume_out_of_range_is_clamped_and_warned() {
    let mut playback = MockPlayback::new();
    playback.expect_set_volume().never();

    let player = player(playback, MockAmbient::new());
    let warnings = captured_warnings(|| player.set_volume(1.5));

    assert_eq!(player.get_volume(), 1.0);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("volume out of range"));
}

#[test]
fn test_volume_forwarded_when_track_active() {
    let mut playback = MockPlayback::new();
    playback
        .expect_set_volume()
        .with(eq(0.33_f32))
        .times(1)
        .return_const(());

    let player = loaded_player(playback);
    player.set_volume(0.333);

    assert_eq!(player.get_volume(), 0.33);
}

#[test]
fn test_speed_without_track_is_stored_and_reported() {
    let mut playback = MockPlayback::new();
    playback.expect_set_playback_speed().never();

    let player = player(playback, MockAmbient::new());
    let (events, _subscription) = record(&player);

    player.set_playback_speed(3.0);

    assert_eq!(player.get_playback_speed(), 2.0);
    assert_eq!(
        error_messages(&events.lock()),
        vec!["Cannot set playback speed: no track is loaded"]
    );
}

#[test]
fn test_speed_forwarded_clamped() {
    let mut playback = MockPlayback::new();
    playback
        .expect_set_playback_speed()
        .with(eq(0.25_f32))
        .times(1)
        .return_const(());

    let player = loaded_player(playback);
    player.set_playback_speed(0.1);

    assert_eq!(player.get_playback_speed(), 0.25);
}

#[test]
fn test_progress_interval_clamped() {
    let player = player(MockPlayback::new(), MockAmbient::new());

    player.set_progress_interval(50);
    assert_eq!(player.get_progress_interval(), 100);

    player.set_progress_interval(2_500);
    assert_eq!(player.get_progress_interval(), 2_500);

    player.set_progress_interval(60_000);
    assert_eq!(player.get_progress_interval(), 10_000);
}

#[test]
fn test_initial_progress_interval_is_clamped() {
    let mut playback = MockPlayback::new();
    playback
        .expect_play()
        .withf(|_, options| options.progress_interval_ms == 100)
        .times(1)
        .return_const(());

    let mut player = None;
    let warnings = captured_warnings(|| {
        player = Some(AudioPro::with_backends(
            Arc::new(EventEmitter::new()),
            Arc::new(playback),
            Arc::new(MockAmbient::new()),
            ConfigureOptions::default().with_progress_interval_ms(5),
        ));
    });
    let player = player.unwrap();

    assert_eq!(player.get_progress_interval(), 100);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("progress interval out of range"));

    player.play(track("t1"), PlayOptions::default());
}

#[test]
fn test_configure_json_applies_debug_flags() {
    let player = player(MockPlayback::new(), MockAmbient::new());

    player
        .configure_json(json!({
            "debug": true,
            "debugIncludesProgress": true,
            "progressIntervalMs": 20_000,
            "contentType": "SPEECH",
            "skipSilence": true
        }))
        .expect("object accepted");

    let options = player.get_configure_options();
    assert!(player.store().debug());
    assert_eq!(options.progress_interval_ms, 10_000);
    assert_eq!(options.extra.get("skipSilence"), Some(&json!(true)));

    assert!(player.configure_json(json!(["not", "an", "object"])).is_err());
}

// ============================================================================
// Play
// ============================================================================

#[test]
fn test_play_assembles_backend_options() {
    let mut playback = MockPlayback::new();
    playback
        .expect_play()
        .withf(|track, options| {
            track.id == "t1"
                && options.auto_play
                && options.volume == 0.5
                && options.playback_speed == 1.5
                && options.progress_interval_ms == 500
                && options.start_time_ms == Some(2_000)
        })
        .times(1)
        .return_const(());

    let player = player(playback, MockAmbient::new());
    player.configure(ConfigureOptions::default().with_progress_interval_ms(500));
    player.set_volume(0.5);
    player.set_playback_speed(1.5);

    player.play(track("t1"), PlayOptions::default().with_start_time_ms(2_000));

    assert_eq!(player.get_playing_track().map(|t| t.id), Some("t1".to_string()));
}

#[test]
fn test_play_respects_auto_play_false() {
    let mut playback = MockPlayback::new();
    playback
        .expect_play()
        .withf(|_, options| !options.auto_play)
        .times(1)
        .return_const(());

    let player = player(playback, MockAmbient::new());
    player.play(track("t1"), PlayOptions::default().with_auto_play(false));
}

#[test]
fn test_play_normalizes_local_paths() {
    let mut playback = MockPlayback::new();
    playback
        .expect_play()
        .withf(|track, _| track.url.as_uri() == Some("file:///sdcard/music/a.mp3"))
        .times(1)
        .return_const(());

    let player = player(playback, MockAmbient::new());
    player.play(
        Track::new("t1", "/sdcard/music/a.mp3", "Song A", "https://cdn.example.com/a.jpg"),
        PlayOptions::default(),
    );
}

#[test]
fn test_invalid_track_never_reaches_backend() {
    let mut playback = MockPlayback::new();
    playback.expect_play().never();

    let player = player(playback, MockAmbient::new());
    let (events, _subscription) = record(&player);

    player.play(
        Track::new("t1", "", "Song A", "https://cdn.example.com/a.jpg"),
        PlayOptions::default(),
    );

    let events = events.lock();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].track, EventTrack::Cleared);
    assert!(error_messages(&events)[0].contains("url"));
    assert!(player.get_playing_track().is_none());
}

#[test]
fn test_play_clears_previous_error() {
    let mut playback = MockPlayback::new();
    playback.expect_play().times(1).return_const(());

    let player = player(playback, MockAmbient::new());
    player.pause();
    assert!(player.get_error().is_some());

    player.play(track("t1"), PlayOptions::default());
    assert!(player.get_error().is_none());
}

// ============================================================================
// Stop & clear
// ============================================================================

#[test]
fn test_stop_always_forwarded_and_clears_error() {
    let mut playback = MockPlayback::new();
    playback.expect_stop().times(2).return_const(());

    let player = player(playback, MockAmbient::new());
    player.pause();
    assert!(player.get_error().is_some());

    player.stop();
    player.stop();

    assert!(player.get_error().is_none());
}

#[test]
fn test_clear_resets_volume_and_track() {
    let mut playback = MockPlayback::new();
    playback.expect_set_volume().return_const(());
    playback.expect_clear().times(1).return_const(());

    let player = loaded_player(playback);
    player.set_volume(0.2);

    player.clear();

    assert_eq!(player.get_volume(), 1.0);
    assert!(player.get_playing_track().is_none());
    assert!(player.get_error().is_none());
}

// ============================================================================
// Listeners
// ============================================================================

#[test]
fn test_listeners_observe_reduced_state() {
    let player = loaded_player(MockPlayback::new());
    let store = Arc::clone(player.store());
    let observed = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&observed);
    let _subscription = player.add_event_listener(move |_| sink.lock().push(store.state()));

    report_state(&player, PlayerState::Paused);

    assert_eq!(*observed.lock(), vec![PlayerState::Paused]);
}

#[test]
fn test_watch_reports_state_transitions() {
    let player = loaded_player(MockPlayback::new());
    let states = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&states);
    let _subscription = player.watch(move |view| sink.lock().push(view.state));

    report_state(&player, PlayerState::Paused);
    report_state(&player, PlayerState::Paused);
    report_state(&player, PlayerState::Playing);

    assert_eq!(*states.lock(), vec![PlayerState::Paused, PlayerState::Playing]);
    assert_eq!(player.view().state, PlayerState::Playing);
}

#[test]
fn test_removed_listener_is_not_called() {
    let player = player(MockPlayback::new(), MockAmbient::new());
    let (events, subscription) = record(&player);

    subscription.remove();
    subscription.remove();
    player.pause();

    assert!(events.lock().is_empty());
}

// ============================================================================
// Ambient lane
// ============================================================================

#[test]
fn test_ambient_commands_bypass_main_guards() {
    let mut ambient = MockAmbient::new();
    ambient
        .expect_ambient_play()
        .withf(|options| {
            options.url.as_uri() == Some("https://cdn.example.com/rain.mp3") && options.looping
        })
        .times(1)
        .return_const(());
    ambient.expect_ambient_pause().times(1).return_const(());
    ambient.expect_ambient_resume().times(1).return_const(());
    ambient.expect_ambient_stop().times(1).return_const(());
    ambient
        .expect_ambient_seek_to()
        .with(eq(4_000))
        .times(1)
        .return_const(());

    let player = player(MockPlayback::new(), ambient);
    let (main_events, _main) = record(&player);

    player.ambient_play(AmbientPlayOptions::new("https://cdn.example.com/rain.mp3").looping(true));
    player.ambient_pause();
    player.ambient_resume();
    player.ambient_seek_to(4_000);
    player.ambient_seek_to(-1);
    player.ambient_stop();

    assert!(main_events.lock().is_empty());
    assert_eq!(player.get_state(), PlayerState::Idle);
}

#[test]
fn test_ambient_invalid_url_reports_on_ambient_lane_only() {
    let mut ambient = MockAmbient::new();
    ambient.expect_ambient_play().never();

    let player = player(MockPlayback::new(), ambient);
    let (main_events, _main) = record(&player);
    let (ambient_events, _ambient) = record_ambient(&player);

    player.ambient_play(AmbientPlayOptions::new("  "));

    assert!(main_events.lock().is_empty());
    let ambient_events = ambient_events.lock();
    assert_eq!(ambient_events.len(), 1);
    assert!(matches!(&ambient_events[0], AmbientEvent::Error { .. }));
    assert!(player.get_error().is_none());
}

#[test]
fn test_ambient_volume_is_normalized() {
    let mut ambient = MockAmbient::new();
    ambient
        .expect_ambient_set_volume()
        .with(eq(1.0_f32))
        .times(1)
        .return_const(());

    let player = player(MockPlayback::new(), ambient);
    player.ambient_set_volume(2.0);

    assert_eq!(player.get_ambient_volume(), 1.0);
    assert_eq!(player.get_volume(), 1.0);
}
