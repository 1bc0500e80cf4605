use super::*;
use crate::backend::{
    BackendError, MediaBackend, MediaSession, SeekReason, SeekTolerance, SessionEvent, SessionId,
    TimeRange,
};
use crate::config::PlaybackSettings;
use crate::favorites::{Favorites, MemoryFavoritesStore};
use crate::library::{Artwork, ArtworkImage, AudioSource, Track, TrackId};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Open(SessionId),
    Artwork(ArtworkRequest),
    LoadDuration(SessionId),
    Play(SessionId),
    Pause(SessionId),
    Seek(SessionId, Duration, SeekReason),
    StartTicks(SessionId),
    StopTicks(SessionId),
    Close(SessionId),
}

type Log = Rc<RefCell<Vec<Call>>>;

#[derive(Default)]
struct FakeBackend {
    log: Log,
    ranges: Rc<RefCell<Vec<TimeRange>>>,
    fail_open: Rc<RefCell<bool>>,
}

struct FakeSession {
    id: SessionId,
    log: Log,
    ranges: Rc<RefCell<Vec<TimeRange>>>,
}

impl MediaSession for FakeSession {
    fn load_duration(&self) {
        self.log.borrow_mut().push(Call::LoadDuration(self.id));
    }
    fn play(&self) {
        self.log.borrow_mut().push(Call::Play(self.id));
    }
    fn pause(&self) {
        self.log.borrow_mut().push(Call::Pause(self.id));
    }
    fn seek(&self, to: Duration, tolerance: SeekTolerance, reason: SeekReason) {
        if reason == SeekReason::Scrub {
            assert_eq!(tolerance, SeekTolerance::Exact);
        }
        self.log.borrow_mut().push(Call::Seek(self.id, to, reason));
    }
    fn start_ticks(&self, _interval: Duration) {
        self.log.borrow_mut().push(Call::StartTicks(self.id));
    }
    fn stop_ticks(&self) {
        self.log.borrow_mut().push(Call::StopTicks(self.id));
    }
    fn loaded_ranges(&self) -> Vec<TimeRange> {
        self.ranges.borrow().clone()
    }
    fn close(&mut self) {
        self.log.borrow_mut().push(Call::Close(self.id));
    }
}

impl MediaBackend for FakeBackend {
    type Session = FakeSession;

    fn open(
        &mut self,
        id: SessionId,
        source: &AudioSource,
        _events: Sender<EngineEvent>,
    ) -> Result<FakeSession, BackendError> {
        if *self.fail_open.borrow() {
            return Err(BackendError::Decode(format!("cannot decode {source}")));
        }
        self.log.borrow_mut().push(Call::Open(id));
        Ok(FakeSession {
            id,
            log: self.log.clone(),
            ranges: self.ranges.clone(),
        })
    }

    fn extract_artwork(
        &self,
        _source: &AudioSource,
        request: ArtworkRequest,
        _events: Sender<EngineEvent>,
    ) {
        self.log.borrow_mut().push(Call::Artwork(request));
    }
}

struct Harness {
    engine: PlaybackEngine<FakeBackend>,
    log: Log,
    ranges: Rc<RefCell<Vec<TimeRange>>>,
    fail_open: Rc<RefCell<bool>>,
    store: MemoryFavoritesStore,
    _rx: Receiver<EngineEvent>,
}

impl Harness {
    fn new() -> Self {
        Self::with_favorites(&[])
    }

    fn with_favorites(ids: &[&str]) -> Self {
        let backend = FakeBackend::default();
        let log = backend.log.clone();
        let ranges = backend.ranges.clone();
        let fail_open = backend.fail_open.clone();
        let store = MemoryFavoritesStore::with_ids(ids.iter().copied());
        let favorites = Favorites::load(Box::new(store.clone()));
        let (tx, rx) = mpsc::channel();
        let engine = PlaybackEngine::new(backend, favorites, &PlaybackSettings::default(), tx);
        Self {
            engine,
            log,
            ranges,
            fail_open,
            store,
            _rx: rx,
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.log.borrow().clone()
    }

    fn clear_calls(&self) {
        self.log.borrow_mut().clear();
    }

    fn live_session(&self) -> SessionId {
        self.log
            .borrow()
            .iter()
            .rev()
            .find_map(|c| match c {
                Call::Open(id) => Some(*id),
                _ => None,
            })
            .expect("no session was opened")
    }

    fn session_event(&mut self, event: SessionEvent) {
        let session = self.live_session();
        self.engine
            .handle_event(EngineEvent::Session { session, event });
    }

    fn ready(&mut self, duration: Option<Duration>) {
        self.session_event(SessionEvent::Ready { duration });
    }

    fn state(&self) -> PlaybackState {
        self.engine.snapshot()
    }
}

fn local(name: &str) -> Track {
    Track::new(name, "Artist", AudioSource::Local(PathBuf::from("/music").join(name)))
}

fn remote(name: &str) -> Track {
    let source = AudioSource::parse(&format!("https://example.com/audio/{name}")).unwrap();
    Track::new(name, "Artist", source)
}

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

fn playlist(n: usize) -> Vec<Track> {
    (0..n).map(|i| local(&format!("t{i}.mp3"))).collect()
}

#[test]
fn start_index_is_clamped_into_the_playlist() {
    let mut h = Harness::new();
    h.engine.load_playlist(playlist(5), 10);
    assert_eq!(h.state().current_index, Some(4));

    h.engine.load_playlist(playlist(5), -3);
    assert_eq!(h.state().current_index, Some(0));

    h.engine.load_playlist(playlist(5), 2);
    assert_eq!(h.state().current_index, Some(2));
}

#[test]
fn empty_playlist_clears_everything_and_closes_the_session() {
    let mut h = Harness::new();
    h.engine.load_playlist(playlist(2), 0);
    let session = h.live_session();
    h.ready(Some(secs(60)));
    h.session_event(SessionEvent::Tick(secs(5)));

    h.engine.load_playlist(Vec::new(), 0);

    let state = h.state();
    assert_eq!(state.current_index, None);
    assert!(!state.is_playing);
    assert_eq!(state.current_time, Duration::ZERO);
    assert_eq!(state.buffered_time, Duration::ZERO);
    assert!(h.engine.playlist().is_empty());
    assert!(h.engine.current_track().is_none());
    assert!(h.calls().contains(&Call::Close(session)));
}

#[test]
fn loading_a_track_closes_the_previous_session_first() {
    let mut h = Harness::new();
    h.engine.load_playlist(playlist(2), 0);
    h.clear_calls();

    h.engine.next_track();

    let calls = h.calls();
    let close = calls.iter().position(|c| *c == Call::Close(1)).unwrap();
    let open = calls.iter().position(|c| *c == Call::Open(2)).unwrap();
    assert!(close < open);
    assert!(calls.contains(&Call::LoadDuration(2)));
}

#[test]
fn favorite_flags_are_synced_from_the_store_on_load() {
    let mut h = Harness::with_favorites(&["b.mp3"]);
    let mut a = local("a.mp3");
    a.is_favorited = true;
    let b = local("b.mp3");

    h.engine.load_playlist(vec![a, b], 0);

    let flags: Vec<bool> = h.engine.playlist().iter().map(|t| t.is_favorited).collect();
    assert_eq!(flags, vec![false, true]);
}

#[test]
fn toggle_favorite_twice_restores_flag_and_store() {
    let mut h = Harness::new();
    h.engine.load_playlist(vec![remote("test2.mp3")], 0);

    h.engine.toggle_favorite();
    assert!(h.engine.current_track().unwrap().is_favorited);
    assert!(h.store.snapshot().contains("test2.mp3"));
    assert!(h.engine.favorites().contains("test2.mp3"));

    h.engine.toggle_favorite();
    assert!(!h.engine.current_track().unwrap().is_favorited);
    assert!(h.store.snapshot().is_empty());
}

#[test]
fn toggle_favorite_without_a_track_does_nothing() {
    let mut h = Harness::new();
    h.engine.toggle_favorite();
    assert!(h.store.snapshot().is_empty());
    assert!(h.calls().is_empty());
}

#[test]
fn next_and_previous_wrap_around() {
    let mut h = Harness::new();
    h.engine.load_playlist(playlist(3), 2);

    h.engine.next_track();
    assert_eq!(h.state().current_index, Some(0));

    h.engine.previous_track();
    assert_eq!(h.state().current_index, Some(2));

    h.engine.previous_track();
    assert_eq!(h.state().current_index, Some(1));
}

#[test]
fn navigation_on_an_empty_playlist_is_a_no_op() {
    let mut h = Harness::new();
    h.engine.next_track();
    h.engine.previous_track();
    assert_eq!(h.state().current_index, None);
    assert!(h.calls().is_empty());
}

#[test]
fn repeat_mode_cycles_back_after_three_steps() {
    let mut h = Harness::new();
    assert_eq!(h.state().repeat_mode, RepeatMode::Off);
    h.engine.cycle_repeat_mode();
    assert_eq!(h.state().repeat_mode, RepeatMode::One);
    h.engine.cycle_repeat_mode();
    assert_eq!(h.state().repeat_mode, RepeatMode::All);
    h.engine.cycle_repeat_mode();
    assert_eq!(h.state().repeat_mode, RepeatMode::Off);
}

#[test]
fn ready_backfills_duration_starts_ticks_and_plays() {
    let mut h = Harness::new();
    h.engine.load_playlist(playlist(1), 0);
    assert!(!h.state().is_playing);

    h.ready(Some(secs(180)));

    let session = h.live_session();
    assert!(h.state().is_playing);
    assert_eq!(h.engine.current_track().unwrap().duration, Some(secs(180)));
    let calls = h.calls();
    assert!(calls.contains(&Call::StartTicks(session)));
    assert!(calls.contains(&Call::Play(session)));
    assert_eq!(h.state().buffered_time, secs(15));
}

#[test]
fn caller_supplied_duration_is_never_overwritten() {
    let mut h = Harness::new();
    let track = local("a.mp3").with_duration_secs(200.0);
    h.engine.load_playlist(vec![track], 0);

    h.session_event(SessionEvent::DurationLoaded(Some(secs(180))));
    h.ready(Some(secs(180)));

    assert_eq!(h.engine.current_track().unwrap().duration, Some(secs(200)));
}

#[test]
fn failed_duration_load_changes_nothing() {
    let mut h = Harness::new();
    h.engine.load_playlist(playlist(1), 0);
    h.session_event(SessionEvent::DurationLoaded(None));
    assert_eq!(h.engine.current_track().unwrap().duration, None);
    assert_eq!(h.state().last_error, None);
}

#[test]
fn events_from_a_replaced_session_are_dropped() {
    let mut h = Harness::new();
    h.engine.load_playlist(playlist(2), 0);
    let stale = h.live_session();
    h.engine.next_track();
    h.clear_calls();

    h.engine.handle_event(EngineEvent::Session {
        session: stale,
        event: SessionEvent::Ready {
            duration: Some(secs(10)),
        },
    });
    h.engine.handle_event(EngineEvent::Session {
        session: stale,
        event: SessionEvent::EndOfMedia,
    });

    assert!(!h.state().is_playing);
    assert_eq!(h.state().current_index, Some(1));
    assert_eq!(h.engine.playlist()[0].duration, None);
    assert!(h.calls().is_empty());
}

#[test]
fn artwork_is_requested_only_for_tracks_without_art() {
    let mut h = Harness::new();
    let with_art = local("a.mp3").with_artwork(Artwork::Asset("cover".into()));
    h.engine.load_playlist(vec![with_art, local("b.mp3")], 0);
    assert!(!h.calls().iter().any(|c| matches!(c, Call::Artwork(_))));

    h.engine.next_track();
    let id = h.engine.playlist()[1].id;
    let calls = h.calls();
    let asked = calls
        .iter()
        .position(|c| *c == Call::Artwork(ArtworkRequest { index: 1, track: id }))
        .expect("artwork requested");
    let opened = calls.iter().position(|c| *c == Call::Open(2)).unwrap();
    assert!(asked < opened, "artwork is requested before the session opens");
}

#[test]
fn stale_artwork_results_are_discarded() {
    let mut h = Harness::new();
    h.engine.load_playlist(playlist(2), 0);
    let first = h.engine.playlist()[0].id;
    h.engine.next_track();
    let image = ArtworkImage {
        data: vec![1, 2, 3],
        mime_type: Some("image/png".into()),
    };

    // Slot no longer current.
    h.engine.handle_event(EngineEvent::Artwork {
        request: ArtworkRequest {
            index: 0,
            track: first,
        },
        image: Some(image.clone()),
    });
    // Right slot, different track.
    h.engine.handle_event(EngineEvent::Artwork {
        request: ArtworkRequest {
            index: 1,
            track: TrackId::new(),
        },
        image: Some(image.clone()),
    });
    assert!(h.engine.playlist().iter().all(|t| t.artwork.is_none()));

    let current = h.engine.playlist()[1].id;
    h.engine.handle_event(EngineEvent::Artwork {
        request: ArtworkRequest {
            index: 1,
            track: current,
        },
        image: Some(image.clone()),
    });
    assert_eq!(
        h.engine.playlist()[1].artwork,
        Some(Artwork::Extracted(image))
    );
}

#[test]
fn scrub_near_the_end_swallows_exactly_one_end_of_media() {
    let mut h = Harness::new();
    h.engine.load_playlist(playlist(2), 0);
    h.ready(Some(secs(100)));

    h.engine.begin_scrubbing();
    assert!(h.state().is_user_scrubbing);
    h.engine.update_scrub_position(Duration::from_millis(99_000));
    assert_eq!(h.state().current_time, Duration::from_millis(99_000));
    h.engine.user_did_end_scrubbing(Duration::from_millis(99_800));

    assert!(!h.state().is_user_scrubbing);
    assert!(h.calls().contains(&Call::Seek(
        1,
        Duration::from_millis(99_800),
        SeekReason::Scrub
    )));

    h.session_event(SessionEvent::EndOfMedia);
    assert_eq!(h.state().current_index, Some(0));

    h.session_event(SessionEvent::EndOfMedia);
    assert_eq!(h.state().current_index, Some(1));
}

#[test]
fn suppression_expires_after_the_seek_completes() {
    let mut h = Harness::new();
    h.engine.load_playlist(playlist(2), 0);
    h.ready(Some(secs(100)));

    h.engine.begin_scrubbing();
    h.engine.user_did_end_scrubbing(Duration::from_millis(99_900));
    h.session_event(SessionEvent::SeekCompleted {
        reason: SeekReason::Scrub,
        finished: true,
    });

    // Not yet due.
    h.engine.poll_timers(Instant::now());
    h.engine.poll_timers(Instant::now() + secs(1));

    h.session_event(SessionEvent::EndOfMedia);
    assert_eq!(h.state().current_index, Some(1));
}

#[test]
fn scrub_far_from_the_end_does_not_suppress() {
    let mut h = Harness::new();
    h.engine.load_playlist(playlist(2), 0);
    h.ready(Some(secs(100)));

    h.engine.begin_scrubbing();
    h.engine.user_did_end_scrubbing(secs(50));
    h.session_event(SessionEvent::EndOfMedia);

    assert_eq!(h.state().current_index, Some(1));
}

#[test]
fn scrub_target_is_clamped_to_the_duration() {
    let mut h = Harness::new();
    h.engine.load_playlist(playlist(1), 0);
    h.ready(Some(secs(100)));

    h.engine.begin_scrubbing();
    h.engine.user_did_end_scrubbing(secs(500));

    assert!(h.calls().contains(&Call::Seek(1, secs(100), SeekReason::Scrub)));
}

#[test]
fn scrubbing_pauses_ticks_until_the_seek_completes() {
    let mut h = Harness::new();
    h.engine.load_playlist(playlist(1), 0);
    h.ready(Some(secs(100)));
    h.clear_calls();

    h.engine.begin_scrubbing();
    h.engine.begin_scrubbing();
    assert_eq!(h.calls(), vec![Call::StopTicks(1)]);

    h.session_event(SessionEvent::Tick(secs(42)));
    assert_eq!(h.state().current_time, Duration::ZERO);

    h.engine.user_did_end_scrubbing(secs(30));
    h.session_event(SessionEvent::SeekCompleted {
        reason: SeekReason::Scrub,
        finished: true,
    });
    assert_eq!(h.calls().last(), Some(&Call::StartTicks(1)));

    h.session_event(SessionEvent::Tick(secs(31)));
    assert_eq!(h.state().current_time, secs(31));
}

#[test]
fn ending_a_scrub_without_a_known_duration_just_resumes_ticks() {
    let mut h = Harness::new();
    h.engine.load_playlist(playlist(1), 0);
    h.ready(None);
    h.clear_calls();

    h.engine.begin_scrubbing();
    h.engine.user_did_end_scrubbing(secs(10));

    assert_eq!(h.calls(), vec![Call::StopTicks(1), Call::StartTicks(1)]);
    assert!(!h.state().is_user_scrubbing);
}

#[test]
fn end_of_media_while_scrubbing_is_ignored() {
    let mut h = Harness::new();
    h.engine.load_playlist(playlist(2), 0);
    h.ready(Some(secs(100)));

    h.engine.begin_scrubbing();
    h.session_event(SessionEvent::EndOfMedia);

    assert_eq!(h.state().current_index, Some(0));
}

#[test]
fn repeat_one_restarts_the_track_and_plays_after_the_seek() {
    let mut h = Harness::new();
    h.engine.load_playlist(playlist(2), 0);
    h.ready(Some(secs(100)));
    h.engine.cycle_repeat_mode();
    h.clear_calls();

    h.session_event(SessionEvent::EndOfMedia);
    assert_eq!(
        h.calls(),
        vec![Call::Seek(1, Duration::ZERO, SeekReason::Restart)]
    );

    h.session_event(SessionEvent::SeekCompleted {
        reason: SeekReason::Restart,
        finished: true,
    });
    assert_eq!(h.calls().last(), Some(&Call::Play(1)));
    assert_eq!(h.state().current_index, Some(0));
    assert!(h.state().is_playing);
}

#[test]
fn repeat_all_wraps_to_the_first_track() {
    let mut h = Harness::new();
    h.engine.load_playlist(playlist(3), 2);
    h.ready(Some(secs(100)));
    h.engine.cycle_repeat_mode();
    h.engine.cycle_repeat_mode();

    h.session_event(SessionEvent::EndOfMedia);

    assert_eq!(h.state().current_index, Some(0));
}

#[test]
fn repeat_off_at_the_end_pauses_and_rewinds() {
    let mut h = Harness::new();
    h.engine.load_playlist(playlist(2), 1);
    h.ready(Some(secs(100)));
    h.session_event(SessionEvent::Tick(secs(99)));
    h.clear_calls();

    h.session_event(SessionEvent::EndOfMedia);

    let session = h.live_session();
    assert_eq!(
        h.calls(),
        vec![
            Call::Pause(session),
            Call::Seek(session, Duration::ZERO, SeekReason::Rewind)
        ]
    );
    let state = h.state();
    assert_eq!(state.current_index, Some(1));
    assert_eq!(state.current_time, Duration::ZERO);
    assert!(!state.is_playing);
}

#[test]
fn repeat_off_mid_playlist_advances() {
    let mut h = Harness::new();
    h.engine.load_playlist(playlist(3), 0);
    h.ready(Some(secs(100)));

    h.session_event(SessionEvent::EndOfMedia);

    assert_eq!(h.state().current_index, Some(1));
    assert!(!h.state().is_playing, "waits for the new session to be ready");
}

#[test]
fn local_buffer_is_current_time_plus_lookahead_capped_at_duration() {
    let mut h = Harness::new();
    h.engine.load_playlist(playlist(1), 0);
    h.ready(Some(secs(20)));

    h.session_event(SessionEvent::Tick(secs(10)));
    assert_eq!(h.state().buffered_time, secs(20));

    h.session_event(SessionEvent::Tick(secs(2)));
    assert_eq!(h.state().buffered_time, secs(17));
}

#[test]
fn local_buffer_without_duration_is_not_capped() {
    let mut h = Harness::new();
    h.engine.load_playlist(playlist(1), 0);
    h.ready(None);

    h.session_event(SessionEvent::Tick(secs(10)));
    assert_eq!(h.state().buffered_time, secs(25));
}

#[test]
fn remote_buffer_follows_the_first_loaded_range() {
    let mut h = Harness::new();
    h.engine.load_playlist(vec![remote("song.mp3")], 0);
    h.ready(Some(secs(60)));

    h.session_event(SessionEvent::Tick(secs(5)));
    assert_eq!(h.state().buffered_time, secs(5), "no range yet");

    h.ranges.borrow_mut().push(TimeRange {
        start: Duration::ZERO,
        duration: secs(30),
    });
    h.session_event(SessionEvent::LoadedRangesChanged);
    assert_eq!(h.state().buffered_time, secs(30));

    h.ranges.borrow_mut()[0].duration = secs(90);
    h.session_event(SessionEvent::LoadedRangesChanged);
    assert_eq!(h.state().buffered_time, secs(60));
}

#[test]
fn remote_buffer_never_falls_behind_playback() {
    let mut h = Harness::new();
    h.engine.load_playlist(vec![remote("song.mp3")], 0);
    h.ready(Some(secs(60)));
    h.ranges.borrow_mut().push(TimeRange {
        start: Duration::ZERO,
        duration: secs(10),
    });

    h.session_event(SessionEvent::Tick(secs(12)));
    assert_eq!(h.state().buffered_time, secs(12));
}

#[test]
fn backend_failure_stops_playback_and_clears_scrub_state() {
    let mut h = Harness::new();
    h.engine.load_playlist(playlist(2), 0);
    h.ready(Some(secs(100)));
    h.engine.begin_scrubbing();
    h.engine.user_did_end_scrubbing(Duration::from_millis(99_900));
    h.engine.begin_scrubbing();

    h.session_event(SessionEvent::Failed("decoder exploded".into()));

    let state = h.state();
    assert!(!state.is_playing);
    assert!(!state.is_user_scrubbing);
    assert_eq!(state.current_index, Some(0));
    assert_eq!(state.last_error.as_deref(), Some("decoder exploded"));

    // Guard was cleared, so a later end of media is not swallowed.
    h.session_event(SessionEvent::EndOfMedia);
    assert_eq!(h.state().current_index, Some(1));
    assert_eq!(h.state().last_error, None);
}

#[test]
fn open_failure_leaves_the_track_current_but_stopped() {
    let mut h = Harness::new();
    *h.fail_open.borrow_mut() = true;

    h.engine.load_playlist(playlist(2), 1);

    let state = h.state();
    assert_eq!(state.current_index, Some(1));
    assert!(!state.is_playing);
    assert!(state.last_error.is_some());

    h.engine.play();
    assert!(!h.state().is_playing);
}

#[test]
fn play_without_a_session_is_a_no_op() {
    let mut h = Harness::new();
    h.engine.play();
    assert!(!h.state().is_playing);
    h.engine.pause();
    assert!(!h.state().is_playing);
}

#[test]
fn control_commands_drive_the_engine() {
    let mut h = Harness::new();
    h.engine.handle_event(EngineEvent::Control(ControlCmd::LoadPlaylist {
        tracks: playlist(2),
        start_index: 0,
    }));
    h.ready(Some(secs(100)));
    assert!(h.state().is_playing);

    h.engine.handle_event(EngineEvent::Control(ControlCmd::Pause));
    assert!(!h.state().is_playing);
    h.engine.handle_event(EngineEvent::Control(ControlCmd::Play));
    assert!(h.state().is_playing);

    h.engine.handle_event(EngineEvent::Control(ControlCmd::Next));
    assert_eq!(h.state().current_index, Some(1));
    h.engine.handle_event(EngineEvent::Control(ControlCmd::CycleRepeatMode));
    assert_eq!(h.state().repeat_mode, RepeatMode::One);
}

#[test]
fn status_line_describes_the_current_track() {
    let mut h = Harness::new();
    assert!(h.engine.status_line().starts_with("nothing loaded"));

    h.engine.load_playlist(playlist(1), 0);
    h.ready(Some(secs(125)));
    h.session_event(SessionEvent::Tick(secs(61)));

    let line = h.engine.status_line();
    assert!(line.starts_with("playing: Artist - t0.mp3"), "{line}");
    assert!(line.contains("01:01 / 02:05"), "{line}");
    assert!(line.ends_with("track 1/1"), "{line}");
}

#[test]
fn dropping_the_engine_closes_the_live_session() {
    let h = Harness::new();
    let Harness {
        mut engine, log, ..
    } = h;
    engine.load_playlist(playlist(1), 0);
    drop(engine);
    assert_eq!(log.borrow().last(), Some(&Call::Close(1)));
}

#[test]
fn initial_repeat_mode_comes_from_settings() {
    let settings = PlaybackSettings {
        repeat_mode: crate::config::RepeatModeSetting::All,
        ..PlaybackSettings::default()
    };
    let (tx, _rx) = mpsc::channel();
    let favorites = Favorites::load(Box::new(MemoryFavoritesStore::default()));
    let engine = PlaybackEngine::new(FakeBackend::default(), favorites, &settings, tx);
    assert_eq!(engine.snapshot().repeat_mode, RepeatMode::All);
}

#[test]
fn switching_tracks_mid_seek_still_starts_ticks_on_the_new_session() {
    let mut h = Harness::new();
    h.engine.load_playlist(playlist(3), 0);
    h.ready(Some(secs(100)));
    h.engine.begin_scrubbing();
    h.engine.user_did_end_scrubbing(secs(40));

    // The scrub seek on session 1 never completes before the switch.
    h.engine.next_track();
    h.engine.handle_event(EngineEvent::Session {
        session: 1,
        event: SessionEvent::SeekCompleted {
            reason: SeekReason::Scrub,
            finished: true,
        },
    });
    h.ready(Some(secs(100)));

    assert!(h.calls().contains(&Call::StartTicks(2)));
    h.session_event(SessionEvent::Tick(secs(7)));
    assert_eq!(h.state().current_time, secs(7));
}

#[test]
fn ticks_past_the_duration_are_capped() {
    let mut h = Harness::new();
    h.engine.load_playlist(playlist(1), 0);
    h.ready(Some(secs(20)));

    h.session_event(SessionEvent::Tick(secs(21)));

    let state = h.state();
    assert_eq!(state.current_time, secs(20));
    assert_eq!(state.buffered_time, secs(20));
}

#[test]
fn remote_buffer_stays_within_the_duration() {
    let mut h = Harness::new();
    h.engine.load_playlist(vec![remote("song.mp3")], 0);
    h.ready(Some(secs(60)));

    h.session_event(SessionEvent::Tick(secs(61)));

    assert!(h.state().buffered_time <= secs(60));
    assert_eq!(h.state().current_time, secs(60));
}
