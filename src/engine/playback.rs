use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::backend::{
    MediaBackend, MediaSession, SeekReason, SeekTolerance, SessionEvent, SessionId, TimeRange,
};
use crate::config::PlaybackSettings;
use crate::favorites::Favorites;
use crate::library::{Artwork, ArtworkImage, Track};

use super::events::{ArtworkRequest, ControlCmd, EngineEvent};
use super::state::{PlaybackState, RepeatMode, format_mmss};

struct ActiveSession<S> {
    id: SessionId,
    handle: S,
    ready: bool,
    ticking: bool,
}

/// One-shot guard that swallows the end-of-media signal produced by a scrub
/// landing right at the end of the track.
#[derive(Debug, Default)]
struct EndSuppression {
    armed: bool,
    disarm_at: Option<Instant>,
}

impl EndSuppression {
    fn arm(&mut self) {
        self.armed = true;
        self.disarm_at = None;
    }

    fn clear(&mut self) {
        self.armed = false;
        self.disarm_at = None;
    }
}

pub struct PlaybackEngine<B: MediaBackend> {
    backend: B,
    events: Sender<EngineEvent>,
    favorites: Favorites,

    playlist: Vec<Track>,
    current_index: Option<usize>,
    is_playing: bool,
    current_time: Duration,
    buffered_time: Duration,
    is_user_scrubbing: bool,
    repeat_mode: RepeatMode,
    last_error: Option<String>,

    session: Option<ActiveSession<B::Session>>,
    last_session_id: SessionId,
    observer_paused: bool,
    suppression: EndSuppression,

    tick_interval: Duration,
    lookahead: Duration,
    scrub_end_threshold: Duration,
    suppression_disarm: Duration,
}

impl<B: MediaBackend> PlaybackEngine<B> {
    /// `events` is the sending side of the channel this engine is fed from;
    /// it is handed to every session the backend opens.
    pub fn new(
        backend: B,
        favorites: Favorites,
        settings: &PlaybackSettings,
        events: Sender<EngineEvent>,
    ) -> Self {
        Self {
            backend,
            events,
            favorites,
            playlist: Vec::new(),
            current_index: None,
            is_playing: false,
            current_time: Duration::ZERO,
            buffered_time: Duration::ZERO,
            is_user_scrubbing: false,
            repeat_mode: settings.repeat_mode.into(),
            last_error: None,
            session: None,
            last_session_id: 0,
            observer_paused: false,
            suppression: EndSuppression::default(),
            tick_interval: Duration::from_millis(settings.tick_interval_ms.max(1)),
            lookahead: Duration::try_from_secs_f64(settings.local_buffer_lookahead_secs)
                .unwrap_or(Duration::ZERO),
            scrub_end_threshold: Duration::from_millis(settings.scrub_end_threshold_ms),
            suppression_disarm: Duration::from_millis(settings.suppression_disarm_ms),
        }
    }

    pub fn snapshot(&self) -> PlaybackState {
        PlaybackState {
            current_index: self.current_index,
            is_playing: self.is_playing,
            current_time: self.current_time,
            buffered_time: self.buffered_time,
            is_user_scrubbing: self.is_user_scrubbing,
            repeat_mode: self.repeat_mode,
            last_error: self.last_error.clone(),
        }
    }

    pub fn playlist(&self) -> &[Track] {
        &self.playlist
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current_index.and_then(|i| self.playlist.get(i))
    }

    pub fn favorites(&self) -> &Favorites {
        &self.favorites
    }

    /// One human-readable line describing what is playing.
    pub fn status_line(&self) -> String {
        let Some(track) = self.current_track() else {
            return format!("nothing loaded (repeat {})", self.repeat_mode);
        };
        let state = if self.is_playing { "playing" } else { "paused" };
        let total = track
            .duration
            .map(format_mmss)
            .unwrap_or_else(|| "--:--".to_string());
        let fav = if track.is_favorited { " [fav]" } else { "" };
        let position = self.current_index.map_or(0, |i| i + 1);
        format!(
            "{state}: {}{fav} {} / {total} (buffered {}) repeat {}, track {position}/{}",
            track.display(),
            format_mmss(self.current_time),
            format_mmss(self.buffered_time),
            self.repeat_mode,
            self.playlist().len(),
        )
    }

    /// Apply one event from the engine channel.
    pub fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Session { session, event } => {
                if self.session.as_ref().map(|s| s.id) != Some(session) {
                    debug!("dropping {event:?} from stale session {session}");
                    return;
                }
                self.on_session_event(event);
            }
            EngineEvent::Artwork { request, image } => self.on_artwork(request, image),
            EngineEvent::Control(cmd) => self.apply(cmd),
        }
    }

    fn apply(&mut self, cmd: ControlCmd) {
        match cmd {
            ControlCmd::LoadPlaylist {
                tracks,
                start_index,
            } => self.load_playlist(tracks, start_index),
            ControlCmd::Play => self.play(),
            ControlCmd::Pause => self.pause(),
            ControlCmd::Next => self.next_track(),
            ControlCmd::Previous => self.previous_track(),
            ControlCmd::ToggleFavorite => self.toggle_favorite(),
            ControlCmd::CycleRepeatMode => self.cycle_repeat_mode(),
            ControlCmd::BeginScrub => self.begin_scrubbing(),
            ControlCmd::ScrubTo(t) => self.update_scrub_position(t),
            ControlCmd::EndScrub(t) => self.user_did_end_scrubbing(t),
            ControlCmd::Status => {
                info!("{}", self.status_line());
                info!(
                    "favorites ({}): {}",
                    self.favorites.len(),
                    self.favorites.list_all().join(", ")
                );
            }
            // The runtime stops the loop before this reaches us.
            ControlCmd::Quit => {}
        }
    }

    /// Fire any deadline that is due at `now`.
    pub fn poll_timers(&mut self, now: Instant) {
        if let Some(at) = self.suppression.disarm_at {
            if now >= at {
                debug!("end-of-track suppression expired");
                self.suppression.clear();
            }
        }
    }

    // --- playlist ---------------------------------------------------------

    /// Replace the playlist and start playing at `start_index`, clamped into range.
    pub fn load_playlist(&mut self, tracks: Vec<Track>, start_index: isize) {
        if tracks.is_empty() {
            self.teardown_session();
            self.playlist.clear();
            self.current_index = None;
            self.reset_progress();
            info!("playlist cleared");
            return;
        }

        let mut tracks = tracks;
        for track in &mut tracks {
            track.is_favorited = self.favorites.contains(&track.favorite_id());
        }
        self.playlist = tracks;

        let last = self.playlist.len() - 1;
        let index = usize::try_from(start_index).unwrap_or(0).min(last);
        info!("loaded {} track(s), starting at {index}", self.playlist.len());
        self.load_and_play_track(index);
    }

    fn load_and_play_track(&mut self, index: usize) {
        let Some(track) = self.playlist.get(index) else {
            return;
        };
        let source = track.source.clone();
        let request = ArtworkRequest {
            index,
            track: track.id,
        };
        let needs_artwork = !track.has_artwork();
        info!("now playing: {}", track.display());

        self.current_index = Some(index);
        self.reset_progress();
        self.last_error = None;
        // A scrub seek still pending on the old session will never complete.
        self.observer_paused = false;

        if needs_artwork {
            self.backend
                .extract_artwork(&source, request, self.events.clone());
        }

        self.teardown_session();
        self.last_session_id += 1;
        let id = self.last_session_id;
        match self.backend.open(id, &source, self.events.clone()) {
            Ok(handle) => {
                handle.load_duration();
                self.session = Some(ActiveSession {
                    id,
                    handle,
                    ready: false,
                    ticking: false,
                });
            }
            Err(e) => self.fail(e.to_string()),
        }
    }

    fn teardown_session(&mut self) {
        if let Some(mut active) = self.session.take() {
            debug!("closing session {}", active.id);
            active.handle.close();
        }
        self.suppression.clear();
    }

    fn reset_progress(&mut self) {
        self.is_playing = false;
        self.current_time = Duration::ZERO;
        self.buffered_time = Duration::ZERO;
    }

    pub fn next_track(&mut self) {
        if self.playlist.is_empty() {
            return;
        }
        let len = self.playlist.len();
        let next = self.current_index.map_or(0, |i| (i + 1) % len);
        self.load_and_play_track(next);
    }

    pub fn previous_track(&mut self) {
        if self.playlist.is_empty() {
            return;
        }
        let len = self.playlist.len();
        let prev = self.current_index.map_or(len - 1, |i| (i + len - 1) % len);
        self.load_and_play_track(prev);
    }

    // --- transport --------------------------------------------------------

    pub fn play(&mut self) {
        let Some(active) = self.session.as_ref() else {
            warn!("play requested but no track is loaded");
            return;
        };
        active.handle.play();
        self.is_playing = true;
    }

    pub fn pause(&mut self) {
        if let Some(active) = self.session.as_ref() {
            active.handle.pause();
        }
        self.is_playing = false;
    }

    pub fn pause_time_observer(&mut self) {
        if self.observer_paused {
            return;
        }
        self.observer_paused = true;
        if let Some(active) = self.session.as_mut() {
            if active.ticking {
                active.handle.stop_ticks();
                active.ticking = false;
            }
        }
    }

    pub fn resume_time_observer(&mut self) {
        if !self.observer_paused {
            return;
        }
        self.observer_paused = false;
        self.start_ticks();
    }

    fn start_ticks(&mut self) {
        if let Some(active) = self.session.as_mut() {
            if active.ready && !active.ticking {
                active.handle.start_ticks(self.tick_interval);
                active.ticking = true;
            }
        }
    }

    pub fn begin_scrubbing(&mut self) {
        self.pause_time_observer();
        self.is_user_scrubbing = true;
    }

    /// Follow the drag position while the user is scrubbing.
    pub fn update_scrub_position(&mut self, to: Duration) {
        if !self.is_user_scrubbing {
            return;
        }
        let duration = self.current_track().and_then(|t| t.duration);
        self.current_time = duration.map_or(to, |d| to.min(d));
    }

    pub fn user_did_end_scrubbing(&mut self, to: Duration) {
        self.is_user_scrubbing = false;

        let duration = self
            .current_track()
            .and_then(|t| t.duration)
            .filter(|d| !d.is_zero());
        let (Some(duration), true) = (duration, self.session.is_some()) else {
            self.resume_time_observer();
            return;
        };

        let target = to.min(duration);
        if duration - target < self.scrub_end_threshold {
            debug!("scrub landed near the end, suppressing next end of media");
            self.suppression.arm();
        }
        self.current_time = target;
        if let Some(active) = self.session.as_ref() {
            active
                .handle
                .seek(target, SeekTolerance::Exact, SeekReason::Scrub);
        }
    }

    // --- favorites / repeat -----------------------------------------------

    pub fn toggle_favorite(&mut self) {
        let Some(track) = self.current_index.and_then(|i| self.playlist.get_mut(i)) else {
            return;
        };
        track.is_favorited = !track.is_favorited;
        let id = track.favorite_id();
        if track.is_favorited {
            self.favorites.add(&id);
        } else {
            self.favorites.remove(&id);
        }
        info!(
            "toggled favorite for {id}; {} saved",
            self.favorites.len()
        );
    }

    pub fn cycle_repeat_mode(&mut self) {
        self.repeat_mode = self.repeat_mode.next();
        info!("repeat mode: {}", self.repeat_mode);
    }

    // --- backend signals --------------------------------------------------

    fn on_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::DurationLoaded(duration) => {
                if let Some(d) = duration {
                    self.backfill_duration(d);
                }
                if self.current_track().is_some_and(Track::is_local) {
                    self.update_buffer_time();
                }
            }
            SessionEvent::Ready { duration } => {
                if let Some(d) = duration {
                    self.backfill_duration(d);
                }
                if let Some(active) = self.session.as_mut() {
                    active.ready = true;
                }
                if !self.observer_paused {
                    self.start_ticks();
                }
                self.update_buffer_time();
                self.play();
            }
            SessionEvent::Failed(reason) => self.fail(reason),
            SessionEvent::Tick(t) => {
                if self.is_user_scrubbing || self.observer_paused {
                    return;
                }
                let duration = self.current_track().and_then(|track| track.duration);
                self.current_time = duration.map_or(t, |d| t.min(d));
                self.update_buffer_time();
            }
            SessionEvent::LoadedRangesChanged => self.update_buffer_time(),
            SessionEvent::SeekCompleted { reason, finished } => {
                debug!("seek completed ({reason:?}, finished={finished})");
                self.on_seek_completed(reason);
            }
            SessionEvent::EndOfMedia => self.on_end_of_media(),
        }
    }

    fn on_seek_completed(&mut self, reason: SeekReason) {
        match reason {
            SeekReason::Scrub => {
                self.resume_time_observer();
                if self.current_track().is_some_and(Track::is_local) {
                    self.update_buffer_time();
                }
                if self.suppression.armed {
                    self.suppression.disarm_at = Some(Instant::now() + self.suppression_disarm);
                }
            }
            SeekReason::Restart => self.play(),
            SeekReason::Rewind => self.update_buffer_time(),
        }
    }

    fn on_end_of_media(&mut self) {
        if self.suppression.armed {
            debug!("ignoring end of media right after a scrub");
            self.suppression.clear();
            return;
        }
        if self.is_user_scrubbing {
            return;
        }

        let Some(index) = self.current_index else {
            self.is_playing = false;
            return;
        };
        let next = index + 1;

        match self.repeat_mode {
            RepeatMode::One => {
                if let Some(active) = self.session.as_ref() {
                    active
                        .handle
                        .seek(Duration::ZERO, SeekTolerance::Relaxed, SeekReason::Restart);
                }
            }
            RepeatMode::All => {
                self.load_and_play_track(if next < self.playlist.len() { next } else { 0 });
            }
            RepeatMode::Off if next < self.playlist.len() => self.load_and_play_track(next),
            RepeatMode::Off => {
                info!("end of playlist");
                self.pause();
                if let Some(active) = self.session.as_ref() {
                    active
                        .handle
                        .seek(Duration::ZERO, SeekTolerance::Relaxed, SeekReason::Rewind);
                }
                self.current_time = Duration::ZERO;
                self.is_playing = false;
            }
        }
    }

    fn on_artwork(&mut self, request: ArtworkRequest, image: Option<ArtworkImage>) {
        if self.current_index != Some(request.index) {
            debug!("dropping artwork for slot {} (no longer current)", request.index);
            return;
        }
        let Some(track) = self.playlist.get_mut(request.index) else {
            return;
        };
        if track.id != request.track {
            debug!("dropping artwork for replaced track {}", request.track);
            return;
        }
        if let Some(image) = image {
            if track.artwork.is_none() {
                track.artwork = Some(Artwork::Extracted(image));
            }
        }
    }

    fn backfill_duration(&mut self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        if let Some(track) = self.current_index.and_then(|i| self.playlist.get_mut(i)) {
            if track.duration.is_none() {
                track.duration = Some(duration);
            }
        }
    }

    fn fail(&mut self, reason: String) {
        warn!("playback failed: {reason}");
        self.is_playing = false;
        self.is_user_scrubbing = false;
        self.suppression.clear();
        self.last_error = Some(reason);
    }

    fn update_buffer_time(&mut self) {
        let Some(track) = self.current_track() else {
            self.buffered_time = Duration::ZERO;
            return;
        };
        let duration = track.duration;
        let clamp = |t: Duration| duration.map_or(t, |d| t.min(d));

        let buffered = if track.is_local() {
            clamp(self.current_time + self.lookahead)
        } else {
            let first_end = self
                .session
                .as_ref()
                .and_then(|s| s.handle.loaded_ranges().first().map(TimeRange::end));
            first_end.map_or(self.current_time, clamp)
        };
        self.buffered_time = clamp(buffered.max(self.current_time));
    }
}

impl<B: MediaBackend> Drop for PlaybackEngine<B> {
    fn drop(&mut self) {
        self.teardown_session();
    }
}
