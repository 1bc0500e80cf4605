//! Contract between the playback engine and a media backend.
//!
//! A backend opens one session per track. Everything a session reports
//! (readiness, time ticks, seek completion, end of media) is delivered as
//! an `EngineEvent::Session` tagged with the session's id, so the engine can
//! drop anything from a session it has already torn down.

use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::time::Duration;

use thiserror::Error;

use crate::engine::{ArtworkRequest, EngineEvent};
use crate::library::AudioSource;

pub type SessionId = u64;

/// One contiguous span of media the backend has available.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Duration,
    pub duration: Duration,
}

impl TimeRange {
    pub fn end(&self) -> Duration {
        self.start + self.duration
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SeekTolerance {
    /// Land exactly on the requested time.
    Exact,
    /// Let the backend pick the cheapest nearby position.
    Relaxed,
}

/// Why a seek was issued; echoed back in `SessionEvent::SeekCompleted`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SeekReason {
    /// The user released the seek control.
    Scrub,
    /// Repeat-one restarting the current track.
    Restart,
    /// End of playlist with repeat off: park at the start.
    Rewind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Answer to `MediaSession::load_duration`; `None` when it could not be determined.
    DurationLoaded(Option<Duration>),
    Ready { duration: Option<Duration> },
    Failed(String),
    Tick(Duration),
    LoadedRangesChanged,
    SeekCompleted { reason: SeekReason, finished: bool },
    EndOfMedia,
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("audio file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to decode audio: {0}")]
    Decode(String),
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("download cancelled")]
    Cancelled,
    #[error("no audio output device: {0}")]
    OutputUnavailable(String),
    #[error("audio thread is gone")]
    Disconnected,
}

/// A live connection to the backend for one track.
pub trait MediaSession {
    /// Ask for the media duration; answered with `SessionEvent::DurationLoaded`.
    fn load_duration(&self);
    fn play(&self);
    fn pause(&self);
    /// Answered with `SessionEvent::SeekCompleted { reason, .. }`.
    fn seek(&self, to: Duration, tolerance: SeekTolerance, reason: SeekReason);
    /// Emit `SessionEvent::Tick` every `interval` until `stop_ticks`.
    fn start_ticks(&self, interval: Duration);
    fn stop_ticks(&self);
    fn loaded_ranges(&self) -> Vec<TimeRange>;
    /// Stop playback and unsubscribe. No events are sent for this session afterwards.
    fn close(&mut self);
}

pub trait MediaBackend {
    type Session: MediaSession;

    fn open(
        &mut self,
        id: SessionId,
        source: &AudioSource,
        events: Sender<EngineEvent>,
    ) -> Result<Self::Session, BackendError>;

    /// Look for cover art embedded in `source` off-thread; answered with
    /// `EngineEvent::Artwork { request, .. }`.
    ///
    /// Called before `open` for the same source, so a backend that downloads
    /// remote media can read the art from that download.
    fn extract_artwork(
        &self,
        source: &AudioSource,
        request: ArtworkRequest,
        events: Sender<EngineEvent>,
    );
}
