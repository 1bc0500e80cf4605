use std::sync::mpsc::{SendError, Sender};
use std::time::Duration;

use crate::backend::{SessionEvent, SessionId};
use crate::library::{ArtworkImage, Track, TrackId};

/// Tags an artwork extraction with the playlist slot it was started for.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ArtworkRequest {
    pub index: usize,
    pub track: TrackId,
}

/// Transport and playlist commands, sent by the router and the console.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCmd {
    LoadPlaylist { tracks: Vec<Track>, start_index: isize },
    Play,
    Pause,
    Next,
    Previous,
    ToggleFavorite,
    CycleRepeatMode,
    BeginScrub,
    ScrubTo(Duration),
    EndScrub(Duration),
    /// Log the current playback state.
    Status,
    Quit,
}

/// Everything the engine thread reacts to.
#[derive(Debug)]
pub enum EngineEvent {
    Session {
        session: SessionId,
        event: SessionEvent,
    },
    Artwork {
        request: ArtworkRequest,
        image: Option<ArtworkImage>,
    },
    Control(ControlCmd),
}

/// Cloneable sending side of the engine channel.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: Sender<EngineEvent>,
}

impl EngineHandle {
    pub fn new(tx: Sender<EngineEvent>) -> Self {
        Self { tx }
    }

    pub fn send(&self, cmd: ControlCmd) -> Result<(), SendError<EngineEvent>> {
        self.tx.send(EngineEvent::Control(cmd))
    }
}
