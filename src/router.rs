//! Chat command routing.
//!
//! Commands arrive as a name plus a JSON parameter object. They are
//! validated into a [`ChatCommand`] first and only then posted to the
//! engine thread, so a rejected command never touches playback.

mod command;

use std::path::PathBuf;

use log::{info, warn};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::BundledSettings;
use crate::engine::{ControlCmd, EngineHandle};
use crate::library::{Artwork, AudioSource, Track};

pub use command::{ChatCommand, SongRequest};

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid command: {0}")]
    Validation(String),
    #[error("bundled resource not found: {0}")]
    ResourceNotFound(PathBuf),
    #[error("unknown chat command: {0}")]
    UnknownCommand(String),
    #[error("playback engine is not running")]
    EngineUnavailable,
}

/// `{"command": "...", "parameters": {...}}`
#[derive(Debug, Deserialize)]
struct Envelope {
    command: String,
    #[serde(default)]
    parameters: Map<String, Value>,
}

pub struct CommandRouter {
    engine: EngineHandle,
    bundled: BundledSettings,
}

impl CommandRouter {
    pub fn new(engine: EngineHandle, bundled: BundledSettings) -> Self {
        Self { engine, bundled }
    }

    pub fn handle(
        &self,
        command: &str,
        parameters: &Map<String, Value>,
    ) -> Result<(), CommandError> {
        let result = ChatCommand::parse(command, parameters).and_then(|cmd| self.dispatch(cmd));
        if let Err(e) = &result {
            warn!("chat command {command:?} rejected: {e}");
        }
        result
    }

    /// Parse and handle one JSON-encoded command.
    pub fn handle_json(&self, line: &str) -> Result<(), CommandError> {
        let envelope: Envelope = serde_json::from_str(line).map_err(|e| {
            let err = CommandError::Validation(format!("malformed command JSON: {e}"));
            warn!("{err}");
            err
        })?;
        self.handle(&envelope.command, &envelope.parameters)
    }

    fn dispatch(&self, cmd: ChatCommand) -> Result<(), CommandError> {
        let control = match cmd {
            ChatCommand::PlayDefaultTrack => {
                let track = self.default_track()?;
                info!("chat: playing bundled track {}", track.display());
                single_track(track)
            }
            ChatCommand::PlaySong(song) => {
                let track = song.into_track();
                info!("chat: playing {}", track.display());
                single_track(track)
            }
            ChatCommand::Pause => ControlCmd::Pause,
            ChatCommand::Resume => ControlCmd::Play,
        };
        self.engine
            .send(control)
            .map_err(|_| CommandError::EngineUnavailable)
    }

    fn default_track(&self) -> Result<Track, CommandError> {
        let path = self.bundled.default_track_path();
        if !path.is_file() {
            return Err(CommandError::ResourceNotFound(path));
        }
        let mut track = Track::new(
            &self.bundled.default_track_title,
            &self.bundled.default_track_artist,
            AudioSource::Local(path),
        );
        if let Some(asset) = &self.bundled.default_track_artwork {
            track = track.with_artwork(Artwork::Asset(asset.clone()));
        }
        Ok(track)
    }
}

fn single_track(track: Track) -> ControlCmd {
    ControlCmd::LoadPlaylist {
        tracks: vec![track],
        start_index: 0,
    }
}
