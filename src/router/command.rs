use serde_json::{Map, Value};
use url::Url;

use crate::library::{Artwork, AudioSource, Track};

use super::CommandError;

/// A validated chat command.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    PlayDefaultTrack,
    PlaySong(SongRequest),
    Pause,
    Resume,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SongRequest {
    pub title: String,
    pub artist: String,
    pub audio: AudioSource,
    /// Seconds; `0` (or absent) means unknown.
    pub duration_secs: f64,
    pub album_art: Option<Url>,
}

impl SongRequest {
    pub fn into_track(self) -> Track {
        let track = Track::new(self.title, self.artist, self.audio)
            .with_duration_secs(self.duration_secs);
        match self.album_art {
            Some(url) => track.with_artwork(Artwork::Remote(url)),
            None => track,
        }
    }
}

impl ChatCommand {
    pub fn parse(command: &str, params: &Map<String, Value>) -> Result<Self, CommandError> {
        match command {
            "PLAY_DEFAULT_TRACK" | "PLAY_LOCAL_LOST_FREQUCIES" => Ok(Self::PlayDefaultTrack),
            "PLAY_SONG" => parse_song(params).map(Self::PlaySong),
            "PAUSE" => Ok(Self::Pause),
            "RESUME" => Ok(Self::Resume),
            other => Err(CommandError::UnknownCommand(other.to_string())),
        }
    }
}

fn parse_song(params: &Map<String, Value>) -> Result<SongRequest, CommandError> {
    let title = required_str(params, "title")?;
    let artist = required_str(params, "artist")?;
    let audio_url = required_str(params, "audioURL")?;
    let audio = AudioSource::parse(audio_url)
        .map_err(|e| CommandError::Validation(format!("audioURL: {e}")))?;

    // A non-numeric duration is treated like a missing one.
    let duration_secs = params.get("duration").and_then(Value::as_f64).unwrap_or(0.0);
    let album_art = params
        .get("albumArtURL")
        .and_then(Value::as_str)
        .and_then(|s| Url::parse(s).ok());

    Ok(SongRequest {
        title: title.to_string(),
        artist: artist.to_string(),
        audio,
        duration_secs,
        album_art,
    })
}

fn required_str<'a>(params: &'a Map<String, Value>, key: &str) -> Result<&'a str, CommandError> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| CommandError::Validation(format!("missing or non-string parameter {key:?}")))
}
