use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use url::Url;
use uuid::Uuid;

/// Opaque identity of a track inside one playlist.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TrackId(Uuid);

impl TrackId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("invalid audio source {0:?}: {1}")]
    InvalidSource(String, url::ParseError),
    #[error("unsupported URL scheme {0:?}")]
    UnsupportedScheme(String),
}

/// Where a track's audio comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    Local(PathBuf),
    Remote(Url),
}

impl AudioSource {
    /// Parse a URL string. `file://` URLs become local sources.
    pub fn parse(s: &str) -> Result<Self, TrackError> {
        let url = Url::parse(s.trim()).map_err(|e| TrackError::InvalidSource(s.to_string(), e))?;
        Self::try_from(url)
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }

    /// The file name used as the persistent favorite identifier.
    pub fn file_name(&self) -> String {
        let name = match self {
            Self::Local(path) => path
                .file_name()
                .and_then(|s| s.to_str())
                .map(str::to_string),
            Self::Remote(url) => url
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .filter(|s| !s.is_empty())
                .map(|s| {
                    urlencoding::decode(s)
                        .map(|decoded| decoded.into_owned())
                        .unwrap_or_else(|_| s.to_string())
                }),
        };
        name.unwrap_or_else(|| self.to_string())
    }
}

impl TryFrom<Url> for AudioSource {
    type Error = TrackError;

    fn try_from(url: Url) -> Result<Self, Self::Error> {
        match url.scheme() {
            "file" => url
                .to_file_path()
                .map(Self::Local)
                .map_err(|_| TrackError::UnsupportedScheme(url.to_string())),
            "http" | "https" => Ok(Self::Remote(url)),
            other => Err(TrackError::UnsupportedScheme(other.to_string())),
        }
    }
}

impl From<&Path> for AudioSource {
    fn from(path: &Path) -> Self {
        Self::Local(path.to_path_buf())
    }
}

impl fmt::Display for AudioSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => write!(f, "{url}"),
        }
    }
}

/// Raw embedded cover art pulled out of an audio file's tags.
#[derive(Clone, PartialEq, Eq)]
pub struct ArtworkImage {
    pub data: Vec<u8>,
    pub mime_type: Option<String>,
}

impl fmt::Debug for ArtworkImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtworkImage")
            .field("bytes", &self.data.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// A track's album art. Only one kind is ever attached to a track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artwork {
    /// Name of an artwork asset bundled with the app.
    Asset(String),
    /// Cover art extracted from the audio file itself.
    Extracted(ArtworkImage),
    /// Artwork hosted remotely.
    Remote(Url),
}

/// What the UI should show for a track's art.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtworkDisplay<'a> {
    Asset(&'a str),
    Extracted(&'a ArtworkImage),
    Remote(&'a Url),
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    pub artwork: Option<Artwork>,
    pub source: AudioSource,
    /// `None` until known; resolved from the backend when the caller did not supply it.
    pub duration: Option<Duration>,
    pub is_favorited: bool,
}

impl Track {
    pub fn new(title: impl Into<String>, artist: impl Into<String>, source: AudioSource) -> Self {
        Self {
            id: TrackId::new(),
            title: title.into(),
            artist: artist.into(),
            artwork: None,
            source,
            duration: None,
            is_favorited: false,
        }
    }

    pub fn with_artwork(mut self, artwork: Artwork) -> Self {
        self.artwork = Some(artwork);
        self
    }

    pub fn with_duration(mut self, duration: Option<Duration>) -> Self {
        self.duration = duration;
        self
    }

    /// Set the duration from caller-supplied seconds; `0`, negative and `NaN` mean unknown.
    pub fn with_duration_secs(self, secs: f64) -> Self {
        self.with_duration(duration_from_secs(secs))
    }

    pub fn is_local(&self) -> bool {
        self.source.is_local()
    }

    pub fn favorite_id(&self) -> String {
        self.source.file_name()
    }

    pub fn has_artwork(&self) -> bool {
        self.artwork.is_some()
    }

    pub fn display_artwork(&self) -> ArtworkDisplay<'_> {
        match &self.artwork {
            Some(Artwork::Asset(name)) => ArtworkDisplay::Asset(name),
            Some(Artwork::Extracted(image)) => ArtworkDisplay::Extracted(image),
            Some(Artwork::Remote(url)) => ArtworkDisplay::Remote(url),
            None => ArtworkDisplay::Default,
        }
    }

    /// `"Artist - Title"`, or just the title when the artist is blank.
    pub fn display(&self) -> String {
        match self.artist.trim() {
            "" => self.title.clone(),
            artist => format!("{} - {}", artist, self.title),
        }
    }
}

/// Seconds to a known duration; `0`, negative, infinite and `NaN` are "unknown".
pub fn duration_from_secs(secs: f64) -> Option<Duration> {
    if secs.is_finite() && secs > 0.0 {
        Duration::try_from_secs_f64(secs).ok()
    } else {
        None
    }
}
