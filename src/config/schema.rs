use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/cadenza/config.toml`,
/// falling back to `~/.config/cadenza/config.toml`.
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `CADENZA__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub playback: PlaybackSettings,
    pub favorites: FavoritesSettings,
    pub library: LibrarySettings,
    pub bundled: BundledSettings,
    pub network: NetworkSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Repeat mode the engine starts in.
    pub repeat_mode: RepeatModeSetting,
    /// Interval between periodic time updates from the backend (milliseconds).
    pub tick_interval_ms: u64,
    /// Simulated look-ahead shown as "buffered" for local files (seconds).
    pub local_buffer_lookahead_secs: f64,
    /// A scrub landing closer than this to the end suppresses the next
    /// end-of-track signal (milliseconds).
    pub scrub_end_threshold_ms: u64,
    /// How long the end-of-track suppression stays armed after a scrub seek
    /// completes (milliseconds).
    pub suppression_disarm_ms: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            repeat_mode: RepeatModeSetting::Off,
            tick_interval_ms: 500,
            local_buffer_lookahead_secs: 15.0,
            scrub_end_threshold_ms: 500,
            suppression_disarm_ms: 200,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepeatModeSetting {
    #[serde(alias = "none", alias = "no_loop", alias = "no-loop")]
    Off,
    #[serde(
        alias = "repeat-one",
        alias = "repeat_one",
        alias = "loop-one",
        alias = "loop_one"
    )]
    One,
    #[serde(
        alias = "repeat-all",
        alias = "repeat_all",
        alias = "loop-all",
        alias = "loop_all"
    )]
    All,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FavoritesSettings {
    /// Where the favorite-ID set is persisted. Defaults to
    /// `$XDG_DATA_HOME/cadenza/favorites.toml`.
    pub store_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: vec![
                "mp3".into(),
                "m4a".into(),
                "flac".into(),
                "wav".into(),
                "ogg".into(),
            ],
            follow_links: true,
            include_hidden: false,
            recursive: true,
            max_depth: None,
        }
    }
}

/// The track played by `PLAY_DEFAULT_TRACK`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BundledSettings {
    /// Directory holding bundled audio assets.
    pub asset_dir: PathBuf,
    /// File name of the default track inside `asset_dir`.
    pub default_track_file: String,
    pub default_track_title: String,
    pub default_track_artist: String,
    /// Artwork asset name shown for the default track.
    pub default_track_artwork: Option<String>,
}

impl Default for BundledSettings {
    fn default() -> Self {
        Self {
            asset_dir: PathBuf::from("assets"),
            default_track_file: "Black Friday (pretty like the sun) - Lost Frequencies.mp3"
                .to_string(),
            default_track_title: "Black Friday (pretty like the sun)".to_string(),
            default_track_artist: "Lost Frequencies, Tom Odells, Poppy Baskcomb".to_string(),
            default_track_artwork: Some("Washed_Out_-_Purple_Noon".to_string()),
        }
    }
}

impl BundledSettings {
    pub fn default_track_path(&self) -> PathBuf {
        self.asset_dir.join(&self.default_track_file)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    /// Connect timeout for remote audio/artwork fetches (seconds).
    pub connect_timeout_secs: u64,
    /// Read timeout for remote audio/artwork fetches (seconds).
    pub read_timeout_secs: u64,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 5,
            read_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// One of `error`, `warn`, `info`, `debug`, `trace`, `off`.
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
