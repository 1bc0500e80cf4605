use std::fmt;
use std::time::Duration;

use crate::config::RepeatModeSetting;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum RepeatMode {
    #[default]
    Off,
    One,
    All,
}

impl RepeatMode {
    /// `Off -> One -> All -> Off`.
    pub fn next(self) -> Self {
        match self {
            Self::Off => Self::One,
            Self::One => Self::All,
            Self::All => Self::Off,
        }
    }
}

impl From<RepeatModeSetting> for RepeatMode {
    fn from(setting: RepeatModeSetting) -> Self {
        match setting {
            RepeatModeSetting::Off => Self::Off,
            RepeatModeSetting::One => Self::One,
            RepeatModeSetting::All => Self::All,
        }
    }
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Off => "off",
            Self::One => "one",
            Self::All => "all",
        };
        f.write_str(s)
    }
}

/// Point-in-time copy of the engine's observable transport state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackState {
    pub current_index: Option<usize>,
    pub is_playing: bool,
    pub current_time: Duration,
    pub buffered_time: Duration,
    pub is_user_scrubbing: bool,
    pub repeat_mode: RepeatMode,
    pub last_error: Option<String>,
}

/// Format a `Duration` as `MM:SS`.
pub(super) fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
