//! The playback engine: one state machine that owns the playlist and the
//! live backend session, fed by a single channel of `EngineEvent`s.

mod events;
mod playback;
mod state;

pub use events::{ArtworkRequest, ControlCmd, EngineEvent, EngineHandle};
pub use playback::PlaybackEngine;
pub use state::{PlaybackState, RepeatMode};

#[cfg(test)]
mod tests;
