//! Track model, local library scanning and embedded artwork extraction.

pub mod artwork;
mod model;
mod scan;

pub use model::*;
pub use scan::{scan, track_from_path, tracks_from_paths};
