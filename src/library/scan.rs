use std::path::{Path, PathBuf};

use lofty::prelude::{Accessor, AudioFile, TaggedFileExt};
use log::{debug, warn};
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::model::{AudioSource, Track};

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Build a `Track` for a local file, filling title/artist/duration from tags when present.
///
/// The title falls back to the file stem and the artist to an empty string.
pub fn track_from_path(path: &Path) -> Track {
    let default_title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN")
        .to_string();

    let mut title = default_title;
    let mut artist = String::new();
    let mut duration = None;

    match lofty::read_from_path(path) {
        Ok(tagged) => {
            let d = tagged.properties().duration();
            if !d.is_zero() {
                duration = Some(d);
            }

            if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
                if let Some(v) = tag.title() {
                    if !v.trim().is_empty() {
                        title = v.trim().to_string();
                    }
                }
                if let Some(v) = tag.artist() {
                    let v = v.trim();
                    if !v.is_empty() {
                        artist = v.to_string();
                    }
                }
            }
        }
        Err(e) => debug!("no readable tags in {}: {e}", path.display()),
    }

    Track::new(title, artist, AudioSource::from(path)).with_duration(duration)
}

/// Scan `dir` for audio files, sorted case-insensitively by display string.
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<Track> {
    let mut tracks: Vec<Track> = Vec::new();

    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if path.is_file()
            && (settings.include_hidden || !is_hidden(path))
            && is_audio_file(path, settings)
        {
            tracks.push(track_from_path(path));
        }
    }

    tracks.sort_by_key(|t| t.display().to_lowercase());
    tracks
}

/// Expand command-line paths into a playlist: directories are scanned, files are
/// taken as-is (in argument order), anything else is skipped with a warning.
pub fn tracks_from_paths(paths: &[PathBuf], settings: &LibrarySettings) -> Vec<Track> {
    let mut tracks = Vec::new();
    for path in paths {
        if path.is_dir() {
            tracks.extend(scan(path, settings));
        } else if path.is_file() {
            tracks.push(track_from_path(path));
        } else {
            warn!("skipping {}: not a file or directory", path.display());
        }
    }
    tracks
}
