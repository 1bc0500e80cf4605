//! Embedded cover-art extraction backed by `lofty`.

use std::io::Cursor;
use std::path::Path;

use lofty::file::TaggedFile;
use lofty::picture::PictureType;
use lofty::prelude::TaggedFileExt;
use lofty::probe::Probe;
use log::debug;

use super::model::ArtworkImage;

/// Read the front cover (or else the first picture) from a local audio file.
pub fn extract_from_path(path: &Path) -> Option<ArtworkImage> {
    match lofty::read_from_path(path) {
        Ok(tagged) => first_picture(&tagged),
        Err(e) => {
            debug!("error loading metadata for album art from {}: {e}", path.display());
            None
        }
    }
}

/// Same as [`extract_from_path`] for an in-memory file (e.g. a fetched remote track).
pub fn extract_from_bytes(bytes: &[u8]) -> Option<ArtworkImage> {
    let probe = Probe::new(Cursor::new(bytes)).guess_file_type().ok()?;
    match probe.read() {
        Ok(tagged) => first_picture(&tagged),
        Err(e) => {
            debug!("error loading metadata for album art: {e}");
            None
        }
    }
}

fn first_picture(tagged: &TaggedFile) -> Option<ArtworkImage> {
    let tags = tagged.primary_tag().into_iter().chain(tagged.tags());

    let mut fallback = None;
    for tag in tags {
        for picture in tag.pictures() {
            if picture.pic_type() == PictureType::CoverFront {
                return Some(to_image(picture));
            }
            if fallback.is_none() {
                fallback = Some(to_image(picture));
            }
        }
    }
    fallback
}

fn to_image(picture: &lofty::picture::Picture) -> ArtworkImage {
    ArtworkImage {
        data: picture.data().to_vec(),
        mime_type: picture.mime_type().map(|m| m.as_str().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_from_path_returns_none_for_untagged_or_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let junk = dir.path().join("junk.mp3");
        std::fs::write(&junk, b"not really an mp3").unwrap();

        assert!(extract_from_path(&junk).is_none());
        assert!(extract_from_path(&dir.path().join("missing.mp3")).is_none());
    }

    #[test]
    fn extract_from_bytes_returns_none_for_garbage() {
        assert!(extract_from_bytes(b"").is_none());
        assert!(extract_from_bytes(b"definitely not audio").is_none());
    }
}
