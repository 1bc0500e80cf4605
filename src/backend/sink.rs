//! Utilities for creating `rodio` sinks from loaded media.
//!
//! The helper here encapsulates decoding a file or an in-memory body and
//! preparing a paused `Sink` at the requested start position.

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rodio::{Decoder, OutputStream, Sink, Source};

use super::types::BackendError;

/// Media a session can decode from, repeatedly if a seek needs a fresh sink.
#[derive(Clone)]
pub(super) enum Media {
    File(PathBuf),
    Bytes(Arc<[u8]>),
}

/// Create a paused `Sink` for `media` that starts playback at `start_at`.
///
/// Also returns the decoder's total duration when the format reports one.
pub(super) fn create_sink_at(
    stream: &OutputStream,
    media: &Media,
    start_at: Duration,
) -> Result<(Sink, Option<Duration>), BackendError> {
    let sink = Sink::connect_new(stream.mixer());
    sink.pause();

    let total = match media {
        Media::File(path) => {
            let file = File::open(path).map_err(|source| BackendError::Open {
                path: path.clone(),
                source,
            })?;
            append_decoded(&sink, BufReader::new(file), start_at)?
        }
        Media::Bytes(bytes) => append_decoded(&sink, Cursor::new(bytes.clone()), start_at)?,
    };

    Ok((sink, total))
}

fn append_decoded<R>(
    sink: &Sink,
    reader: R,
    start_at: Duration,
) -> Result<Option<Duration>, BackendError>
where
    R: Read + Seek + Send + Sync + 'static,
{
    let source = Decoder::new(reader).map_err(|e| BackendError::Decode(e.to_string()))?;
    let total = source.total_duration();
    // `skip_duration` is our fallback seeking primitive; even Duration::ZERO is fine.
    sink.append(source.skip_duration(start_at));
    Ok(total)
}
