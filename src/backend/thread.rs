use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error, warn};
use rodio::{OutputStream, OutputStreamBuilder, Sink};
use url::Url;

use crate::engine::{ArtworkRequest, EngineEvent};
use crate::library::{ArtworkImage, artwork};

use super::fetch::fetch_bytes;
use super::sink::{Media, create_sink_at};
use super::types::{BackendError, SeekReason, SeekTolerance, SessionEvent, SessionId, TimeRange};

/// How often the audio thread wakes up to check for ticks and end of media.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// State shared between a session handle and the audio thread.
#[derive(Debug, Default)]
pub(super) struct SessionInfo {
    pub loaded_ranges: Vec<TimeRange>,
    /// Set once the session is closed; stops its download.
    pub closed: bool,
}

pub(super) type SessionInfoHandle = Arc<Mutex<SessionInfo>>;

fn is_closed(info: &SessionInfoHandle) -> bool {
    info.lock().map_or(true, |info| info.closed)
}

fn mark_closed(info: &SessionInfoHandle) {
    if let Ok(mut info) = info.lock() {
        info.closed = true;
    }
}

/// Where to deliver cover art read from a session's downloaded body.
pub(super) struct ArtworkReply {
    pub request: ArtworkRequest,
    pub events: Sender<EngineEvent>,
}

impl ArtworkReply {
    fn send(self, image: Option<ArtworkImage>) {
        let _ = self.events.send(EngineEvent::Artwork {
            request: self.request,
            image,
        });
    }

    // Tag parsing stays off the audio thread.
    fn extract_from(self, body: Arc<[u8]>) {
        thread::spawn(move || {
            let image = artwork::extract_from_bytes(&body);
            self.send(image);
        });
    }
}

pub(super) enum OpenSource {
    File(PathBuf),
    Remote {
        url: Url,
        artwork: Option<ArtworkReply>,
    },
}

pub(super) enum AudioCmd {
    Open {
        id: SessionId,
        source: OpenSource,
        events: Sender<EngineEvent>,
        info: SessionInfoHandle,
    },
    /// A remote body finished downloading (sent by a fetch worker).
    Fetched {
        id: SessionId,
        result: Result<Vec<u8>, BackendError>,
    },
    LoadDuration(SessionId),
    Play(SessionId),
    Pause(SessionId),
    Seek {
        id: SessionId,
        to: Duration,
        tolerance: SeekTolerance,
        reason: SeekReason,
    },
    StartTicks {
        id: SessionId,
        interval: Duration,
    },
    StopTicks(SessionId),
    Close(SessionId),
    Quit,
}

struct Ticker {
    interval: Duration,
    next_at: Instant,
}

struct SessionSlot {
    events: Sender<EngineEvent>,
    info: SessionInfoHandle,
    media: Option<Media>,
    sink: Option<Sink>,
    // Position the current sink started at (non-zero after a rebuild-seek).
    offset: Duration,
    duration: Option<Duration>,
    paused: bool,
    ended: bool,
    failed: bool,
    duration_requested: bool,
    ticks: Option<Ticker>,
    artwork: Option<ArtworkReply>,
}

impl SessionSlot {
    fn new(events: Sender<EngineEvent>, info: SessionInfoHandle) -> Self {
        Self {
            events,
            info,
            media: None,
            sink: None,
            offset: Duration::ZERO,
            duration: None,
            paused: true,
            ended: false,
            failed: false,
            duration_requested: false,
            ticks: None,
            artwork: None,
        }
    }

    fn emit(&self, id: SessionId, event: SessionEvent) {
        let _ = self.events.send(EngineEvent::Session { session: id, event });
    }

    fn fail(&mut self, id: SessionId, reason: String) {
        warn!("session {id} failed: {reason}");
        self.failed = true;
        if self.duration_requested {
            self.duration_requested = false;
            self.emit(id, SessionEvent::DurationLoaded(None));
        }
        self.emit(id, SessionEvent::Failed(reason));
    }

    fn position(&self) -> Duration {
        self.offset + self.sink.as_ref().map_or(Duration::ZERO, Sink::get_pos)
    }

    fn stop(&mut self) {
        mark_closed(&self.info);
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }
}

pub(super) fn spawn_audio_thread(
    rx: Receiver<AudioCmd>,
    self_tx: Sender<AudioCmd>,
    agent: ureq::Agent,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("cadenza-audio".into())
        .spawn(move || run(rx, self_tx, agent))
}

fn run(rx: Receiver<AudioCmd>, self_tx: Sender<AudioCmd>, agent: ureq::Agent) {
    let stream = match OutputStreamBuilder::open_default_stream() {
        Ok(mut stream) => {
            // rodio logs to stderr when OutputStream is dropped. That's useful in debugging,
            // but noisy for an interactive app.
            stream.log_on_drop(false);
            Some(stream)
        }
        Err(e) => {
            error!("no audio output device: {e}");
            None
        }
    };

    let mut sessions: HashMap<SessionId, SessionSlot> = HashMap::new();

    loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(AudioCmd::Quit) => {
                for slot in sessions.values_mut() {
                    slot.stop();
                }
                break;
            }
            Ok(cmd) => handle_cmd(cmd, stream.as_ref(), &mut sessions, &self_tx, &agent),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        let now = Instant::now();
        for (&id, slot) in sessions.iter_mut() {
            service(id, slot, now);
        }
    }
}

fn handle_cmd(
    cmd: AudioCmd,
    stream: Option<&OutputStream>,
    sessions: &mut HashMap<SessionId, SessionSlot>,
    self_tx: &Sender<AudioCmd>,
    agent: &ureq::Agent,
) {
    match cmd {
        AudioCmd::Open {
            id,
            source,
            events,
            info,
        } => {
            let mut slot = SessionSlot::new(events, info);
            match source {
                OpenSource::File(path) => attach_media(id, &mut slot, stream, Media::File(path)),
                OpenSource::Remote { url, artwork } => {
                    debug!("session {id}: fetching {url}");
                    slot.artwork = artwork;
                    let tx = self_tx.clone();
                    let agent = agent.clone();
                    let info = slot.info.clone();
                    thread::spawn(move || {
                        let result = fetch_bytes(&agent, &url, || is_closed(&info));
                        let _ = tx.send(AudioCmd::Fetched { id, result });
                    });
                }
            }
            sessions.insert(id, slot);
        }
        AudioCmd::Fetched { id, result } => {
            // Closed while downloading: drop the body.
            let Some(slot) = sessions.get_mut(&id) else {
                return;
            };
            match result {
                Ok(bytes) => {
                    let body: Arc<[u8]> = bytes.into();
                    if let Some(reply) = slot.artwork.take() {
                        reply.extract_from(body.clone());
                    }
                    attach_media(id, slot, stream, Media::Bytes(body));
                }
                Err(e) => {
                    if let Some(reply) = slot.artwork.take() {
                        reply.send(None);
                    }
                    slot.fail(id, e.to_string());
                }
            }
        }
        AudioCmd::LoadDuration(id) => {
            let Some(slot) = sessions.get_mut(&id) else {
                return;
            };
            if slot.sink.is_some() {
                slot.emit(id, SessionEvent::DurationLoaded(slot.duration));
            } else if slot.failed {
                slot.emit(id, SessionEvent::DurationLoaded(None));
            } else {
                slot.duration_requested = true;
            }
        }
        AudioCmd::Play(id) => {
            if let Some(slot) = sessions.get_mut(&id) {
                slot.paused = false;
                if let Some(sink) = slot.sink.as_ref() {
                    sink.play();
                }
            }
        }
        AudioCmd::Pause(id) => {
            if let Some(slot) = sessions.get_mut(&id) {
                slot.paused = true;
                if let Some(sink) = slot.sink.as_ref() {
                    sink.pause();
                }
            }
        }
        AudioCmd::Seek {
            id,
            to,
            tolerance,
            reason,
        } => {
            let Some(slot) = sessions.get_mut(&id) else {
                return;
            };
            let finished = seek(slot, stream, to);
            debug!("session {id}: seek to {to:?} ({tolerance:?}, {reason:?}) finished={finished}");
            slot.emit(id, SessionEvent::SeekCompleted { reason, finished });
        }
        AudioCmd::StartTicks { id, interval } => {
            if let Some(slot) = sessions.get_mut(&id) {
                slot.ticks = Some(Ticker {
                    interval,
                    next_at: Instant::now() + interval,
                });
            }
        }
        AudioCmd::StopTicks(id) => {
            if let Some(slot) = sessions.get_mut(&id) {
                slot.ticks = None;
            }
        }
        AudioCmd::Close(id) => {
            if let Some(mut slot) = sessions.remove(&id) {
                slot.stop();
                debug!("session {id}: closed");
            }
        }
        AudioCmd::Quit => {}
    }
}

fn attach_media(
    id: SessionId,
    slot: &mut SessionSlot,
    stream: Option<&OutputStream>,
    media: Media,
) {
    let Some(stream) = stream else {
        slot.fail(id, "no audio output device".to_string());
        return;
    };

    match create_sink_at(stream, &media, Duration::ZERO) {
        Ok((sink, total)) => {
            if !slot.paused {
                sink.play();
            }
            slot.sink = Some(sink);
            slot.duration = total;

            if let (Media::Bytes(_), Some(total)) = (&media, total) {
                if let Ok(mut info) = slot.info.lock() {
                    info.loaded_ranges = vec![TimeRange {
                        start: Duration::ZERO,
                        duration: total,
                    }];
                }
                slot.emit(id, SessionEvent::LoadedRangesChanged);
            }
            slot.media = Some(media);

            if slot.duration_requested {
                slot.duration_requested = false;
                slot.emit(id, SessionEvent::DurationLoaded(total));
            }
            slot.emit(id, SessionEvent::Ready { duration: total });
        }
        Err(e) => slot.fail(id, e.to_string()),
    }
}

/// Seek the slot's sink, rebuilding it when the decoder can't seek in place
/// (or the source already ran out). Returns whether the seek happened.
fn seek(slot: &mut SessionSlot, stream: Option<&OutputStream>, to: Duration) -> bool {
    let (Some(sink), Some(media), Some(stream)) = (slot.sink.as_ref(), slot.media.clone(), stream)
    else {
        return false;
    };

    if !sink.empty() && sink.try_seek(to).is_ok() {
        slot.offset = Duration::ZERO;
        slot.ended = false;
        return true;
    }

    match create_sink_at(stream, &media, to) {
        Ok((new_sink, _)) => {
            if !slot.paused {
                new_sink.play();
            }
            if let Some(old) = slot.sink.replace(new_sink) {
                old.stop();
            }
            slot.offset = to;
            slot.ended = false;
            true
        }
        Err(e) => {
            warn!("seek rebuild failed: {e}");
            false
        }
    }
}

fn service(id: SessionId, slot: &mut SessionSlot, now: Instant) {
    let Some(sink) = slot.sink.as_ref() else {
        return;
    };

    if !slot.ended && !slot.paused && sink.empty() {
        slot.ended = true;
        slot.emit(id, SessionEvent::EndOfMedia);
    }

    let due = match slot.ticks.as_mut() {
        Some(ticker) if now >= ticker.next_at => {
            ticker.next_at = now + ticker.interval;
            true
        }
        _ => false,
    };
    if due {
        slot.emit(id, SessionEvent::Tick(slot.position()));
    }
}
