use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::debug;
use url::Url;

use crate::config::NetworkSettings;
use crate::engine::{ArtworkRequest, EngineEvent};
use crate::library::{AudioSource, artwork};

use super::fetch::build_agent;
use super::thread::{
    ArtworkReply, AudioCmd, OpenSource, SessionInfo, SessionInfoHandle, spawn_audio_thread,
};
use super::types::{
    BackendError, MediaBackend, MediaSession, SeekReason, SeekTolerance, SessionId, TimeRange,
};

/// `MediaBackend` playing through the default `rodio` output device.
///
/// All sinks live on one audio thread; sessions are thin handles that post
/// commands to it.
pub struct RodioBackend {
    tx: Sender<AudioCmd>,
    join: Mutex<Option<JoinHandle<()>>>,
    // Remote artwork waits for the body the next session downloads.
    pending_artwork: Mutex<Option<(Url, ArtworkReply)>>,
}

impl RodioBackend {
    pub fn new(network: &NetworkSettings) -> Result<Self, BackendError> {
        let (tx, rx) = mpsc::channel::<AudioCmd>();
        let agent = build_agent(network);

        let audio_handle = spawn_audio_thread(rx, tx.clone(), agent)
            .map_err(|e| BackendError::OutputUnavailable(e.to_string()))?;

        Ok(Self {
            tx,
            join: Mutex::new(Some(audio_handle)),
            pending_artwork: Mutex::new(None),
        })
    }

    /// Take the artwork request waiting for `source`. Any request for a
    /// different source is dropped.
    pub(super) fn claim_artwork(&self, source: &AudioSource) -> Option<ArtworkReply> {
        let (url, reply) = self.pending_artwork.lock().ok()?.take()?;
        match source {
            AudioSource::Remote(wanted) if *wanted == url => Some(reply),
            _ => None,
        }
    }

    /// Stop every sink and wait for the audio thread to exit.
    pub fn shutdown(&self) {
        let _ = self.tx.send(AudioCmd::Quit);

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}

impl Drop for RodioBackend {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl MediaBackend for RodioBackend {
    type Session = RodioSession;

    fn open(
        &mut self,
        id: SessionId,
        source: &AudioSource,
        events: Sender<EngineEvent>,
    ) -> Result<Self::Session, BackendError> {
        let artwork = self.claim_artwork(source);
        let open_source = match source {
            AudioSource::Local(path) => {
                if !path.is_file() {
                    return Err(BackendError::NotFound(path.clone()));
                }
                OpenSource::File(path.clone())
            }
            AudioSource::Remote(url) => OpenSource::Remote {
                url: url.clone(),
                artwork,
            },
        };

        let info: SessionInfoHandle = Arc::new(Mutex::new(SessionInfo::default()));
        self.tx
            .send(AudioCmd::Open {
                id,
                source: open_source,
                events,
                info: info.clone(),
            })
            .map_err(|_| BackendError::Disconnected)?;

        debug!("session {id}: opened {source}");
        Ok(RodioSession {
            id,
            tx: self.tx.clone(),
            info,
            closed: false,
        })
    }

    fn extract_artwork(
        &self,
        source: &AudioSource,
        request: ArtworkRequest,
        events: Sender<EngineEvent>,
    ) {
        match source {
            AudioSource::Local(path) => {
                let path = path.clone();
                thread::spawn(move || {
                    let image = artwork::extract_from_path(&path);
                    let _ = events.send(EngineEvent::Artwork { request, image });
                });
            }
            AudioSource::Remote(url) => {
                if let Ok(mut pending) = self.pending_artwork.lock() {
                    *pending = Some((url.clone(), ArtworkReply { request, events }));
                }
            }
        }
    }
}

pub struct RodioSession {
    id: SessionId,
    tx: Sender<AudioCmd>,
    info: SessionInfoHandle,
    closed: bool,
}

impl RodioSession {
    fn send(&self, cmd: AudioCmd) {
        if self.closed {
            return;
        }
        let _ = self.tx.send(cmd);
    }
}

impl MediaSession for RodioSession {
    fn load_duration(&self) {
        self.send(AudioCmd::LoadDuration(self.id));
    }

    fn play(&self) {
        self.send(AudioCmd::Play(self.id));
    }

    fn pause(&self) {
        self.send(AudioCmd::Pause(self.id));
    }

    fn seek(&self, to: Duration, tolerance: SeekTolerance, reason: SeekReason) {
        self.send(AudioCmd::Seek {
            id: self.id,
            to,
            tolerance,
            reason,
        });
    }

    fn start_ticks(&self, interval: Duration) {
        self.send(AudioCmd::StartTicks {
            id: self.id,
            interval,
        });
    }

    fn stop_ticks(&self) {
        self.send(AudioCmd::StopTicks(self.id));
    }

    fn loaded_ranges(&self) -> Vec<TimeRange> {
        self.info
            .lock()
            .map(|info| info.loaded_ranges.clone())
            .unwrap_or_default()
    }

    fn close(&mut self) {
        if let Ok(mut info) = self.info.lock() {
            info.closed = true;
        }
        self.send(AudioCmd::Close(self.id));
        self.closed = true;
    }
}

impl Drop for RodioSession {
    fn drop(&mut self) {
        self.close();
    }
}
