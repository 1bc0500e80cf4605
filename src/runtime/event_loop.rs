use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::backend::MediaBackend;
use crate::engine::{ControlCmd, EngineEvent, PlaybackEngine, PlaybackState};

/// Upper bound on how long a pending deadline can go unchecked.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Drive `engine` from `rx` until a quit command arrives or every sender is gone.
pub fn run<B: MediaBackend>(engine: &mut PlaybackEngine<B>, rx: &Receiver<EngineEvent>) {
    let mut last = engine.snapshot();

    loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(EngineEvent::Control(ControlCmd::Quit)) => {
                info!("quit requested");
                break;
            }
            Ok(event) => engine.handle_event(event),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        engine.poll_timers(Instant::now());

        let now = engine.snapshot();
        if now != last {
            report_changes(&last, &now, engine);
            last = now;
        }
    }
}

fn report_changes<B: MediaBackend>(
    prev: &PlaybackState,
    next: &PlaybackState,
    engine: &PlaybackEngine<B>,
) {
    if prev.current_index != next.current_index || prev.is_playing != next.is_playing {
        info!("{}", engine.status_line());
    }
    if prev.current_index != next.current_index {
        if let Some(track) = engine.current_track() {
            debug!("artwork: {:?}", track.display_artwork());
        }
    }
    if let Some(err) = &next.last_error {
        if prev.last_error.as_ref() != Some(err) {
            warn!("track stopped: {err}");
        }
    }
    if prev.is_user_scrubbing != next.is_user_scrubbing {
        debug!("scrubbing: {}", next.is_user_scrubbing);
    }
}
