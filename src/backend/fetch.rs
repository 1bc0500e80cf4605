//! Whole-body HTTP fetches for remote tracks.

use std::io::{ErrorKind, Read};
use std::time::Duration;

use url::Url;

use crate::config::NetworkSettings;

use super::types::BackendError;

// Refuse absurd bodies rather than exhausting memory.
const MAX_BODY_BYTES: u64 = 512 * 1024 * 1024;
const CHUNK_BYTES: usize = 64 * 1024;

pub(crate) fn build_agent(settings: &NetworkSettings) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(Duration::from_secs(settings.connect_timeout_secs))
        .timeout_read(Duration::from_secs(settings.read_timeout_secs))
        .build()
}

/// Download `url` in full. `is_cancelled` is checked before connecting and
/// between reads; a cancelled download ends with `BackendError::Cancelled`.
pub(crate) fn fetch_bytes(
    agent: &ureq::Agent,
    url: &Url,
    is_cancelled: impl Fn() -> bool,
) -> Result<Vec<u8>, BackendError> {
    let fetch_err = |reason: String| BackendError::Fetch {
        url: url.to_string(),
        reason,
    };

    if is_cancelled() {
        return Err(BackendError::Cancelled);
    }

    let response = agent.get(url.as_str()).call().map_err(|e| match e {
        ureq::Error::Status(code, _) => fetch_err(format!("HTTP {code}")),
        ureq::Error::Transport(transport) => fetch_err(transport.to_string()),
    })?;

    read_body(response.into_reader(), is_cancelled)
        .map_err(|e| fetch_err(e.to_string()))?
        .ok_or(BackendError::Cancelled)
}

/// Read `reader` to the end in chunks. `None` when cancelled part way.
pub(super) fn read_body(
    reader: impl Read,
    is_cancelled: impl Fn() -> bool,
) -> std::io::Result<Option<Vec<u8>>> {
    let mut reader = reader.take(MAX_BODY_BYTES);
    let mut bytes = Vec::new();
    let mut chunk = vec![0u8; CHUNK_BYTES];

    loop {
        if is_cancelled() {
            return Ok(None);
        }
        match reader.read(&mut chunk) {
            Ok(0) => return Ok(Some(bytes)),
            Ok(n) => bytes.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
}
