//! Media backend: the engine-facing session contract and a `rodio`
//! implementation running on a dedicated audio thread.

mod fetch;
mod player;
mod sink;
mod thread;
mod types;

pub use player::{RodioBackend, RodioSession};
pub use types::*;
