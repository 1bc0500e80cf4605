//! Line-oriented stdin control surface.
//!
//! A line starting with `{` is a chat command envelope for the router;
//! anything else is a transport keyword.

use std::io::{self, BufRead};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{info, warn};

use crate::engine::{ControlCmd, EngineHandle};
use crate::router::CommandRouter;

const HELP: &str = "commands: play, pause, next, prev, fav, repeat, seek <secs>, status, quit, \
                    or a JSON chat command like {\"command\": \"PLAY_DEFAULT_TRACK\"}";

#[derive(Debug, PartialEq)]
enum ConsoleInput {
    Chat(String),
    Control(Vec<ControlCmd>),
    Help,
    Empty,
}

fn parse_line(line: &str) -> Result<ConsoleInput, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ConsoleInput::Empty);
    }
    if line.starts_with('{') {
        return Ok(ConsoleInput::Chat(line.to_string()));
    }

    let mut words = line.split_whitespace();
    let keyword = words.next().unwrap_or_default().to_ascii_lowercase();
    let cmd = match keyword.as_str() {
        "play" | "resume" => ControlCmd::Play,
        "pause" => ControlCmd::Pause,
        "next" => ControlCmd::Next,
        "prev" | "previous" => ControlCmd::Previous,
        "fav" | "favorite" => ControlCmd::ToggleFavorite,
        "repeat" => ControlCmd::CycleRepeatMode,
        "status" => ControlCmd::Status,
        "quit" | "exit" => ControlCmd::Quit,
        "help" => return Ok(ConsoleInput::Help),
        "seek" => {
            let secs: f64 = words
                .next()
                .ok_or("seek needs a position in seconds")?
                .parse()
                .map_err(|_| "seek position must be a number of seconds".to_string())?;
            let to = Duration::try_from_secs_f64(secs.max(0.0))
                .map_err(|_| "seek position out of range".to_string())?;
            // A seek is a scrub with no intermediate drag positions.
            return Ok(ConsoleInput::Control(vec![
                ControlCmd::BeginScrub,
                ControlCmd::EndScrub(to),
            ]));
        }
        other => return Err(format!("unknown command {other:?}; type `help`")),
    };
    Ok(ConsoleInput::Control(vec![cmd]))
}

/// Read stdin on its own thread. End of input asks the engine to quit.
pub fn spawn(router: CommandRouter, engine: EngineHandle) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("cadenza-console".into())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                match parse_line(&line) {
                    Ok(ConsoleInput::Chat(json)) => {
                        // Rejections are already logged by the router.
                        let _ = router.handle_json(&json);
                    }
                    Ok(ConsoleInput::Control(cmds)) => {
                        for cmd in cmds {
                            if engine.send(cmd).is_err() {
                                return;
                            }
                        }
                    }
                    Ok(ConsoleInput::Help) => info!("{HELP}"),
                    Ok(ConsoleInput::Empty) => {}
                    Err(msg) => warn!("{msg}"),
                }
            }
            let _ = engine.send(ControlCmd::Quit);
        })
}
