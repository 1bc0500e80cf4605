use std::env;
use std::path::PathBuf;
use std::sync::mpsc;

use log::{info, warn};

use crate::backend::RodioBackend;
use crate::engine::{EngineEvent, EngineHandle, PlaybackEngine};
use crate::favorites::{Favorites, FavoritesStore, MemoryFavoritesStore, TomlFavoritesStore};
use crate::library::tracks_from_paths;
use crate::router::CommandRouter;

mod console;
mod event_loop;
mod settings;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut clog = colog::default_builder();
    clog.filter(None, log::LevelFilter::Trace);
    clog.init();

    std::panic::set_hook(Box::new(|panic_info| {
        let current_thread = std::thread::current();
        let thread_name = current_thread.name().unwrap_or("unnamed");
        log::error!("panic in thread '{}': {}", thread_name, panic_info);
    }));

    let settings = settings::load_settings();
    log::set_max_level(settings.log.level_filter().unwrap_or(log::LevelFilter::Info));

    let favorites = Favorites::load(favorites_store(&settings));
    let backend = RodioBackend::new(&settings.network)?;

    let (tx, rx) = mpsc::channel::<EngineEvent>();
    let handle = EngineHandle::new(tx.clone());
    let mut engine = PlaybackEngine::new(backend, favorites, &settings.playback, tx);
    info!("{} favorite(s) loaded", engine.favorites().len());

    let paths: Vec<PathBuf> = env::args_os().skip(1).map(PathBuf::from).collect();
    if !paths.is_empty() {
        let tracks = tracks_from_paths(&paths, &settings.library);
        if tracks.is_empty() {
            warn!("no playable audio found in the given paths");
        } else {
            engine.load_playlist(tracks, 0);
        }
    }

    let router = CommandRouter::new(handle.clone(), settings.bundled.clone());
    console::spawn(router, handle)?;
    info!("ready; type `help` for commands");

    event_loop::run(&mut engine, &rx);
    Ok(())
}

fn favorites_store(settings: &crate::config::Settings) -> Box<dyn FavoritesStore + Send> {
    match settings.favorites_path() {
        Some(path) => {
            let store = TomlFavoritesStore::new(path);
            info!("favorites file: {}", store.path().display());
            Box::new(store)
        }
        None => {
            warn!("no favorites location could be resolved; favorites will not be saved");
            Box::new(MemoryFavoritesStore::default())
        }
    }
}
