//! Persistent favorite-track identifiers.
//!
//! `FavoritesStore` is the persistence seam (load everything, replace
//! everything). `Favorites` keeps the loaded set in memory and writes the
//! whole set back whenever it actually changes.

mod store;

use std::collections::BTreeSet;

use log::{debug, warn};

pub use store::{FavoritesError, FavoritesStore, MemoryFavoritesStore, TomlFavoritesStore};

pub struct Favorites {
    ids: BTreeSet<String>,
    store: Box<dyn FavoritesStore + Send>,
}

impl Favorites {
    /// Load the current set from `store`. A store that fails to load starts empty.
    pub fn load(store: Box<dyn FavoritesStore + Send>) -> Self {
        let ids = match store.load() {
            Ok(ids) => ids,
            Err(e) => {
                warn!("failed to load favorites, starting empty: {e}");
                BTreeSet::new()
            }
        };
        debug!("loaded {} favorite(s)", ids.len());
        Self { ids, store }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns `true` when `id` was newly added.
    pub fn add(&mut self, id: &str) -> bool {
        if !self.ids.insert(id.to_string()) {
            return false;
        }
        self.persist();
        true
    }

    /// Returns `true` when `id` was present.
    pub fn remove(&mut self, id: &str) -> bool {
        if !self.ids.remove(id) {
            return false;
        }
        self.persist();
        true
    }

    pub fn list_all(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.replace_all(&self.ids) {
            warn!("failed to persist favorites: {e}");
        }
    }
}
