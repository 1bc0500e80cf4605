use std::{env, path::PathBuf};

use super::schema::{LogSettings, Settings};

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `CADENZA__`), then an
/// optional config file and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("CADENZA")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.playback.tick_interval_ms == 0 {
            return Err("playback.tick_interval_ms must be >= 1".to_string());
        }
        let lookahead = self.playback.local_buffer_lookahead_secs;
        if !lookahead.is_finite() || lookahead < 0.0 {
            return Err(
                "playback.local_buffer_lookahead_secs must be a non-negative number".to_string(),
            );
        }
        if self.log.level_filter().is_none() {
            return Err(format!("log.level {:?} is not a known level", self.log.level));
        }
        Ok(())
    }

    /// Where favorites are persisted: the configured path, or the XDG data default.
    pub fn favorites_path(&self) -> Option<PathBuf> {
        self.favorites
            .store_path
            .clone()
            .or_else(default_favorites_path)
    }
}

impl LogSettings {
    pub fn level_filter(&self) -> Option<log::LevelFilter> {
        self.level.trim().parse().ok()
    }
}

/// Resolve the config path from `CADENZA_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("CADENZA_CONFIG_PATH") {
        let p = PathBuf::from(p);
        return Some(p);
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/cadenza/config.toml`
/// or `~/.config/cadenza/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    };

    config_home.map(|d| d.join("cadenza").join("config.toml"))
}

/// `$XDG_DATA_HOME/cadenza/favorites.toml`, falling back to `~/.local/share`.
pub fn default_favorites_path() -> Option<PathBuf> {
    let data_home = if let Some(xdg) = env::var_os("XDG_DATA_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".local").join("share"))
    };

    data_home.map(|d| d.join("cadenza").join("favorites.toml"))
}
