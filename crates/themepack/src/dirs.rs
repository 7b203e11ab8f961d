use std::path::PathBuf;

use etcetera::{BaseStrategy, choose_base_strategy};

use crate::config::CONFIG_FILE_NAME;

/// Per-user configuration directory, e.g. `~/.config/themepack`
pub fn user_config_dir() -> Option<PathBuf> {
    choose_base_strategy()
        .ok()
        .map(|strategy| strategy.config_dir().join("themepack"))
}

/// Per-user configuration file, whether or not it exists
pub fn user_config_file() -> Option<PathBuf> {
    user_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}
