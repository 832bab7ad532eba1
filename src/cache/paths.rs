// Cache path utilities.
// Resolves the platform directories holding the store file and the config file.

use std::path::PathBuf;

use directories::ProjectDirs;

const APP_NAME: &str = "ghlens";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", APP_NAME)
}

/// Get the base cache directory (~/.cache/ghlens on Linux).
pub fn cache_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Get the configuration directory (~/.config/ghlens on Linux).
pub fn config_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
}

/// Path to the persistent key-value store file.
pub fn store_path() -> Option<PathBuf> {
    cache_dir().map(|dir| dir.join("store.json"))
}

/// Path to the optional TOML configuration file.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}
