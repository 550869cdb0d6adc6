use directories::ProjectDirs;
use std::path::PathBuf;

pub const CONFIG_FILE: &str = "autosieve.json";

pub fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "AutoSieve").map(|d| d.config_dir().to_path_buf())
}

pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join(CONFIG_FILE))
}
