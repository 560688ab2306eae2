//! Configuration paths
//!
//! Uses the directories crate for platform-appropriate locations:
//! - Linux: `~/.config/posts-e2e/`
//! - macOS: `~/Library/Application Support/posts-e2e/`
//! - Windows: `%APPDATA%\posts-e2e\`

use std::path::PathBuf;

const APP_NAME: &str = "posts-e2e";

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_ends_with_file_name() {
        if let Some(path) = config_path() {
            assert!(path.ends_with("config.toml"));
            assert!(path.to_string_lossy().contains(APP_NAME));
        }
    }
}
