//! Default paths for parkbot
//!
//! The config file lives in the user's config directory:
//! - `$PARKBOT_CONFIG` if set
//! - `$XDG_CONFIG_HOME/parkbot/config.toml`
//! - `~/.config/parkbot/config.toml`

use std::path::PathBuf;

/// Environment variable for overriding the config file path
pub const PARKBOT_CONFIG_ENV: &str = "PARKBOT_CONFIG";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Application subdirectory name
const APP_DIR: &str = "parkbot";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$PARKBOT_CONFIG` environment variable (if set)
/// 2. `$XDG_CONFIG_HOME/parkbot/config.toml` (if XDG_CONFIG_HOME is set)
/// 3. `~/.config/parkbot/config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(PARKBOT_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    config_path_without_env()
}

/// Get the config path without checking the PARKBOT_CONFIG env var.
pub fn config_path_without_env() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR).join(CONFIG_FILENAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_contains_parkbot() {
        let path = config_path_without_env();
        assert!(path.to_string_lossy().contains("parkbot"));
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }
}
