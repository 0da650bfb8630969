//! Default paths for thermod components
//!
//! - Config: `/etc/thermod/thermod.toml`
//! - Tuning files: `/etc/thermod/temp_<object>`
//! - Socket: `$THERMOD_SOCKET`, else `/run/thermod/thermod.sock`

use std::path::{Path, PathBuf};

/// Environment variable for overriding the socket path
pub const THERMOD_SOCKET_ENV: &str = "THERMOD_SOCKET";

/// Environment variable for overriding the config path
pub const THERMOD_CONFIG_ENV: &str = "THERMOD_CONFIG";

/// Directory holding the daemon configuration and tuning files
pub const DEFAULT_CONFIG_DIR: &str = "/etc/thermod";

/// Prefix of per-object tuning file names
pub const TUNING_FILE_PREFIX: &str = "temp_";

const CONFIG_FILENAME: &str = "thermod.toml";
const SOCKET_PATH: &str = "/run/thermod/thermod.sock";

/// Default configuration file path, honouring `$THERMOD_CONFIG`
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(THERMOD_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    PathBuf::from(DEFAULT_CONFIG_DIR).join(CONFIG_FILENAME)
}

/// Default socket path, honouring `$THERMOD_SOCKET`
pub fn default_socket_path() -> PathBuf {
    if let Ok(path) = std::env::var(THERMOD_SOCKET_ENV) {
        return PathBuf::from(path);
    }

    PathBuf::from(SOCKET_PATH)
}

/// Default directory searched for tuning files
pub fn default_tuning_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_DIR)
}

/// Path of the tuning file for the named thermal object
pub fn tuning_file_path(dir: &Path, object_name: &str) -> PathBuf {
    dir.join(format!("{}{}", TUNING_FILE_PREFIX, object_name))
}
