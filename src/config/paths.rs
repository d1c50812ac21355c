use std::path::PathBuf;
use tracing::{debug, warn};

pub const DEFAULT_CONFIG_FILE: &str = "tc-sync.json";
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Get the path to the default tc-sync.json
/// Looks in the current working directory, falling back to a relative path
pub fn default_config_path() -> PathBuf {
    match std::env::current_dir() {
        Ok(dir) => {
            let config_path = dir.join(DEFAULT_CONFIG_FILE);
            debug!(path = %config_path.display(), "Looking for config");
            config_path
        }
        Err(err) => {
            warn!(error = ?err, "Unable to resolve working directory, using relative config path");
            PathBuf::from(DEFAULT_CONFIG_FILE)
        }
    }
}
