use std::collections::HashMap;
use std::path::Path;

use tokio::fs;
use tracing::{debug, info, warn};

use crate::types::DeployError;

use super::{env_file::parse_key_value_file, paths, Config};

impl Config {
    /// Load configuration from an explicit path, or from tc-sync.json in the
    /// working directory. Only the implicit file may be absent.
    pub async fn load(explicit: Option<&Path>) -> Result<Self, DeployError> {
        let config = match explicit {
            Some(path) => Self::try_load(path).await?,
            None => {
                let path = paths::default_config_path();
                if !fs::try_exists(&path).await.unwrap_or(false) {
                    warn!(path = %path.display(), "Config file not found, using defaults");
                    return Ok(Self::default());
                }
                Self::try_load(&path).await?
            }
        };

        info!(
            server = %config.server_url,
            project = %config.root_project_id,
            vcs_root = %config.vcs_root_id,
            "Loaded configuration"
        );
        Ok(config)
    }

    async fn try_load(path: &Path) -> Result<Self, DeployError> {
        let contents = fs::read_to_string(path).await.map_err(|err| {
            DeployError::Config(format!("Failed to read {}: {err}", path.display()))
        })?;

        serde_json::from_str(&contents).map_err(|err| {
            DeployError::Config(format!("Failed to parse {}: {err}", path.display()))
        })
    }
}

/// Read a `.env`-style file; a missing file yields no values.
pub async fn load_env_file(path: &Path) -> Result<HashMap<String, String>, DeployError> {
    match fs::read_to_string(path).await {
        Ok(contents) => {
            let values = parse_key_value_file(&contents);
            debug!(path = %path.display(), count = values.len(), "Loaded env file");
            Ok(values)
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
        Err(err) => Err(DeployError::Io(err)),
    }
}

/// Lookup that prefers values from the env file over the process environment.
pub fn overlay_lookup(file_values: HashMap<String, String>) -> impl Fn(&str) -> Option<String> {
    move |key| {
        file_values
            .get(key)
            .cloned()
            .or_else(|| std::env::var(key).ok())
    }
}
