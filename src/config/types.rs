use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::DeployError;

pub const TOKEN_ENV: &str = "TEAMCITY_ADMIN_TOKEN";
pub const URL_ENV: &str = "TEAMCITY_URL";
pub const REPO_URL_ENV: &str = "TEAMCITY_REPO_URL";

/// File-level configuration for the settings deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_server_url")]
    pub server_url: String,

    #[serde(default = "default_repo_url")]
    pub repo_url: String,

    #[serde(default = "default_root_project_id")]
    pub root_project_id: String,

    #[serde(default = "default_vcs_root_id")]
    pub vcs_root_id: String,

    #[serde(default = "default_vcs_root_name")]
    pub vcs_root_name: String,

    #[serde(default = "default_branch")]
    pub branch: String,

    #[serde(default = "default_marker_project_id")]
    pub marker_project_id: String,

    #[serde(default = "default_expected_projects")]
    pub expected_projects: Vec<String>,

    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default)]
    pub repoint_existing: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            repo_url: default_repo_url(),
            root_project_id: default_root_project_id(),
            vcs_root_id: default_vcs_root_id(),
            vcs_root_name: default_vcs_root_name(),
            branch: default_branch(),
            marker_project_id: default_marker_project_id(),
            expected_projects: default_expected_projects(),
            poll_timeout_secs: default_poll_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            repoint_existing: false,
        }
    }
}

fn default_server_url() -> String {
    "https://teamcity.devinfra.ru".to_string()
}

fn default_repo_url() -> String {
    "git@github.com:muratslavich/teamcity-configurations.git".to_string()
}

fn default_root_project_id() -> String {
    "_Root".to_string()
}

fn default_vcs_root_id() -> String {
    "TeamcityConfigurations_GitHubRepo".to_string()
}

fn default_vcs_root_name() -> String {
    "TeamCity Configurations GitHub Repository".to_string()
}

fn default_branch() -> String {
    "refs/heads/main".to_string()
}

fn default_marker_project_id() -> String {
    "TestBusinessProject".to_string()
}

fn default_expected_projects() -> Vec<String> {
    vec!["Test Business Project".to_string()]
}

fn default_poll_timeout_secs() -> u64 {
    120
}

fn default_poll_interval_secs() -> u64 {
    10
}

/// Fully resolved, immutable settings for one run.
#[derive(Clone)]
pub struct Settings {
    pub server_url: String,
    token: String,
    pub repo_url: String,
    pub root_project_id: String,
    pub vcs_root_id: String,
    pub vcs_root_name: String,
    pub branch: String,
    pub marker_project_id: String,
    pub expected_projects: Vec<String>,
    pub poll_timeout: Duration,
    pub poll_interval: Duration,
    pub repoint_existing: bool,
}

impl Settings {
    /// Combine file configuration with an environment lookup.
    /// The token is mandatory; URL overrides are optional.
    pub fn resolve<F>(config: Config, lookup: F) -> Result<Self, DeployError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup(TOKEN_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(DeployError::MissingToken)?;

        let server_url = non_blank(lookup(URL_ENV)).unwrap_or(config.server_url);
        let repo_url = non_blank(lookup(REPO_URL_ENV)).unwrap_or(config.repo_url);

        if config.poll_interval_secs == 0 {
            return Err(DeployError::Config(
                "poll_interval_secs must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            token,
            repo_url,
            root_project_id: config.root_project_id,
            vcs_root_id: config.vcs_root_id,
            vcs_root_name: config.vcs_root_name,
            branch: config.branch,
            marker_project_id: config.marker_project_id,
            expected_projects: config.expected_projects,
            poll_timeout: Duration::from_secs(config.poll_timeout_secs),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            repoint_existing: config.repoint_existing,
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// First eight characters of the token, for display.
    pub fn token_preview(&self) -> String {
        let head: String = self.token.chars().take(8).collect();
        format!("{head}...")
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("server_url", &self.server_url)
            .field("token", &self.token_preview())
            .field("repo_url", &self.repo_url)
            .field("root_project_id", &self.root_project_id)
            .field("vcs_root_id", &self.vcs_root_id)
            .field("marker_project_id", &self.marker_project_id)
            .field("poll_timeout", &self.poll_timeout)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_token_is_rejected() {
        let err = Settings::resolve(Config::default(), lookup_from(&[])).unwrap_err();
        assert!(matches!(err, DeployError::MissingToken));
    }

    #[test]
    fn blank_token_is_rejected() {
        let err =
            Settings::resolve(Config::default(), lookup_from(&[(TOKEN_ENV, "   ")])).unwrap_err();
        assert!(matches!(err, DeployError::MissingToken));
    }

    #[test]
    fn env_overrides_server_url_and_strips_trailing_slash() {
        let settings = Settings::resolve(
            Config::default(),
            lookup_from(&[(TOKEN_ENV, "abcdefghijkl"), (URL_ENV, "http://localhost:8111/")]),
        )
        .unwrap();
        assert_eq!(settings.server_url, "http://localhost:8111");
        assert_eq!(settings.token(), "abcdefghijkl");
        assert_eq!(settings.token_preview(), "abcdefgh...");
    }

    #[test]
    fn debug_output_never_contains_full_token() {
        let settings = Settings::resolve(
            Config::default(),
            lookup_from(&[(TOKEN_ENV, "abcdefgh-very-secret")]),
        )
        .unwrap();
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("very-secret"));
    }

    #[test]
    fn zero_interval_is_a_config_error() {
        let config = Config {
            poll_interval_secs: 0,
            ..Config::default()
        };
        let err = Settings::resolve(config, lookup_from(&[(TOKEN_ENV, "t")])).unwrap_err();
        assert!(matches!(err, DeployError::Config(_)));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: Config = serde_json::from_str(r#"{"poll_timeout_secs": 30}"#).unwrap();
        assert_eq!(config.poll_timeout_secs, 30);
        assert_eq!(config.poll_interval_secs, 10);
        assert_eq!(config.root_project_id, "_Root");
    }
}
