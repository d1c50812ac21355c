#![allow(dead_code)]

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use httpmock::MockServer;
use serde_json::{json, Value};

use teamcity_settings_sync::config::{Config, Settings, TOKEN_ENV, URL_ENV};
use teamcity_settings_sync::deployment::Clock;
use teamcity_settings_sync::teamcity_client::TeamCityClient;

pub const TOKEN: &str = "secret";
pub const AUTH_HEADER: &str = "Basic OnNlY3JldA==";
pub const VCS_ROOT_ID: &str = "TeamcityConfigurations_GitHubRepo";
pub const VCS_ROOT_NAME: &str = "TeamCity Configurations GitHub Repository";

pub fn settings_for(server: &MockServer, config: Config) -> Settings {
    let url = server.base_url();
    Settings::resolve(config, move |key| match key {
        TOKEN_ENV => Some(TOKEN.to_string()),
        URL_ENV => Some(url.clone()),
        _ => None,
    })
    .expect("settings resolve")
}

pub fn default_settings(server: &MockServer) -> Settings {
    settings_for(server, Config::default())
}

pub fn client_for(server: &MockServer) -> TeamCityClient {
    TeamCityClient::new(&default_settings(server)).expect("client")
}

pub fn vcs_root_list(names: &[(&str, &str)]) -> Value {
    json!({
        "count": names.len(),
        "vcs-root": names
            .iter()
            .map(|(id, name)| json!({"id": id, "name": name}))
            .collect::<Vec<_>>(),
    })
}

pub fn feature_list(root_id: &str) -> Value {
    json!({
        "count": 1,
        "projectFeature": [{
            "id": "PROJECT_EXT_2",
            "type": "versionedSettings",
            "properties": {"property": [
                {"name": "enabled", "value": "true"},
                {"name": "rootId", "value": root_id}
            ]}
        }]
    })
}

pub fn project_list(projects: &[(&str, &str)]) -> Value {
    json!({
        "count": projects.len(),
        "project": projects
            .iter()
            .map(|(id, name)| json!({"id": id, "name": name}))
            .collect::<Vec<_>>(),
    })
}

/// Clock that advances instantly on sleep.
pub struct InstantClock {
    now: Mutex<Instant>,
}

impl InstantClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }
}

#[async_trait]
impl Clock for InstantClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        *self.now.lock().unwrap() += duration;
    }
}
