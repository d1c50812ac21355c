use std::future::Future;

use tracing::{info, warn};

use crate::teamcity_client::{ApiResponse, TeamCityClient};
use crate::types::DeployError;

/// A server-side action that asks TeamCity to pull settings from VCS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncAction {
    pub name: String,
    pub endpoint: String,
}

impl SyncAction {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
        }
    }
}

/// Candidate actions in preference order. Server versions differ in which
/// of these exist.
pub fn default_actions(project_id: &str) -> Vec<SyncAction> {
    vec![
        SyncAction::new(
            "commitCurrentSettings",
            format!("projects/id:{project_id}/versionedSettings/commitCurrentSettings"),
        ),
        SyncAction::new(
            "reloadSettingsFromVcs",
            format!("projects/id:{project_id}/versionedSettings/reloadSettingsFromVcs"),
        ),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionAttempt {
    pub action: String,
    pub status: Option<u16>,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    Triggered {
        action: String,
        attempts: Vec<ActionAttempt>,
    },
    AllFailed {
        attempts: Vec<ActionAttempt>,
    },
}

impl TriggerOutcome {
    pub fn attempts(&self) -> &[ActionAttempt] {
        match self {
            TriggerOutcome::Triggered { attempts, .. } | TriggerOutcome::AllFailed { attempts } => {
                attempts
            }
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self, TriggerOutcome::Triggered { .. })
    }
}

/// Run `actions` in order until one returns 2xx.
/// Later actions are not attempted once one succeeds.
pub async fn first_success<F, Fut>(actions: &[SyncAction], mut run: F) -> TriggerOutcome
where
    F: FnMut(&SyncAction) -> Fut,
    Fut: Future<Output = Result<ApiResponse, DeployError>>,
{
    let mut attempts = Vec::with_capacity(actions.len());
    for action in actions {
        match run(action).await {
            Ok(response) if response.is_success() => {
                info!(action = %action.name, status = response.status.as_u16(), "Sync triggered");
                attempts.push(ActionAttempt {
                    action: action.name.clone(),
                    status: Some(response.status.as_u16()),
                    detail: "ok".to_string(),
                });
                return TriggerOutcome::Triggered {
                    action: action.name.clone(),
                    attempts,
                };
            }
            Ok(response) => {
                warn!(
                    action = %action.name,
                    status = response.status.as_u16(),
                    "Sync action rejected, trying next"
                );
                attempts.push(ActionAttempt {
                    action: action.name.clone(),
                    status: Some(response.status.as_u16()),
                    detail: response.body,
                });
            }
            Err(err) => {
                warn!(action = %action.name, error = ?err, "Sync action failed, trying next");
                attempts.push(ActionAttempt {
                    action: action.name.clone(),
                    status: err.status(),
                    detail: err.to_string(),
                });
            }
        }
    }
    TriggerOutcome::AllFailed { attempts }
}

pub struct SyncTrigger<'a> {
    client: &'a TeamCityClient,
    actions: Vec<SyncAction>,
}

impl<'a> SyncTrigger<'a> {
    pub fn new(client: &'a TeamCityClient, actions: Vec<SyncAction>) -> Self {
        Self { client, actions }
    }

    pub async fn trigger(&self) -> TriggerOutcome {
        let client = self.client;
        first_success(&self.actions, |action| {
            let endpoint = action.endpoint.clone();
            async move { client.post_action(&endpoint).await }
        })
        .await
    }
}
