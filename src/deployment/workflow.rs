use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::teamcity_client::{ProjectRef, ServerInfo, TeamCityClient};
use crate::types::DeployError;

use super::poller::{Clock, ConvergencePoller, PollOutcome, PollPolicy, TokioClock};
use super::reconcile::Reconciler;
use super::trigger::{default_actions, SyncTrigger, TriggerOutcome};
use super::types::{SettingsOutcome, VcsRootOutcome, VcsRootSpec, VersionedSettingsSpec};
use super::validator::{validate, ValidationReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalStage {
    Configuration,
    Connectivity,
    VcsRoot,
}

#[derive(Debug)]
pub struct FatalError {
    pub stage: FatalStage,
    pub error: DeployError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Partial,
    Failure,
}

impl Outcome {
    pub fn exit_code(self) -> u8 {
        match self {
            Outcome::Success => 0,
            Outcome::Failure => 1,
            Outcome::Partial => 2,
        }
    }
}

/// Everything one deployment run observed, step by step.
/// A `None` step was never reached.
#[derive(Debug)]
pub struct DeployReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub server: Option<ServerInfo>,
    pub initial_projects: Option<Result<Vec<ProjectRef>, DeployError>>,
    pub vcs_root: Option<VcsRootOutcome>,
    pub versioned_settings: Option<Result<SettingsOutcome, DeployError>>,
    pub trigger: Option<TriggerOutcome>,
    pub convergence: Option<PollOutcome>,
    pub validation: Option<ValidationReport>,
    pub fatal: Option<FatalError>,
}

impl DeployReport {
    fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            server: None,
            initial_projects: None,
            vcs_root: None,
            versioned_settings: None,
            trigger: None,
            convergence: None,
            validation: None,
            fatal: None,
        }
    }

    /// Report for a run that stopped before any remote call.
    pub fn configuration_failure(error: DeployError) -> Self {
        let mut report = Self::new();
        report.fatal = Some(FatalError {
            stage: FatalStage::Configuration,
            error,
        });
        report.finish()
    }

    fn fail(mut self, stage: FatalStage, error: DeployError) -> Self {
        error!(stage = ?stage, error = %error, "Deployment aborted");
        self.fatal = Some(FatalError { stage, error });
        self.finish()
    }

    fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    pub fn outcome(&self) -> Outcome {
        if self.fatal.is_some() {
            return Outcome::Failure;
        }
        let converged = self.convergence.as_ref().is_some_and(PollOutcome::converged);
        let validated = self.validation.as_ref().is_some_and(ValidationReport::passed);
        let settings_ok = matches!(self.versioned_settings, Some(Ok(_)));
        if converged && validated && settings_ok {
            Outcome::Success
        } else {
            Outcome::Partial
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.outcome().exit_code()
    }

    /// Wall-clock length of the run, once it has finished.
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|finished| finished - self.started_at)
    }
}

/// Runs the gated flow: probe, reconcile, trigger, poll, validate.
pub struct Deployer {
    client: TeamCityClient,
    settings: Settings,
    clock: Box<dyn Clock>,
}

impl Deployer {
    pub fn new(settings: Settings) -> Result<Self, DeployError> {
        let client = TeamCityClient::new(&settings)?;
        Ok(Self::with_parts(client, settings, Box::new(TokioClock)))
    }

    pub fn with_parts(client: TeamCityClient, settings: Settings, clock: Box<dyn Clock>) -> Self {
        Self {
            client,
            settings,
            clock,
        }
    }

    pub async fn run(&self) -> DeployReport {
        let mut report = DeployReport::new();

        match self.client.server_info().await {
            Ok(info) => {
                info!(
                    version = ?info.version,
                    build = ?info.build_number,
                    "TeamCity connection successful"
                );
                report.server = Some(info);
            }
            Err(err) => return report.fail(FatalStage::Connectivity, err),
        }

        let initial = self.client.list_projects().await;
        if let Err(err) = &initial {
            warn!(error = ?err, "Failed to list projects");
        }
        report.initial_projects = Some(initial);

        let reconciler = Reconciler::new(&self.client);
        match reconciler
            .ensure_vcs_root(&VcsRootSpec::from_settings(&self.settings))
            .await
        {
            Ok(outcome) => report.vcs_root = Some(outcome),
            Err(err) => return report.fail(FatalStage::VcsRoot, err),
        }

        let spec = VersionedSettingsSpec::from_settings(&self.settings);
        let settings_result = match reconciler.ensure_versioned_settings(&spec).await {
            Ok(SettingsOutcome::PointsElsewhere {
                feature_id: Some(feature_id),
                current_root_id,
            }) if self.settings.repoint_existing => {
                reconciler
                    .update_versioned_settings(&feature_id, current_root_id, &spec)
                    .await
            }
            other => other,
        };
        if let Err(err) = &settings_result {
            warn!(error = %err, "Versioned settings configuration had issues, continuing");
        }
        report.versioned_settings = Some(settings_result);

        let actions = default_actions(&self.settings.root_project_id);
        let trigger = SyncTrigger::new(&self.client, actions).trigger().await;
        if !trigger.succeeded() {
            warn!("No sync action was accepted, relying on convergence check");
        }
        report.trigger = Some(trigger);

        let policy = PollPolicy {
            timeout: self.settings.poll_timeout,
            interval: self.settings.poll_interval,
        };
        let convergence = ConvergencePoller::new(
            &self.client,
            self.clock.as_ref(),
            policy,
            &self.settings.marker_project_id,
        )
        .run()
        .await;

        if convergence.converged() {
            report.validation = Some(validate(
                &convergence.inventory,
                &self.settings.expected_projects,
            ));
        }
        report.convergence = Some(convergence);

        report.finish()
    }
}
