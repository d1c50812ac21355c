//! Human-readable console rendering of deployment and diagnostic results.

use std::fmt;

use crate::config::Settings;
use crate::deployment::{
    DeployReport, FatalStage, Outcome, SettingsOutcome, TriggerOutcome, VcsRootOutcome,
};
use crate::diagnose::Diagnostics;
use crate::types::DeployError;

const OK: &str = "[ok]";
const WARN: &str = "[warn]";
const FAIL: &str = "[fail]";

/// Configuration banner shown before the run.
pub struct ConfigBanner<'a>(pub &'a Settings);

impl fmt::Display for ConfigBanner<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let settings = self.0;
        writeln!(f, "Configuration:")?;
        writeln!(f, "  TeamCity URL: {}", settings.server_url)?;
        writeln!(f, "  Repository:   {}", settings.repo_url)?;
        writeln!(f, "  Token:        {}", settings.token_preview())
    }
}

/// A configuration error that stopped the run before any remote call.
pub struct ConfigFailure<'a>(pub &'a DeployError);

impl fmt::Display for ConfigFailure<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{FAIL} Configuration error: {}", self.0)?;
        token_hint(f, self.0)
    }
}

fn token_hint(f: &mut fmt::Formatter<'_>, error: &DeployError) -> fmt::Result {
    if matches!(error, DeployError::MissingToken) {
        writeln!(f, "  Set your TeamCity admin token:")?;
        writeln!(f, "    export TEAMCITY_ADMIN_TOKEN=your_actual_token")?;
    }
    Ok(())
}

pub struct DeploySummary<'a> {
    pub report: &'a DeployReport,
    pub server_url: &'a str,
}

impl fmt::Display for DeploySummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;

        if let Some(fatal) = &report.fatal {
            let label = match fatal.stage {
                FatalStage::Configuration => "Configuration error",
                FatalStage::Connectivity => "TeamCity connection failed",
                FatalStage::VcsRoot => "Failed to create VCS root",
            };
            writeln!(f, "{FAIL} {label}: {}", fatal.error)?;
            token_hint(f, &fatal.error)?;
        }

        if let Some(server) = &report.server {
            write!(
                f,
                "{OK} Connected (server version: {}",
                server.version.as_deref().unwrap_or("Unknown")
            )?;
            match &server.build_number {
                Some(build) => writeln!(f, ", build {build})")?,
                None => writeln!(f, ")")?,
            }
        }

        if let Some(projects) = &report.initial_projects {
            match projects {
                Ok(projects) => {
                    writeln!(f, "Projects before deployment:")?;
                    for project in projects {
                        writeln!(f, "  - {} (ID: {})", project.name, project.id)?;
                    }
                }
                Err(err) => writeln!(f, "{WARN} Failed to list projects: {err}")?,
            }
        }

        if let Some(vcs_root) = &report.vcs_root {
            match vcs_root {
                VcsRootOutcome::Created { id } => writeln!(f, "{OK} VCS root created ({id})")?,
                VcsRootOutcome::AlreadyExists { id, .. } => {
                    writeln!(f, "{OK} VCS root already exists ({id}), skipped creation")?
                }
            }
        }

        if let Some(settings) = &report.versioned_settings {
            match settings {
                Ok(SettingsOutcome::Created { .. }) => {
                    writeln!(f, "{OK} Versioned settings configured")?
                }
                Ok(SettingsOutcome::AlreadyConfigured { .. }) => {
                    writeln!(f, "{OK} Versioned settings already point at the VCS root")?
                }
                Ok(SettingsOutcome::PointsElsewhere {
                    current_root_id, ..
                }) => {
                    writeln!(
                        f,
                        "{WARN} Versioned settings currently point at: {}",
                        current_root_id.as_deref().unwrap_or("unknown")
                    )?;
                    writeln!(f, "  Manual configuration may be needed in the TeamCity UI")?;
                }
                Ok(SettingsOutcome::Repointed {
                    previous_root_id, ..
                }) => writeln!(
                    f,
                    "{OK} Versioned settings repointed (was: {})",
                    previous_root_id.as_deref().unwrap_or("unknown")
                )?,
                Err(err) => {
                    writeln!(f, "{WARN} Versioned settings configuration had issues: {err}")?
                }
            }
        }

        if let Some(trigger) = &report.trigger {
            match trigger {
                TriggerOutcome::Triggered { action, .. } => {
                    writeln!(f, "{OK} Sync triggered via {action}")?
                }
                TriggerOutcome::AllFailed { attempts } => {
                    writeln!(f, "{WARN} No sync action accepted:")?;
                    for attempt in attempts {
                        let status = attempt
                            .status
                            .map(|s| format!("HTTP {s}"))
                            .unwrap_or_else(|| "no response".to_string());
                        writeln!(f, "  - {} ({status}): {}", attempt.action, attempt.detail)?;
                    }
                }
            }
        }

        if let Some(convergence) = &report.convergence {
            if convergence.converged() {
                writeln!(
                    f,
                    "{OK} Synchronization confirmed after {} poll(s), {}s",
                    convergence.polls,
                    convergence.elapsed.as_secs()
                )?;
            } else {
                writeln!(
                    f,
                    "{FAIL} Synchronization did not complete within timeout ({} poll(s))",
                    convergence.polls
                )?;
                if let Some(err) = &convergence.last_error {
                    writeln!(f, "  Last error: {err}")?;
                }
            }
        }

        if let Some(validation) = &report.validation {
            writeln!(f, "Validation:")?;
            for check in &validation.checks {
                let mark = if check.present { OK } else { FAIL };
                let state = if check.present { "found" } else { "missing" };
                writeln!(f, "  {mark} {} {state}", check.name)?;
            }
        }

        writeln!(f)?;
        match report.outcome() {
            Outcome::Success => {
                writeln!(f, "Deployment completed successfully")?;
                writeln!(f, "  Check your TeamCity instance: {}", self.server_url)?;
            }
            Outcome::Partial => {
                writeln!(f, "Deployment completed with issues")?;
                writeln!(f, "  Please check TeamCity manually: {}", self.server_url)?;
                writeln!(f, "  - Administration -> Versioned Settings")?;
                writeln!(f, "  - Look for any error messages")?;
            }
            Outcome::Failure => writeln!(f, "Deployment failed")?,
        }
        if let Some(duration) = report.duration() {
            writeln!(
                f,
                "  Started {}, took {}s",
                report.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
                duration.num_seconds()
            )?;
        }
        Ok(())
    }
}

pub struct DiagnosticsSummary<'a>(pub &'a Diagnostics);

impl fmt::Display for DiagnosticsSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let diag = self.0;

        writeln!(f, "VCS Roots:")?;
        match &diag.vcs_roots {
            Ok(roots) => {
                for summary in roots {
                    writeln!(f, "  - {} (ID: {})", summary.root.name, summary.root.id)?;
                    if let Some(err) = &summary.detail_error {
                        writeln!(f, "    {WARN} {err}")?;
                        continue;
                    }
                    writeln!(f, "    URL: {}", or_unknown(&summary.url))?;
                    writeln!(f, "    Branch: {}", or_unknown(&summary.branch))?;
                    writeln!(f, "    Auth Method: {}", or_unknown(&summary.auth_method))?;
                }
            }
            Err(err) => writeln!(f, "  {FAIL} {err}")?,
        }
        writeln!(f)?;

        writeln!(f, "Project Features ({}):", diag.project_id)?;
        match &diag.features {
            Ok(features) => {
                for feature in features {
                    writeln!(
                        f,
                        "  - {} (ID: {})",
                        feature.feature_type,
                        feature.id.as_deref().unwrap_or("?")
                    )?;
                    for property in &feature.properties.property {
                        writeln!(f, "    {}: {}", property.name, property.value)?;
                    }
                }
            }
            Err(err) => writeln!(f, "  {FAIL} {err}")?,
        }
        writeln!(f)?;

        writeln!(f, "Projects:")?;
        match &diag.projects {
            Ok(projects) => {
                for project in projects {
                    writeln!(f, "  - {} (ID: {})", project.name, project.id)?;
                }
            }
            Err(err) => writeln!(f, "  {FAIL} {err}")?,
        }
        writeln!(f)?;

        writeln!(f, "Build Configurations:")?;
        match &diag.build_types {
            Ok(build_types) => {
                for bt in build_types {
                    writeln!(
                        f,
                        "  - {} (ID: {}) - Project: {}",
                        bt.name,
                        bt.id,
                        or_unknown(&bt.project_name)
                    )?;
                }
            }
            Err(err) => writeln!(f, "  {FAIL} {err}")?,
        }
        Ok(())
    }
}

fn or_unknown(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("unknown")
}
