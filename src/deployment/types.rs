//! Desired-state descriptions and per-step outcomes for the deployment flow.

use crate::config::Settings;
use crate::teamcity_client::{NewVcsRoot, ProjectFeature, ProjectLocator, Properties};

pub const VERSIONED_SETTINGS_TYPE: &str = "versionedSettings";
pub const GIT_VCS_NAME: &str = "jetbrains.git";
pub const PRIVATE_KEY_DEFAULT: &str = "PRIVATE_KEY_DEFAULT";

/// Desired VCS root. Existence is checked by display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcsRootSpec {
    pub id: String,
    pub name: String,
    pub project_id: String,
    pub url: String,
    pub branch: String,
    pub auth_method: String,
    pub ignore_known_hosts: bool,
}

impl VcsRootSpec {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            id: settings.vcs_root_id.clone(),
            name: settings.vcs_root_name.clone(),
            project_id: settings.root_project_id.clone(),
            url: settings.repo_url.clone(),
            branch: settings.branch.clone(),
            auth_method: PRIVATE_KEY_DEFAULT.to_string(),
            ignore_known_hosts: true,
        }
    }

    pub fn to_request(&self) -> NewVcsRoot {
        NewVcsRoot {
            id: self.id.clone(),
            name: self.name.clone(),
            vcs_name: GIT_VCS_NAME.to_string(),
            project: ProjectLocator {
                id: self.project_id.clone(),
            },
            properties: Properties::from_pairs([
                ("branch", self.branch.clone()),
                ("url", self.url.clone()),
                ("authMethod", self.auth_method.clone()),
                ("ignoreKnownHosts", self.ignore_known_hosts.to_string()),
            ]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildSettingsMode {
    PreferVcs,
    PreferUi,
}

impl BuildSettingsMode {
    pub fn as_str(self) -> &'static str {
        match self {
            BuildSettingsMode::PreferVcs => "PREFER_VCS",
            BuildSettingsMode::PreferUi => "PREFER_CURRENT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialsStorage {
    CredentialsJson,
    ScrambledInVcs,
}

impl CredentialsStorage {
    pub fn as_str(self) -> &'static str {
        match self {
            CredentialsStorage::CredentialsJson => "credentialsJSON",
            CredentialsStorage::ScrambledInVcs => "scrambledInVcs",
        }
    }
}

/// Desired versioned-settings feature on the root project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedSettingsSpec {
    pub project_id: String,
    pub enabled: bool,
    pub root_id: String,
    pub build_settings: BuildSettingsMode,
    pub import_settings: bool,
    pub credentials_storage: CredentialsStorage,
    pub show_changes: bool,
}

impl VersionedSettingsSpec {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            project_id: settings.root_project_id.clone(),
            enabled: true,
            root_id: settings.vcs_root_id.clone(),
            build_settings: BuildSettingsMode::PreferVcs,
            import_settings: true,
            credentials_storage: CredentialsStorage::CredentialsJson,
            show_changes: true,
        }
    }

    pub fn to_feature(&self) -> ProjectFeature {
        ProjectFeature {
            id: None,
            feature_type: VERSIONED_SETTINGS_TYPE.to_string(),
            properties: Properties::from_pairs([
                ("credentialsStorageType", self.credentials_storage.as_str().to_string()),
                ("enabled", self.enabled.to_string()),
                ("rootId", self.root_id.clone()),
                ("showChanges", self.show_changes.to_string()),
                ("buildSettings", self.build_settings.as_str().to_string()),
                ("importSettings", self.import_settings.to_string()),
            ]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsRootOutcome {
    Created { id: String },
    AlreadyExists { id: String, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsOutcome {
    Created {
        feature_id: Option<String>,
    },
    AlreadyConfigured {
        feature_id: Option<String>,
    },
    /// Existing feature references another root; left untouched.
    PointsElsewhere {
        feature_id: Option<String>,
        current_root_id: Option<String>,
    },
    Repointed {
        feature_id: String,
        previous_root_id: Option<String>,
    },
}

impl SettingsOutcome {
    pub fn needs_attention(&self) -> bool {
        matches!(self, SettingsOutcome::PointsElsewhere { .. })
    }
}
