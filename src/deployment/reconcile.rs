use tracing::{info, warn};

use crate::teamcity_client::{ProjectFeature, TeamCityClient};
use crate::types::DeployError;

use super::types::{
    SettingsOutcome, VcsRootOutcome, VcsRootSpec, VersionedSettingsSpec, VERSIONED_SETTINGS_TYPE,
};

/// Create-if-missing for the VCS root and the versioned-settings feature.
///
/// Existing resources are never modified unless repointing is requested
/// explicitly through [`Reconciler::update_versioned_settings`].
pub struct Reconciler<'a> {
    client: &'a TeamCityClient,
}

impl<'a> Reconciler<'a> {
    pub fn new(client: &'a TeamCityClient) -> Self {
        Self { client }
    }

    pub async fn ensure_vcs_root(&self, spec: &VcsRootSpec) -> Result<VcsRootOutcome, DeployError> {
        let existing = self.client.list_vcs_roots().await?;
        if let Some(root) = existing.into_iter().find(|r| r.name == spec.name) {
            info!(id = %root.id, name = %root.name, "VCS root already exists, skipping creation");
            return Ok(VcsRootOutcome::AlreadyExists {
                id: root.id,
                name: root.name,
            });
        }

        self.client.create_vcs_root(&spec.to_request()).await?;
        info!(id = %spec.id, url = %spec.url, "VCS root created");
        Ok(VcsRootOutcome::Created {
            id: spec.id.clone(),
        })
    }

    pub async fn ensure_versioned_settings(
        &self,
        spec: &VersionedSettingsSpec,
    ) -> Result<SettingsOutcome, DeployError> {
        if let Some(feature) = self.find_versioned_settings(&spec.project_id).await? {
            let current_root = feature.properties.get("rootId").map(str::to_string);
            if current_root.as_deref() == Some(spec.root_id.as_str()) {
                info!(
                    feature = ?feature.id,
                    root = %spec.root_id,
                    "Versioned settings already point at the VCS root"
                );
                return Ok(SettingsOutcome::AlreadyConfigured {
                    feature_id: feature.id,
                });
            }
            warn!(
                feature = ?feature.id,
                current = ?current_root,
                expected = %spec.root_id,
                "Versioned settings point at a different VCS root, manual setup may be needed"
            );
            return Ok(SettingsOutcome::PointsElsewhere {
                feature_id: feature.id,
                current_root_id: current_root,
            });
        }

        let created = self
            .client
            .create_project_feature(&spec.project_id, &spec.to_feature())
            .await?;
        let feature_id = created.and_then(|f| f.id);
        info!(feature = ?feature_id, "Versioned settings configured");
        Ok(SettingsOutcome::Created { feature_id })
    }

    /// Rewrite an existing feature so it references `spec.root_id`.
    pub async fn update_versioned_settings(
        &self,
        feature_id: &str,
        previous_root_id: Option<String>,
        spec: &VersionedSettingsSpec,
    ) -> Result<SettingsOutcome, DeployError> {
        let mut feature = spec.to_feature();
        feature.id = Some(feature_id.to_string());
        self.client
            .update_project_feature(&spec.project_id, feature_id, &feature)
            .await?;
        info!(feature = %feature_id, root = %spec.root_id, "Versioned settings repointed");
        Ok(SettingsOutcome::Repointed {
            feature_id: feature_id.to_string(),
            previous_root_id,
        })
    }

    /// Locate the versioned-settings feature, fetching its detail when the
    /// listing omits properties.
    pub async fn find_versioned_settings(
        &self,
        project_id: &str,
    ) -> Result<Option<ProjectFeature>, DeployError> {
        let features = self.client.project_features(project_id).await?;
        let Some(feature) = features
            .into_iter()
            .find(|f| f.feature_type == VERSIONED_SETTINGS_TYPE)
        else {
            info!(project = %project_id, "No versioned settings feature found");
            return Ok(None);
        };

        if !feature.properties.is_empty() {
            return Ok(Some(feature));
        }
        let Some(id) = feature.id.as_deref() else {
            return Ok(Some(feature));
        };
        let detail = self.client.project_feature(project_id, id).await;
        match detail {
            Ok(detail) => Ok(Some(detail)),
            Err(err) => {
                warn!(feature = %id, error = ?err, "Failed to fetch feature detail, using summary");
                Ok(Some(feature))
            }
        }
    }
}
