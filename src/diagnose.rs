//! Read-only snapshot of the server's versioned-settings related state.

use tracing::warn;

use crate::deployment::types::VERSIONED_SETTINGS_TYPE;
use crate::teamcity_client::{BuildTypeRef, ProjectFeature, ProjectRef, TeamCityClient, VcsRootRef};
use crate::types::DeployError;

#[derive(Debug)]
pub struct VcsRootSummary {
    pub root: VcsRootRef,
    pub url: Option<String>,
    pub branch: Option<String>,
    pub auth_method: Option<String>,
    pub detail_error: Option<String>,
}

#[derive(Debug)]
pub struct Diagnostics {
    pub project_id: String,
    pub vcs_roots: Result<Vec<VcsRootSummary>, DeployError>,
    pub features: Result<Vec<ProjectFeature>, DeployError>,
    pub projects: Result<Vec<ProjectRef>, DeployError>,
    pub build_types: Result<Vec<BuildTypeRef>, DeployError>,
}

/// Each section is collected independently; one failing does not hide the rest.
pub async fn collect(client: &TeamCityClient, project_id: &str) -> Diagnostics {
    Diagnostics {
        project_id: project_id.to_string(),
        vcs_roots: collect_vcs_roots(client).await,
        features: collect_features(client, project_id).await,
        projects: client.list_projects().await,
        build_types: client.list_build_types().await,
    }
}

async fn collect_vcs_roots(client: &TeamCityClient) -> Result<Vec<VcsRootSummary>, DeployError> {
    let roots = client.list_vcs_roots().await?;
    let mut summaries = Vec::with_capacity(roots.len());
    for root in roots {
        let detail = client.vcs_root_detail(&root.id).await;
        let summary = match detail {
            Ok(detail) => VcsRootSummary {
                url: detail.properties.get("url").map(str::to_string),
                branch: detail.properties.get("branch").map(str::to_string),
                auth_method: detail.properties.get("authMethod").map(str::to_string),
                detail_error: None,
                root,
            },
            Err(err) => {
                warn!(root = %root.id, error = ?err, "Failed to fetch VCS root detail");
                VcsRootSummary {
                    root,
                    url: None,
                    branch: None,
                    auth_method: None,
                    detail_error: Some(err.to_string()),
                }
            }
        };
        summaries.push(summary);
    }
    Ok(summaries)
}

async fn collect_features(
    client: &TeamCityClient,
    project_id: &str,
) -> Result<Vec<ProjectFeature>, DeployError> {
    let mut features = client.project_features(project_id).await?;
    for feature in features.iter_mut() {
        if feature.feature_type != VERSIONED_SETTINGS_TYPE || !feature.properties.is_empty() {
            continue;
        }
        let Some(id) = feature.id.clone() else {
            continue;
        };
        match client.project_feature(project_id, &id).await {
            Ok(detail) => *feature = detail,
            Err(err) => warn!(feature = %id, error = ?err, "Failed to fetch feature detail"),
        }
    }
    Ok(features)
}
