use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::warn;

use crate::config::Settings;
use crate::types::DeployError;

use super::api_types::{
    BuildTypeList, BuildTypeRef, NewVcsRoot, ProjectFeature, ProjectFeatureList, ProjectList,
    ProjectRef, ServerInfo, VcsRootDetail, VcsRootList, VcsRootRef,
};
use super::http::{ApiResponse, HttpClient};

/// Typed access to the TeamCity REST resources used by the deployment.
#[derive(Clone)]
pub struct TeamCityClient {
    http: HttpClient,
}

impl TeamCityClient {
    pub fn new(settings: &Settings) -> Result<Self, DeployError> {
        Ok(Self {
            http: HttpClient::new(&settings.server_url, settings.token())?,
        })
    }

    pub async fn server_info(&self) -> Result<ServerInfo, DeployError> {
        self.get_json("server", "Connection check").await
    }

    pub async fn list_projects(&self) -> Result<Vec<ProjectRef>, DeployError> {
        let list: ProjectList = self.get_json("projects", "List projects").await?;
        Ok(list.project)
    }

    pub async fn list_vcs_roots(&self) -> Result<Vec<VcsRootRef>, DeployError> {
        let list: VcsRootList = self.get_json("vcs-roots", "List VCS roots").await?;
        Ok(list.vcs_root)
    }

    pub async fn vcs_root_detail(&self, id: &str) -> Result<VcsRootDetail, DeployError> {
        self.get_json(&format!("vcs-roots/id:{id}"), "Fetch VCS root")
            .await
    }

    pub async fn create_vcs_root(&self, root: &NewVcsRoot) -> Result<(), DeployError> {
        self.http
            .post("vcs-roots", root)
            .await?
            .require_success("Create VCS root")?;
        Ok(())
    }

    pub async fn project_features(
        &self,
        project_id: &str,
    ) -> Result<Vec<ProjectFeature>, DeployError> {
        let list: ProjectFeatureList = self
            .get_json(
                &format!("projects/id:{project_id}/projectFeatures"),
                "List project features",
            )
            .await?;
        Ok(list.project_feature)
    }

    pub async fn project_feature(
        &self,
        project_id: &str,
        feature_id: &str,
    ) -> Result<ProjectFeature, DeployError> {
        self.get_json(
            &format!("projects/id:{project_id}/projectFeatures/id:{feature_id}"),
            "Fetch project feature",
        )
        .await
    }

    /// Create a feature; returns the server's view of it when the body parses.
    pub async fn create_project_feature(
        &self,
        project_id: &str,
        feature: &ProjectFeature,
    ) -> Result<Option<ProjectFeature>, DeployError> {
        let response = self
            .http
            .post(&format!("projects/id:{project_id}/projectFeatures"), feature)
            .await?
            .require_success("Create versioned settings")?;
        Ok(lenient_json(&response))
    }

    pub async fn update_project_feature(
        &self,
        project_id: &str,
        feature_id: &str,
        feature: &ProjectFeature,
    ) -> Result<(), DeployError> {
        self.http
            .put(
                &format!("projects/id:{project_id}/projectFeatures/id:{feature_id}"),
                feature,
            )
            .await?
            .require_success("Update versioned settings")?;
        Ok(())
    }

    /// POST an empty object to an action endpoint and hand back the raw response.
    pub async fn post_action(&self, endpoint: &str) -> Result<ApiResponse, DeployError> {
        self.http.post(endpoint, &json!({})).await
    }

    pub async fn list_build_types(&self) -> Result<Vec<BuildTypeRef>, DeployError> {
        let list: BuildTypeList = self.get_json("buildTypes", "List build types").await?;
        Ok(list.build_type)
    }

    async fn get_json<T>(&self, endpoint: &str, operation: &str) -> Result<T, DeployError>
    where
        T: DeserializeOwned,
    {
        self.http
            .get(endpoint)
            .await?
            .require_success(operation)?
            .json()
    }
}

fn lenient_json<T>(response: &ApiResponse) -> Option<T>
where
    T: DeserializeOwned,
{
    if response.body.trim().is_empty() {
        return None;
    }
    match response.json() {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                endpoint = %response.endpoint,
                error = ?err,
                "Ignoring unparseable response body"
            );
            None
        }
    }
}
