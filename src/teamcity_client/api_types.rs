use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ServerInfo {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, rename = "buildNumber")]
    pub build_number: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ProjectList {
    #[serde(default)]
    pub project: Vec<ProjectRef>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ProjectRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct VcsRootList {
    #[serde(default, rename = "vcs-root")]
    pub vcs_root: Vec<VcsRootRef>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VcsRootRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VcsRootDetail {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub properties: Properties,
}

/// Body for `POST vcs-roots`.
#[derive(Debug, Serialize)]
pub struct NewVcsRoot {
    pub id: String,
    pub name: String,
    #[serde(rename = "vcsName")]
    pub vcs_name: String,
    pub project: ProjectLocator,
    pub properties: Properties,
}

#[derive(Debug, Serialize)]
pub struct ProjectLocator {
    pub id: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct ProjectFeatureList {
    #[serde(default, rename = "projectFeature")]
    pub project_feature: Vec<ProjectFeature>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProjectFeature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub feature_type: String,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Debug, Deserialize, Default)]
pub struct BuildTypeList {
    #[serde(default, rename = "buildType")]
    pub build_type: Vec<BuildTypeRef>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BuildTypeRef {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "projectName")]
    pub project_name: Option<String>,
}

/// TeamCity's `{"property": [{"name", "value"}]}` bag.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    #[serde(default)]
    pub property: Vec<Property>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl Properties {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            property: pairs
                .into_iter()
                .map(|(name, value)| Property {
                    name: name.into(),
                    value: value.into(),
                })
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.property
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.property.is_empty()
    }
}
