mod api_types;
mod client;
mod http;

pub use api_types::{
    BuildTypeRef, NewVcsRoot, ProjectFeature, ProjectLocator, ProjectRef, Properties, Property,
    ServerInfo, VcsRootDetail, VcsRootRef,
};
pub use client::TeamCityClient;
pub use http::{basic_auth_value, ApiResponse, HttpClient, REST_PREFIX};
