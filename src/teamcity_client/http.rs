use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::types::DeployError;

/// REST namespace every endpoint is resolved under.
pub const REST_PREFIX: &str = "app/rest";

/// Raw response: status plus the body as text.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub endpoint: String,
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn json<T>(&self) -> Result<T, DeployError>
    where
        T: DeserializeOwned,
    {
        serde_json::from_str(&self.body).map_err(|source| DeployError::Decode {
            endpoint: self.endpoint.clone(),
            source,
        })
    }

    /// Turn a non-2xx response into an `Api` error labelled with `operation`.
    pub fn require_success(self, operation: &str) -> Result<Self, DeployError> {
        if self.is_success() {
            return Ok(self);
        }
        Err(DeployError::Api {
            operation: operation.to_string(),
            status: self.status.as_u16(),
            body: self.body,
        })
    }
}

/// Thin transport over the TeamCity REST namespace.
///
/// Certificate verification is disabled: the target servers run on
/// self-signed or internal certificates.
#[derive(Clone)]
pub struct HttpClient {
    base_url: String,
    http: Client,
}

impl HttpClient {
    pub fn new(server_url: &str, token: &str) -> Result<Self, DeployError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&basic_auth_value(token))
            .map_err(|err| DeployError::Config(format!("Invalid token: {err}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(DeployError::Http)?;

        Ok(Self {
            base_url: server_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            REST_PREFIX,
            endpoint.trim_start_matches('/')
        )
    }

    pub async fn get(&self, endpoint: &str) -> Result<ApiResponse, DeployError> {
        self.send::<()>(Method::GET, endpoint, None).await
    }

    pub async fn post<B>(&self, endpoint: &str, body: &B) -> Result<ApiResponse, DeployError>
    where
        B: Serialize + ?Sized,
    {
        self.send(Method::POST, endpoint, Some(body)).await
    }

    pub async fn put<B>(&self, endpoint: &str, body: &B) -> Result<ApiResponse, DeployError>
    where
        B: Serialize + ?Sized,
    {
        self.send(Method::PUT, endpoint, Some(body)).await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<ApiResponse, DeployError> {
        self.send::<()>(Method::DELETE, endpoint, None).await
    }

    async fn send<B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<ApiResponse, DeployError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.endpoint_url(endpoint);
        debug!(method = %method, url = %url, "TeamCity request");

        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(DeployError::Http)?;
        let status = response.status();
        let body = response.text().await.map_err(DeployError::Http)?;
        debug!(endpoint, status = status.as_u16(), "TeamCity response");

        Ok(ApiResponse {
            endpoint: endpoint.to_string(),
            status,
            body,
        })
    }
}

/// `Basic` header value for an empty user name and the token as password.
pub fn basic_auth_value(token: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!(":{token}")))
}
