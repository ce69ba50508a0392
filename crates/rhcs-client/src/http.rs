//! REST implementation of the client traits
//!
//! Talks to the clusters-management v1 API over HTTPS. Authentication is
//! limited to an optional bearer token that the caller already holds.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::client_traits::*;
use crate::error::ApiError;
use crate::model::{Cluster, Ingress, ListPage, User};

const API_PREFIX: &str = "/api/clusters_mgmt/v1";

/// Error document returned by the API on failure.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    reason: Option<String>,
}

/// Clusters-management client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpClustersApi {
    base_url: String,
    http: reqwest::Client,
}

impl HttpClustersApi {
    /// Create a client for `base_url`, sending `token` as a bearer token if given.
    pub fn new(base_url: &str, token: Option<&str>) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ApiError::Transport(format!("invalid token: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        let http = reqwest::Client::builder()
            .user_agent(concat!("rhcs-client/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;
        Ok(Self::with_client(base_url, http))
    }

    /// Wrap a preconfigured `reqwest::Client`.
    pub fn with_client(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    fn cluster_url(&self, cluster_id: &str) -> String {
        format!("{}{}/clusters/{}", self.base_url, API_PREFIX, cluster_id)
    }

    fn ingresses_url(&self, cluster_id: &str) -> String {
        format!("{}/ingresses", self.cluster_url(cluster_id))
    }

    fn users_url(&self, cluster_id: &str, group_id: &str) -> String {
        format!("{}/groups/{}/users", self.cluster_url(cluster_id), group_id)
    }

    async fn send(&self, request: RequestBuilder, resource: &str) -> ApiResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        debug!(resource = %resource, status = status.as_u16(), "clusters-mgmt response");
        if status.is_success() {
            return Ok(response);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound {
                resource: resource.to_string(),
            });
        }
        let text = response.text().await.unwrap_or_default();
        let reason = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.reason)
            .unwrap_or(text);
        Err(ApiError::Status {
            code: status.as_u16(),
            reason,
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: &str,
    ) -> ApiResult<T> {
        let response = self.send(request, resource).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl ClusterClient for HttpClustersApi {
    async fn get_cluster(&self, cluster_id: &str) -> ApiResult<Cluster> {
        let url = self.cluster_url(cluster_id);
        self.send_json(self.http.get(&url), &url).await
    }
}

#[async_trait]
impl IngressClient for HttpClustersApi {
    async fn list_ingresses(&self, cluster_id: &str) -> ApiResult<Vec<Ingress>> {
        let url = self.ingresses_url(cluster_id);
        let page: ListPage<Ingress> = self.send_json(self.http.get(&url), &url).await?;
        Ok(page.items)
    }

    async fn create_ingress(&self, cluster_id: &str, body: &Ingress) -> ApiResult<Ingress> {
        let url = self.ingresses_url(cluster_id);
        self.send_json(self.http.post(&url).json(body), &url).await
    }

    async fn update_ingress(
        &self,
        cluster_id: &str,
        ingress_id: &str,
        body: &Ingress,
    ) -> ApiResult<Ingress> {
        let url = format!("{}/{}", self.ingresses_url(cluster_id), ingress_id);
        self.send_json(self.http.patch(&url).json(body), &url).await
    }
}

#[async_trait]
impl GroupMembershipClient for HttpClustersApi {
    async fn add_user(&self, cluster_id: &str, group_id: &str, user: &User) -> ApiResult<User> {
        let url = self.users_url(cluster_id, group_id);
        self.send_json(self.http.post(&url).json(user), &url).await
    }

    async fn get_user(&self, cluster_id: &str, group_id: &str, user_id: &str) -> ApiResult<User> {
        let url = format!("{}/{}", self.users_url(cluster_id, group_id), user_id);
        self.send_json(self.http.get(&url), &url).await
    }

    async fn delete_user(
        &self,
        cluster_id: &str,
        group_id: &str,
        user_id: &str,
    ) -> ApiResult<()> {
        let url = format!("{}/{}", self.users_url(cluster_id, group_id), user_id);
        self.send(self.http.delete(&url), &url).await?;
        Ok(())
    }
}
