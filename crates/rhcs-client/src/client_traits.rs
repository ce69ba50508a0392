//! Client trait definitions for the clusters-management API
//!
//! These traits define the remote operations the provider core consumes:
//! - `ClusterClient`: Cluster status lookups (used for readiness polling)
//! - `IngressClient`: Ingress enumeration, creation, and update
//! - `GroupMembershipClient`: Group user add/get/delete
//!
//! All traits are async and transport-agnostic. Retries and rate limiting,
//! if any, belong to the implementation. In-memory fakes are provided for
//! testing via the `fakes` module.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::model::{Cluster, Ingress, User};

/// Result type for API operations
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Cluster status lookups.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Fetch the current status of a cluster.
    async fn get_cluster(&self, cluster_id: &str) -> ApiResult<Cluster>;
}

/// Ingresses embedded in a cluster.
///
/// Guarantees:
/// - `list_ingresses` has no side effects and may be called any number of times.
/// - `create_ingress` and `update_ingress` return the ingress as stored by the
///   API, which may normalise the submitted values.
#[async_trait]
pub trait IngressClient: Send + Sync {
    /// Enumerate every ingress of the cluster.
    async fn list_ingresses(&self, cluster_id: &str) -> ApiResult<Vec<Ingress>>;

    /// Create an ingress from a full body.
    async fn create_ingress(&self, cluster_id: &str, body: &Ingress) -> ApiResult<Ingress>;

    /// Patch an existing ingress with the fields set in `body`.
    async fn update_ingress(
        &self,
        cluster_id: &str,
        ingress_id: &str,
        body: &Ingress,
    ) -> ApiResult<Ingress>;
}

/// Users of a cluster group.
#[async_trait]
pub trait GroupMembershipClient: Send + Sync {
    /// Add a user to a group.
    async fn add_user(&self, cluster_id: &str, group_id: &str, user: &User) -> ApiResult<User>;

    /// Fetch a group member. Returns `ApiError::NotFound` if absent.
    async fn get_user(&self, cluster_id: &str, group_id: &str, user_id: &str) -> ApiResult<User>;

    /// Remove a user from a group.
    async fn delete_user(&self, cluster_id: &str, group_id: &str, user_id: &str)
        -> ApiResult<()>;
}

/// Everything the provider needs from the API, as a single object.
pub trait ClustersApi: ClusterClient + IngressClient + GroupMembershipClient {}

impl<T> ClustersApi for T where T: ClusterClient + IngressClient + GroupMembershipClient {}
