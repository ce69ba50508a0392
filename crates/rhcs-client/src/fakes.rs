//! In-memory fakes for client traits (testing only)
//!
//! Provides `MemoryClustersApi`, which satisfies every client trait without a
//! server, records each call it receives, and can be scripted to walk a
//! cluster through a sequence of states or to fail a given operation.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client_traits::*;
use crate::error::ApiError;
use crate::model::{Cluster, ClusterState, Ingress, User};

/// The API operation a recorded call targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    GetCluster,
    ListIngresses,
    CreateIngress,
    UpdateIngress,
    AddUser,
    GetUser,
    DeleteUser,
}

/// A call received by the fake.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiCall {
    pub operation: ApiOperation,
    pub cluster_id: String,
    /// Ingress id for updates, `group/user` for membership calls.
    pub target: Option<String>,
    /// Request body for ingress create/update.
    pub body: Option<Ingress>,
}

#[derive(Debug)]
struct ClusterEntry {
    cluster: Cluster,
    /// States handed out by successive `get_cluster` calls; the last repeats.
    states: VecDeque<ClusterState>,
    ingresses: Vec<Ingress>,
    groups: HashMap<String, Vec<User>>,
}

#[derive(Debug, Default)]
struct Inner {
    clusters: HashMap<String, ClusterEntry>,
    calls: Vec<ApiCall>,
    failures: HashMap<ApiOperation, ApiError>,
    next_ingress: u32,
}

/// In-memory clusters-management API backed by a `HashMap<cluster_id, ClusterEntry>`.
#[derive(Debug, Default)]
pub struct MemoryClustersApi {
    inner: Mutex<Inner>,
}

impl MemoryClustersApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cluster. Replaces any previous cluster with the same id.
    pub fn insert_cluster(&self, cluster: Cluster) {
        let mut inner = self.inner.lock().unwrap();
        inner.clusters.insert(
            cluster.id.clone(),
            ClusterEntry {
                cluster,
                states: VecDeque::new(),
                ingresses: Vec::new(),
                groups: HashMap::new(),
            },
        );
    }

    /// Script the states returned by successive `get_cluster` calls.
    pub fn set_state_sequence(&self, cluster_id: &str, states: Vec<ClusterState>) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(entry) = inner.clusters.get_mut(cluster_id) {
            entry.states = states.into();
        }
    }

    /// Seed an ingress directly, bypassing the call log. Returns its id.
    pub fn insert_ingress(&self, cluster_id: &str, mut ingress: Ingress) -> String {
        let mut inner = self.inner.lock().unwrap();
        let id = match ingress.id.clone() {
            Some(id) => id,
            None => {
                inner.next_ingress += 1;
                format!("ingress-{}", inner.next_ingress)
            }
        };
        ingress.id = Some(id.clone());
        if let Some(entry) = inner.clusters.get_mut(cluster_id) {
            entry.ingresses.push(ingress);
        }
        id
    }

    /// Fetch the stored ingress with the given id.
    pub fn ingress(&self, cluster_id: &str, ingress_id: &str) -> Option<Ingress> {
        let inner = self.inner.lock().unwrap();
        inner.clusters.get(cluster_id).and_then(|entry| {
            entry
                .ingresses
                .iter()
                .find(|i| i.id.as_deref() == Some(ingress_id))
                .cloned()
        })
    }

    /// Make every call to `operation` fail with `error` until cleared.
    pub fn fail_on(&self, operation: ApiOperation, error: ApiError) {
        let mut inner = self.inner.lock().unwrap();
        inner.failures.insert(operation, error);
    }

    /// Remove an injected failure.
    pub fn clear_failure(&self, operation: ApiOperation) {
        let mut inner = self.inner.lock().unwrap();
        inner.failures.remove(&operation);
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<ApiCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Calls received for one operation, in order.
    pub fn calls_for(&self, operation: ApiOperation) -> Vec<ApiCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.operation == operation)
            .collect()
    }

    /// Number of calls that could have changed remote state.
    pub fn mutating_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| {
                matches!(
                    c.operation,
                    ApiOperation::CreateIngress
                        | ApiOperation::UpdateIngress
                        | ApiOperation::AddUser
                        | ApiOperation::DeleteUser
                )
            })
            .count()
    }
}

fn record(
    inner: &mut Inner,
    operation: ApiOperation,
    cluster_id: &str,
    target: Option<String>,
    body: Option<Ingress>,
) -> ApiResult<()> {
    inner.calls.push(ApiCall {
        operation,
        cluster_id: cluster_id.to_string(),
        target,
        body,
    });
    match inner.failures.get(&operation) {
        Some(err) => Err(err.clone()),
        None => Ok(()),
    }
}

fn cluster_not_found(cluster_id: &str) -> ApiError {
    ApiError::NotFound {
        resource: format!("clusters/{}", cluster_id),
    }
}

#[async_trait]
impl ClusterClient for MemoryClustersApi {
    async fn get_cluster(&self, cluster_id: &str) -> ApiResult<Cluster> {
        let mut inner = self.inner.lock().unwrap();
        record(&mut inner, ApiOperation::GetCluster, cluster_id, None, None)?;
        let entry = inner
            .clusters
            .get_mut(cluster_id)
            .ok_or_else(|| cluster_not_found(cluster_id))?;
        if entry.states.len() > 1 {
            if let Some(state) = entry.states.pop_front() {
                entry.cluster.state = state;
            }
        } else if let Some(state) = entry.states.front() {
            entry.cluster.state = *state;
        }
        Ok(entry.cluster.clone())
    }
}

#[async_trait]
impl IngressClient for MemoryClustersApi {
    async fn list_ingresses(&self, cluster_id: &str) -> ApiResult<Vec<Ingress>> {
        let mut inner = self.inner.lock().unwrap();
        record(&mut inner, ApiOperation::ListIngresses, cluster_id, None, None)?;
        inner
            .clusters
            .get(cluster_id)
            .map(|entry| entry.ingresses.clone())
            .ok_or_else(|| cluster_not_found(cluster_id))
    }

    async fn create_ingress(&self, cluster_id: &str, body: &Ingress) -> ApiResult<Ingress> {
        let mut inner = self.inner.lock().unwrap();
        record(
            &mut inner,
            ApiOperation::CreateIngress,
            cluster_id,
            None,
            Some(body.clone()),
        )?;
        inner.next_ingress += 1;
        let id = format!("ingress-{}", inner.next_ingress);
        let entry = inner
            .clusters
            .get_mut(cluster_id)
            .ok_or_else(|| cluster_not_found(cluster_id))?;
        if body.is_default() && entry.ingresses.iter().any(Ingress::is_default) {
            return Err(ApiError::Status {
                code: 409,
                reason: format!("cluster '{}' already has a default ingress", cluster_id),
            });
        }
        let mut created = Ingress {
            id: Some(id),
            default: Some(body.is_default()),
            ..Default::default()
        };
        created.apply_patch(body);
        entry.ingresses.push(created.clone());
        Ok(created)
    }

    async fn update_ingress(
        &self,
        cluster_id: &str,
        ingress_id: &str,
        body: &Ingress,
    ) -> ApiResult<Ingress> {
        let mut inner = self.inner.lock().unwrap();
        record(
            &mut inner,
            ApiOperation::UpdateIngress,
            cluster_id,
            Some(ingress_id.to_string()),
            Some(body.clone()),
        )?;
        let entry = inner
            .clusters
            .get_mut(cluster_id)
            .ok_or_else(|| cluster_not_found(cluster_id))?;
        let ingress = entry
            .ingresses
            .iter_mut()
            .find(|i| i.id.as_deref() == Some(ingress_id))
            .ok_or_else(|| ApiError::NotFound {
                resource: format!("clusters/{}/ingresses/{}", cluster_id, ingress_id),
            })?;
        ingress.apply_patch(body);
        Ok(ingress.clone())
    }
}

#[async_trait]
impl GroupMembershipClient for MemoryClustersApi {
    async fn add_user(&self, cluster_id: &str, group_id: &str, user: &User) -> ApiResult<User> {
        let mut inner = self.inner.lock().unwrap();
        let user_id = user.id.clone().unwrap_or_default();
        record(
            &mut inner,
            ApiOperation::AddUser,
            cluster_id,
            Some(format!("{}/{}", group_id, user_id)),
            None,
        )?;
        let entry = inner
            .clusters
            .get_mut(cluster_id)
            .ok_or_else(|| cluster_not_found(cluster_id))?;
        let members = entry.groups.entry(group_id.to_string()).or_default();
        if members.iter().any(|u| u.id == user.id) {
            return Err(ApiError::Status {
                code: 409,
                reason: format!("user '{}' is already in group '{}'", user_id, group_id),
            });
        }
        members.push(user.clone());
        Ok(user.clone())
    }

    async fn get_user(&self, cluster_id: &str, group_id: &str, user_id: &str) -> ApiResult<User> {
        let mut inner = self.inner.lock().unwrap();
        record(
            &mut inner,
            ApiOperation::GetUser,
            cluster_id,
            Some(format!("{}/{}", group_id, user_id)),
            None,
        )?;
        let entry = inner
            .clusters
            .get(cluster_id)
            .ok_or_else(|| cluster_not_found(cluster_id))?;
        entry
            .groups
            .get(group_id)
            .and_then(|members| members.iter().find(|u| u.id.as_deref() == Some(user_id)))
            .cloned()
            .ok_or_else(|| ApiError::NotFound {
                resource: format!(
                    "clusters/{}/groups/{}/users/{}",
                    cluster_id, group_id, user_id
                ),
            })
    }

    async fn delete_user(
        &self,
        cluster_id: &str,
        group_id: &str,
        user_id: &str,
    ) -> ApiResult<()> {
        let mut inner = self.inner.lock().unwrap();
        record(
            &mut inner,
            ApiOperation::DeleteUser,
            cluster_id,
            Some(format!("{}/{}", group_id, user_id)),
            None,
        )?;
        let entry = inner
            .clusters
            .get_mut(cluster_id)
            .ok_or_else(|| cluster_not_found(cluster_id))?;
        let members = entry.groups.entry(group_id.to_string()).or_default();
        let before = members.len();
        members.retain(|u| u.id.as_deref() != Some(user_id));
        if members.len() == before {
            return Err(ApiError::NotFound {
                resource: format!(
                    "clusters/{}/groups/{}/users/{}",
                    cluster_id, group_id, user_id
                ),
            });
        }
        Ok(())
    }
}
