//! Remote object model for the clusters-management API.
//!
//! These types mirror the JSON documents the API exchanges. Every optional
//! field is skipped when unset, so a partially populated [`Ingress`] doubles
//! as a patch body that only carries the fields being changed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Cluster
// ---------------------------------------------------------------------------

/// Lifecycle state reported by the API for a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterState {
    Validating,
    Waiting,
    Pending,
    Installing,
    Ready,
    Error,
    Hibernating,
    Resuming,
    PoweringDown,
    Uninstalling,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for ClusterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ClusterState::Validating => "validating",
            ClusterState::Waiting => "waiting",
            ClusterState::Pending => "pending",
            ClusterState::Installing => "installing",
            ClusterState::Ready => "ready",
            ClusterState::Error => "error",
            ClusterState::Hibernating => "hibernating",
            ClusterState::Resuming => "resuming",
            ClusterState::PoweringDown => "powering_down",
            ClusterState::Uninstalling => "uninstalling",
            ClusterState::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// OpenShift version attached to a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterVersion {
    /// Raw version string, e.g. `4.14.2`.
    pub raw_id: String,
}

/// Status view of a cluster, as returned by `GET /clusters/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub state: ClusterState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<ClusterVersion>,
}

impl Cluster {
    /// A cluster in the given state with no name or version.
    pub fn new(id: impl Into<String>, state: ClusterState) -> Self {
        Self {
            id: id.into(),
            name: None,
            state,
            version: None,
        }
    }

    /// Attach a raw version (builder pattern).
    pub fn with_version(mut self, raw_id: impl Into<String>) -> Self {
        self.version = Some(ClusterVersion {
            raw_id: raw_id.into(),
        });
        self
    }

    pub fn is_ready(&self) -> bool {
        self.state == ClusterState::Ready
    }

    /// Raw version string, if the cluster reports one.
    pub fn raw_version(&self) -> Option<&str> {
        self.version.as_ref().map(|v| v.raw_id.as_str())
    }
}

// ---------------------------------------------------------------------------
// Ingress
// ---------------------------------------------------------------------------

/// An ingress embedded in a cluster.
///
/// Used both for responses and for create/update request bodies. The API
/// distinguishes an omitted collection (`None`, leave untouched) from an
/// empty one (`Some` of an empty collection, clear it).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ingress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_selectors: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excluded_namespaces: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_wildcard_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_namespace_ownership_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_routes_hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_routes_tls_secret_ref: Option<String>,
}

impl Ingress {
    /// Whether this is the cluster's default ingress.
    pub fn is_default(&self) -> bool {
        self.default.unwrap_or(false)
    }

    /// Names of the attributes this body sets, in wire order.
    ///
    /// `id` and `default` are addressing fields and are not reported.
    pub fn set_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.route_selectors.is_some() {
            fields.push("route_selectors");
        }
        if self.excluded_namespaces.is_some() {
            fields.push("excluded_namespaces");
        }
        if self.route_wildcard_policy.is_some() {
            fields.push("route_wildcard_policy");
        }
        if self.route_namespace_ownership_policy.is_some() {
            fields.push("route_namespace_ownership_policy");
        }
        if self.cluster_routes_hostname.is_some() {
            fields.push("cluster_routes_hostname");
        }
        if self.cluster_routes_tls_secret_ref.is_some() {
            fields.push("cluster_routes_tls_secret_ref");
        }
        fields
    }

    /// Apply a patch body: every field the patch sets overwrites this one.
    ///
    /// An empty hostname or TLS secret reference clears the value.
    pub fn apply_patch(&mut self, patch: &Ingress) {
        if let Some(selectors) = &patch.route_selectors {
            self.route_selectors = Some(selectors.clone());
        }
        if let Some(namespaces) = &patch.excluded_namespaces {
            self.excluded_namespaces = Some(namespaces.clone());
        }
        if let Some(policy) = &patch.route_wildcard_policy {
            self.route_wildcard_policy = Some(policy.clone());
        }
        if let Some(policy) = &patch.route_namespace_ownership_policy {
            self.route_namespace_ownership_policy = Some(policy.clone());
        }
        if let Some(hostname) = &patch.cluster_routes_hostname {
            self.cluster_routes_hostname = non_empty(hostname);
        }
        if let Some(secret) = &patch.cluster_routes_tls_secret_ref {
            self.cluster_routes_tls_secret_ref = non_empty(secret);
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Group membership
// ---------------------------------------------------------------------------

/// A user that belongs to a cluster group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()) }
    }
}

// ---------------------------------------------------------------------------
// List envelope
// ---------------------------------------------------------------------------

/// A page of a collection, as returned by list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ListPage<T> {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}
