//! RHCS-Core: State Reconciliation for Cluster Sub-resources
//!
//! Decides, for a sub-resource embedded in a cluster, which remote calls
//! converge the API on declared intent, and folds the API's answer back into
//! stored state.
//!
//! ## Layer 1 - Reconciliation Core
//!
//! Focus: Deterministic diffing, gating, and convergence over `rhcs-client`.
//!
//! ## Key Components
//!
//! - `attr`: tri-state attribute values and their native conversions
//! - `version`: version parsing and ordering for feature gates
//! - `poll`: readiness polling with deadline and cancellation
//! - `default_ingress`: validation gate, reconciler, and cluster lifecycle wiring
//! - `group_membership`: add/read/delete/import of group members
//! - `config`, `obs`, `telemetry`: configuration and structured logging

pub mod attr;
pub mod config;
pub mod default_ingress;
pub mod error;
pub mod group_membership;
pub mod obs;
pub mod poll;
pub mod telemetry;
pub mod version;

pub use attr::{Attr, ConversionError, ListAttr, MapAttr, StringAttr};
pub use config::ProviderConfig;
pub use default_ingress::{
    reconcile_default_ingress, ClusterIngressLifecycle, DefaultIngress, IngressAction,
    IngressContext, IngressPolicy, Reconciliation,
};
pub use error::{ReconcileError, Result};
pub use group_membership::GroupMembership;
pub use poll::{cancellable, wait_for_cluster_ready, wait_until, PollSettings};
pub use version::{is_greater_or_equal, Version, VersionParseError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
