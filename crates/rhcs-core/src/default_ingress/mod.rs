//! The default ingress embedded in a cluster.
//!
//! - `state`: declared/stored attributes and how API responses fold into them
//! - `validate`: the gate every declared intent passes before a remote call
//! - `reconcile`: diffing and the create/update/read paths
//! - `lifecycle`: readiness, validation, and reconciliation in order

pub mod lifecycle;
pub mod reconcile;
pub mod state;
pub mod validate;

pub use lifecycle::ClusterIngressLifecycle;
pub use reconcile::{
    build_creation_request, diff_default_ingress, read_default_ingress, reconcile_default_ingress,
    refresh_default_ingress, IngressAction, IngressContext, Reconciliation,
};
pub use state::DefaultIngress;
pub use validate::{validate_default_ingress, IngressPolicy, MIN_DEFAULT_INGRESS_VERSION};
