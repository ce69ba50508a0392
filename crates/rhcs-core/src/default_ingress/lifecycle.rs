//! Default ingress handling within the cluster resource lifecycle.
//!
//! Every mutating step waits for the cluster to be ready, then validates,
//! then reconciles. The whole operation is raced against the caller's
//! cancellation token, so an in-flight remote call is abandoned promptly.

use std::sync::Arc;

use rhcs_client::{Cluster, ClustersApi};
use tokio_util::sync::CancellationToken;

use super::reconcile::{
    read_default_ingress, reconcile_default_ingress, refresh_default_ingress, IngressContext,
    Reconciliation,
};
use super::state::DefaultIngress;
use super::validate::IngressPolicy;
use crate::error::Result;
use crate::poll::{cancellable, wait_for_cluster_ready, PollSettings};
use crate::version::VersionParseError;

/// Drives the default ingress of clusters through one API client.
pub struct ClusterIngressLifecycle {
    client: Arc<dyn ClustersApi>,
    settings: PollSettings,
    policy: IngressPolicy,
}

impl ClusterIngressLifecycle {
    pub fn new(client: Arc<dyn ClustersApi>, settings: PollSettings) -> Self {
        Self {
            client,
            settings,
            policy: IngressPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: IngressPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// First apply after the cluster itself was created.
    pub async fn create(
        &self,
        cluster_id: &str,
        intent: Option<&DefaultIngress>,
        cancel: &CancellationToken,
    ) -> Result<Reconciliation> {
        self.apply(cluster_id, None, intent, cancel).await
    }

    /// Refresh stored state; absent state stays absent.
    pub async fn read(
        &self,
        cluster_id: &str,
        stored: Option<&DefaultIngress>,
        cancel: &CancellationToken,
    ) -> Result<Option<DefaultIngress>> {
        cancellable(
            cluster_id,
            cancel,
            refresh_default_ingress(&*self.client, cluster_id, stored),
        )
        .await
    }

    /// Populate state from whatever default ingress the cluster has now.
    pub async fn import(
        &self,
        cluster_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<DefaultIngress>> {
        cancellable(
            cluster_id,
            cancel,
            read_default_ingress(&*self.client, cluster_id),
        )
        .await
    }

    pub async fn update(
        &self,
        cluster_id: &str,
        stored: Option<&DefaultIngress>,
        intent: Option<&DefaultIngress>,
        cancel: &CancellationToken,
    ) -> Result<Reconciliation> {
        self.apply(cluster_id, stored, intent, cancel).await
    }

    async fn apply(
        &self,
        cluster_id: &str,
        stored: Option<&DefaultIngress>,
        intent: Option<&DefaultIngress>,
        cancel: &CancellationToken,
    ) -> Result<Reconciliation> {
        let cluster =
            wait_for_cluster_ready(&*self.client, cluster_id, self.settings, cancel).await?;
        let ctx = IngressContext::new(cluster_id, cluster_version(&cluster)?)
            .with_policy(self.policy.clone());
        cancellable(
            cluster_id,
            cancel,
            reconcile_default_ingress(&*self.client, &ctx, stored, intent),
        )
        .await
    }
}

fn cluster_version(cluster: &Cluster) -> Result<&str> {
    cluster
        .raw_version()
        .ok_or_else(|| VersionParseError::new("", "cluster reports no version").into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::Attr;
    use crate::default_ingress::IngressAction;
    use crate::error::ReconcileError;
    use rhcs_client::fakes::{ApiOperation, MemoryClustersApi};
    use rhcs_client::ClusterState;
    use std::time::Duration;

    fn lifecycle(api: &Arc<MemoryClustersApi>) -> ClusterIngressLifecycle {
        ClusterIngressLifecycle::new(
            api.clone(),
            PollSettings::new(Duration::from_secs(30), Duration::from_secs(600)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_waits_for_ready_cluster() {
        let api = Arc::new(MemoryClustersApi::new());
        api.insert_cluster(Cluster::new("c1", ClusterState::Installing).with_version("4.14.7"));
        api.set_state_sequence("c1", vec![ClusterState::Installing, ClusterState::Ready]);

        let result = lifecycle(&api)
            .create("c1", Some(&DefaultIngress::default()), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.action, IngressAction::Created);
        assert_eq!(api.calls_for(ApiOperation::GetCluster).len(), 2);
        let ops: Vec<_> = api.calls().iter().map(|c| c.operation).collect();
        assert_eq!(ops.last(), Some(&ApiOperation::CreateIngress));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_cluster_version_is_parse_error() {
        let api = Arc::new(MemoryClustersApi::new());
        api.insert_cluster(Cluster::new("c1", ClusterState::Ready));

        let err = lifecycle(&api)
            .create("c1", Some(&DefaultIngress::default()), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::VersionParse(_)));
        assert_eq!(api.mutating_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_on_old_cluster_fails_gate() {
        let api = Arc::new(MemoryClustersApi::new());
        api.insert_cluster(Cluster::new("c1", ClusterState::Ready).with_version("4.13.9"));
        let stored = DefaultIngress {
            id: Attr::from("ingress-1"),
            ..Default::default()
        };
        let intent = DefaultIngress {
            route_wildcard_policy: Attr::from("WildcardsAllowed"),
            ..stored.clone()
        };

        let err = lifecycle(&api)
            .update("c1", Some(&stored), Some(&intent), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::UnsupportedVersion { .. }));
        assert_eq!(api.mutating_calls(), 0);
    }

    #[tokio::test]
    async fn test_import_reads_unmanaged_default_ingress() {
        let api = Arc::new(MemoryClustersApi::new());
        api.insert_cluster(Cluster::new("c1", ClusterState::Ready).with_version("4.14.0"));
        let lifecycle = lifecycle(&api);
        let cancel = CancellationToken::new();

        assert_eq!(lifecycle.read("c1", None, &cancel).await.unwrap(), None);
        assert_eq!(lifecycle.import("c1", &cancel).await.unwrap(), None);

        api.insert_ingress(
            "c1",
            rhcs_client::Ingress {
                default: Some(true),
                ..Default::default()
            },
        );
        let state = lifecycle.import("c1", &cancel).await.unwrap().unwrap();
        assert_eq!(state.id, Attr::from("ingress-1"));
        assert_eq!(api.mutating_calls(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_read_surfaces_cancelled() {
        let api = Arc::new(MemoryClustersApi::new());
        api.insert_cluster(Cluster::new("c1", ClusterState::Ready));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = lifecycle(&api)
            .read("c1", Some(&DefaultIngress::default()), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::Cancelled { .. }));
    }
}
