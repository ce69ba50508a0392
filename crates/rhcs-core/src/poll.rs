//! Readiness polling.
//!
//! [`wait_until`] queries a remote object immediately, then once per
//! interval, until a predicate holds, the deadline passes, or the caller
//! cancels. Time comes from `tokio::time`, so tests drive it with a paused
//! clock instead of sleeping.

use std::future::Future;
use std::time::Duration;

use rhcs_client::{ApiResult, Cluster, ClusterClient};
use serde::{Deserialize, Serialize};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::{ReconcileError, Result};
use crate::obs;

/// Interval and overall deadline for a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSettings {
    /// Delay between the start of consecutive status queries.
    pub interval: Duration,
    /// Maximum time to wait for the predicate.
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(60 * 60),
        }
    }
}

impl PollSettings {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

/// Poll `query` until `predicate` accepts the latest object.
///
/// # Errors
///
/// - `ReconcileError::Timeout` if the deadline passes first.
/// - `ReconcileError::Cancelled` if `cancel` fires, including mid-query.
/// - `ReconcileError::RemoteCall` if a status query fails.
pub async fn wait_until<T, Q, Fut, P>(
    object: &str,
    mut query: Q,
    predicate: P,
    settings: PollSettings,
    cancel: &CancellationToken,
) -> Result<T>
where
    Q: FnMut() -> Fut,
    Fut: Future<Output = ApiResult<T>>,
    P: Fn(&T) -> bool,
{
    let start = Instant::now();
    let deadline = start + settings.timeout;
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        obs::emit_poll_attempt(object, attempt);

        // The query is listed before the deadline so that a query already
        // due at the deadline still runs once.
        let latest = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(ReconcileError::Cancelled { object: object.to_string() });
            }
            result = query() => result
                .map_err(|source| ReconcileError::remote("poll status", object, None, source))?,
            _ = sleep_until(deadline) => {
                return Err(timed_out(object, start, attempt));
            }
        };

        if predicate(&latest) {
            obs::emit_poll_finished(object, attempt, start.elapsed());
            return Ok(latest);
        }

        let next = Instant::now() + settings.interval;
        if next > deadline {
            return Err(timed_out(object, start, attempt));
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(ReconcileError::Cancelled { object: object.to_string() });
            }
            _ = sleep_until(next) => {}
        }
    }
}

fn timed_out(object: &str, start: Instant, attempts: u32) -> ReconcileError {
    let elapsed = start.elapsed();
    obs::emit_poll_timed_out(object, attempts, elapsed);
    ReconcileError::Timeout {
        object: object.to_string(),
        elapsed,
    }
}

/// Wait for a cluster to report the `ready` state.
pub async fn wait_for_cluster_ready<C>(
    client: &C,
    cluster_id: &str,
    settings: PollSettings,
    cancel: &CancellationToken,
) -> Result<Cluster>
where
    C: ClusterClient + ?Sized,
{
    wait_until(
        cluster_id,
        || client.get_cluster(cluster_id),
        Cluster::is_ready,
        settings,
        cancel,
    )
    .await
}

/// Race `operation` against `cancel`. Cancellation wins when both are ready,
/// and the abandoned operation is dropped.
pub async fn cancellable<T>(
    object: &str,
    cancel: &CancellationToken,
    operation: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ReconcileError::Cancelled { object: object.to_string() }),
        result = operation => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rhcs_client::fakes::{ApiOperation, MemoryClustersApi};
    use rhcs_client::{ApiError, ClusterState};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_default_settings() {
        let settings = PollSettings::default();
        assert_eq!(settings.interval, secs(30));
        assert_eq!(settings.timeout, secs(3600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_predicate_true_on_first_query() {
        let calls = AtomicU32::new(0);
        let value = wait_until(
            "obj",
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, ApiError>(7u32) }
            },
            |v| *v == 7,
            PollSettings::new(secs(1), secs(3)),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_true_times_out_after_bounded_queries() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();
        let err = wait_until(
            "cluster-1",
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, ApiError>(false) }
            },
            |ready| *ready,
            PollSettings::new(secs(1), secs(3)),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        let queries = calls.load(Ordering::SeqCst);
        assert!((3..=4).contains(&queries), "made {} queries", queries);
        match err {
            ReconcileError::Timeout { object, elapsed } => {
                assert_eq!(object, "cluster-1");
                assert!(elapsed <= secs(3));
            }
            other => panic!("expected Timeout, got {:?}", other),
        }
        assert!(start.elapsed() <= secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_error_aborts_poll() {
        let err = wait_until(
            "cluster-1",
            || async { Err::<bool, _>(ApiError::Transport("refused".to_string())) },
            |ready| *ready,
            PollSettings::new(secs(1), secs(3)),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::RemoteCall {
                operation: "poll status",
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_polling_promptly() {
        let cancel = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2500)).await;
            trigger.cancel();
        });

        let counter = calls.clone();
        let start = Instant::now();
        let err = wait_until(
            "cluster-1",
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, ApiError>(false) }
            },
            |ready| *ready,
            PollSettings::new(secs(1), secs(60)),
            &cancel,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ReconcileError::Cancelled { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(start.elapsed() < secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_hanging_query() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(secs(5)).await;
            trigger.cancel();
        });

        let err = wait_until(
            "cluster-1",
            || async {
                std::future::pending::<()>().await;
                Ok::<_, ApiError>(true)
            },
            |ready| *ready,
            PollSettings::new(secs(1), secs(60)),
            &cancel,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ReconcileError::Cancelled { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellable_abandons_pending_operation() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(secs(5)).await;
            trigger.cancel();
        });

        let err = cancellable("obj", &cancel, std::future::pending::<Result<()>>())
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::Cancelled { ref object } if object == "obj"));
    }

    #[tokio::test]
    async fn test_cancellable_passes_result_through() {
        let value = cancellable("obj", &CancellationToken::new(), async { Ok(3u8) })
            .await
            .unwrap();
        assert_eq!(value, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_cluster_ready() {
        let api = MemoryClustersApi::new();
        api.insert_cluster(Cluster::new("c1", ClusterState::Installing));
        api.set_state_sequence(
            "c1",
            vec![
                ClusterState::Installing,
                ClusterState::Installing,
                ClusterState::Ready,
            ],
        );

        let cluster = wait_for_cluster_ready(
            &api,
            "c1",
            PollSettings::new(secs(30), secs(3600)),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(cluster.is_ready());
        assert_eq!(api.calls_for(ApiOperation::GetCluster).len(), 3);
    }
}
