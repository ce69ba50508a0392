//! Convergence of a cluster's default ingress.
//!
//! Compares stored state with declared intent, issues the smallest set of
//! remote calls that makes the API match the intent, and folds the API's
//! answer back into a new stored state.
//!
//! | stored  | intent  | outcome                                        |
//! |---------|---------|------------------------------------------------|
//! | absent  | absent  | nothing to do                                  |
//! | present | absent  | refreshed from the API, left in place          |
//! | absent  | present | adopt the existing default ingress, or create  |
//! | present | present | patch only the differing fields, or nothing    |

use rhcs_client::{ApiError, Ingress, IngressClient};
use serde::{Deserialize, Serialize};

use super::state::DefaultIngress;
use super::validate::{validate_default_ingress, IngressPolicy};
use crate::attr::{to_native_list, to_native_map, to_native_string, ConversionError, StringAttr};
use crate::error::{ReconcileError, Result};
use crate::obs::{self, ReconcileSpan};

/// Parent cluster facts the reconciler needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressContext {
    pub cluster_id: String,
    /// Raw cluster version, e.g. `4.14.3`.
    pub cluster_version: String,
    #[serde(default)]
    pub policy: IngressPolicy,
}

impl IngressContext {
    pub fn new(cluster_id: impl Into<String>, cluster_version: impl Into<String>) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            cluster_version: cluster_version.into(),
            policy: IngressPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: IngressPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// What a reconciliation did remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum IngressAction {
    /// No remote mutation was needed.
    Noop,
    Created,
    Updated { fields: Vec<&'static str> },
    /// Intent no longer manages the ingress; stored state was refreshed only.
    Retained,
}

/// New stored state plus the action that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub state: Option<DefaultIngress>,
    pub action: IngressAction,
}

impl Reconciliation {
    fn new(state: Option<DefaultIngress>, action: IngressAction) -> Self {
        Self { state, action }
    }
}

fn remote_failure(
    operation: &'static str,
    cluster_id: &str,
    ingress_id: Option<&str>,
    source: ApiError,
) -> ReconcileError {
    obs::emit_remote_call_failed(operation, cluster_id, &source);
    ReconcileError::remote(operation, cluster_id, ingress_id, source)
}

/// The API answered with a default ingress that carries no identifier.
fn missing_id(operation: &'static str, cluster_id: &str) -> ReconcileError {
    remote_failure(
        operation,
        cluster_id,
        None,
        ApiError::Decode("default ingress has no id".to_string()),
    )
}

// ---------------------------------------------------------------------------
// Request shapes
// ---------------------------------------------------------------------------

/// Creation body for `intent`.
///
/// Unset collections are sent as empty so the creation is explicit.
pub fn build_creation_request(
    intent: &DefaultIngress,
) -> std::result::Result<Ingress, ConversionError> {
    let route_selectors =
        to_native_map(&intent.route_selectors).map_err(|e| e.at("route_selectors"))?;
    let excluded_namespaces =
        to_native_list(&intent.excluded_namespaces).map_err(|e| e.at("excluded_namespaces"))?;

    Ok(Ingress {
        id: None,
        default: Some(true),
        route_selectors: Some(route_selectors.unwrap_or_default()),
        excluded_namespaces: Some(excluded_namespaces.unwrap_or_default()),
        route_wildcard_policy: to_native_string(&intent.route_wildcard_policy).map(str::to_string),
        route_namespace_ownership_policy: to_native_string(
            &intent.route_namespace_ownership_policy,
        )
        .map(str::to_string),
        cluster_routes_hostname: non_empty(to_native_string(&intent.cluster_routes_hostname)),
        cluster_routes_tls_secret_ref: non_empty(to_native_string(
            &intent.cluster_routes_tls_secret_ref,
        )),
    })
}

/// Patch body holding only the fields where `intent` differs from `stored`.
///
/// An empty body (no [`Ingress::set_fields`]) means nothing to send.
pub fn diff_default_ingress(
    stored: &DefaultIngress,
    intent: &DefaultIngress,
) -> std::result::Result<Ingress, ConversionError> {
    let mut patch = Ingress::default();

    if !intent.route_selectors.is_unknown() {
        let want = to_native_map(&intent.route_selectors).map_err(|e| e.at("route_selectors"))?;
        let have = to_native_map(&stored.route_selectors).map_err(|e| e.at("route_selectors"))?;
        patch.route_selectors = collection_change(have, want);
    }

    if !intent.excluded_namespaces.is_unknown() {
        let want = to_native_list(&intent.excluded_namespaces)
            .map_err(|e| e.at("excluded_namespaces"))?;
        let have = to_native_list(&stored.excluded_namespaces)
            .map_err(|e| e.at("excluded_namespaces"))?;
        patch.excluded_namespaces = collection_change(have, want);
    }

    patch.route_wildcard_policy =
        computed_change(&stored.route_wildcard_policy, &intent.route_wildcard_policy);
    patch.route_namespace_ownership_policy = computed_change(
        &stored.route_namespace_ownership_policy,
        &intent.route_namespace_ownership_policy,
    );

    if !intent.cluster_routes_hostname.is_unknown() {
        patch.cluster_routes_hostname = clearable_change(
            to_native_string(&stored.cluster_routes_hostname),
            to_native_string(&intent.cluster_routes_hostname),
        );
    }
    if !intent.cluster_routes_tls_secret_ref.is_unknown() {
        patch.cluster_routes_tls_secret_ref = clearable_change(
            to_native_string(&stored.cluster_routes_tls_secret_ref),
            to_native_string(&intent.cluster_routes_tls_secret_ref),
        );
    }

    Ok(patch)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_string)
}

/// Absent and empty compare unequal; a cleared collection is sent as empty.
fn collection_change<C: PartialEq + Default>(have: Option<C>, want: Option<C>) -> Option<C> {
    if have == want {
        None
    } else {
        Some(want.unwrap_or_default())
    }
}

/// Null or unknown intent leaves the remote value alone.
fn computed_change(stored: &StringAttr, intent: &StringAttr) -> Option<String> {
    let want = to_native_string(intent)?;
    if to_native_string(stored) == Some(want) {
        None
    } else {
        Some(want.to_string())
    }
}

/// `""` and absent are the same; clearing is sent as `""`.
fn clearable_change(have: Option<&str>, want: Option<&str>) -> Option<String> {
    let have = have.filter(|s| !s.is_empty());
    let want = want.filter(|s| !s.is_empty());
    if have == want {
        None
    } else {
        Some(want.unwrap_or_default().to_string())
    }
}

// ---------------------------------------------------------------------------
// Read path
// ---------------------------------------------------------------------------

/// Find the cluster's default ingress and populate state from it.
///
/// Fields the API omits are null; an explicitly empty collection stays empty.
pub async fn read_default_ingress<C>(
    client: &C,
    cluster_id: &str,
) -> Result<Option<DefaultIngress>>
where
    C: IngressClient + ?Sized,
{
    let ingresses = client
        .list_ingresses(cluster_id)
        .await
        .map_err(|e| remote_failure("list ingresses", cluster_id, None, e))?;
    Ok(ingresses
        .iter()
        .find(|i| i.is_default())
        .map(DefaultIngress::from_remote))
}

/// Refresh stored state from the API.
///
/// Absent stored state stays absent without a remote call. Collections that
/// were null in `stored` and are empty remotely stay null.
pub async fn refresh_default_ingress<C>(
    client: &C,
    cluster_id: &str,
    stored: Option<&DefaultIngress>,
) -> Result<Option<DefaultIngress>>
where
    C: IngressClient + ?Sized,
{
    let Some(stored) = stored else {
        return Ok(None);
    };
    let ingresses = client
        .list_ingresses(cluster_id)
        .await
        .map_err(|e| remote_failure("list ingresses", cluster_id, None, e))?;
    match ingresses.iter().find(|i| i.is_default()) {
        Some(remote) => Ok(Some(DefaultIngress::fold_response(remote, stored))),
        None => {
            obs::emit_ingress_missing(cluster_id);
            Ok(None)
        }
    }
}

// ---------------------------------------------------------------------------
// Reconcile
// ---------------------------------------------------------------------------

/// Converge the cluster's default ingress on `intent`.
///
/// Validation and attribute conversion both happen before any mutating
/// call; `stored` is never modified, the new state is returned instead.
///
/// # Errors
///
/// - Gate failures (`UnsupportedVersion`, `VersionParse`,
///   `InvalidConfiguration`, `Conversion`) with no remote mutation.
/// - `RemoteCall` wrapping the first failing client call.
pub async fn reconcile_default_ingress<C>(
    client: &C,
    ctx: &IngressContext,
    stored: Option<&DefaultIngress>,
    intent: Option<&DefaultIngress>,
) -> Result<Reconciliation>
where
    C: IngressClient + ?Sized,
{
    let _span = ReconcileSpan::enter("default_ingress", &ctx.cluster_id);
    let cluster_id = ctx.cluster_id.as_str();

    let Some(intent) = intent else {
        if stored.is_none() {
            return Ok(Reconciliation::new(None, IngressAction::Noop));
        }
        let state = refresh_default_ingress(client, cluster_id, stored).await?;
        return Ok(Reconciliation::new(state, IngressAction::Retained));
    };

    let mut intent = intent.clone();
    intent.adopt_id(stored);
    validate_default_ingress(Some(&intent), &ctx.cluster_version, &ctx.policy)?;
    let creation = build_creation_request(&intent)?;

    // Stored state without an id was only implied by the parent; look the
    // ingress up before deciding between create and update.
    let current = match stored.filter(|s| s.has_id()) {
        Some(stored) => Some(stored.clone()),
        None => read_default_ingress(client, cluster_id).await?,
    };

    let Some(current) = current else {
        let created = client
            .create_ingress(cluster_id, &creation)
            .await
            .map_err(|e| remote_failure("create ingress", cluster_id, None, e))?;
        let Some(created_id) = created.id.as_deref().filter(|id| !id.is_empty()) else {
            return Err(missing_id("create ingress", cluster_id));
        };
        obs::emit_ingress_created(cluster_id, created_id);
        let state = DefaultIngress::fold_response(&created, &intent);
        return Ok(Reconciliation::new(Some(state), IngressAction::Created));
    };

    // An update can never target an unknown identifier.
    let Some(ingress_id) = to_native_string(&current.id).filter(|id| !id.is_empty()) else {
        return Err(missing_id("list ingresses", cluster_id));
    };
    let patch = diff_default_ingress(&current, &intent)?;
    let fields = patch.set_fields();
    if fields.is_empty() {
        obs::emit_ingress_unchanged(cluster_id);
        return Ok(Reconciliation::new(Some(current), IngressAction::Noop));
    }

    let updated = client
        .update_ingress(cluster_id, ingress_id, &patch)
        .await
        .map_err(|e| remote_failure("update ingress", cluster_id, Some(ingress_id), e))?;
    obs::emit_ingress_updated(cluster_id, ingress_id, &fields);
    Ok(Reconciliation::new(
        Some(DefaultIngress::fold_response(&updated, &intent)),
        IngressAction::Updated { fields },
    ))
}
