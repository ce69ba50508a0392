//! Validation gate for declared default ingress intent.
//!
//! Runs before any remote call. Rules are checked in a fixed order and the
//! first failure is returned.

use serde::{Deserialize, Serialize};

use super::state::DefaultIngress;
use crate::attr::{is_empty_string, to_native_string, Attr};
use crate::error::{ReconcileError, Result};
use crate::obs;
use crate::version::is_greater_or_equal;

/// Lowest cluster version that supports managing the default ingress.
pub const MIN_DEFAULT_INGRESS_VERSION: &str = "4.14.0-0";

pub const WILDCARDS_DISALLOWED: &str = "WildcardsDisallowed";
pub const WILDCARDS_ALLOWED: &str = "WildcardsAllowed";
pub const NAMESPACE_OWNERSHIP_STRICT: &str = "Strict";
pub const NAMESPACE_OWNERSHIP_INTER_NAMESPACE_ALLOWED: &str = "InterNamespaceAllowed";

/// Accepted versions and enumerated values for default ingress intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressPolicy {
    pub minimum_version: String,
    pub wildcard_policies: Vec<String>,
    pub namespace_ownership_policies: Vec<String>,
}

impl Default for IngressPolicy {
    fn default() -> Self {
        Self {
            minimum_version: MIN_DEFAULT_INGRESS_VERSION.to_string(),
            wildcard_policies: vec![
                WILDCARDS_DISALLOWED.to_string(),
                WILDCARDS_ALLOWED.to_string(),
            ],
            namespace_ownership_policies: vec![
                NAMESPACE_OWNERSHIP_STRICT.to_string(),
                NAMESPACE_OWNERSHIP_INTER_NAMESPACE_ALLOWED.to_string(),
            ],
        }
    }
}

/// Check declared intent against the cluster version and policy.
///
/// Absent intent always passes. The failure, if any, is logged before it is
/// returned.
pub fn validate_default_ingress(
    intent: Option<&DefaultIngress>,
    cluster_version: &str,
    policy: &IngressPolicy,
) -> Result<()> {
    let result = check(intent, cluster_version, policy);
    if let Err(err) = &result {
        obs::emit_validation_failed(err);
    }
    result
}

fn check(
    intent: Option<&DefaultIngress>,
    cluster_version: &str,
    policy: &IngressPolicy,
) -> Result<()> {
    let Some(intent) = intent else {
        return Ok(());
    };

    if !is_greater_or_equal(cluster_version, &policy.minimum_version)? {
        return Err(ReconcileError::UnsupportedVersion {
            version: cluster_version.to_string(),
            minimum: policy.minimum_version.clone(),
        });
    }

    let hostname_empty = is_empty_string(&intent.cluster_routes_hostname);
    let tls_empty = is_empty_string(&intent.cluster_routes_tls_secret_ref);

    if !intent.has_id() && (!hostname_empty || !tls_empty) {
        return Err(ReconcileError::InvalidConfiguration(
            "cluster_routes_hostname and cluster_routes_tls_secret_ref can't be set on \
             cluster creation"
                .to_string(),
        ));
    }

    if hostname_empty != tls_empty {
        return Err(ReconcileError::InvalidConfiguration(
            "cluster_routes_hostname and cluster_routes_tls_secret_ref must be set together"
                .to_string(),
        ));
    }

    if matches!(&intent.route_selectors, Attr::Value(selectors) if selectors.is_empty()) {
        return Err(ReconcileError::InvalidConfiguration(
            "route_selectors must contain at least one entry when set".to_string(),
        ));
    }

    if matches!(&intent.excluded_namespaces, Attr::Value(namespaces) if namespaces.is_empty()) {
        return Err(ReconcileError::InvalidConfiguration(
            "excluded_namespaces must contain at least one entry when set".to_string(),
        ));
    }

    check_allowed(
        "route_wildcard_policy",
        to_native_string(&intent.route_wildcard_policy),
        &policy.wildcard_policies,
    )?;
    check_allowed(
        "route_namespace_ownership_policy",
        to_native_string(&intent.route_namespace_ownership_policy),
        &policy.namespace_ownership_policies,
    )
}

fn check_allowed(attribute: &str, value: Option<&str>, allowed: &[String]) -> Result<()> {
    match value {
        Some(v) if !allowed.iter().any(|a| a == v) => {
            Err(ReconcileError::InvalidConfiguration(format!(
                "{} '{}' is not one of: {}",
                attribute,
                v,
                allowed.join(", ")
            )))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::Attr;

    fn with_routes(id: Option<&str>, hostname: &str, tls: &str) -> DefaultIngress {
        DefaultIngress {
            id: Attr::from_option(id.map(str::to_string)),
            cluster_routes_hostname: Attr::from(hostname),
            cluster_routes_tls_secret_ref: Attr::from(tls),
            ..Default::default()
        }
    }

    #[test]
    fn test_absent_intent_passes_any_version() {
        let policy = IngressPolicy::default();
        assert!(validate_default_ingress(None, "3.11.0", &policy).is_ok());
        assert!(validate_default_ingress(None, "garbage", &policy).is_ok());
    }

    #[test]
    fn test_version_below_minimum_is_rejected() {
        let intent = DefaultIngress::default();
        let err =
            validate_default_ingress(Some(&intent), "4.13.5", &IngressPolicy::default())
                .unwrap_err();
        match err {
            ReconcileError::UnsupportedVersion { version, minimum } => {
                assert_eq!(version, "4.13.5");
                assert_eq!(minimum, "4.14.0-0");
            }
            other => panic!("expected UnsupportedVersion, got {:?}", other),
        }
    }

    #[test]
    fn test_prerelease_of_minimum_is_accepted() {
        let intent = DefaultIngress::default();
        assert!(
            validate_default_ingress(Some(&intent), "4.14.0-rc.3", &IngressPolicy::default())
                .is_ok()
        );
    }

    #[test]
    fn test_unparseable_version_is_parse_error() {
        let intent = DefaultIngress::default();
        let err = validate_default_ingress(Some(&intent), "four", &IngressPolicy::default())
            .unwrap_err();
        assert!(matches!(err, ReconcileError::VersionParse(_)));
    }

    #[test]
    fn test_version_checked_before_other_rules() {
        let intent = DefaultIngress {
            cluster_routes_hostname: Attr::from("apps.example.com"),
            route_wildcard_policy: Attr::from("Sometimes"),
            ..Default::default()
        };
        let err = validate_default_ingress(Some(&intent), "4.12.0", &IngressPolicy::default())
            .unwrap_err();
        assert!(matches!(err, ReconcileError::UnsupportedVersion { .. }));
    }

    #[test]
    fn test_routes_rejected_on_creation() {
        let intent = with_routes(None, "apps.example.com", "secret");
        let err = validate_default_ingress(Some(&intent), "4.14.1", &IngressPolicy::default())
            .unwrap_err();
        assert!(err.to_string().contains("can't be set on cluster creation"));
    }

    #[test]
    fn test_routes_must_be_set_together() {
        let policy = IngressPolicy::default();

        let intent = with_routes(Some("i1"), "apps.example.com", "");
        let err = validate_default_ingress(Some(&intent), "4.14.1", &policy).unwrap_err();
        assert!(err.to_string().contains("must be set together"));

        let intent = DefaultIngress {
            id: Attr::from("i1"),
            cluster_routes_tls_secret_ref: Attr::from("secret"),
            ..Default::default()
        };
        let err = validate_default_ingress(Some(&intent), "4.14.1", &policy).unwrap_err();
        assert!(err.to_string().contains("must be set together"));
    }

    #[test]
    fn test_routes_accepted_with_id() {
        let intent = with_routes(Some("i1"), "apps.example.com", "secret");
        assert!(
            validate_default_ingress(Some(&intent), "4.14.1", &IngressPolicy::default()).is_ok()
        );
    }

    #[test]
    fn test_known_empty_collections_are_rejected() {
        let policy = IngressPolicy::default();

        let intent = DefaultIngress {
            route_selectors: Attr::Value(Default::default()),
            ..Default::default()
        };
        let err = validate_default_ingress(Some(&intent), "4.14.1", &policy).unwrap_err();
        assert!(err.to_string().contains("route_selectors"));

        let intent = DefaultIngress {
            excluded_namespaces: Attr::Value(vec![]),
            ..Default::default()
        };
        let err = validate_default_ingress(Some(&intent), "4.14.1", &policy).unwrap_err();
        assert!(err.to_string().contains("excluded_namespaces"));

        for intent in [
            DefaultIngress::default(),
            DefaultIngress {
                route_selectors: Attr::Unknown,
                excluded_namespaces: Attr::Unknown,
                ..Default::default()
            },
        ] {
            assert!(validate_default_ingress(Some(&intent), "4.14.1", &policy).is_ok());
        }
    }

    #[test]
    fn test_policy_values_are_enumerated() {
        let policy = IngressPolicy::default();

        let intent = DefaultIngress {
            route_wildcard_policy: Attr::from("WildcardsSometimes"),
            ..Default::default()
        };
        let err = validate_default_ingress(Some(&intent), "4.14.1", &policy).unwrap_err();
        assert!(err.to_string().contains("route_wildcard_policy"));

        let intent = DefaultIngress {
            route_wildcard_policy: Attr::from(WILDCARDS_ALLOWED),
            route_namespace_ownership_policy: Attr::from("Loose"),
            ..Default::default()
        };
        let err = validate_default_ingress(Some(&intent), "4.14.1", &policy).unwrap_err();
        assert!(err.to_string().contains("route_namespace_ownership_policy"));

        let intent = DefaultIngress {
            route_wildcard_policy: Attr::Unknown,
            route_namespace_ownership_policy: Attr::from(NAMESPACE_OWNERSHIP_STRICT),
            ..Default::default()
        };
        assert!(validate_default_ingress(Some(&intent), "4.14.1", &policy).is_ok());
    }
}
