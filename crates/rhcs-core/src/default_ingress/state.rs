//! Declared and stored shape of a cluster's default ingress.

use rhcs_client::Ingress;
use serde::{Deserialize, Serialize};

use crate::attr::{
    from_optional_list, from_optional_map, from_optional_string, is_empty_string, Attr, ListAttr,
    MapAttr, StringAttr,
};

/// Default ingress attributes, used both for declared intent and stored state.
///
/// # Invariants
///
/// In stored state, `id` is empty exactly when the ingress has never been
/// confirmed to exist remotely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultIngress {
    pub id: StringAttr,
    pub route_selectors: MapAttr,
    pub excluded_namespaces: ListAttr,
    pub route_wildcard_policy: StringAttr,
    pub route_namespace_ownership_policy: StringAttr,
    pub cluster_routes_hostname: StringAttr,
    pub cluster_routes_tls_secret_ref: StringAttr,
}

impl DefaultIngress {
    /// Stored state as reported by the API.
    ///
    /// Fields the API omits become null; an empty collection stays empty.
    pub fn from_remote(ingress: &Ingress) -> Self {
        Self {
            id: from_optional_string(ingress.id.as_deref()),
            route_selectors: from_optional_map(ingress.route_selectors.as_ref()),
            excluded_namespaces: from_optional_list(ingress.excluded_namespaces.as_deref()),
            route_wildcard_policy: from_optional_string(ingress.route_wildcard_policy.as_deref()),
            route_namespace_ownership_policy: from_optional_string(
                ingress.route_namespace_ownership_policy.as_deref(),
            ),
            cluster_routes_hostname: from_optional_string(
                ingress.cluster_routes_hostname.as_deref(),
            ),
            cluster_routes_tls_secret_ref: from_optional_string(
                ingress.cluster_routes_tls_secret_ref.as_deref(),
            ),
        }
    }

    /// Stored state after a create or update answered with `response`.
    ///
    /// Values come from the response. The API reports an omitted collection
    /// as empty, so an empty collection whose intent was null is kept null.
    pub fn fold_response(response: &Ingress, intent: &DefaultIngress) -> Self {
        let mut state = Self::from_remote(response);
        if intent.route_selectors.is_null() && is_empty_collection(&state.route_selectors) {
            state.route_selectors = Attr::Null;
        }
        if intent.excluded_namespaces.is_null() && is_empty_collection(&state.excluded_namespaces)
        {
            state.excluded_namespaces = Attr::Null;
        }
        state
    }

    /// Whether the remote identifier is known.
    pub fn has_id(&self) -> bool {
        !is_empty_string(&self.id)
    }

    /// Carry a known stored id into intent that leaves it unset.
    ///
    /// The id is computed by the API; intent never chooses it.
    pub fn adopt_id(&mut self, stored: Option<&DefaultIngress>) {
        if self.has_id() {
            return;
        }
        if let Some(stored) = stored.filter(|s| s.has_id()) {
            self.id = stored.id.clone();
        }
    }
}

fn is_empty_collection<C>(value: &Attr<C>) -> bool
where
    for<'a> &'a C: IntoIterator,
{
    value
        .as_value()
        .map_or(false, |c| c.into_iter().next().is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_from_remote_keeps_empty_selectors_explicit() {
        let remote = Ingress {
            id: Some("i1".to_string()),
            default: Some(true),
            route_selectors: Some(BTreeMap::new()),
            ..Default::default()
        };
        let state = DefaultIngress::from_remote(&remote);
        assert_eq!(state.id, Attr::from("i1"));
        assert_eq!(state.route_selectors, Attr::Value(BTreeMap::new()));
        assert_eq!(state.excluded_namespaces, Attr::Null);
        assert_eq!(state.cluster_routes_hostname, Attr::Null);
    }

    #[test]
    fn test_fold_response_keeps_null_intent_null() {
        let remote = Ingress {
            id: Some("i1".to_string()),
            route_selectors: Some(BTreeMap::new()),
            excluded_namespaces: Some(vec![]),
            route_wildcard_policy: Some("WildcardsDisallowed".to_string()),
            ..Default::default()
        };
        let intent = DefaultIngress {
            excluded_namespaces: Attr::Value(vec![]),
            ..Default::default()
        };
        let state = DefaultIngress::fold_response(&remote, &intent);
        assert_eq!(state.route_selectors, Attr::Null);
        assert_eq!(state.excluded_namespaces, Attr::Value(vec![]));
        assert_eq!(state.route_wildcard_policy, Attr::from("WildcardsDisallowed"));
    }

    #[test]
    fn test_adopt_id_only_fills_missing_id() {
        let stored = DefaultIngress {
            id: Attr::from("i1"),
            ..Default::default()
        };

        let mut intent = DefaultIngress::default();
        intent.adopt_id(Some(&stored));
        assert_eq!(intent.id, Attr::from("i1"));

        let mut intent = DefaultIngress {
            id: Attr::Unknown,
            ..Default::default()
        };
        intent.adopt_id(None);
        assert!(intent.id.is_unknown());

        let mut intent = DefaultIngress {
            id: Attr::from("other"),
            ..Default::default()
        };
        intent.adopt_id(Some(&stored));
        assert_eq!(intent.id, Attr::from("other"));
    }

    #[test]
    fn test_state_store_round_trip() {
        let mut selectors = BTreeMap::new();
        selectors.insert("route".to_string(), "external".to_string());
        let state = DefaultIngress::from_remote(&Ingress {
            id: Some("i1".to_string()),
            route_selectors: Some(selectors),
            excluded_namespaces: Some(vec!["b".to_string(), "a".to_string()]),
            route_namespace_ownership_policy: Some("Strict".to_string()),
            ..Default::default()
        });

        let json = serde_json::to_string(&state).unwrap();
        let back: DefaultIngress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
