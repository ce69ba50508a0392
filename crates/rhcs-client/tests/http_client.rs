//! HttpClustersApi tests against a local mock server.

use rhcs_client::{
    ApiError, ClusterClient, ClusterState, GroupMembershipClient, HttpClustersApi, Ingress,
    IngressClient, User,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CLUSTER_PATH: &str = "/api/clusters_mgmt/v1/clusters/c1";

#[tokio::test]
async fn get_cluster_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CLUSTER_PATH))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "Cluster",
            "id": "c1",
            "name": "prod",
            "state": "installing",
            "version": { "raw_id": "4.14.0" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpClustersApi::new(&server.uri(), Some("secret-token")).unwrap();
    let cluster = api.get_cluster("c1").await.unwrap();

    assert_eq!(cluster.state, ClusterState::Installing);
    assert_eq!(cluster.name.as_deref(), Some("prod"));
    assert_eq!(cluster.raw_version(), Some("4.14.0"));
}

#[tokio::test]
async fn list_ingresses_unwraps_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/ingresses", CLUSTER_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "IngressList",
            "page": 1,
            "size": 2,
            "total": 2,
            "items": [
                { "id": "a1", "default": true, "route_selectors": {} },
                { "id": "b2", "default": false }
            ]
        })))
        .mount(&server)
        .await;

    let api = HttpClustersApi::new(&server.uri(), None).unwrap();
    let items = api.list_ingresses("c1").await.unwrap();

    assert_eq!(items.len(), 2);
    assert!(items[0].is_default());
    assert_eq!(items[0].route_selectors, Some(Default::default()));
    assert_eq!(items[1].route_selectors, None);
}

#[tokio::test]
async fn update_ingress_patches_with_partial_body() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(format!("{}/ingresses/a1", CLUSTER_PATH)))
        .and(body_json(json!({ "route_wildcard_policy": "WildcardsAllowed" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "a1",
            "default": true,
            "route_wildcard_policy": "WildcardsAllowed"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpClustersApi::new(&server.uri(), None).unwrap();
    let patch = Ingress {
        route_wildcard_policy: Some("WildcardsAllowed".to_string()),
        ..Default::default()
    };
    let updated = api.update_ingress("c1", "a1", &patch).await.unwrap();

    assert_eq!(updated.id.as_deref(), Some("a1"));
    assert_eq!(updated.route_wildcard_policy.as_deref(), Some("WildcardsAllowed"));
}

#[tokio::test]
async fn not_found_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CLUSTER_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let api = HttpClustersApi::new(&server.uri(), None).unwrap();
    let err = api.get_cluster("c1").await.unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn error_reason_is_extracted_from_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}/groups/dedicated-admins/users", CLUSTER_PATH)))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "kind": "Error",
            "id": "400",
            "code": "CLUSTERS-MGMT-400",
            "reason": "User name is invalid"
        })))
        .mount(&server)
        .await;

    let api = HttpClustersApi::new(&server.uri(), None).unwrap();
    let err = api
        .add_user("c1", "dedicated-admins", &User::new("bad name"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ApiError::Status {
            code: 400,
            reason: "User name is invalid".to_string()
        }
    );
}

#[tokio::test]
async fn malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CLUSTER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let api = HttpClustersApi::new(&server.uri(), None).unwrap();
    let err = api.get_cluster("c1").await.unwrap_err();

    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn delete_user_accepts_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{}/groups/dedicated-admins/users/alice", CLUSTER_PATH)))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpClustersApi::new(&server.uri(), None).unwrap();
    api.delete_user("c1", "dedicated-admins", "alice")
        .await
        .unwrap();
}
