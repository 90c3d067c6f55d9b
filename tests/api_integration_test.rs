use formwire::adapters::api_service::ApiService;
use formwire::adapters::fixture_transport::{FixtureReply, FixtureRoute, FixtureTransport};
use formwire::config::HttpMethod;
use serde_json::json;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

const CATALOG: &str = r#"
conexResourceId: res-001
serviceName: userService
serviceTitle: User Service
endpoints:
  - name: getUser
    url: https://api.example.com/users/{id}
    method: GET
    requestSchema:
      id:
        required: true
        type: integer
  - name: listUsers
    url: https://api.example.com/users
    method: GET
    cache: true
  - name: flaky
    url: https://api.example.com/flaky
    method: GET
    retry: 3
  - name: echo
    url: https://api.example.com/echo
    method: POST
    mock: true
"#;

fn setup(routes: Vec<FixtureRoute>) -> (ApiService, FixtureTransport) {
    let transport = FixtureTransport::new(routes);
    let service = ApiService::from_yaml(CATALOG, Arc::new(transport.clone())).unwrap();
    (service, transport)
}

#[tokio::test]
async fn test_get_user_scenario() {
    let (service, transport) = setup(vec![FixtureRoute::new(
        HttpMethod::Get,
        "https://api.example.com/users/1",
        vec![FixtureReply::json(200, json!({ "id": 1, "name": "Ada" }))],
    )]);

    let result = service.get("getUser", json!({ "id": 1 }), None).await;
    assert!(result.success);
    assert_eq!(result.status, Some(200));
    assert_eq!(result.data, Some(json!({ "id": 1, "name": "Ada" })));
    assert_eq!(transport.request_count().await, 1);

    let result = service.get("getUser", json!({}), None).await;
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Validation failed: id is required"));
    assert!(result.status.is_none());
    // No dispatch for an invalid payload
    assert_eq!(transport.request_count().await, 1);
}

#[tokio::test]
async fn test_endpoint_lookup_is_exact() {
    let (service, transport) = setup(vec![]);
    assert!(service.endpoint("getUser").is_some());
    assert!(service.endpoint("getuser").is_none());

    let result = service.call("getuser", json!({ "id": 1 }), None).await;
    assert_eq!(result.error.as_deref(), Some("Endpoint 'getuser' not found"));
    assert_eq!(transport.request_count().await, 0);
}

#[tokio::test]
async fn test_retry_exhausts_all_attempts() {
    let (service, transport) = setup(vec![FixtureRoute::new(
        HttpMethod::Get,
        "https://api.example.com/flaky",
        vec![FixtureReply::fail("connection reset")],
    )]);

    let result = service.get("flaky", json!({}), None).await;
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Network error: connection reset"));
    assert!(result.status.is_none());
    assert_eq!(transport.request_count().await, 4);
}

#[tokio::test]
async fn test_retry_stops_at_first_success() {
    let (service, transport) = setup(vec![FixtureRoute::new(
        HttpMethod::Get,
        "https://api.example.com/flaky",
        vec![
            FixtureReply::fail("timeout"),
            FixtureReply::json(502, json!({ "message": "bad gateway" })),
            FixtureReply::json(200, json!({ "ok": true })),
        ],
    )]);

    let result = service.get("flaky", json!({}), None).await;
    assert!(result.success);
    assert_eq!(result.data, Some(json!({ "ok": true })));
    assert_eq!(transport.request_count().await, 3);
}

#[tokio::test]
async fn test_non_success_status_message() {
    let (service, _) = setup(vec![FixtureRoute::new(
        HttpMethod::Get,
        "https://api.example.com/users/9",
        vec![FixtureReply::Respond { status: 404, body: None }],
    )]);

    let result = service.get("getUser", json!({ "id": 9 }), None).await;
    assert!(!result.success);
    assert_eq!(result.status, Some(404));
    assert_eq!(result.error.as_deref(), Some("Request failed with status 404"));
}

#[tokio::test]
async fn test_success_without_json_body_degrades_to_empty_object() {
    let (service, _) = setup(vec![FixtureRoute::new(
        HttpMethod::Get,
        "https://api.example.com/users/2",
        vec![FixtureReply::Respond { status: 204, body: None }],
    )]);

    let result = service.get("getUser", json!({ "id": 2 }), None).await;
    assert!(result.success);
    assert_eq!(result.status, Some(204));
    assert_eq!(result.data, Some(json!({})));
}

#[tokio::test]
async fn test_cached_get_dispatches_once() {
    let (service, transport) = setup(vec![FixtureRoute::new(
        HttpMethod::Get,
        "https://api.example.com/users",
        vec![FixtureReply::json(200, json!([{ "id": 1 }]))],
    )]);

    let first = service.get("listUsers", json!({ "page": 1, "size": 10 }), None).await;
    // Same JSON, different member order
    let payload: serde_json::Value = serde_json::from_str(r#"{"size":10,"page":1}"#).unwrap();
    let second = service.get("listUsers", payload, None).await;

    assert_eq!(first, second);
    assert_eq!(transport.request_count().await, 1);
    assert_eq!(service.cache().len().await, 1);

    // A different payload is a different entry
    service.get("listUsers", json!({ "page": 2, "size": 10 }), None).await;
    assert_eq!(transport.request_count().await, 2);

    service.cache().clear().await;
    service.get("listUsers", json!({ "page": 1, "size": 10 }), None).await;
    assert_eq!(transport.request_count().await, 3);
}

#[tokio::test]
async fn test_mock_round_trip() {
    let (service, transport) = setup(vec![]);
    let result = service.post("echo", json!({ "msg": "hi" }), None).await;

    assert!(result.success);
    let data = result.data.unwrap();
    assert_eq!(data["mock"], json!(true));
    assert_eq!(data["endpoint"], json!("echo"));
    assert_eq!(data["payload"], json!({ "msg": "hi" }));
    assert_eq!(transport.request_count().await, 0);
}

#[tokio::test]
async fn test_completion_called_once_per_call() {
    let (service, _) = setup(vec![]);
    let calls = Arc::new(AtomicUsize::new(0));

    for name in ["echo", "getUser", "nope"] {
        let counter = calls.clone();
        service
            .call(
                name,
                json!({}),
                Some(Box::new(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                })),
            )
            .await;
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_fixture_file_from_disk() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("fixtures.yaml");
    fs::write(
        &path,
        r#"
routes:
  - url: https://api.example.com/users/5
    replies:
      - status: 200
        body: { id: 5 }
"#,
    )?;

    let transport = FixtureTransport::from_path(&path)?;
    let service = ApiService::from_yaml(CATALOG, Arc::new(transport))?;
    let result = service.get("getUser", json!({ "id": 5 }), None).await;
    assert_eq!(result.data, Some(json!({ "id": 5 })));
    Ok(())
}
