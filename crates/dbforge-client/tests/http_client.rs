//! HTTP-level tests for `HttpControlPlaneClient` against a mock server.

use dbforge_client::{ClientConfig, ClientError, ControlPlaneClient, HttpControlPlaneClient, Method};
use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpControlPlaneClient {
    let config = ClientConfig::new("test-token").with_base_url(format!("{}/v2", server.uri()));
    HttpControlPlaneClient::new(&config).unwrap()
}

#[tokio::test]
async fn get_sends_bearer_token_without_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/databases/"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"databases": []})))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server)
        .request(Method::Get, "/databases/", None)
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.json::<serde_json::Value>().unwrap(), json!({"databases": []}));

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("content-type").is_none());
    assert!(requests[0].body.is_empty());
}

#[tokio::test]
async fn post_sends_json_body() {
    let server = MockServer::start().await;
    let body = json!({"name": "app"});
    Mock::given(method("POST"))
        .and(path("/v2/databases/abc/dbs"))
        .and(header("authorization", "Bearer test-token"))
        .and(header("content-type", "application/json"))
        .and(body_json(&body))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"db": {"name": "app"}})))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server)
        .request(Method::Post, "/databases/abc/dbs", Some(&body))
        .await
        .unwrap();

    assert_eq!(response.status, 201);
    assert_eq!(response.payload()["db"]["name"], "app");
}

#[tokio::test]
async fn put_and_delete_use_their_verbs() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v2/databases/abc/firewall"))
        .and(header_exists("content-type"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v2/databases/abc"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let rules = json!({"rules": [{"type": "ip_addr", "value": "10.0.0.1"}]});
    let put = client
        .request(Method::Put, "/databases/abc/firewall", Some(&rules))
        .await
        .unwrap();
    let delete = client
        .request(Method::Delete, "/databases/abc", None)
        .await
        .unwrap();

    assert_eq!(put.status, 204);
    assert_eq!(delete.status, 204);
    assert!(delete.body.is_empty());
}

#[tokio::test]
async fn error_statuses_are_returned_not_raised() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/databases"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "id": "unprocessable_entity",
            "message": "cluster name is not available"
        })))
        .mount(&server)
        .await;

    let response = client_for(&server)
        .request(Method::Post, "/databases", Some(&json!({"name": "orders"})))
        .await
        .unwrap();

    assert_eq!(response.status, 422);
    assert!(response.body.contains("not available"));
}

#[tokio::test]
async fn unreachable_server_is_transport_failure() {
    // Bind then release a port so nothing is listening on it.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ClientConfig::new("test-token").with_base_url(format!("http://{addr}/v2"));
    let client = HttpControlPlaneClient::new(&config).unwrap();

    let err = client
        .request(Method::Get, "/databases/", None)
        .await
        .unwrap_err();

    match &err {
        ClientError::Transport { method, path, .. } => {
            assert_eq!(*method, Method::Get);
            assert_eq!(path, "/databases/");
        }
        other => panic!("expected transport failure, got {other:?}"),
    }
    assert!(err.is_retriable());
}
