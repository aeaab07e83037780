//! End-to-end workflow tests over HTTP against a mock control plane.

use std::sync::Arc;

use dbforge_client::{ClientConfig, HttpControlPlaneClient};
use dbforge_control::{
    Action, Command, CommandResult, ControlError, DestroyOutcome, ProvisionRequest,
    ProvisionStage, ProvisionerConfig, WaitConfig,
};
use dbforge_core::{ClusterName, StepOutcome};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> Arc<HttpControlPlaneClient> {
    let config = ClientConfig::new("test-token").with_base_url(format!("{}/v2", server.uri()));
    Arc::new(HttpControlPlaneClient::new(&config).unwrap())
}

fn request() -> ProvisionRequest {
    ProvisionRequest {
        cluster_name: ClusterName::new("orders").unwrap(),
        region: "nyc1".to_string(),
        database: "orders".to_string(),
        user: "app".to_string(),
        allowed_source: "203.0.113.7".to_string(),
    }
}

fn fast_config() -> ProvisionerConfig {
    ProvisionerConfig {
        wait: WaitConfig {
            interval_seconds: 1,
            timeout_seconds: Some(10),
            max_attempts: None,
        },
        ..Default::default()
    }
}

fn listing(status: &str) -> Value {
    json!({
        "databases": [
            {"id": "c-0", "name": "billing", "status": "online", "engine": "pg", "region": "ams3"},
            {"id": "c-1", "name": "orders", "status": status, "engine": "mysql", "region": "nyc1",
             "created_at": "2024-03-01T10:00:00Z"}
        ],
        "meta": {"total": 2}
    })
}

async fn mount_list(server: &MockServer, body: Value, times: Option<u64>) {
    let mock = Mock::given(method("GET"))
        .and(path("/v2/databases/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body));
    match times {
        Some(n) => mock.up_to_n_times(n).mount(server).await,
        None => mock.mount(server).await,
    }
}

async fn mount_steps(server: &MockServer, status: u16) {
    for (verb, route) in [
        ("POST", "/v2/databases"),
        ("PUT", "/v2/databases/c-1/firewall"),
        ("POST", "/v2/databases/c-1/dbs"),
        ("POST", "/v2/databases/c-1/users"),
    ] {
        Mock::given(method(verb))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({})))
            .expect(1)
            .mount(server)
            .await;
    }
}

async fn mutations(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() != "GET")
        .map(|r| format!("{} {}", r.method, r.url.path()))
        .collect()
}

#[tokio::test]
async fn fresh_cluster_is_fully_provisioned() {
    let server = MockServer::start().await;
    mount_list(&server, listing("creating"), Some(1)).await;
    mount_list(&server, listing("online"), None).await;
    mount_steps(&server, 201).await;

    let output = Command::new(Action::Create, request())
        .execute(client_for(&server), &fast_config(), &CancellationToken::new())
        .await
        .unwrap();

    let CommandResult::Provisioned(report) = &output.result else {
        panic!("expected a provision report, got {:?}", output.result);
    };
    assert!(report.changed());
    assert_eq!(report.stage, ProvisionStage::Complete);
    assert_eq!(report.wait.as_ref().unwrap().attempts, 2);
    assert_eq!(
        mutations(&server).await,
        vec![
            "POST /v2/databases",
            "PUT /v2/databases/c-1/firewall",
            "POST /v2/databases/c-1/dbs",
            "POST /v2/databases/c-1/users",
        ]
    );
    let written: Value = serde_json::from_str(&output.to_json()).unwrap();
    assert_eq!(written, listing("online"));
}

#[tokio::test]
async fn existing_cluster_continues_with_resolved_id() {
    let server = MockServer::start().await;
    mount_list(&server, listing("online"), None).await;
    Mock::given(method("POST"))
        .and(path("/v2/databases"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(json!({"id": "unprocessable_entity", "message": "name already exists"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v2/databases/c-1/firewall"))
        .and(body_json(json!({"rules": [{"type": "ip_addr", "value": "203.0.113.7"}]})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/databases/c-1/dbs"))
        .respond_with(ResponseTemplate::new(422))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/databases/c-1/users"))
        .and(body_json(json!({
            "name": "app",
            "mysql_settings": {"auth_plugin": "mysql_native_password"}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"user": {"name": "app"}})))
        .expect(1)
        .mount(&server)
        .await;

    let output = Command::new(Action::Create, request())
        .execute(client_for(&server), &fast_config(), &CancellationToken::new())
        .await
        .unwrap();

    let CommandResult::Provisioned(report) = &output.result else {
        panic!("expected a provision report, got {:?}", output.result);
    };
    assert_eq!(report.cluster, StepOutcome::AlreadyExists);
    assert_eq!(report.existing_cluster.as_ref().unwrap()["id"], "c-1");
    assert_eq!(report.firewall, StepOutcome::Created { payload: Value::Null });
    assert_eq!(report.database, StepOutcome::AlreadyExists);
    assert!(report.user.is_created());
}

#[tokio::test]
async fn create_twice_converges() {
    let server = MockServer::start().await;
    mount_list(&server, listing("online"), None).await;
    mount_steps(&server, 201).await;

    let client = client_for(&server);
    let first = Command::new(Action::Create, request())
        .execute(Arc::clone(&client), &fast_config(), &CancellationToken::new())
        .await
        .unwrap();
    assert!(first.changed());

    // Everything exists now.
    server.reset().await;
    mount_list(&server, listing("online"), None).await;
    mount_steps(&server, 422).await;

    let second = Command::new(Action::Create, request())
        .execute(client, &fast_config(), &CancellationToken::new())
        .await
        .unwrap();
    assert!(!second.changed());
    assert_eq!(mutations(&server).await.len(), 4);
}

#[tokio::test]
async fn destroy_of_absent_cluster_returns_full_list() {
    let server = MockServer::start().await;
    mount_list(&server, listing("online"), None).await;
    Mock::given(method("DELETE"))
        .and(path("/v2/databases/c-1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"id": "not_found"})))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    for _ in 0..2 {
        let output = Command::new(Action::Destroy, request())
            .execute(Arc::clone(&client), &fast_config(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            output.result,
            CommandResult::Destroyed {
                outcome: DestroyOutcome::NoOp,
                status: Some(404),
            }
        );
        assert_eq!(output.clusters.len(), 2);
        let written: Value = serde_json::from_str(&output.to_json()).unwrap();
        assert_eq!(written, listing("online"));
    }
}

#[tokio::test]
async fn cluster_stuck_creating_times_out() {
    let server = MockServer::start().await;
    mount_list(&server, listing("creating"), None).await;
    Mock::given(method("POST"))
        .and(path("/v2/databases"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let config = ProvisionerConfig {
        wait: WaitConfig {
            interval_seconds: 1,
            timeout_seconds: None,
            max_attempts: Some(2),
        },
        ..Default::default()
    };
    let err = Command::new(Action::Create, request())
        .execute(client_for(&server), &config, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ControlError::WaitTimeout { attempts: 2, .. }));
    assert_eq!(err.exit_code(), 5);
    assert_eq!(mutations(&server).await, vec!["POST /v2/databases"]);
}

#[tokio::test]
async fn unreachable_control_plane_is_a_transport_failure() {
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let config = ClientConfig::new("test-token").with_base_url(format!("http://{addr}/v2"));
    let client = Arc::new(HttpControlPlaneClient::new(&config).unwrap());

    let err = Command::new(Action::Info, request())
        .execute(client, &fast_config(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.is_transport_failure());
    assert_eq!(err.exit_code(), 3);
}
