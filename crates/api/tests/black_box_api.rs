use gymjobs_api::app::{AppState, build_app};
use gymjobs_api::bootstrap::bootstrap;
use gymjobs_api::config::ServeConfig;
use gymjobs_api::services::{Membership, Services};
use reqwest::StatusCode;
use serde_json::{Value, json};

struct TestServer {
    base_url: String,
    services: Services,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same bootstrap as prod, but bound to an ephemeral port.
        let config = ServeConfig {
            retry_base: std::time::Duration::ZERO,
            ..ServeConfig::default()
        };
        let services = Services::in_memory();
        let booted = bootstrap(&config, services.clone()).expect("bootstrap failed");
        let app = build_app(AppState::new(config.app_id, booted));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            services,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn health_is_ok() {
    let srv = TestServer::spawn().await;

    let res = reqwest::get(srv.url("/health")).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn introspection_lists_every_registered_function() {
    let srv = TestServer::spawn().await;

    let res = reqwest::get(srv.url("/api/jobs")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();

    assert_eq!(body["app_id"], "gym-app");
    assert_eq!(body["count"], 3);
    let functions = body["functions"].as_array().unwrap();
    let ids: Vec<_> = functions.iter().map(|f| f["id"].as_str().unwrap()).collect();
    assert_eq!(ids, ["send-welcome-email", "update-check-in-streak", "expire-memberships"]);

    let welcome = &functions[0];
    assert_eq!(welcome["handle"], "gym-app-send-welcome-email");
    assert_eq!(welcome["trigger"]["event"], "user.created");
    assert_eq!(welcome["trigger"]["if"], "event.data.role == \"member\"");
    assert_eq!(welcome["retries"], 3);

    let sweep = &functions[2];
    assert_eq!(sweep["trigger"]["kind"], "cron");
    assert_eq!(sweep["concurrency"], 1);
    assert_eq!(functions[1]["rate_limit"]["key"], "event.data.member_id");
}

#[tokio::test]
async fn invoke_runs_one_attempt_and_returns_steps() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/jobs/send-welcome-email"))
        .json(&json!({
            "event": {
                "name": "user.created",
                "data": { "user_id": "u-1", "email": "ana@example.com", "role": "member" }
            },
            "attempt": 0
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["output"], json!({ "user_id": "u-1", "sent": true }));
    assert!(body["steps"].get("send-email").is_some());
    assert_eq!(srv.services.outbox.sent().len(), 1);
}

#[tokio::test]
async fn completed_steps_are_not_repeated() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/jobs/send-welcome-email"))
        .json(&json!({
            "event": {
                "name": "user.created",
                "data": { "user_id": "u-2", "email": "bo@example.com" }
            },
            "attempt": 1,
            "steps": { "send-email": null }
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(srv.services.outbox.sent().is_empty());
}

#[tokio::test]
async fn handler_failure_maps_to_500_with_message() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/jobs/send-welcome-email"))
        .json(&json!({ "event": { "name": "user.created", "data": { "user_id": "u-3" } } }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("missing field `email`"));
}

#[tokio::test]
async fn unknown_function_and_bad_body() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/jobs/no-such-job"))
        .json(&json!({ "event": { "name": "x" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .post(srv.url("/api/jobs/send-welcome-email"))
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn events_are_routed_through_the_runtime() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/events"))
        .json(&json!({
            "name": "user.created",
            "data": { "user_id": "u-4", "email": "staff@example.com", "role": "staff" }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert!(body["runs"].as_array().unwrap().is_empty());

    for expected in ["completed", "rate_limited"] {
        let res = client
            .post(srv.url("/api/events"))
            .json(&json!({ "name": "member.checked_in", "data": { "member_id": "m-1" } }))
            .send()
            .await
            .unwrap();
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["runs"][0]["status"], expected);
    }
    assert_eq!(srv.services.members.streak("m-1"), 1);
}

#[tokio::test]
async fn tick_runs_the_nightly_sweep() {
    let srv = TestServer::spawn().await;
    srv.services.members.upsert(Membership {
        member_id: "m-9".into(),
        email: "lapsed@example.com".into(),
        expires_on: "2020-01-01".parse().unwrap(),
        active: true,
    });

    let res = reqwest::Client::new()
        .post(srv.url("/api/jobs/expire-memberships/tick"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["run"]["status"], "completed");
    assert_eq!(body["run"]["output"], json!({ "expired": 1 }));
    assert_eq!(srv.services.outbox.sent()[0].template, "membership-expired");
}
