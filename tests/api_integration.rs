//! Integration tests for the PID Minter API.
//!
//! These tests spin up a real server instance and make HTTP requests to verify
//! the complete request/response cycle.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;
use regex::Regex;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::Barrier;

use pid_minter::api::{AppState, create_router};
use pid_minter::config::{
    AppConfig, AuthConfig, FileStorageConfig, ObservabilityConfig, StorageBackend, StorageConfig,
};
use pid_minter::storage::create_storage;

// ============================================================================
// Test Harness
// ============================================================================

const ADMIN_TOKEN: &str = "test_admin_token_12345";

/// Test server instance.
struct TestServer {
    addr: SocketAddr,
    client: Client,
    _temp_dir: TempDir,
}

impl TestServer {
    async fn new() -> Self {
        Self::with_backend(StorageBackend::Memory).await
    }

    async fn with_backend(backend: StorageBackend) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let config = AppConfig {
            storage: StorageConfig {
                backend,
                file: FileStorageConfig {
                    data_dir: temp_dir.path().to_path_buf(),
                },
            },
            auth: AuthConfig {
                admin_token: ADMIN_TOKEN.to_string(),
            },
            observability: ObservabilityConfig {
                log_level: "warn".to_string(),
                log_format: "text".to_string(),
                metrics_enabled: true,
            },
            ..Default::default()
        };

        let storage = create_storage(&config.storage)
            .await
            .expect("Failed to create storage");

        // Not installed globally; tests only check that the endpoint renders.
        let handle = PrometheusBuilder::new().build_recorder().handle();
        let state = AppState::new(Arc::new(config), storage).with_metrics(handle);
        let app = create_router(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server failed");
        });

        Self {
            addr,
            client: Client::new(),
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Request failed")
    }

    async fn get_admin(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .bearer_auth(ADMIN_TOKEN)
            .send()
            .await
            .expect("Request failed")
    }

    async fn put_with_token<T: Serialize>(&self, path: &str, token: &str, body: &T) -> Response {
        self.client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Request failed")
    }

    async fn put_admin<T: Serialize>(&self, path: &str, body: &T) -> Response {
        self.put_with_token(path, ADMIN_TOKEN, body).await
    }

    async fn post_admin<T: Serialize>(&self, path: &str, body: &T) -> Response {
        self.client
            .post(self.url(path))
            .bearer_auth(ADMIN_TOKEN)
            .json(body)
            .send()
            .await
            .expect("Request failed")
    }

    async fn mint(&self, query: &str) -> ApiResponse<MintData> {
        self.get(&format!("/v1/mint?{query}"))
            .await
            .json()
            .await
            .unwrap()
    }
}

/// API response structure.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    code: i32,
    message: String,
    data: Option<T>,
}

impl<T> ApiResponse<T> {
    fn is_success(&self) -> bool {
        self.code == 0
    }
}

#[derive(Debug, Deserialize)]
struct MintData {
    pids: Vec<String>,
    ordinal: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct CapacityData {
    usage_key: String,
    total: Option<u64>,
    consumed: u64,
    remaining: Option<u64>,
}

// ============================================================================
// Health Endpoint Tests
// ============================================================================

#[derive(Debug, Deserialize)]
struct HealthData {
    status: String,
}

#[derive(Debug, Deserialize)]
struct ReadyData {
    ready: bool,
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = TestServer::new().await;
    let response = server.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: ApiResponse<HealthData> = response.json().await.unwrap();
    assert!(body.is_success());
    assert_eq!(body.data.unwrap().status, "healthy");
}

#[tokio::test]
async fn test_ready_endpoint() {
    let server = TestServer::with_backend(StorageBackend::File).await;
    let response = server.get("/ready").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: ApiResponse<ReadyData> = response.json().await.unwrap();
    assert!(body.is_success());
    assert!(body.data.unwrap().ready);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let server = TestServer::new().await;
    let response = server.get("/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Minting Tests
// ============================================================================

#[tokio::test]
async fn test_sequential_mint_resumes() {
    let server = TestServer::new().await;
    let sequential = "random=false&token_type=DIGIT&root_length=5";

    let body = server.mint(&format!("amount=3&{sequential}")).await;
    assert!(body.is_success());
    let data = body.data.unwrap();
    assert_eq!(data.pids, ["00000", "00001", "00002"]);
    assert_eq!(data.ordinal, Some(3));

    let data = server
        .mint(&format!("amount=2&{sequential}"))
        .await
        .data
        .unwrap();
    assert_eq!(data.pids, ["00003", "00004"]);
    assert_eq!(data.ordinal, Some(5));
}

#[tokio::test]
async fn test_random_mint_consonants() {
    let server = TestServer::new().await;

    let data = server
        .mint("amount=21&token_type=LOWERCASE&root_length=1&sans_vowel=true")
        .await
        .data
        .unwrap();
    assert!(data.ordinal.is_none());

    let minted: HashSet<String> = data.pids.into_iter().collect();
    let consonants: HashSet<String> = "bcdfghjklmnpqrstvwxz"
        .chars()
        .chain(['y'])
        .map(String::from)
        .collect();
    assert_eq!(minted, consonants);
}

#[tokio::test]
async fn test_mint_with_prefix_and_prepend() {
    let server = TestServer::new().await;

    let data = server
        .mint("amount=1&random=false&prefix=xyz&prepend=ark:/&char_map=dl")
        .await
        .data
        .unwrap();
    assert_eq!(data.pids, ["ark:/xyz0b"]);
}

#[tokio::test]
async fn test_mint_defaults_to_one() {
    let server = TestServer::new().await;

    let data = server.mint("").await.data.unwrap();
    assert_eq!(data.pids.len(), 1);

    let shape = Regex::new(r"^[0-9]{5}$").unwrap();
    assert!(shape.is_match(&data.pids[0]));
}

#[tokio::test]
async fn test_non_positive_amount_mints_nothing() {
    let server = TestServer::new().await;

    for amount in [0, -3] {
        let body = server.mint(&format!("amount={amount}")).await;
        assert!(body.is_success());
        assert!(body.data.unwrap().pids.is_empty());
    }
}

#[tokio::test]
async fn test_not_enough_permutations() {
    let server = TestServer::new().await;
    let response = server
        .get("/v1/mint?amount=11&random=false&token_type=DIGIT&root_length=1")
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: ApiResponse<Value> = response.json().await.unwrap();
    assert_eq!(body.code, 1005);
    assert!(body.message.contains("only 10"));
    assert!(body.data.is_none());
}

#[tokio::test]
async fn test_amount_above_batch_limit() {
    let server = TestServer::new().await;
    let response = server.get("/v1/mint?amount=1001").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: ApiResponse<Value> = response.json().await.unwrap();
    assert_eq!(body.code, 3001);
}

#[tokio::test]
async fn test_invalid_char_map() {
    let server = TestServer::new().await;
    let response = server.get("/v1/mint?auto=false&char_map=dqd").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: ApiResponse<Value> = response.json().await.unwrap();
    assert_eq!(body.code, 1003);
}

// ============================================================================
// Setting Tests
// ============================================================================

#[tokio::test]
async fn test_get_default_setting() {
    let server = TestServer::new().await;
    let body: ApiResponse<Value> = server.get("/v1/settings").await.json().await.unwrap();
    assert!(body.is_success());

    let setting = body.data.unwrap();
    assert_eq!(setting["token_type"], "DIGIT");
    assert_eq!(setting["root_length"], 5);
    assert_eq!(setting["random"], true);
}

#[tokio::test]
async fn test_update_setting_drives_mint() {
    let server = TestServer::with_backend(StorageBackend::File).await;
    let setting = json!({
        "prepend": "",
        "prefix": "b",
        "token_type": "LOWER_EXTENDED",
        "char_map": "",
        "root_length": 2,
        "sans_vowel": true,
        "auto": true,
        "random": false
    });

    let response = server.put_admin("/v1/settings", &setting).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: ApiResponse<Value> = server.get("/v1/settings").await.json().await.unwrap();
    assert_eq!(body.data.unwrap()["prefix"], "b");

    let data = server.mint("amount=2").await.data.unwrap();
    assert_eq!(data.pids, ["b00", "b01"]);
}

#[tokio::test]
async fn test_update_invalid_setting() {
    let server = TestServer::new().await;
    let response = server
        .put_admin("/v1/settings", &json!({ "root_length": 0 }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: ApiResponse<Value> = response.json().await.unwrap();
    assert_eq!(body.code, 1003);
}

#[tokio::test]
async fn test_capacity_report() {
    let server = TestServer::new().await;
    let sequential = "random=false&token_type=DIGIT&root_length=3";
    server.mint(&format!("amount=7&{sequential}")).await;

    let body: ApiResponse<CapacityData> = server
        .get(&format!("/v1/settings/capacity?{sequential}"))
        .await
        .json()
        .await
        .unwrap();
    let report = body.data.unwrap();
    assert_eq!(report.usage_key, "|-|d.d.d");
    assert_eq!(report.total, Some(1000));
    assert_eq!(report.consumed, 7);
    assert_eq!(report.remaining, Some(993));

    // Digits have no vowels to exclude; the flag must not split the space.
    let body: ApiResponse<CapacityData> = server
        .get(&format!("/v1/settings/capacity?{sequential}&sans_vowel=false"))
        .await
        .json()
        .await
        .unwrap();
    let report = body.data.unwrap();
    assert_eq!(report.usage_key, "|-|d.d.d");
    assert_eq!(report.remaining, Some(993));
}

#[tokio::test]
async fn test_capacity_unbounded() {
    let server = TestServer::new().await;
    let body: ApiResponse<CapacityData> = server
        .get("/v1/settings/capacity?token_type=MIXED_EXTENDED&root_length=20")
        .await
        .json()
        .await
        .unwrap();
    let report = body.data.unwrap();
    assert_eq!(report.total, None);
    assert_eq!(report.remaining, None);
}

#[tokio::test]
async fn test_resume_after_existing_pid() {
    let server = TestServer::new().await;
    let response = server
        .post_admin(
            "/v1/settings/resume",
            &json!({
                "pid": "x0041",
                "prefix": "x",
                "token_type": "DIGIT",
                "root_length": 4,
                "random": false
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: ApiResponse<Value> = response.json().await.unwrap();
    assert_eq!(body.data.unwrap()["ordinal"], 42);

    let data = server
        .mint("amount=1&prefix=x&token_type=DIGIT&root_length=4&random=false")
        .await
        .data
        .unwrap();
    assert_eq!(data.pids, ["x0042"]);
}

#[tokio::test]
async fn test_resume_with_foreign_pid() {
    let server = TestServer::new().await;
    let response = server
        .post_admin(
            "/v1/settings/resume",
            &json!({ "pid": "zz", "prefix": "x" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: ApiResponse<Value> = response.json().await.unwrap();
    assert_eq!(body.code, 3003);
}

#[tokio::test]
async fn test_usage_listing() {
    let server = TestServer::new().await;
    server
        .mint("amount=4&random=false&token_type=DIGIT&root_length=2")
        .await;

    let body: ApiResponse<Vec<Value>> = server.get_admin("/v1/usage").await.json().await.unwrap();
    let usage = body.data.unwrap();
    assert_eq!(usage.len(), 1);
    assert_eq!(usage[0]["key"], "|-|d.d");
    assert_eq!(usage[0]["ordinal"], 4);
    assert_eq!(usage[0]["issued"], 4);
}

// ============================================================================
// Authentication Tests
// ============================================================================

#[tokio::test]
async fn test_update_setting_without_token() {
    let server = TestServer::new().await;
    let response = server
        .client
        .put(server.url("/v1/settings"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body: ApiResponse<Value> = response.json().await.unwrap();
    assert_eq!(body.code, 2001);
}

#[tokio::test]
async fn test_update_setting_with_wrong_token() {
    let server = TestServer::new().await;
    let response = server
        .put_with_token("/v1/settings", "invalid_token", &json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_usage_requires_admin() {
    let server = TestServer::new().await;
    let response = server.get("/v1/usage").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Concurrency Tests
// ============================================================================

#[tokio::test]
async fn test_concurrent_sequential_minting() {
    let server = Arc::new(TestServer::with_backend(StorageBackend::File).await);

    let num_tasks = 5;
    let batches_per_task = 4;
    let barrier = Arc::new(Barrier::new(num_tasks));

    let mut handles = Vec::new();
    for _ in 0..num_tasks {
        let server = Arc::clone(&server);
        let barrier = Arc::clone(&barrier);

        handles.push(tokio::spawn(async move {
            barrier.wait().await;

            let mut pids = Vec::new();
            for _ in 0..batches_per_task {
                let body = server
                    .mint("amount=5&random=false&token_type=DIGIT&root_length=4")
                    .await;
                pids.extend(body.data.unwrap().pids);
            }
            pids
        }));
    }

    let mut all = Vec::new();
    for handle in handles {
        all.extend(handle.await.expect("Task panicked"));
    }

    let unique: HashSet<&String> = all.iter().collect();
    assert_eq!(all.len(), 100);
    assert_eq!(unique.len(), all.len(), "All identifiers should be unique");
}

// ============================================================================
// Edge Case Tests
// ============================================================================

#[tokio::test]
async fn test_unknown_route() {
    let server = TestServer::new().await;
    let response = server.get("/unknown/route").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
