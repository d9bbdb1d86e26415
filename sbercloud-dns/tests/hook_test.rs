//! Integration tests for the SberCloud DNS client against a mock API server.

use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sbercloud_dns::{ApiError, Endpoints, SberCloudDns};

const CHALLENGE: &str = "pW9ZKG0xV_PCsUzRTXH0DYbieolMBanntse4HNE3Xls";

async fn client_for(server: &MockServer) -> SberCloudDns {
    SberCloudDns::builder("test-ak".to_string(), "test-sk".to_string())
        .endpoints(Endpoints {
            iam: server.uri(),
            dns: server.uri(),
        })
        .max_retries(0)
        .build()
        .expect("client builds against mock endpoints")
}

fn zone_item(id: &str, name: &str, status: &str) -> serde_json::Value {
    json!({ "id": id, "name": name, "status": status })
}

// ---- project lookup ----

#[tokio::test]
async fn find_project_id_matches_enabled_project() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "projects": [
                { "id": "p-disabled", "name": "production", "enabled": false },
                { "id": "p-other", "name": "staging", "enabled": true },
                { "id": "p-match", "name": "production", "enabled": true },
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dns = client_for(&server).await;
    let id = dns.find_project_id("production").await.unwrap();
    assert_eq!(id, "p-match");
}

#[tokio::test]
async fn find_project_id_reports_missing_project() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "projects": [
                { "id": "p-1", "name": "production", "enabled": false },
            ]
        })))
        .mount(&server)
        .await;

    let dns = client_for(&server).await;
    let err = dns.find_project_id("production").await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "no active project named 'production' found"
    );
    assert!(err.is_expected());
}

// ---- zone lookup ----

#[tokio::test]
async fn find_zone_id_matches_active_zone() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/zones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "zones": [
                zone_item("z-pending", "example.com.", "PENDING_CREATE"),
                zone_item("z-other", "other.com.", "ACTIVE"),
                zone_item("z-match", "example.com.", "ACTIVE"),
            ],
            "metadata": { "total_count": 3 }
        })))
        .mount(&server)
        .await;

    let dns = client_for(&server).await;
    // Name given without the trailing dot still matches.
    let id = dns.find_zone_id("example.com").await.unwrap();
    assert_eq!(id, "z-match");
}

#[tokio::test]
async fn find_zone_id_pages_until_match() {
    let server = MockServer::start().await;

    let mut first_page: Vec<serde_json::Value> = Vec::new();
    for i in 0..500 {
        first_page.push(zone_item(&format!("z-{i}"), &format!("filler{i}.com."), "ACTIVE"));
    }

    Mock::given(method("GET"))
        .and(path("/v2/zones"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "zones": first_page,
            "metadata": { "total_count": 501 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/zones"))
        .and(query_param("offset", "500"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "zones": [zone_item("z-last", "example.com.", "ACTIVE")],
            "metadata": { "total_count": 501 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dns = client_for(&server).await;
    let id = dns.find_zone_id("example.com.").await.unwrap();
    assert_eq!(id, "z-last");
}

#[tokio::test]
async fn find_zone_id_reports_missing_zone_without_dot() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/zones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "zones": [],
            "metadata": { "total_count": 0 }
        })))
        .mount(&server)
        .await;

    let dns = client_for(&server).await;
    let err = dns.find_zone_id("example.com.").await.unwrap_err();
    assert_eq!(err.to_string(), "no active 'example.com' zone found");
}

// ---- record lookup ----

#[tokio::test]
async fn find_txt_record_requires_exact_value_set() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/zones/z-1/recordsets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "recordsets": [
                {
                    "id": "r-wrong-type",
                    "name": "_acme-challenge.example.com.",
                    "type": "A",
                    "records": ["1.2.3.4"],
                    "status": "ACTIVE"
                },
                {
                    "id": "r-extra-value",
                    "name": "_acme-challenge.example.com.",
                    "type": "TXT",
                    "records": [format!("\"{CHALLENGE}\""), "\"stale-value\""],
                    "status": "ACTIVE"
                },
                {
                    "id": "r-match",
                    "name": "_acme-challenge.example.com.",
                    "type": "TXT",
                    "records": [format!("\"{CHALLENGE}\"")],
                    "status": "ACTIVE"
                },
            ],
            "metadata": { "total_count": 3 }
        })))
        .mount(&server)
        .await;

    let dns = client_for(&server).await;
    let id = dns
        .find_txt_record("z-1", "_acme-challenge.example.com.", CHALLENGE)
        .await
        .unwrap();
    assert_eq!(id, "r-match");
}

#[tokio::test]
async fn find_txt_record_ignores_unquoted_value() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/zones/z-1/recordsets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "recordsets": [
                {
                    "id": "r-unquoted",
                    "name": "_acme-challenge.example.com.",
                    "type": "TXT",
                    "records": [CHALLENGE],
                    "status": "ACTIVE"
                },
            ],
            "metadata": { "total_count": 1 }
        })))
        .mount(&server)
        .await;

    let dns = client_for(&server).await;
    let err = dns
        .find_txt_record("z-1", "_acme-challenge.example.com.", CHALLENGE)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        format!(
            "no active record '_acme-challenge.example.com.' of type 'TXT' with value '{CHALLENGE}' found"
        )
    );
}

// ---- present ----

#[tokio::test]
async fn present_posts_quoted_txt_record() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/zones/z-1/recordsets"))
        .and(body_json(json!({
            "name": "_acme-challenge.example.com.",
            "type": "TXT",
            "records": [format!("\"{CHALLENGE}\"")],
            "ttl": 300
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "id": "r-new",
            "status": "PENDING_CREATE"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dns = client_for(&server).await;
    let id = dns
        .present("z-1", "_acme-challenge.example.com.", CHALLENGE)
        .await
        .unwrap();
    assert_eq!(id, "r-new");
}

// ---- cleanup ----

#[tokio::test]
async fn cleanup_deletes_the_matching_record() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/zones/z-1/recordsets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "recordsets": [
                {
                    "id": "r-1",
                    "name": "_acme-challenge.example.com.",
                    "type": "TXT",
                    "records": [format!("\"{CHALLENGE}\"")],
                    "status": "ACTIVE"
                },
            ],
            "metadata": { "total_count": 1 }
        })))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/v2/zones/z-1/recordsets/r-1"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "id": "r-1",
            "status": "PENDING_DELETE"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dns = client_for(&server).await;
    dns.cleanup("z-1", "_acme-challenge.example.com.", CHALLENGE)
        .await
        .unwrap();
}

#[tokio::test]
async fn cleanup_without_record_issues_no_delete() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/zones/z-1/recordsets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "recordsets": [],
            "metadata": { "total_count": 0 }
        })))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(202))
        .expect(0)
        .mount(&server)
        .await;

    let dns = client_for(&server).await;
    let err = dns
        .cleanup("z-1", "_acme-challenge.example.com.", CHALLENGE)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::RecordNotFound { .. }));
}

#[tokio::test]
async fn present_then_cleanup_removes_the_created_record() {
    let server = MockServer::start().await;
    let fqdn = "_acme-challenge.foo.example.org.";

    // Create returns an id; the listing afterwards echoes the posted record.
    Mock::given(method("POST"))
        .and(path("/v2/zones/z-1/recordsets"))
        .and(body_json(json!({
            "name": fqdn,
            "type": "TXT",
            "records": ["\"tok\""],
            "ttl": 300
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "id": "r-e2e",
            "status": "PENDING_CREATE"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/zones/z-1/recordsets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "recordsets": [
                {
                    "id": "r-e2e",
                    "name": fqdn,
                    "type": "TXT",
                    "records": ["\"tok\""],
                    "status": "ACTIVE"
                },
            ],
            "metadata": { "total_count": 1 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/v2/zones/z-1/recordsets/r-e2e"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "id": "r-e2e",
            "status": "PENDING_DELETE"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dns = client_for(&server).await;
    let created = dns.present("z-1", fqdn, "tok").await.unwrap();
    assert_eq!(created, "r-e2e");
    dns.cleanup("z-1", fqdn, "tok").await.unwrap();
}

// ---- retries ----

async fn retrying_client_for(server: &MockServer) -> SberCloudDns {
    SberCloudDns::builder("test-ak".to_string(), "test-sk".to_string())
        .endpoints(Endpoints {
            iam: server.uri(),
            dns: server.uri(),
        })
        .max_retries(1)
        .build()
        .expect("client builds against mock endpoints")
}

#[tokio::test]
async fn transient_server_error_is_retried() {
    let server = MockServer::start().await;

    // First attempt hits the 503; the retry gets the real response.
    Mock::given(method("GET"))
        .and(path("/v3/projects"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v3/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "projects": [{ "id": "p-1", "name": "production", "enabled": true }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dns = retrying_client_for(&server).await;
    let id = dns.find_project_id("production").await.unwrap();
    assert_eq!(id, "p-1");
}

#[tokio::test]
async fn rate_limit_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/zones"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/zones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "zones": [zone_item("z-1", "example.com.", "ACTIVE")],
            "metadata": { "total_count": 1 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dns = retrying_client_for(&server).await;
    let id = dns.find_zone_id("example.com.").await.unwrap();
    assert_eq!(id, "z-1");
}

#[tokio::test]
async fn auth_failure_is_not_retried() {
    let server = MockServer::start().await;

    // expect(1) fails verification if the client sends a second request.
    Mock::given(method("GET"))
        .and(path("/v3/projects"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "APIGW.0301",
            "message": "signature mismatch"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dns = retrying_client_for(&server).await;
    let err = dns.find_project_id("production").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidCredentials { .. }));
}

// ---- headers and errors ----

#[tokio::test]
async fn requests_carry_signature_headers() {
    let server = MockServer::start().await;

    // The mock only matches when the signed headers are present.
    Mock::given(method("GET"))
        .and(path("/v3/projects"))
        .and(header_exists("Authorization"))
        .and(header_exists("X-Sdk-Date"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "projects": [{ "id": "p-1", "name": "production", "enabled": true }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dns = client_for(&server).await;
    let id = dns.find_project_id("production").await.unwrap();
    assert_eq!(id, "p-1");
}

#[tokio::test]
async fn project_scope_sent_as_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/zones"))
        .and(header("X-Project-Id", "p-scope"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "zones": [zone_item("z-1", "example.com.", "ACTIVE")],
            "metadata": { "total_count": 1 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut dns = client_for(&server).await;
    dns.set_project_id("p-scope".to_string());
    let id = dns.find_zone_id("example.com.").await.unwrap();
    assert_eq!(id, "z-1");
}

#[tokio::test]
async fn unauthorized_maps_to_invalid_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/projects"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "APIGW.0301",
            "message": "signature mismatch"
        })))
        .mount(&server)
        .await;

    let dns = client_for(&server).await;
    let err = dns.find_project_id("production").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidCredentials { .. }));
    assert!(err.is_expected());
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn api_error_body_surfaced_in_status_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/zones/z-1/recordsets"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "DNS.0312",
            "message": "recordset already exists"
        })))
        .mount(&server)
        .await;

    let dns = client_for(&server).await;
    let err = dns
        .present("z-1", "_acme-challenge.example.com.", CHALLENGE)
        .await
        .unwrap_err();
    match err {
        ApiError::ApiStatus {
            status,
            error_code,
            message,
        } => {
            assert_eq!(status, 409);
            assert_eq!(error_code.as_deref(), Some("DNS.0312"));
            assert_eq!(message, "recordset already exists");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
