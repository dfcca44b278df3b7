//! HTTP contract tests for the REST backend client

use std::sync::Arc;

use seller_sync_lib::application::RangeSyncCoordinator;
use seller_sync_lib::application::SalesViewService;
use seller_sync_lib::domain::date_range::{DateRange, parse_date_key};
use seller_sync_lib::domain::errors::BackendError;
use seller_sync_lib::domain::sales::LogisticType;
use seller_sync_lib::domain::sync_backend::{OwnerId, SalesReader, SyncBackend};
use seller_sync_lib::domain::sync_progress::SyncPhase;
use seller_sync_lib::infrastructure::backend_client::BackendClient;
use seller_sync_lib::infrastructure::config::BackendConfig;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, token: Option<&str>) -> BackendClient {
    let config = BackendConfig {
        base_url: format!("{}/api", server.uri()),
        api_token: token.map(str::to_string),
        max_requests_per_second: 0,
        ..BackendConfig::default()
    };
    BackendClient::new(&config).unwrap()
}

#[tokio::test]
async fn test_sync_day_posts_date_and_seller() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/sync/daily"))
        .and(header("authorization", "Bearer secret"))
        .and(body_json(json!({"date": "2025-01-03", "sellerId": 42})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "syncedCount": 17,
            "tierInfo": {"tier": "gold", "remaining": 880}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("secret"));
    let response = client
        .sync_day(parse_date_key("2025-01-03").unwrap(), OwnerId(42))
        .await
        .unwrap();

    assert_eq!(response.synced_count, 17);
    assert_eq!(response.tier_info.unwrap()["tier"], "gold");
}

#[tokio::test]
async fn test_reconcile_posts_range() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/sync/reconcile"))
        .and(body_json(json!({"from": "2025-01-01", "to": "2025-01-31", "sellerId": 7})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"updatedCount": 12})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let range = DateRange::parse("2025-01-01", "2025-01-31").unwrap();
    let response = client.reconcile_status_changes(&range, OwnerId(7)).await.unwrap();

    assert_eq!(response.updated_count, 12);
}

#[tokio::test]
async fn test_status_errors_are_mapped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/sync/daily"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/sync/reconcile"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let day = parse_date_key("2025-01-01").unwrap();
    let range = DateRange::single(day);

    match client.sync_day(day, OwnerId(1)).await {
        Err(BackendError::Status { status, body }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("expected status error, got {other:?}"),
    }
    assert!(matches!(
        client.reconcile_status_changes(&range, OwnerId(1)).await,
        Err(BackendError::RateLimited)
    ));
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/sync/daily"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let result = client.sync_day(parse_date_key("2025-01-01").unwrap(), OwnerId(1)).await;
    assert!(matches!(result, Err(BackendError::Decode(_))));
}

#[tokio::test]
async fn test_fetch_sales_recomputes_totals() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/sales"))
        .and(query_param("from", "2025-01-01"))
        .and(query_param("to", "2025-01-02"))
        .and(query_param("sellerId", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "orders": [
                {
                    "orderId": 1, "dateCreated": "2025-01-01T09:00:00Z",
                    "logisticType": "fulfillment", "units": 2,
                    "grossAmount": 200.0, "saleFee": 30.0, "shippingCost": 10.0,
                    "taxAmount": 0.0, "netAmount": 160.0
                },
                {
                    "orderId": 2, "dateCreated": "2025-01-02T09:00:00Z",
                    "logisticType": "brand_new_mode", "units": 1,
                    "grossAmount": 50.0, "saleFee": 5.0, "shippingCost": 5.0,
                    "netAmount": 40.0
                }
            ],
            "totals": {"orderCount": 999}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let range = DateRange::parse("2025-01-01", "2025-01-02").unwrap();
    let summary = client.fetch_sales(&range, OwnerId(5)).await.unwrap();

    assert_eq!(summary.totals.order_count, 2);
    assert_eq!(summary.totals.units, 3);
    assert_eq!(summary.totals.net_amount, 200.0);
    assert_eq!(summary.orders[1].logistic_type, LogisticType::NotSpecified);
}

#[tokio::test]
async fn test_coordinator_runs_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/sync/daily"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"syncedCount": 3})))
        .expect(4)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/sync/reconcile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"updatedCount": 2})))
        .expect(1)
        .mount(&server)
        .await;

    let client = Arc::new(client_for(&server, None));
    let sales_view = Arc::new(SalesViewService::new(client.clone(), std::time::Duration::from_secs(60)));
    let coordinator = RangeSyncCoordinator::new(client, sales_view);

    let range = DateRange::parse("2025-01-01", "2025-01-04").unwrap();
    assert!(coordinator.run(range, OwnerId(8)).await);

    let progress = coordinator.snapshot();
    assert_eq!(progress.phase, SyncPhase::Complete);
    assert_eq!(progress.synced_count, 12);
    assert_eq!(progress.reconciled_count, 2);
}
