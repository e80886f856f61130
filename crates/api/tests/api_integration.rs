//! API integration tests.
//!
//! These tests drive the router end to end over a mock database and an
//! in-memory recipient directory.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use std::sync::Arc;
use tower::ServiceExt;

use tradehub_api::{AppState, router as api_router};
use tradehub_common::Config;
use tradehub_core::services::{Contact, StaticDirectory};
use tradehub_core::{
    DeliveryCoordinator, DeliveryTransports, NotificationFactory, NotificationQueryService,
};
use tradehub_db::entities::notification::ActorKind;
use tradehub_db::repositories::NotificationRepository;

fn admin_contact() -> Contact {
    Contact {
        id: "admin1".to_string(),
        kind: ActorKind::Admin,
        display_name: "Admin One".to_string(),
        email: Some("admin1@example.com".to_string()),
        phone: None,
    }
}

/// Build a router over the given mock connection.
fn test_router(db: sea_orm::DatabaseConnection) -> Router {
    let repo = NotificationRepository::new(Arc::new(db));
    let directory = Arc::new(StaticDirectory::new(vec![admin_contact()]));
    let config = Config::default();

    let factory = NotificationFactory::new(
        repo.clone(),
        directory.clone(),
        config.delivery.max_attempts,
    );
    let coordinator = Arc::new(DeliveryCoordinator::new(
        repo.clone(),
        directory,
        DeliveryTransports::default(),
        &config,
    ));
    let query = NotificationQueryService::new(repo);

    api_router().with_state(AppState::new(factory, coordinator, query))
}

fn empty_router() -> Router {
    test_router(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_returns_ok() {
    let response = empty_router()
        .oneshot(
            Request::builder()
                .uri("/health")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn unknown_endpoint_returns_404() {
    let response = empty_router()
        .oneshot(post_json("/nonexistent/endpoint", "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_json_is_rejected() {
    let response = empty_router()
        .oneshot(post_json("/notifications/unread-count", "not json"))
        .await
        .unwrap();

    assert!(
        response.status() == StatusCode::BAD_REQUEST
            || response.status() == StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[tokio::test]
async fn unread_count_wraps_payload() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[maplit::btreemap! {
            "num_items" => sea_orm::Value::BigInt(Some(7))
        }]])
        .into_connection();

    let response = test_router(db)
        .oneshot(post_json(
            "/notifications/unread-count",
            r#"{"recipientId":"admin1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["count"], 7);
}

#[tokio::test]
async fn unread_count_requires_recipient() {
    let response = empty_router()
        .oneshot(post_json("/notifications/unread-count", r#"{"recipientId":""}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn mark_all_as_read_reports_count() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 4,
        }])
        .into_connection();

    let response = test_router(db)
        .oneshot(post_json(
            "/notifications/mark-all-as-read",
            r#"{"recipientId":"admin1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["count"], 4);
}

#[tokio::test]
async fn create_with_unresolvable_audience_is_unprocessable() {
    let body = serde_json::json!({
        "event": {
            "eventType": "order_comment",
            "orderId": "order-1",
            "commentId": "comment-1",
            "orderNumber": "1042",
            "commentContent": "Looks good"
        },
        "recipients": {
            "audience": "direct",
            "recipients": [{"id": "ghost", "kind": "user"}]
        }
    });

    let response = empty_router()
        .oneshot(post_json("/notifications/create", &body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "RECIPIENT_RESOLUTION_ERROR");
}

#[tokio::test]
async fn mark_as_read_for_foreign_recipient_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<tradehub_db::entities::notification::Model>::new()])
        .into_connection();

    let response = test_router(db)
        .oneshot(post_json(
            "/notifications/mark-as-read",
            r#"{"notificationId":"n1","recipientId":"someone-else"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn retry_on_missing_notification_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<tradehub_db::entities::notification::Model>::new()])
        .into_connection();

    let response = test_router(db)
        .oneshot(post_json("/notifications/retry", r#"{"notificationId":"gone"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "NOTIFICATION_NOT_FOUND");
}
