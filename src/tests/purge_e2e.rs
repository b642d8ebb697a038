//! End-to-end purge runs: executor + retention filter + HTTP source against
//! a mock server.

use chrono::{Duration, Utc};
use serde_json::{Value, json};
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

use crate::{
    credentials::Credentials,
    executor::Executor,
    filter::RetentionPolicy,
    models::ItemKind,
    source::{HttpItemSource, HttpSourceConfig, SourceError},
};

fn source_for(server: &MockServer) -> HttpItemSource {
    let credentials = Credentials {
        server: Url::parse(&server.uri()).unwrap(),
        access_token: "test-token".into(),
    };
    HttpItemSource::new(credentials, HttpSourceConfig::default())
}

fn policy() -> RetentionPolicy {
    RetentionPolicy {
        min_age_days: 60,
        max_favourites: 20,
    }
}

fn status(id: &str, days_ago: i64, favourites: i64, favourited: bool, author_id: &str) -> Value {
    json!({
        "id": id,
        "created_at": (Utc::now() - Duration::days(days_ago)).to_rfc3339(),
        "favourites_count": favourites,
        "favourited": favourited,
        "account": {"id": author_id, "acct": "someone@example.social"}
    })
}

async fn mount_account(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/accounts/verify_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "42", "acct": "mike@example.social"
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_posts_purge_end_to_end() {
    let server = MockServer::start().await;
    mount_account(&server).await;

    let page2 = format!("{}/api/v1/accounts/42/statuses?max_id=2", server.uri());
    Mock::given(method("GET"))
        .and(path("/api/v1/accounts/42/statuses"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([
                    status("5", 5, 0, false, "42"),   // too recent
                    status("4", 70, 0, false, "42"),  // eligible
                ]))
                .insert_header("link", format!("<{page2}>; rel=\"next\"").as_str()),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/accounts/42/statuses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            status("3", 70, 25, false, "42"), // too popular
            status("2", 70, 5, true, "42"),   // self-favourited
            status("1", 70, 5, false, "42"),  // eligible
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/statuses/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status("4", 70, 0, false, "42")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/statuses/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status("1", 70, 5, false, "42")))
        .expect(1)
        .mount(&server)
        .await;

    let source = source_for(&server);
    let report = Executor::new(policy(), false)
        .run(&source, ItemKind::Post)
        .await
        .unwrap();

    assert_eq!(report.examined, 5);
    assert_eq!(report.deleted, 2);
    assert_eq!(report.too_recent, 1);
    assert_eq!(report.too_popular, 1);
    assert_eq!(report.self_marked, 1);
    assert_eq!(report.account, "mike@example.social");
    assert_eq!(
        report.summary(),
        "Deleted 2 of 5 posts for @mike@example.social"
    );
}

#[tokio::test]
async fn test_dry_run_counts_without_delete_calls() {
    let server = MockServer::start().await;
    mount_account(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/accounts/42/statuses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            status("2", 70, 0, false, "42"),
            status("1", 5, 0, false, "42"),
        ])))
        .mount(&server)
        .await;

    // Any delete reaching the server is a test failure.
    Mock::given(method("DELETE"))
        .and(path("/api/v1/statuses/2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let source = source_for(&server);
    let report = Executor::new(policy(), true)
        .run(&source, ItemKind::Post)
        .await
        .unwrap();

    assert_eq!(report.deleted, 1);
    assert_eq!(report.too_recent, 1);
    assert_eq!(
        report.summary(),
        "Would have deleted 1 of 2 posts for @mike@example.social (dry run)"
    );
}

#[tokio::test]
async fn test_liked_items_purge_unfavourites_foreign_items_only() {
    let server = MockServer::start().await;
    mount_account(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/favourites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            status("9", 70, 3, false, "42"), // own item, retained
            status("8", 70, 3, false, "99"), // foreign, removed
            status("7", 5, 0, false, "99"),  // recent, retained
        ])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/statuses/8/unfavourite"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status("8", 70, 2, false, "99")))
        .expect(1)
        .mount(&server)
        .await;

    let source = source_for(&server);
    let report = Executor::new(policy(), false)
        .run(&source, ItemKind::Liked)
        .await
        .unwrap();

    assert_eq!(report.examined, 3);
    assert_eq!(report.deleted, 1);
    assert_eq!(report.own_item, 1);
    assert_eq!(report.too_recent, 1);
}

#[tokio::test]
async fn test_authentication_failure_aborts_before_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/accounts/verify_credentials"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "invalid token"})),
        )
        .mount(&server)
        .await;

    let source = source_for(&server);
    let err = Executor::new(policy(), false)
        .run(&source, ItemKind::Post)
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::Authentication(_)));
}

#[tokio::test]
async fn test_already_deleted_item_does_not_abort_the_run() {
    let server = MockServer::start().await;
    mount_account(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/accounts/42/statuses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            status("2", 70, 0, false, "42"),
            status("1", 70, 0, false, "42"),
        ])))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/statuses/2"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Record not found"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/statuses/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status("1", 70, 0, false, "42")))
        .expect(1)
        .mount(&server)
        .await;

    let source = source_for(&server);
    let report = Executor::new(policy(), false)
        .run(&source, ItemKind::Post)
        .await
        .unwrap();

    assert_eq!(report.missing, 1);
    assert_eq!(report.deleted, 1);
}
