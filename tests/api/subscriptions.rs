use reqwest::StatusCode;

use serde_json::{json, Value};

use wiremock::matchers::*;
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{NewSubscriber, TestApp};

async fn mount_email_ok(app: &TestApp) {
    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&app.email_server)
        .await;
}

fn kyiv() -> NewSubscriber {
    NewSubscriber::new("A@Example.com ", " Kyiv ", "daily")
}

#[tokio::test]
async fn subscribe_returns_success_for_valid_request() {
    let app = TestApp::spawn().await;
    mount_email_ok(&app).await;

    let res = app.subscribe(&kyiv()).await.expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "success": true }));

    let subscriptions = app.subscriptions().await;
    assert_eq!(subscriptions.len(), 1);
    assert_eq!(subscriptions[0].email, "a@example.com");
    assert_eq!(subscriptions[0].city, "Kyiv");
    assert!(!subscriptions[0].confirmed);
    assert!(subscriptions[0].confirmed_at.is_none());
    assert_eq!(subscriptions[0].token.len(), 64);
}

#[tokio::test]
async fn subscribe_returns_bad_request_for_invalid_data() {
    let app = TestApp::spawn().await;
    mount_email_ok(&app).await;

    let test_cases: Vec<(&str, NewSubscriber)> = vec![
        (
            "missing email",
            NewSubscriber {
                email: None,
                ..kyiv()
            },
        ),
        (
            "missing city",
            NewSubscriber {
                city: None,
                ..kyiv()
            },
        ),
        (
            "missing frequency",
            NewSubscriber {
                frequency: None,
                ..kyiv()
            },
        ),
        ("missing everything", NewSubscriber::default()),
        (
            "malformed email",
            NewSubscriber::new("bad email address", "Kyiv", "daily"),
        ),
        (
            "unknown frequency",
            NewSubscriber::new("test@test.com", "Kyiv", "monthly"),
        ),
    ];

    for (desc, new_subscriber) in test_cases {
        let res = app
            .subscribe(&new_subscriber)
            .await
            .expect("Failed to execute request");

        assert_eq!(
            StatusCode::BAD_REQUEST,
            res.status(),
            "API did not fail when payload had {}",
            desc
        );
        let body: Value = res.json().await.unwrap();
        assert!(body["error"].is_string());
    }

    assert!(app.subscriptions().await.is_empty());
}

#[tokio::test]
async fn subscribe_returns_bad_request_for_malformed_json() {
    let app = TestApp::spawn().await;

    let res = app
        .request(reqwest::Method::POST, "api/subscribe")
        .header("Content-Type", "application/json")
        .body("{\"email\": 42")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::BAD_REQUEST, res.status());
}

#[tokio::test]
async fn subscribe_sends_a_confirmation_email_with_link() {
    let app = TestApp::spawn().await;

    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        // Expect a send-email request
        .expect(1)
        .mount(&app.email_server)
        .await;

    app.subscribe(&kyiv()).await.expect("Failed to execute request");

    let token = app.confirmation_token(0).await;
    assert_eq!(token, app.subscriptions().await[0].token);
}

#[tokio::test]
async fn subscribe_succeeds_even_if_email_send_fails() {
    let app = TestApp::spawn().await;

    Mock::given(path("/email"))
        .and(method("POST"))
        // Ensure that send-email fails
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let res = app.subscribe(&kyiv()).await.expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    assert_eq!(app.subscriptions().await.len(), 1);
}

#[tokio::test]
async fn subscription_can_be_confirmed() {
    let app = TestApp::spawn().await;
    mount_email_ok(&app).await;

    app.subscribe(&kyiv()).await.expect("Failed to execute request");
    let token = app.confirmation_token(0).await;

    let res = app.confirm(&token).await.expect("Failed to confirm");

    assert_eq!(StatusCode::OK, res.status());
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "confirmed": true }));

    let subscription = &app.subscriptions().await[0];
    assert!(subscription.confirmed);
    assert!(subscription.confirmed_at.is_some());
}

#[tokio::test]
async fn confirm_is_idempotent() {
    let app = TestApp::spawn().await;
    mount_email_ok(&app).await;

    app.subscribe(&kyiv()).await.unwrap();
    let token = app.confirmation_token(0).await;

    assert_eq!(StatusCode::OK, app.confirm(&token).await.unwrap().status());
    let confirmed_at = app.subscriptions().await[0].confirmed_at;

    assert_eq!(StatusCode::OK, app.confirm(&token).await.unwrap().status());
    assert_eq!(app.subscriptions().await[0].confirmed_at, confirmed_at);
}

#[tokio::test]
async fn confirm_unknown_token_is_not_found() {
    let app = TestApp::spawn().await;

    let res = app.confirm("bogus").await.unwrap();

    assert_eq!(StatusCode::NOT_FOUND, res.status());
}

#[tokio::test]
async fn subscribing_twice_while_pending_invalidates_old_token() {
    let app = TestApp::spawn().await;
    mount_email_ok(&app).await;

    app.subscribe(&kyiv()).await.unwrap();
    let old_token = app.confirmation_token(0).await;
    app.subscribe(&kyiv()).await.unwrap();
    let new_token = app.confirmation_token(1).await;

    assert_ne!(old_token, new_token);
    assert_eq!(app.subscriptions().await.len(), 1);
    assert_eq!(StatusCode::NOT_FOUND, app.confirm(&old_token).await.unwrap().status());
    assert_eq!(StatusCode::OK, app.confirm(&new_token).await.unwrap().status());
}

#[tokio::test]
async fn subscribing_to_an_active_subscription_conflicts() {
    let app = TestApp::spawn().await;
    mount_email_ok(&app).await;

    app.subscribe(&kyiv()).await.unwrap();
    let token = app.confirmation_token(0).await;
    app.confirm(&token).await.unwrap();
    let before = app.subscriptions().await;

    let res = app.subscribe(&kyiv()).await.unwrap();

    assert_eq!(StatusCode::CONFLICT, res.status());
    assert_eq!(app.subscriptions().await, before);
}

#[tokio::test]
async fn unsubscribe_deactivates_subscription() {
    let app = TestApp::spawn().await;
    mount_email_ok(&app).await;

    app.subscribe(&kyiv()).await.unwrap();
    let token = app.confirmation_token(0).await;
    app.confirm(&token).await.unwrap();

    let res = app.unsubscribe(&token).await.unwrap();

    assert_eq!(StatusCode::OK, res.status());
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "unsubscribed": true }));
    assert!(app.subscriptions().await[0].unsubscribed_at.is_some());

    assert_eq!(StatusCode::NOT_FOUND, app.confirm(&token).await.unwrap().status());
    assert_eq!(StatusCode::NOT_FOUND, app.unsubscribe(&token).await.unwrap().status());
}

#[tokio::test]
async fn unsubscribe_unknown_token_is_not_found() {
    let app = TestApp::spawn().await;

    let res = app.unsubscribe("bogus").await.unwrap();

    assert_eq!(StatusCode::NOT_FOUND, res.status());
}

#[tokio::test]
async fn resubscribing_after_unsubscribe_starts_over() {
    let app = TestApp::spawn().await;
    mount_email_ok(&app).await;

    app.subscribe(&kyiv()).await.unwrap();
    let token = app.confirmation_token(0).await;
    app.confirm(&token).await.unwrap();
    app.unsubscribe(&token).await.unwrap();
    let id = app.subscriptions().await[0].id;

    let res = app.subscribe(&kyiv()).await.unwrap();

    assert_eq!(StatusCode::OK, res.status());
    let subscriptions = app.subscriptions().await;
    assert_eq!(subscriptions.len(), 1);
    assert_eq!(subscriptions[0].id, id);
    assert!(!subscriptions[0].confirmed);
    assert!(subscriptions[0].confirmed_at.is_none());
    assert!(subscriptions[0].unsubscribed_at.is_none());

    let new_token = app.confirmation_token(1).await;
    assert_eq!(StatusCode::OK, app.confirm(&new_token).await.unwrap().status());
}
