//! Role inspection and administration endpoints through the router.

mod common;

use axum::http::StatusCode;
use common::{read_json, TestApp};
use identity_service::models::{Provider, Role};

fn admin_token(app: &TestApp) -> String {
    app.mint_token(
        "googleadmin",
        "director@hackillinois.org",
        Provider::Google,
        &[Role::User, Role::Staff, Role::Admin],
    )
}

fn staff_token(app: &TestApp) -> String {
    app.mint_token(
        "googlestaff",
        "organizer@hackillinois.org",
        Provider::Google,
        &[Role::User, Role::Staff],
    )
}

#[tokio::test]
async fn test_own_roles_come_from_the_token() {
    let app = TestApp::new();
    let token = app.mint_token(
        "github1",
        "dev@example.com",
        Provider::Github,
        &[Role::User, Role::Applicant],
    );

    let response = app.get("/auth/roles", Some(&token)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["id"], "github1");
    assert_eq!(body["roles"], serde_json::json!(["USER", "APPLICANT"]));
}

#[tokio::test]
async fn test_roles_of_another_user_reads_the_store() {
    let app = TestApp::new();
    app.seed_user(
        "github1",
        "dev@example.com",
        Provider::Github,
        &[Role::User, Role::Attendee],
    );

    let response = app
        .get("/auth/roles/github1", Some(&staff_token(&app)))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["id"], "github1");
    assert_eq!(body["roles"], serde_json::json!(["USER", "ATTENDEE"]));
}

#[tokio::test]
async fn test_roles_of_unknown_user_is_404() {
    let app = TestApp::new();

    let response = app.get("/auth/roles/ghost", Some(&staff_token(&app))).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json(response).await;
    assert_eq!(body["error"], "UserNotFound");
}

#[tokio::test]
async fn test_role_listing_returns_exactly_the_holders() {
    let app = TestApp::new();
    app.seed_user("a", "a@example.com", Provider::Github, &[Role::User]);
    app.seed_user(
        "b",
        "b@example.com",
        Provider::Github,
        &[Role::User, Role::Attendee],
    );
    app.seed_user(
        "c",
        "c@example.com",
        Provider::Github,
        &[Role::User, Role::Attendee, Role::Staff],
    );

    let response = app
        .get("/auth/roles/list/ATTENDEE", Some(&staff_token(&app)))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["user_ids"], serde_json::json!(["b", "c"]));
}

#[tokio::test]
async fn test_role_listing_with_no_holders_is_an_empty_list() {
    let app = TestApp::new();

    let response = app
        .get("/auth/roles/list/MENTOR", Some(&staff_token(&app)))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["user_ids"], serde_json::json!([]));
}

#[tokio::test]
async fn test_role_listing_rejects_unknown_role_names() {
    let app = TestApp::new();

    let response = app
        .get("/auth/roles/list/SUPERUSER", Some(&staff_token(&app)))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["error"], "BadRequest");
}

#[tokio::test]
async fn test_grant_then_revoke_restores_the_original_set() {
    let app = TestApp::new();
    app.seed_user("github1", "dev@example.com", Provider::Github, &[Role::User]);
    let token = admin_token(&app);

    let response = app
        .put("/auth/roles/github1/MENTOR", Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["roles"], serde_json::json!(["USER", "MENTOR"]));

    let response = app
        .delete("/auth/roles/github1/MENTOR", Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["roles"], serde_json::json!(["USER"]));
}

#[tokio::test]
async fn test_revoking_an_absent_role_is_a_no_op() {
    let app = TestApp::new();
    app.seed_user("github1", "dev@example.com", Provider::Github, &[Role::User]);

    let response = app
        .delete("/auth/roles/github1/STAFF", Some(&admin_token(&app)))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["roles"], serde_json::json!(["USER"]));
}

#[tokio::test]
async fn test_granting_a_held_role_is_a_no_op() {
    let app = TestApp::new();
    app.seed_user(
        "github1",
        "dev@example.com",
        Provider::Github,
        &[Role::User, Role::Mentor],
    );

    let response = app
        .put("/auth/roles/github1/MENTOR", Some(&admin_token(&app)))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["roles"], serde_json::json!(["USER", "MENTOR"]));
}

#[tokio::test]
async fn test_mutating_an_unknown_user_is_404() {
    let app = TestApp::new();

    let response = app
        .put("/auth/roles/ghost/STAFF", Some(&admin_token(&app)))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json(response).await;
    assert_eq!(body["error"], "UserNotFound");
}

#[tokio::test]
async fn test_granting_an_unknown_role_is_400() {
    let app = TestApp::new();
    app.seed_user("github1", "dev@example.com", Provider::Github, &[Role::User]);

    let response = app
        .put("/auth/roles/github1/SUPERUSER", Some(&admin_token(&app)))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_user_lookup_joins_identity_and_profile() {
    let app = TestApp::new();
    app.seed_user(
        "github1",
        "dev@example.com",
        Provider::Github,
        &[Role::User, Role::Attendee],
    );

    let response = app.get("/auth/user/github1", Some(&admin_token(&app))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["id"], "github1");
    assert_eq!(body["email"], "dev@example.com");
    assert_eq!(body["provider"], "github");
    assert_eq!(body["roles"], serde_json::json!(["USER", "ATTENDEE"]));
}

#[tokio::test]
async fn test_admin_user_lookup_requires_admin() {
    let app = TestApp::new();
    app.seed_user("github1", "dev@example.com", Provider::Github, &[Role::User]);

    let response = app.get("/auth/user/github1", Some(&staff_token(&app))).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
