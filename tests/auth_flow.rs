//! Sign-in, sign-up and sign-out against scripted identity endpoints.

mod common;

use common::{Route, StubServer, dead_url};
use jsonwebtoken::{EncodingKey, Header};
use pathwise::error::{AppError, AuthError};
use pathwise::models::Config;
use pathwise::services::AuthService;
use serde_json::json;
use tempfile::TempDir;

/// Token expiring far in the future, signed with a key the client never sees.
fn token(email: &str) -> String {
    jsonwebtoken::encode(
        &Header::default(),
        &json!({ "sub": email, "exp": 4_102_444_800i64 }),
        &EncodingKey::from_secret(b"backend-only-secret"),
    )
    .unwrap()
}

fn config(dir: &TempDir, backend: &str, provider: Option<&str>) -> Config {
    let mut config = Config::default();
    config.api.base_url = backend.to_string();
    config.api.timeout_ms = 2000;
    config.auth.session_file = dir.path().join("session.json").display().to_string();
    if let Some(provider) = provider {
        config.auth.provider_url = Some(provider.to_string());
        config.auth.anon_key = Some("anon-key".to_string());
    }
    config
}

fn backend_token_route(email: &str, name: &str) -> Route {
    Route::json(
        200,
        json!({
            "access_token": token(email),
            "token_type": "bearer",
            "user": { "id": "b-1", "email": email, "name": name }
        }),
    )
}

#[tokio::test]
async fn provider_sign_in_persists_session() {
    let provider = StubServer::start([(
        "POST /auth/v1/token",
        Route::json(
            200,
            json!({
                "access_token": token("ada@example.com"),
                "token_type": "bearer",
                "expires_in": 3600,
                "user": {
                    "id": "p-1",
                    "email": "ada@example.com",
                    "user_metadata": { "name": "Ada Lovelace" }
                }
            }),
        ),
    )])
    .await;
    let dir = tempfile::tempdir().unwrap();
    let auth =
        AuthService::from_config(&config(&dir, &dead_url().await, Some(&provider.url()))).unwrap();

    let session = auth.login("ada@example.com", "correct horse").await.unwrap();
    assert_eq!(session.user.name, "Ada Lovelace");
    assert!(session.expires_at.is_some());

    let request = &provider.requests()[0];
    assert_eq!(request.query.as_deref(), Some("grant_type=password"));
    assert_eq!(request.header("apikey"), Some("anon-key"));
    assert_eq!(request.json()["email"], "ada@example.com");

    // A fresh service over the same file sees the session.
    let reopened =
        AuthService::from_config(&config(&dir, &dead_url().await, Some(&provider.url()))).unwrap();
    assert!(reopened.is_authenticated().await.unwrap());
    assert_eq!(
        reopened.current_user().await.unwrap().unwrap().email,
        "ada@example.com"
    );
}

#[tokio::test]
async fn provider_failure_falls_back_to_backend() {
    let provider = StubServer::start([(
        "POST /auth/v1/token",
        Route::json(503, json!({ "msg": "upstream unavailable" })),
    )])
    .await;
    let backend = StubServer::start([(
        "POST /api/auth/login",
        backend_token_route("ada@example.com", "Ada"),
    )])
    .await;
    let dir = tempfile::tempdir().unwrap();
    let auth = AuthService::from_config(&config(&dir, &backend.url(), Some(&provider.url()))).unwrap();

    let session = auth.login("ada@example.com", "pw").await.unwrap();
    assert_eq!(session.user.id, "b-1");
    assert_eq!(backend.hits("/api/auth/login"), 1);
}

#[tokio::test]
async fn rejected_password_is_invalid_credentials() {
    let provider = StubServer::start([(
        "POST /auth/v1/token",
        Route::json(
            400,
            json!({ "error": "invalid_grant", "error_description": "Invalid login credentials" }),
        ),
    )])
    .await;
    let backend = StubServer::start([(
        "POST /api/auth/login",
        backend_token_route("ada@example.com", "Ada"),
    )])
    .await;
    let dir = tempfile::tempdir().unwrap();
    let auth = AuthService::from_config(&config(&dir, &backend.url(), Some(&provider.url()))).unwrap();

    let err = auth.login("ada@example.com", "wrong").await.unwrap_err();
    assert!(matches!(err, AppError::Auth(AuthError::InvalidCredentials)));
    assert_eq!(err.to_string(), "Invalid email or password");
    assert_eq!(backend.hits("/api/auth/login"), 0);
    assert!(!auth.is_authenticated().await.unwrap());
}

#[tokio::test]
async fn backend_only_401_is_invalid_credentials() {
    let backend = StubServer::start([(
        "POST /api/auth/login",
        Route::json(401, json!({ "detail": "Invalid credentials" })),
    )])
    .await;
    let dir = tempfile::tempdir().unwrap();
    let auth = AuthService::from_config(&config(&dir, &backend.url(), None)).unwrap();

    let err = auth.login("ada@example.com", "wrong").await.unwrap_err();
    assert!(matches!(err, AppError::Auth(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn nothing_reachable_is_unreachable() {
    let dir = tempfile::tempdir().unwrap();
    let auth = AuthService::from_config(&config(
        &dir,
        &dead_url().await,
        Some(&dead_url().await),
    ))
    .unwrap();

    let err = auth.login("ada@example.com", "pw").await.unwrap_err();
    assert!(matches!(err, AppError::Auth(AuthError::Unreachable(_))));
    assert!(err.to_string().starts_with("Cannot reach the authentication server"));
}

#[tokio::test]
async fn backend_sign_up_defaults_name() {
    let backend = StubServer::start([(
        "POST /api/auth/signup",
        backend_token_route("grace@example.com", "grace"),
    )])
    .await;
    let dir = tempfile::tempdir().unwrap();
    let auth = AuthService::from_config(&config(&dir, &backend.url(), None)).unwrap();

    let session = auth.sign_up("grace@example.com", "pw", None).await.unwrap();
    assert_eq!(session.user.display_name(), "grace");
    assert_eq!(backend.requests()[0].json()["name"], "grace");
}

#[tokio::test]
async fn sign_up_error_message_is_surfaced() {
    let backend = StubServer::start([(
        "POST /api/auth/signup",
        Route::json(400, json!({ "detail": "User already registered" })),
    )])
    .await;
    let dir = tempfile::tempdir().unwrap();
    let auth = AuthService::from_config(&config(&dir, &backend.url(), None)).unwrap();

    let err = auth
        .sign_up("grace@example.com", "pw", Some("Grace"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Auth(AuthError::Failed(ref m)) if m == "User already registered"));
}

#[tokio::test]
async fn logout_revokes_and_forgets_session() {
    let ada_token = token("ada@example.com");
    let provider = StubServer::start([
        (
            "POST /auth/v1/token",
            Route::json(
                200,
                json!({
                    "access_token": &ada_token,
                    "user": { "id": "p-1", "email": "ada@example.com" }
                }),
            ),
        ),
        ("POST /auth/v1/logout", Route::raw(204, "")),
    ])
    .await;
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, &dead_url().await, Some(&provider.url()));
    let auth = AuthService::from_config(&config).unwrap();

    auth.login("ada@example.com", "pw").await.unwrap();
    assert!(std::path::Path::new(&config.auth.session_file).exists());

    auth.logout().await.unwrap();
    assert!(!std::path::Path::new(&config.auth.session_file).exists());
    assert!(auth.current_user().await.unwrap().is_none());

    let revoke = provider
        .requests()
        .into_iter()
        .find(|r| r.path == "/auth/v1/logout")
        .unwrap();
    assert_eq!(
        revoke.header("authorization"),
        Some(format!("Bearer {ada_token}").as_str())
    );
}
