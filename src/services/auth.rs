// src/services/auth.rs

//! Authentication service.
//!
//! Sign-in goes to the identity provider first and falls back to the
//! backend's own auth routes when the provider cannot serve the request.
//! The resulting session is persisted through a [`SessionStore`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{AppError, AuthError, Result};
use crate::models::{Config, Session, User, default_name};
use crate::storage::{LocalSessionStore, SessionStore};
use crate::utils::endpoint;
use crate::utils::http::{create_async_client, error_message};

type AuthResult<T> = std::result::Result<T, AuthError>;

/// A service able to exchange credentials for a session.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Session>;

    async fn sign_up(&self, email: &str, password: &str, name: &str) -> AuthResult<Session>;

    /// Revoke the session server-side. Providers without revocation succeed.
    async fn sign_out(&self, _session: &Session) -> AuthResult<()> {
        Ok(())
    }
}

/// GoTrue-compatible identity provider (Supabase Auth).
#[derive(Clone)]
pub struct SupabaseProvider {
    client: Client,
    base_url: String,
    anon_key: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct GoTrueSession {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    user: Option<GoTrueUser>,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    #[serde(default)]
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Value,
}

impl GoTrueUser {
    fn into_user(self, email: &str) -> User {
        let name = self
            .user_metadata
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_name(email).to_string());
        User {
            id: self.id,
            email: self.email.unwrap_or_else(|| email.to_string()),
            name,
        }
    }
}

impl SupabaseProvider {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            anon_key: anon_key.into(),
            timeout,
        }
    }

    fn post(&self, path: &str) -> AuthResult<RequestBuilder> {
        let url = endpoint(&self.base_url, path).map_err(AuthError::failed)?;
        Ok(self
            .client
            .post(url)
            .header("apikey", &self.anon_key)
            .timeout(self.timeout))
    }

    fn session_from(&self, body: &str, email: &str) -> AuthResult<Session> {
        let parsed: GoTrueSession = serde_json::from_str(body).map_err(AuthError::failed)?;
        let Some(token) = parsed.access_token.filter(|t| !t.is_empty()) else {
            return Err(AuthError::failed(
                "account created; confirm your email before signing in",
            ));
        };
        let user = match parsed.user {
            Some(user) => user.into_user(email),
            None => User {
                id: String::new(),
                email: email.to_string(),
                name: default_name(email).to_string(),
            },
        };
        let mut session = Session::new(token, user);
        if let Some(token_type) = parsed.token_type {
            session.token_type = token_type;
        }
        Ok(session)
    }
}

#[async_trait]
impl IdentityProvider for SupabaseProvider {
    fn name(&self) -> &str {
        "identity provider"
    }

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Session> {
        let request = self
            .post("/auth/v1/token?grant_type=password")?
            .json(&json!({ "email": email, "password": password }));
        let body = send(request, true).await?;
        self.session_from(&body, email)
    }

    async fn sign_up(&self, email: &str, password: &str, name: &str) -> AuthResult<Session> {
        let request = self.post("/auth/v1/signup")?.json(&json!({
            "email": email,
            "password": password,
            "data": { "name": name },
        }));
        let body = send(request, false).await?;
        self.session_from(&body, email)
    }

    async fn sign_out(&self, session: &Session) -> AuthResult<()> {
        let request = self
            .post("/auth/v1/logout")?
            .bearer_auth(&session.access_token);
        send(request, false).await.map(|_| ())
    }
}

/// The backend's own `/api/auth/*` routes.
#[derive(Clone)]
pub struct BackendAuth {
    client: Client,
    base_url: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    user: User,
}

impl BackendAuth {
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            timeout,
        }
    }

    async fn exchange(&self, path: &str, payload: Value, credentials: bool) -> AuthResult<Session> {
        let url = endpoint(&self.base_url, path).map_err(AuthError::failed)?;
        let request = self.client.post(url).json(&payload).timeout(self.timeout);
        let body = send(request, credentials).await?;

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(AuthError::failed)?;
        let mut session = Session::new(parsed.access_token, parsed.user);
        if let Some(token_type) = parsed.token_type {
            session.token_type = token_type;
        }
        Ok(session)
    }
}

#[async_trait]
impl IdentityProvider for BackendAuth {
    fn name(&self) -> &str {
        "backend"
    }

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Session> {
        self.exchange(
            "/api/auth/login",
            json!({ "email": email, "password": password }),
            true,
        )
        .await
    }

    async fn sign_up(&self, email: &str, password: &str, name: &str) -> AuthResult<Session> {
        self.exchange(
            "/api/auth/signup",
            json!({ "email": email, "password": password, "name": name }),
            false,
        )
        .await
    }
}

/// Send a request and return the body of a 2xx response.
///
/// With `credentials`, 400/401 mean the email/password pair was rejected.
async fn send(request: RequestBuilder, credentials: bool) -> AuthResult<String> {
    let response = request.send().await.map_err(transport_error)?;
    let status = response.status();
    let body = response.text().await.map_err(transport_error)?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(rejection(status, &body, credentials))
    }
}

fn transport_error(e: reqwest::Error) -> AuthError {
    if e.is_connect() || e.is_timeout() || e.is_request() {
        AuthError::Unreachable(e.to_string())
    } else {
        AuthError::failed(e)
    }
}

fn rejection(status: StatusCode, body: &str, credentials: bool) -> AuthError {
    let message = error_message(status, body);
    let rejected = matches!(status, StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED);
    // "Email not confirmed" is a 400 too, but the password was right.
    if credentials && rejected && !message.to_lowercase().contains("confirm") {
        AuthError::InvalidCredentials
    } else {
        AuthError::Failed(message)
    }
}

/// Sign-in, sign-up and session state for one user.
pub struct AuthService {
    provider: Option<Arc<dyn IdentityProvider>>,
    backend: Arc<dyn IdentityProvider>,
    store: Arc<dyn SessionStore>,
}

impl AuthService {
    pub fn new(
        provider: Option<Arc<dyn IdentityProvider>>,
        backend: Arc<dyn IdentityProvider>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            provider,
            backend,
            store,
        }
    }

    /// Provider from `auth.provider_url`/`auth.anon_key` when both are set,
    /// backend routes under `api.base_url`, session file at `auth.session_file`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = create_async_client(&config.api)?;
        let timeout = config.api.timeout();

        let provider: Option<Arc<dyn IdentityProvider>> =
            match (&config.auth.provider_url, &config.auth.anon_key) {
                (Some(url), Some(key)) => Some(Arc::new(SupabaseProvider::new(
                    client.clone(),
                    url.clone(),
                    key.clone(),
                    timeout,
                ))),
                (Some(_), None) => {
                    log::warn!("auth.provider_url set without auth.anon_key; using backend auth only");
                    None
                }
                _ => None,
            };
        let backend = Arc::new(BackendAuth::new(client, config.api.base_url.clone(), timeout));
        let store = Arc::new(LocalSessionStore::new(&config.auth.session_file));

        Ok(Self::new(provider, backend, store))
    }

    /// Sign in and persist the session.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let email = check_credentials(email, password)?;
        let session = self
            .with_fallback("sign-in", |idp| async move { idp.sign_in(email, password).await })
            .await?;
        self.store.save(&session).await?;
        log::info!("Signed in as {}", session.user.email);
        Ok(session)
    }

    /// Create an account and persist the session. The name defaults to the
    /// local part of the email.
    pub async fn sign_up(&self, email: &str, password: &str, name: Option<&str>) -> Result<Session> {
        let email = check_credentials(email, password)?;
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| default_name(email));
        let session = self
            .with_fallback("sign-up", |idp| async move {
                idp.sign_up(email, password, name).await
            })
            .await?;
        self.store.save(&session).await?;
        log::info!("Signed up as {}", session.user.email);
        Ok(session)
    }

    /// Revoke the provider session if possible and forget it locally.
    pub async fn logout(&self) -> Result<()> {
        if let (Some(provider), Some(session)) = (&self.provider, self.store.load().await?) {
            if let Err(e) = provider.sign_out(&session).await {
                log::warn!("Provider sign-out failed: {e}; clearing local session anyway");
            }
        }
        self.store.clear().await
    }

    /// Stored session, expired or not.
    pub async fn session(&self) -> Result<Option<Session>> {
        self.store.load().await
    }

    /// Signed-in user whose session has not expired.
    pub async fn current_user(&self) -> Result<Option<User>> {
        self.current_user_at(Utc::now()).await
    }

    pub async fn current_user_at(&self, now: DateTime<Utc>) -> Result<Option<User>> {
        Ok(self
            .store
            .load()
            .await?
            .filter(|s| s.is_valid_at(now))
            .map(|s| s.user))
    }

    pub async fn is_authenticated(&self) -> Result<bool> {
        self.is_authenticated_at(Utc::now()).await
    }

    pub async fn is_authenticated_at(&self, now: DateTime<Utc>) -> Result<bool> {
        Ok(self.current_user_at(now).await?.is_some())
    }

    /// Provider first; the backend gets a turn unless the provider rejected
    /// the credentials outright.
    async fn with_fallback<'a, F, Fut>(&'a self, action: &str, call: F) -> AuthResult<Session>
    where
        F: Fn(&'a dyn IdentityProvider) -> Fut,
        Fut: Future<Output = AuthResult<Session>>,
    {
        let Some(provider) = &self.provider else {
            return call(self.backend.as_ref()).await;
        };

        let primary = match call(provider.as_ref()).await {
            Ok(session) => return Ok(session),
            Err(AuthError::InvalidCredentials) => return Err(AuthError::InvalidCredentials),
            Err(e) => e,
        };
        log::warn!(
            "{} {action} failed: {primary}; trying {}",
            provider.name(),
            self.backend.name()
        );

        match call(self.backend.as_ref()).await {
            Ok(session) => Ok(session),
            // The backend is down too; the provider's error says more.
            Err(AuthError::Unreachable(_)) => Err(primary),
            Err(e) => Err(e),
        }
    }
}

fn check_credentials<'a>(email: &'a str, password: &str) -> Result<&'a str> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::validation("a valid email is required"));
    }
    if password.is_empty() {
        return Err(AppError::validation("password is required"));
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemorySessionStore;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        label: &'static str,
        outcome: AuthResult<()>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(label: &'static str, outcome: AuthResult<()>) -> Arc<Self> {
            Arc::new(Self {
                label,
                outcome,
                calls: AtomicUsize::new(0),
            })
        }

        fn session(&self, email: &str, name: &str) -> AuthResult<Session> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone().map(|()| {
                Session::new(
                    format!("{}-token", self.label),
                    User {
                        id: self.label.into(),
                        email: email.into(),
                        name: name.into(),
                    },
                )
            })
        }
    }

    #[async_trait]
    impl IdentityProvider for Scripted {
        fn name(&self) -> &str {
            self.label
        }

        async fn sign_in(&self, email: &str, _password: &str) -> AuthResult<Session> {
            self.session(email, "")
        }

        async fn sign_up(&self, email: &str, _password: &str, name: &str) -> AuthResult<Session> {
            self.session(email, name)
        }
    }

    fn service(provider: Option<Arc<Scripted>>, backend: Arc<Scripted>) -> AuthService {
        AuthService::new(
            provider.map(|p| p as Arc<dyn IdentityProvider>),
            backend,
            Arc::new(MemorySessionStore::new()),
        )
    }

    #[tokio::test]
    async fn provider_success_skips_backend() {
        let provider = Scripted::new("provider", Ok(()));
        let backend = Scripted::new("backend", Ok(()));
        let auth = service(Some(provider), backend.clone());

        let session = auth.login("ada@example.com", "pw").await.unwrap();
        assert_eq!(session.access_token, "provider-token");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert!(auth.is_authenticated().await.unwrap());
    }

    #[tokio::test]
    async fn provider_outage_falls_back_to_backend() {
        let provider = Scripted::new("provider", Err(AuthError::Unreachable("refused".into())));
        let backend = Scripted::new("backend", Ok(()));
        let auth = service(Some(provider), backend);

        let session = auth.login("ada@example.com", "pw").await.unwrap();
        assert_eq!(session.access_token, "backend-token");
    }

    #[tokio::test]
    async fn rejected_credentials_do_not_fall_back() {
        let provider = Scripted::new("provider", Err(AuthError::InvalidCredentials));
        let backend = Scripted::new("backend", Ok(()));
        let auth = service(Some(provider), backend.clone());

        let err = auth.login("ada@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::InvalidCredentials)));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert!(!auth.is_authenticated().await.unwrap());
    }

    #[tokio::test]
    async fn both_unreachable_surfaces_provider_error() {
        let provider = Scripted::new("provider", Err(AuthError::Unreachable("provider down".into())));
        let backend = Scripted::new("backend", Err(AuthError::Unreachable("backend down".into())));
        let auth = service(Some(provider), backend);

        let err = auth.login("ada@example.com", "pw").await.unwrap_err();
        assert_eq!(err.to_string(), "Cannot reach the authentication server: provider down");
    }

    #[tokio::test]
    async fn sign_up_name_defaults_to_email_local_part() {
        let backend = Scripted::new("backend", Ok(()));
        let auth = service(None, backend);

        let session = auth.sign_up("grace@example.com", "pw", Some("  ")).await.unwrap();
        assert_eq!(session.user.name, "grace");
    }

    #[tokio::test]
    async fn blank_credentials_are_rejected_locally() {
        let backend = Scripted::new("backend", Ok(()));
        let auth = service(None, backend.clone());

        assert!(matches!(
            auth.login("  ", "pw").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            auth.login("ada@example.com", "").await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn logout_clears_session() {
        let auth = service(None, Scripted::new("backend", Ok(())));
        auth.login("ada@example.com", "pw").await.unwrap();
        auth.logout().await.unwrap();
        assert!(auth.current_user().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_session_is_not_authenticated() {
        let store = Arc::new(MemorySessionStore::new());
        let mut session = Session::new(
            "t",
            User {
                id: "1".into(),
                email: "ada@example.com".into(),
                name: "Ada".into(),
            },
        );
        session.expires_at = Utc.timestamp_opt(1_700_000_000, 0).single();
        store.save(&session).await.unwrap();

        let auth = AuthService::new(None, Scripted::new("backend", Ok(())), store);
        let later = Utc.timestamp_opt(1_800_000_000, 0).unwrap();
        assert!(!auth.is_authenticated_at(later).await.unwrap());
        assert!(auth.session().await.unwrap().is_some());
    }

    #[test]
    fn rejection_mapping() {
        assert_eq!(
            rejection(StatusCode::BAD_REQUEST, r#"{"error_description":"Invalid login credentials"}"#, true),
            AuthError::InvalidCredentials
        );
        assert_eq!(
            rejection(StatusCode::BAD_REQUEST, r#"{"msg":"Email not confirmed"}"#, true),
            AuthError::Failed("Email not confirmed".into())
        );
        assert_eq!(
            rejection(StatusCode::BAD_REQUEST, r#"{"detail":"User already registered"}"#, false),
            AuthError::Failed("User already registered".into())
        );
    }
}
