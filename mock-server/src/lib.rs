use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const DEFAULT_USER: &str = "admin@example.com";
pub const DEFAULT_PASSWORD: &str = "admin";

/// Endpoints whose hits are counted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    LegacyAuth,
    LegacyKey,
    Auth,
    Refresh,
    Key,
    CreateKey,
}

#[derive(Deserialize)]
pub struct Login {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenField {
    pub token: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub token: TokenField,
    #[serde(rename = "refreshToken", skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<TokenField>,
}

#[derive(Deserialize)]
pub struct CreateKey {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

enum TokenStatus {
    Valid,
    Expired,
    Unknown,
}

#[derive(Default)]
struct Inner {
    users: HashMap<String, String>,
    keys: HashMap<String, Value>,
    access_tokens: HashSet<String>,
    expired_tokens: HashSet<String>,
    refresh_tokens: HashSet<String>,
    hits: HashMap<Route, usize>,
}

impl Inner {
    fn issue(&mut self, with_refresh: bool) -> TokenPair {
        let access = Uuid::new_v4().to_string();
        self.access_tokens.insert(access.clone());
        let refresh_token = with_refresh.then(|| {
            let refresh = Uuid::new_v4().to_string();
            self.refresh_tokens.insert(refresh.clone());
            TokenField { token: refresh }
        });
        TokenPair {
            token: TokenField { token: access },
            refresh_token,
        }
    }

    fn access_status(&self, token: Option<&str>) -> TokenStatus {
        match token {
            Some(t) if self.access_tokens.contains(t) => TokenStatus::Valid,
            Some(t) if self.expired_tokens.contains(t) => TokenStatus::Expired,
            _ => TokenStatus::Unknown,
        }
    }
}

/// Shared, inspectable state of the mock key service.
#[derive(Clone, Default)]
pub struct ServerState {
    inner: Arc<RwLock<Inner>>,
}

impl ServerState {
    pub fn new(email: &str, password: &str) -> Self {
        let mut inner = Inner::default();
        inner.users.insert(email.to_string(), password.to_string());
        Self {
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    pub async fn insert_key(&self, id: &str, key: Value) {
        self.inner.write().await.keys.insert(id.to_string(), key);
    }

    /// Mark every issued access token as expired. Refresh tokens stay valid.
    pub async fn expire_access_tokens(&self) {
        let mut inner = self.inner.write().await;
        let tokens: Vec<String> = inner.access_tokens.drain().collect();
        inner.expired_tokens.extend(tokens);
    }

    pub async fn revoke_refresh_tokens(&self) {
        self.inner.write().await.refresh_tokens.clear();
    }

    pub async fn hits(&self, route: Route) -> usize {
        self.inner.read().await.hits.get(&route).copied().unwrap_or(0)
    }

    async fn hit(&self, route: Route) {
        *self.inner.write().await.hits.entry(route).or_default() += 1;
    }
}

pub fn app() -> Router {
    app_with_state(ServerState::new(DEFAULT_USER, DEFAULT_PASSWORD))
}

pub fn app_with_state(state: ServerState) -> Router {
    Router::new()
        .route("/api/auth", post(legacy_auth))
        .route("/api/key/{id}", get(legacy_key))
        .route("/api/v1/auth", post(auth))
        .route("/api/v1/auth/refresh", get(refresh))
        .route("/api/v1/keys", post(create_key))
        .route("/api/v1/keys/one/{id}", get(get_key))
        .with_state(state)
}

pub async fn run_with_state(listener: TcpListener, state: ServerState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

type Reply = (StatusCode, Json<Value>);

fn reply(status: StatusCode, body: Value) -> Reply {
    (status, Json(body))
}

async fn login(state: &ServerState, input: &Login, with_refresh: bool) -> Option<TokenPair> {
    let mut inner = state.inner.write().await;
    if inner.users.get(&input.email) != Some(&input.password) {
        debug!(email = %input.email, "rejected login");
        return None;
    }
    info!(email = %input.email, "issued tokens");
    Some(inner.issue(with_refresh))
}

async fn legacy_auth(State(state): State<ServerState>, Json(input): Json<Login>) -> Reply {
    state.hit(Route::LegacyAuth).await;
    match login(&state, &input, false).await {
        Some(pair) => reply(StatusCode::OK, json!(pair)),
        None => reply(
            StatusCode::UNAUTHORIZED,
            json!({"name": "invalid-credentials", "message": "Invalid email or password"}),
        ),
    }
}

async fn legacy_key(State(state): State<ServerState>, headers: HeaderMap, Path(id): Path<String>) -> Reply {
    state.hit(Route::LegacyKey).await;
    let inner = state.inner.read().await;
    match inner.access_status(bearer(&headers)) {
        TokenStatus::Valid => match inner.keys.get(&id) {
            Some(key) => reply(StatusCode::OK, key.clone()),
            None => reply(StatusCode::NOT_FOUND, json!({"name": "not-found", "message": "key not found"})),
        },
        TokenStatus::Expired => reply(
            StatusCode::UNAUTHORIZED,
            json!({"name": "token-expired", "message": "Auth expired"}),
        ),
        TokenStatus::Unknown => reply(
            StatusCode::UNAUTHORIZED,
            json!({"name": "unauthorized", "message": "Missing or invalid token"}),
        ),
    }
}

async fn auth(State(state): State<ServerState>, Json(input): Json<Login>) -> Reply {
    state.hit(Route::Auth).await;
    match login(&state, &input, true).await {
        Some(pair) => reply(StatusCode::OK, json!(pair)),
        None => reply(StatusCode::UNAUTHORIZED, json!({"message": "Invalid email or password"})),
    }
}

async fn refresh(State(state): State<ServerState>, headers: HeaderMap) -> Reply {
    state.hit(Route::Refresh).await;
    let mut inner = state.inner.write().await;
    let presented = bearer(&headers).map(str::to_string);
    match presented {
        Some(token) if inner.refresh_tokens.remove(&token) => {
            debug!("rotated refresh token");
            let pair = inner.issue(true);
            reply(StatusCode::OK, json!(pair))
        }
        _ => reply(StatusCode::FORBIDDEN, json!({"message": "invalid refresh token"})),
    }
}

fn v1_denied(status: TokenStatus) -> Option<Reply> {
    match status {
        TokenStatus::Valid => None,
        TokenStatus::Expired => Some(reply(StatusCode::FORBIDDEN, json!({"message": "token-expired"}))),
        TokenStatus::Unknown => Some(reply(StatusCode::UNAUTHORIZED, json!({"message": "unauthorized"}))),
    }
}

async fn get_key(State(state): State<ServerState>, headers: HeaderMap, Path(id): Path<String>) -> Reply {
    state.hit(Route::Key).await;
    let inner = state.inner.read().await;
    if let Some(denied) = v1_denied(inner.access_status(bearer(&headers))) {
        return denied;
    }
    match inner.keys.get(&id) {
        Some(key) => reply(StatusCode::OK, key.clone()),
        None => reply(StatusCode::NOT_FOUND, json!({"message": "key not found"})),
    }
}

async fn create_key(State(state): State<ServerState>, headers: HeaderMap, Json(input): Json<CreateKey>) -> Reply {
    state.hit(Route::CreateKey).await;
    let mut inner = state.inner.write().await;
    if let Some(denied) = v1_denied(inner.access_status(bearer(&headers))) {
        return denied;
    }
    let id = Uuid::new_v4().to_string();
    let key = json!({"id": id, "name": input.name, "value": input.value});
    inner.keys.insert(id, key.clone());
    reply(StatusCode::CREATED, key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_pair_omits_refresh_token() {
        let pair = Inner::default().issue(false);
        let json = serde_json::to_value(&pair).unwrap();
        assert!(json["token"]["token"].is_string());
        assert!(json.get("refreshToken").is_none());
    }

    #[test]
    fn refreshable_pair_has_both_tokens() {
        let mut inner = Inner::default();
        let pair = inner.issue(true);
        let json = serde_json::to_value(&pair).unwrap();
        assert_eq!(json["token"]["token"], pair.token.token);
        assert!(json["refreshToken"]["token"].is_string());
        assert_eq!(inner.refresh_tokens.len(), 1);
    }

    #[test]
    fn issued_tokens_are_distinct() {
        let mut inner = Inner::default();
        let a = inner.issue(false);
        let b = inner.issue(false);
        assert_ne!(a.token.token, b.token.token);
        assert_eq!(inner.access_tokens.len(), 2);
    }

    #[test]
    fn access_status_tracks_expiry() {
        let mut inner = Inner::default();
        let token = inner.issue(false).token.token;
        assert!(matches!(inner.access_status(Some(&token)), TokenStatus::Valid));
        inner.access_tokens.remove(&token);
        inner.expired_tokens.insert(token.clone());
        assert!(matches!(inner.access_status(Some(&token)), TokenStatus::Expired));
        assert!(matches!(inner.access_status(None), TokenStatus::Unknown));
    }

    #[test]
    fn login_rejects_missing_password() {
        let result: Result<Login, _> = serde_json::from_str(r#"{"email":"a@b.c"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn create_key_value_is_optional() {
        let input: CreateKey = serde_json::from_str(r#"{"name":"k1"}"#).unwrap();
        assert_eq!(input.name, "k1");
        assert!(input.value.is_none());
    }

    #[test]
    fn bearer_requires_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Token abc".parse().unwrap());
        assert_eq!(bearer(&headers), None);
        headers.insert(AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(bearer(&headers), Some("abc"));
    }
}
