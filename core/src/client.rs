//! Session-aware client for the key service.
//!
//! # Design
//! `SessionClient` owns the credentials, the current `Session` snapshot and a
//! `Transport`. Every public operation builds a `RequestSpec` and runs it
//! through [`SessionClient::request`], which retries once after recovering
//! from an expired token. The retried response is returned as-is, even if it
//! is another expiry, so recovery can never loop.
//!
//! The session lives in an `ArcSwapOption`: readers take a cheap snapshot and
//! recovery stores a complete replacement. Two calls that see an expiry at the
//! same time each recover and each store their own session; the last store
//! wins. Recovery is not deduplicated.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::auth::{self, bearer, json_content_type};
use crate::error::{ClientError, ConfigError, Result};
use crate::http::HttpRequest;
use crate::query::{build_url, QueryOptions, ResolvedUrl};
use crate::session::{Credentials, ExecutionMode, Session};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{ApiResponse, RequestSpec};
use crate::variant::ApiVariant;

/// Client for the key service that logs in once and keeps the session fresh.
///
/// Requests carry the current access token. A response with the variant's
/// expiry signature triggers one recovery and one retry of the same call.
pub struct SessionClient<T = ReqwestTransport> {
    credentials: Credentials,
    variant: ApiVariant,
    mode: ExecutionMode,
    transport: T,
    session: ArcSwapOption<Session>,
}

impl SessionClient<ReqwestTransport> {
    /// Client over the default reqwest transport. The execution mode is read
    /// from the environment.
    pub fn new(credentials: Credentials, variant: ApiVariant) -> Self {
        Self::with_transport(credentials, variant, ReqwestTransport::default())
    }

    /// Credentials and execution mode both come from the environment.
    pub fn from_env(variant: ApiVariant) -> std::result::Result<Self, ConfigError> {
        Ok(Self::new(Credentials::from_env()?, variant))
    }
}

impl<T: Transport> SessionClient<T> {
    pub fn with_transport(credentials: Credentials, variant: ApiVariant, transport: T) -> Self {
        Self {
            credentials,
            variant,
            mode: ExecutionMode::from_env(),
            transport,
            session: ArcSwapOption::empty(),
        }
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn variant(&self) -> &ApiVariant {
        &self.variant
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Current session snapshot, if authenticated.
    pub fn session(&self) -> Option<Arc<Session>> {
        self.session.load_full()
    }

    /// Log in and store the session.
    ///
    /// In `ExecutionMode::Test` this returns immediately without a network call
    /// and the session stays empty. On failure the previous session, if any,
    /// is left in place.
    pub async fn initialize(&self) -> Result<()> {
        if self.mode == ExecutionMode::Test {
            debug!("test execution mode, skipping authentication");
            return Ok(());
        }
        let session = self.authenticate().await?;
        self.session.store(Some(Arc::new(session)));
        info!(username = %self.credentials.username(), "authenticated");
        Ok(())
    }

    /// Obtain a fresh session with a full login. Does not store it.
    async fn authenticate(&self) -> Result<Session> {
        let endpoint = auth::login_endpoint(&self.credentials, &self.variant);
        let request = auth::build_login(&self.credentials, &self.variant)?;
        let response = self.send(request).await?;
        auth::parse_login(&endpoint, &self.variant, &response).inspect_err(|e| {
            warn!(%endpoint, error = %e, "authentication failed");
        })
    }

    /// Replace the session after an expiry.
    ///
    /// Uses the refresh endpoint when the variant has one and the session
    /// holds a refresh token, and a full login otherwise. A failure leaves the
    /// current session untouched.
    pub async fn recover(&self) -> Result<Arc<Session>> {
        let current = self.session.load_full().ok_or(ClientError::NotInitialized)?;
        let session = match auth::build_refresh(&self.credentials, &self.variant, &current)? {
            Some(request) => {
                let endpoint = request.url.clone();
                let response = self.send(request).await?;
                auth::parse_refresh(&endpoint, &current, &response).inspect_err(|e| {
                    warn!(%endpoint, error = %e, "token refresh failed");
                })?
            }
            None => self.authenticate().await?,
        };
        let session = Arc::new(session);
        self.session.store(Some(Arc::clone(&session)));
        info!(refreshed = self.variant.supports_refresh(), "session recovered");
        Ok(session)
    }

    /// Base URL joined with `path`, plus every query option.
    pub fn resolve_url(&self, path: &str, options: &QueryOptions) -> Result<ResolvedUrl> {
        Ok(build_url(self.credentials.api_url(), path, options)?)
    }

    /// Turn a `RequestSpec` into a transport request carrying the current
    /// access token.
    pub fn build_request(&self, spec: &RequestSpec, options: &QueryOptions) -> Result<HttpRequest> {
        let session = self.session.load_full().ok_or(ClientError::NotInitialized)?;
        let url = self.resolve_url(&spec.path, options)?.into_string();
        let rule = spec.method.rule();

        let mut headers = Vec::with_capacity(2);
        if rule.content_type_json {
            headers.push(json_content_type());
        }
        headers.push(bearer(session.access_token()));

        let (params, body) = if rule.json_body {
            (None, Some(serde_json::to_string(&spec.params)?))
        } else if spec.params.is_empty() {
            (None, None)
        } else {
            (Some(Value::Object(spec.params.clone())), None)
        };

        Ok(HttpRequest {
            method: spec.method,
            url,
            headers,
            params,
            body,
        })
    }

    /// One round trip, no expiry handling.
    pub async fn execute(&self, spec: &RequestSpec, options: &QueryOptions) -> Result<ApiResponse> {
        let request = self.build_request(spec, options)?;
        self.send(request).await
    }

    /// Execute `spec`; on an expiry response recover and execute it once more.
    pub async fn request(&self, spec: &RequestSpec, options: &QueryOptions) -> Result<ApiResponse> {
        let response = self.execute(spec, options).await?;
        if !self.variant.is_expired(&response) {
            return Ok(response);
        }
        warn!(method = %spec.method, path = %spec.path, status = response.status, "access token expired");
        self.recover().await?;
        self.execute(spec, options).await
    }

    /// Fetch one key by id.
    ///
    /// The id is sent as one encoded path segment. Ids that URL resolution
    /// would collapse (empty, `.`, `..`) are rejected before anything is sent.
    pub async fn get_key(&self, key_id: &str, options: &QueryOptions) -> Result<ApiResponse> {
        if matches!(key_id, "" | "." | "..") {
            return Err(ClientError::InvalidKeyId(key_id.to_string()));
        }
        let spec = RequestSpec::get(self.variant.key_path_for(key_id));
        self.request(&spec, options).await
    }

    async fn send(&self, request: HttpRequest) -> Result<ApiResponse> {
        debug!(method = %request.method, url = %request.url, "sending request");
        let response = self.transport.send(request).await?;
        let parsed = ApiResponse::from_http(response)?;
        debug!(status = parsed.status, "received response");
        Ok(parsed)
    }
}
