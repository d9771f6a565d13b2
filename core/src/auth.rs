//! Login and refresh requests, and turning their responses into sessions.
//!
//! # Design
//! Like the rest of the request plumbing, each call is split into a `build_*`
//! function producing an `HttpRequest` and a `parse_*` function consuming the
//! parsed response. `SessionClient` performs the round trip in between and
//! decides when to swap in the resulting `Session`.

use crate::error::ClientError;
use crate::http::{HttpMethod, HttpRequest};
use crate::query::{join_url, QueryOptions};
use crate::session::{Credentials, Session};
use crate::types::{ApiResponse, LoginRequest, TokenResponse};
use crate::variant::ApiVariant;

pub(crate) fn bearer(token: &str) -> (String, String) {
    ("Authorization".to_string(), format!("Bearer {token}"))
}

pub(crate) fn json_content_type() -> (String, String) {
    ("content-type".to_string(), "application/json".to_string())
}

/// Login endpoint URL, used for the request and in error reports.
pub fn login_endpoint(credentials: &Credentials, variant: &ApiVariant) -> String {
    format!("{}{}", credentials.api_url(), variant.auth_path)
}

/// `POST {base}{auth_path}` with `{email, password}`. Carries no bearer token.
pub fn build_login(credentials: &Credentials, variant: &ApiVariant) -> Result<HttpRequest, ClientError> {
    let body = serde_json::to_string(&LoginRequest {
        email: credentials.username(),
        password: credentials.password(),
    })?;
    Ok(HttpRequest {
        method: HttpMethod::Post,
        url: login_endpoint(credentials, variant),
        headers: vec![json_content_type()],
        params: None,
        body: Some(body),
    })
}

/// Extract a session from a login response.
///
/// Only a missing access token is fatal. The refresh token is kept when the
/// variant supports refresh and it is well-formed.
pub fn parse_login(endpoint: &str, variant: &ApiVariant, response: &ApiResponse) -> Result<Session, ClientError> {
    let failed = || ClientError::AuthenticationFailed {
        endpoint: endpoint.to_string(),
        response: response.body.to_string(),
    };
    let tokens = TokenResponse::new(&response.body);
    let access = tokens.access_token().ok_or_else(failed)?;
    let refresh = if variant.supports_refresh() {
        tokens.refresh_token().map(str::to_string)
    } else {
        None
    };
    Ok(Session::new(access.to_string(), refresh))
}

/// `GET {base}{refresh_path}` authorized with the refresh token.
///
/// Returns `None` when the variant has no refresh endpoint or the session
/// holds no refresh token.
pub fn build_refresh(
    credentials: &Credentials,
    variant: &ApiVariant,
    session: &Session,
) -> Result<Option<HttpRequest>, ClientError> {
    let (Some(path), Some(refresh_token)) = (variant.refresh_path, session.refresh_token()) else {
        return Ok(None);
    };
    let url = join_url(credentials.api_url(), path, &QueryOptions::new())?;
    Ok(Some(HttpRequest {
        method: HttpMethod::Get,
        url: url.into(),
        headers: vec![bearer(refresh_token)],
        params: None,
        body: None,
    }))
}

/// Extract the replacement session from a refresh response.
///
/// A response without a usable new refresh token keeps the previous one.
pub fn parse_refresh(endpoint: &str, previous: &Session, response: &ApiResponse) -> Result<Session, ClientError> {
    let failed = || ClientError::RefreshFailed {
        endpoint: endpoint.to_string(),
        response: response.body.to_string(),
    };
    let tokens = TokenResponse::new(&response.body);
    let access = tokens.access_token().ok_or_else(failed)?;
    let refresh = tokens
        .refresh_token()
        .or(previous.refresh_token())
        .map(str::to_string);
    Ok(Session::new(access.to_string(), refresh))
}
