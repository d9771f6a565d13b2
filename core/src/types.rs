//! Request descriptions, parsed responses and wire DTOs for the key service.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ClientError;
use crate::http::{HttpMethod, HttpResponse};

/// One logical API call: method, path below the base URL and parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: HttpMethod,
    pub path: String,
    pub params: Map<String, Value>,
}

impl RequestSpec {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Map::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params.extend(params);
        self
    }
}

/// Status code and JSON body of a completed call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    /// Parse a transport response. An empty body becomes `{}`.
    pub fn from_http(response: HttpResponse) -> Result<Self, ClientError> {
        let body = if response.body.trim().is_empty() {
            Value::Object(Map::new())
        } else {
            serde_json::from_str(&response.body).map_err(|source| {
                ClientError::MalformedResponse {
                    status: response.status,
                    source,
                }
            })?
        };
        Ok(Self {
            status: response.status,
            body,
        })
    }
}

/// Login payload. The service calls the username field `email`.
#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Tokens in a login or refresh response, `{"token": {"token": ..},
/// "refreshToken": {"token": ..}}`.
///
/// Each token is read on its own; one that is missing, empty or of an
/// unexpected shape counts as absent without affecting the other.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TokenResponse<'a> {
    body: &'a Value,
}

impl<'a> TokenResponse<'a> {
    pub fn new(body: &'a Value) -> Self {
        Self { body }
    }

    pub fn access_token(&self) -> Option<&'a str> {
        self.token_at("/token/token")
    }

    pub fn refresh_token(&self) -> Option<&'a str> {
        self.token_at("/refreshToken/token")
    }

    fn token_at(&self, pointer: &str) -> Option<&'a str> {
        self.body
            .pointer(pointer)
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn http(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn empty_body_parses_to_empty_object() {
        let resp = ApiResponse::from_http(http(204, "")).unwrap();
        assert_eq!(resp.status, 204);
        assert_eq!(resp.body, json!({}));
    }

    #[test]
    fn whitespace_body_parses_to_empty_object() {
        let resp = ApiResponse::from_http(http(200, " \n")).unwrap();
        assert_eq!(resp.body, json!({}));
    }

    #[test]
    fn error_body_is_returned_as_data() {
        let resp = ApiResponse::from_http(http(500, r#"{"message":"boom"}"#)).unwrap();
        assert_eq!(resp.status, 500);
        assert_eq!(resp.body["message"], "boom");
    }

    #[test]
    fn non_json_body_is_malformed() {
        let err = ApiResponse::from_http(http(502, "<html>bad gateway</html>")).unwrap_err();
        assert!(matches!(err, ClientError::MalformedResponse { status: 502, .. }));
    }

    #[test]
    fn token_response_reads_nested_tokens() {
        let body = json!({
            "token": {"token": "T1"},
            "refreshToken": {"token": "R1"}
        });
        let parsed = TokenResponse::new(&body);
        assert_eq!(parsed.access_token(), Some("T1"));
        assert_eq!(parsed.refresh_token(), Some("R1"));
    }

    #[test]
    fn empty_token_counts_as_missing() {
        let body = json!({"token": {"token": ""}});
        let parsed = TokenResponse::new(&body);
        assert_eq!(parsed.access_token(), None);
        assert_eq!(parsed.refresh_token(), None);
    }

    #[test]
    fn odd_refresh_token_shape_does_not_hide_access_token() {
        for body in [
            json!({"token": {"token": "T1"}, "refreshToken": "R1"}),
            json!({"token": {"token": "T1"}, "refreshToken": {"token": 5}}),
            json!({"token": {"token": "T1"}, "refreshToken": null}),
        ] {
            let parsed = TokenResponse::new(&body);
            assert_eq!(parsed.access_token(), Some("T1"), "{body}");
            assert_eq!(parsed.refresh_token(), None, "{body}");
        }
    }

    #[test]
    fn flat_or_non_string_access_token_is_missing() {
        for body in [json!({"token": "T1"}), json!({"token": {"token": 1}}), json!([])] {
            assert_eq!(TokenResponse::new(&body).access_token(), None, "{body}");
        }
    }

    #[test]
    fn request_spec_builders() {
        let spec = RequestSpec::post("/api/v1/keys").with_param("name", "k1");
        assert_eq!(spec.method, HttpMethod::Post);
        assert_eq!(spec.path, "/api/v1/keys");
        assert_eq!(spec.params["name"], "k1");
    }
}
