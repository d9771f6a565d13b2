//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. `SessionClient` builds `HttpRequest`
//! values and hands them to a [`Transport`](crate::transport::Transport); it
//! never speaks HTTP itself. All fields use owned types so values can be
//! queued, recorded and replayed in tests without lifetime concerns.

use serde_json::Value;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

/// How a method carries its parameters and which headers it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodRule {
    /// Params are serialized as a JSON body (`true`) or passed through as
    /// transport-level request parameters (`false`).
    pub json_body: bool,
    /// Send `content-type: application/json`.
    pub content_type_json: bool,
}

const NO_BODY: MethodRule = MethodRule {
    json_body: false,
    content_type_json: false,
};

const JSON_BODY: MethodRule = MethodRule {
    json_body: true,
    content_type_json: true,
};

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Body and header rules for this method. New methods get one row here.
    pub fn rule(self) -> MethodRule {
        match self {
            HttpMethod::Get | HttpMethod::Delete => NO_BODY,
            HttpMethod::Post | HttpMethod::Patch => JSON_BODY,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Transport-level parameters for body-less methods. Never encoded into
    /// the URL by the client.
    pub params: Option<Value>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
///
/// Constructed by the transport after executing an `HttpRequest`. Any status
/// code is a valid response; only failures to complete the round trip are
/// transport errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_less_methods_skip_content_type() {
        for method in [HttpMethod::Get, HttpMethod::Delete] {
            let rule = method.rule();
            assert!(!rule.json_body, "{method}");
            assert!(!rule.content_type_json, "{method}");
        }
    }

    #[test]
    fn body_methods_send_json() {
        for method in [HttpMethod::Post, HttpMethod::Patch] {
            let rule = method.rule();
            assert!(rule.json_body, "{method}");
            assert!(rule.content_type_json, "{method}");
        }
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = HttpRequest {
            method: HttpMethod::Get,
            url: "http://localhost/".to_string(),
            headers: vec![("Authorization".to_string(), "Bearer T1".to_string())],
            params: None,
            body: None,
        };
        assert_eq!(req.header("authorization"), Some("Bearer T1"));
        assert_eq!(req.header("content-type"), None);
    }
}
