//! The HTTP round-trip capability the client depends on.
//!
//! # Design
//! `SessionClient` builds `HttpRequest` values and parses `HttpResponse`
//! values; a `Transport` executes the round trip in between. Any status code
//! comes back as `Ok`. Only connection-level failures are `TransportError`s,
//! which the client propagates without interpretation.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// `Transport` backed by a shared `reqwest::Client`.
///
/// Transport-level `params` on body-less requests are not encoded; query
/// filtering goes through `QueryOptions`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn to_reqwest(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
            ..
        } = request;

        let mut builder = self.client.request(to_reqwest(method), &url);
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| TransportError::Request {
            url: url.clone(),
            source: Box::new(e),
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| TransportError::Body {
            url,
            source: Box::new(e),
        })?;

        Ok(HttpResponse { status, body })
    }
}
