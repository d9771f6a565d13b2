//! Verify expiry detection and request building against JSON test vectors
//! stored in `test-vectors/`.
//!
//! Bodies are compared as parsed JSON so field ordering does not matter.

use async_trait::async_trait;
use chranilka_core::{
    ApiResponse, ApiVariant, Credentials, ExecutionMode, HttpMethod, HttpRequest, HttpResponse,
    QueryOptions, RequestSpec, SessionClient, Transport, TransportError,
};
use serde_json::Value;

/// Answers every request with a login response carrying `token`.
struct LoginOnly {
    token: String,
}

#[async_trait]
impl Transport for LoginOnly {
    async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse {
            status: 200,
            body: serde_json::json!({"token": {"token": self.token}}).to_string(),
        })
    }
}

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PATCH" => HttpMethod::Patch,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn parse_variant(s: &str) -> ApiVariant {
    match s {
        "legacy" => ApiVariant::LEGACY,
        "refreshable" => ApiVariant::REFRESHABLE,
        other => panic!("unknown variant: {other}"),
    }
}

fn pairs(value: &Value) -> Vec<(String, String)> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            let arr = h.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect()
}

#[test]
fn expiry_test_vectors() {
    let raw = include_str!("../../test-vectors/expiry.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let variant = parse_variant(case["variant"].as_str().unwrap());
        let response = ApiResponse {
            status: case["status"].as_u64().unwrap() as u16,
            body: case["body"].clone(),
        };
        assert_eq!(
            variant.is_expired(&response),
            case["expired"].as_bool().unwrap(),
            "{name}"
        );
    }
}

#[tokio::test]
async fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let base = vectors["base_url"].as_str().unwrap();

    let client = SessionClient::with_transport(
        Credentials::new(base, "user@example.com", "secret"),
        ApiVariant::LEGACY,
        LoginOnly {
            token: vectors["access_token"].as_str().unwrap().to_string(),
        },
    )
    .with_mode(ExecutionMode::Live);
    client.initialize().await.unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let spec_json = &case["spec"];
        let spec = RequestSpec::new(
            parse_method(spec_json["method"].as_str().unwrap()),
            spec_json["path"].as_str().unwrap(),
        )
        .with_params(spec_json["params"].as_object().unwrap().clone());

        let options = pairs(&case["query"])
            .into_iter()
            .fold(QueryOptions::new(), |opts, (k, v)| opts.with(k, v));

        let expected = &case["expected_request"];
        let req = client.build_request(&spec, &options).unwrap();

        assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, format!("{base}{}", expected["url"].as_str().unwrap()), "{name}: url");
        assert_eq!(req.headers, pairs(&expected["headers"]), "{name}: headers");

        let params = req.params.clone().unwrap_or(Value::Null);
        assert_eq!(params, expected["params"], "{name}: params");

        let body: Value = req
            .body
            .as_deref()
            .map(|b| serde_json::from_str(b).unwrap())
            .unwrap_or(Value::Null);
        assert_eq!(body, expected["body"], "{name}: body");
    }
}
