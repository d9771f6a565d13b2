//! API variant descriptors and expiry detection.
//!
//! The service exists in two flavours that differ only in endpoint paths, how
//! an expired token is reported, and whether a refresh token is issued. One
//! descriptor captures all of it so the authentication and retry code is
//! shared.

use serde_json::Value;

use crate::types::ApiResponse;

/// Substring that marks an expired token in the trigger field.
pub const EXPIRY_MARKER: &str = "token-expired";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiVariant {
    /// Login endpoint, below the base URL.
    pub auth_path: &'static str,
    /// Refresh endpoint. `None` means recovery re-sends the credentials.
    pub refresh_path: Option<&'static str>,
    /// Key lookup path prefix; the encoded key id is appended.
    pub key_path: &'static str,
    /// Status code of an expiry response.
    pub expiry_status: u16,
    /// Body field holding the expiry marker.
    pub expiry_field: &'static str,
}

impl ApiVariant {
    pub const LEGACY: ApiVariant = ApiVariant {
        auth_path: "/api/auth",
        refresh_path: None,
        key_path: "/api/key/",
        expiry_status: 401,
        expiry_field: "name",
    };

    pub const REFRESHABLE: ApiVariant = ApiVariant {
        auth_path: "/api/v1/auth",
        refresh_path: Some("/api/v1/auth/refresh"),
        key_path: "/api/v1/keys/one/",
        expiry_status: 403,
        expiry_field: "message",
    };

    pub fn supports_refresh(&self) -> bool {
        self.refresh_path.is_some()
    }

    /// Lookup path for `key_id`, percent-encoded as a single path segment.
    pub fn key_path_for(&self, key_id: &str) -> String {
        format!("{}{}", self.key_path, urlencoding::encode(key_id))
    }

    /// True when `response` carries this variant's expiry signature.
    pub fn is_expired(&self, response: &ApiResponse) -> bool {
        if response.status != self.expiry_status {
            return false;
        }
        match response.body.get(self.expiry_field) {
            Some(Value::String(s)) => s.to_ascii_lowercase().contains(EXPIRY_MARKER),
            _ => false,
        }
    }
}
