//! Async client core for the Chranilka key service.
//!
//! # Overview
//! Authenticates once, attaches the bearer token to every call, and recovers
//! from token expiry by logging in again (or refreshing) and retrying the
//! failed call exactly once.
//!
//! # Design
//! - `SessionClient` owns the credentials and an immutable `Session` snapshot
//!   that is replaced wholesale on (re)authentication.
//! - The two service flavours are one `ApiVariant` descriptor each; expiry
//!   detection and recovery are shared code parameterised by it.
//! - I/O goes through the `Transport` trait. Requests and responses are plain
//!   data, so tests script the transport instead of mocking HTTP.
//!
//! ```no_run
//! use chranilka_core::{ApiVariant, Credentials, QueryOptions, SessionClient};
//!
//! # async fn run() -> chranilka_core::Result<()> {
//! let client = SessionClient::new(
//!     Credentials::new("https://keys.example.com", "user@example.com", "secret"),
//!     ApiVariant::REFRESHABLE,
//! );
//! client.initialize().await?;
//! let key = client.get_key("42", &QueryOptions::new()).await?;
//! println!("{} {}", key.status, key.body);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod http;
pub mod query;
pub mod session;
pub mod transport;
pub mod types;
pub mod variant;

pub use client::SessionClient;
pub use error::{ClientError, ConfigError, Result, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, MethodRule};
pub use query::{QueryOptions, ResolvedUrl};
pub use session::{Credentials, ExecutionMode, Session};
pub use transport::{ReqwestTransport, Transport};
pub use types::{ApiResponse, RequestSpec};
pub use variant::ApiVariant;
