//! Blocking client for the New/Mode engagement API.
//!
//! # Overview
//! Wraps the API's tools, targets, actions, campaigns, organizations,
//! services and outreaches behind fourteen methods on `NewmodeClient`. Each
//! method issues a CSRF token fetch plus one HTTP call with basic auth, and
//! unwraps the response envelope that resource uses.
//!
//! # Design
//! - Requests and responses are plain data (`HttpRequest`, `HttpResponse`);
//!   a `Transport` does the I/O. `UreqTransport` is the default, any
//!   `Fn(&HttpRequest) -> Result<HttpResponse, ApiError>` works too.
//! - `NewmodeClient` is stateless apart from its immutable `ClientConfig`.
//! - Failures are returned as `ApiError` and also logged once as a
//!   `tracing` warning. The crate never installs a subscriber.
//! - Resources stay `serde_json::Value`; envelope rules (`Envelope`) are
//!   spelled out per operation.
//!
//! ```no_run
//! use newmode_core::{params, ConfigArgs, NewmodeClient};
//!
//! let client = NewmodeClient::from_env(ConfigArgs::credentials("user", "secret"))?;
//! let tools = client.get_tools(&params([("page", "1")]))?;
//! println!("{tools}");
//! # Ok::<(), newmode_core::ApiError>(())
//! ```

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod request;
pub mod transport;
pub mod types;

pub use client::{parse_response, NewmodeClient};
pub use config::{ClientConfig, ConfigArgs, DEFAULT_API_URL, DEFAULT_API_VERSION};
pub use envelope::Envelope;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use request::{RequestSpec, CSRF_HEADER, TOKEN_ENDPOINT};
pub use transport::UreqTransport;
pub use types::{params, LookupSearch, Params};
