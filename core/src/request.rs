//! Request descriptors and their translation into wire requests.
//!
//! # Design
//! A `RequestSpec` is what an operation asks for: endpoint, method, query,
//! payload, and whether the call is version-prefixed and CSRF-protected.
//! `RequestSpec::build` turns it into an `HttpRequest` for a given
//! configuration and (optional) CSRF token. Building does no I/O.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use secrecy::ExposeSecret;
use serde_json::Value;
use url::Url;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};
use crate::types::Params;

/// Header carrying the session token on protected calls.
pub const CSRF_HEADER: &str = "X-CSRF-Token";
/// Unversioned endpoint that hands out CSRF tokens.
pub const TOKEN_ENDPOINT: &str = "session/token";

/// Description of a single API call.
///
/// Defaults match what every resource operation uses: version-prefixed and
/// CSRF-protected.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub endpoint: String,
    /// Trailing path segment appended after `endpoint`, percent-encoded.
    pub segment: Option<String>,
    pub method: HttpMethod,
    pub params: Params,
    pub payload: Option<Value>,
    pub versioned: bool,
    pub requires_csrf: bool,
}

impl RequestSpec {
    pub fn new(method: HttpMethod, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            segment: None,
            method,
            params: Params::new(),
            payload: None,
            versioned: true,
            requires_csrf: true,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, endpoint)
    }

    /// The token fetch itself: unversioned and unprotected.
    pub fn csrf_token() -> Self {
        Self::get(TOKEN_ENDPOINT).unversioned().without_csrf()
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.segment = Some(segment.into());
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn unversioned(mut self) -> Self {
        self.versioned = false;
        self
    }

    pub fn without_csrf(mut self) -> Self {
        self.requires_csrf = false;
        self
    }

    /// Absolute URL for this call, query string included.
    pub fn url(&self, config: &ClientConfig) -> Result<Url, ApiError> {
        let mut raw = config.api_url().to_string();
        if self.versioned {
            raw.push_str(config.api_version());
            raw.push('/');
        }
        raw.push_str(&self.endpoint);

        let mut url = Url::parse(&raw)?;
        if let Some(segment) = &self.segment {
            url.path_segments_mut()
                .map_err(|()| ApiError::InvalidUrl(format!("{raw} cannot take a path segment")))?
                .push(segment);
        }
        if !self.params.is_empty() {
            url.query_pairs_mut().extend_pairs(self.params.iter());
        }
        Ok(url)
    }

    /// Translate into a wire request. `csrf` is attached as `X-CSRF-Token`
    /// when present; a GET never carries a body.
    pub fn build(&self, config: &ClientConfig, csrf: Option<&str>) -> Result<HttpRequest, ApiError> {
        let url = self.url(config)?;

        let mut headers = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Authorization".to_string(), basic_auth(config)),
        ];
        if let Some(token) = csrf {
            headers.push((CSRF_HEADER.to_string(), token.to_string()));
        }

        let body = match self.method {
            HttpMethod::Get => None,
            _ => {
                let payload = self.payload.clone().unwrap_or_else(|| Value::Object(Default::default()));
                let text = serde_json::to_string(&payload).map_err(|e| ApiError::Serialization(e.to_string()))?;
                Some(text)
            }
        };

        Ok(HttpRequest {
            method: self.method,
            url: url.into(),
            headers,
            body,
        })
    }
}

fn basic_auth(config: &ClientConfig) -> String {
    let credentials = format!("{}:{}", config.api_user(), config.api_password().expose_secret());
    format!("Basic {}", STANDARD.encode(credentials))
}
