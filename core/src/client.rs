//! The New/Mode API client.
//!
//! # Design
//! `NewmodeClient` holds only its configuration and a transport; nothing
//! carries over between calls. Every resource operation is a one-liner that
//! names its endpoint, its envelope rule, and the warning to log on failure,
//! then goes through `call`. `send` is the single request primitive: it
//! fetches a fresh CSRF token when the call needs one, builds the request,
//! and executes it exactly once.

use std::fmt::Display;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{ClientConfig, ConfigArgs};
use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::request::{RequestSpec, CSRF_HEADER};
use crate::transport::UreqTransport;
use crate::types::{LookupSearch, Params};

/// Blocking client for the New/Mode API.
#[derive(Debug, Clone)]
pub struct NewmodeClient<T = UreqTransport> {
    config: ClientConfig,
    transport: T,
}

impl NewmodeClient<UreqTransport> {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }

    /// Resolve configuration from `args` and the `NEWMODE_*` environment.
    pub fn from_env(args: ConfigArgs) -> Result<Self, ApiError> {
        Ok(Self::new(ClientConfig::from_env(args)?))
    }
}

impl<T: Transport> NewmodeClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // -----------------------------------------------------------------------
    // Request primitive
    // -----------------------------------------------------------------------

    /// Build the wire request for `spec` without sending it.
    pub fn build_request(&self, spec: &RequestSpec, csrf: Option<&str>) -> Result<HttpRequest, ApiError> {
        spec.build(&self.config, csrf)
    }

    /// Issue one API call. When `spec.requires_csrf` is set a token is
    /// fetched first; if that fails the call still goes out, without the
    /// token header.
    pub fn send(&self, spec: &RequestSpec) -> Result<HttpResponse, ApiError> {
        let token = if spec.requires_csrf {
            self.csrf_token().ok()
        } else {
            None
        };
        let request = self.build_request(spec, token.as_deref())?;
        debug!(method = %request.method, url = %request.url, csrf = token.is_some(), "sending request");
        self.transport.execute(&request)
    }

    /// Fetch a fresh CSRF token from `session/token`. Never cached.
    pub fn csrf_token(&self) -> Result<String, ApiError> {
        let result = self
            .send(&RequestSpec::csrf_token())
            .and_then(|response| parse_response(response, Envelope::Raw))
            .and_then(|body| match body.get(CSRF_HEADER).and_then(Value::as_str) {
                Some(token) => Ok(token.to_string()),
                None => Err(ApiError::MissingEnvelope {
                    key: CSRF_HEADER.to_string(),
                }),
            });
        if let Err(err) = &result {
            warn!(operation = "getting CSRF token", status = ?err.status(), error = %err, "error getting CSRF token");
        }
        result
    }

    fn call(&self, what: &str, spec: RequestSpec, envelope: Envelope) -> Result<Value, ApiError> {
        let result = self.send(&spec).and_then(|response| parse_response(response, envelope));
        if let Err(err) = &result {
            warn!(
                operation = what,
                endpoint = %spec.endpoint,
                status = ?err.status(),
                error = %err,
                "error {what}"
            );
        }
        result
    }

    // -----------------------------------------------------------------------
    // Tools, targets and actions
    // -----------------------------------------------------------------------

    pub fn get_tools(&self, params: &Params) -> Result<Value, ApiError> {
        let spec = RequestSpec::get("tool").with_params(params.clone());
        self.call("getting tools", spec, Envelope::Embedded("tool"))
    }

    pub fn get_tool(&self, tool_id: impl Display, params: &Params) -> Result<Value, ApiError> {
        let spec = RequestSpec::get(format!("tool/{tool_id}")).with_params(params.clone());
        self.call("getting tool", spec, Envelope::Raw)
    }

    /// Look up the targets a tool would reach for `search`.
    ///
    /// An empty search returns the tool's custom targets. Anything else
    /// becomes one percent-encoded path segment, so `#`, `?` and `/` in a
    /// free-text search stay inside the path.
    pub fn lookup_targets(
        &self,
        tool_id: impl Display,
        search: impl Into<LookupSearch>,
        params: &Params,
    ) -> Result<Value, ApiError> {
        let mut spec = RequestSpec::get(format!("lookup/{tool_id}")).with_params(params.clone());
        if let Some(segment) = search.into().segment() {
            spec = spec.with_segment(segment);
        }
        self.call("looking up targets", spec, Envelope::Raw)
    }

    /// Action description for a tool, including the structure `run_action`
    /// expects.
    pub fn get_action(&self, tool_id: impl Display, params: &Params) -> Result<Value, ApiError> {
        let spec = RequestSpec::get(format!("action/{tool_id}")).with_params(params.clone());
        self.call("getting action", spec, Envelope::Raw)
    }

    /// Run a tool's action with `payload`, returning the posted outreach.
    pub fn run_action<P>(&self, tool_id: impl Display, payload: &P, params: &Params) -> Result<Value, ApiError>
    where
        P: Serialize + ?Sized,
    {
        let payload = match serde_json::to_value(payload) {
            Ok(payload) => payload,
            Err(e) => {
                let err = ApiError::Serialization(e.to_string());
                warn!(operation = "running action", error = %err, "error running action");
                return Err(err);
            }
        };
        let spec = RequestSpec::new(HttpMethod::Patch, format!("action/{tool_id}"))
            .with_params(params.clone())
            .with_payload(payload);
        self.call("running action", spec, Envelope::Raw)
    }

    pub fn get_target(&self, target_id: impl Display, params: &Params) -> Result<Value, ApiError> {
        let spec = RequestSpec::get(format!("target/{target_id}")).with_params(params.clone());
        self.call("getting target", spec, Envelope::Raw)
    }

    // -----------------------------------------------------------------------
    // Campaigns, organizations and services
    // -----------------------------------------------------------------------

    pub fn get_campaigns(&self, params: &Params) -> Result<Value, ApiError> {
        let spec = RequestSpec::get("campaign").with_params(params.clone());
        self.call("getting campaigns", spec, Envelope::Embedded("campaign"))
    }

    pub fn get_campaign(&self, campaign_id: impl Display, params: &Params) -> Result<Value, ApiError> {
        let spec = RequestSpec::get(format!("campaign/{campaign_id}")).with_params(params.clone());
        self.call("getting campaign", spec, Envelope::Raw)
    }

    pub fn get_organizations(&self, params: &Params) -> Result<Value, ApiError> {
        let spec = RequestSpec::get("organization").with_params(params.clone());
        self.call("getting organizations", spec, Envelope::Data)
    }

    pub fn get_organization(&self, organization_id: impl Display, params: &Params) -> Result<Value, ApiError> {
        let spec = RequestSpec::get(format!("organization/{organization_id}")).with_params(params.clone());
        self.call("getting organization", spec, Envelope::Data)
    }

    pub fn get_services(&self, params: &Params) -> Result<Value, ApiError> {
        let spec = RequestSpec::get("service").with_params(params.clone());
        self.call("getting services", spec, Envelope::Embedded("service"))
    }

    pub fn get_service(&self, service_id: impl Display, params: &Params) -> Result<Value, ApiError> {
        let spec = RequestSpec::get(format!("service/{service_id}")).with_params(params.clone());
        self.call("getting service", spec, Envelope::Raw)
    }

    // -----------------------------------------------------------------------
    // Outreaches
    // -----------------------------------------------------------------------

    /// Outreaches recorded for a tool. `nid` is set on a copy of `params`.
    pub fn get_outreaches(&self, tool_id: impl Display, params: &Params) -> Result<Value, ApiError> {
        let mut params = params.clone();
        params.insert("nid".to_string(), tool_id.to_string());
        let spec = RequestSpec::get("outreach").with_params(params);
        self.call("getting outreaches", spec, Envelope::Embedded("outreach"))
    }

    pub fn get_outreach(&self, outreach_id: impl Display, params: &Params) -> Result<Value, ApiError> {
        let spec = RequestSpec::get(format!("outreach/{outreach_id}")).with_params(params.clone());
        self.call("getting outreach", spec, Envelope::Raw)
    }
}

/// Check the status, decode JSON, and apply `envelope`.
pub fn parse_response(response: HttpResponse, envelope: Envelope) -> Result<Value, ApiError> {
    check_status(&response)?;
    let body: Value =
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))?;
    envelope.unwrap(body)
}

/// Anything but 200 is a failure.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.status == 200 {
        return Ok(());
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}
