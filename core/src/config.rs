//! Client configuration.
//!
//! # Design
//! Values come from three layers, later layers winning: built-in defaults,
//! explicit arguments, then `NEWMODE_*` environment variables. Resolution
//! takes the environment as a lookup function so tests never touch the
//! process environment.

use secrecy::SecretString;

use crate::error::ApiError;

/// Production API root.
pub const DEFAULT_API_URL: &str = "https://engage.newmode.net/api/";
/// API version prefixed onto versioned endpoints.
pub const DEFAULT_API_VERSION: &str = "v1.0";

pub const ENV_API_URL: &str = "NEWMODE_API_URL";
pub const ENV_API_USER: &str = "NEWMODE_API_USER";
pub const ENV_API_PASSWORD: &str = "NEWMODE_API_PASSWORD";
pub const ENV_API_VERSION: &str = "NEWMODE_API_VERSION";

/// Explicit constructor arguments. Every field is optional; anything left
/// unset falls back to the environment and then to the defaults.
#[derive(Debug, Clone, Default)]
pub struct ConfigArgs {
    pub api_url: Option<String>,
    pub api_user: Option<String>,
    pub api_password: Option<String>,
    pub api_version: Option<String>,
}

impl ConfigArgs {
    pub fn credentials(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            api_user: Some(user.into()),
            api_password: Some(password.into()),
            ..Self::default()
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = Some(api_url.into());
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }
}

/// Immutable configuration for a `NewmodeClient`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    api_url: String,
    api_version: String,
    api_user: String,
    api_password: SecretString,
}

impl ClientConfig {
    /// Build a configuration from explicit values only, ignoring the
    /// environment.
    pub fn new(
        api_url: impl Into<String>,
        api_version: impl Into<String>,
        api_user: impl Into<String>,
        api_password: impl Into<String>,
    ) -> Self {
        Self {
            api_url: normalize_base(&api_url.into()),
            api_version: api_version.into(),
            api_user: api_user.into(),
            api_password: SecretString::from(api_password.into()),
        }
    }

    /// Resolve against the process environment.
    pub fn from_env(args: ConfigArgs) -> Result<Self, ApiError> {
        Self::resolve(args, |key| std::env::var(key).ok())
    }

    /// Resolve `args` against an arbitrary environment lookup. Environment
    /// values take precedence over explicit arguments.
    pub fn resolve<F>(args: ConfigArgs, env: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |key: &str, explicit: Option<String>| env(key).or(explicit);

        let api_url = pick(ENV_API_URL, args.api_url).unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_version =
            pick(ENV_API_VERSION, args.api_version).unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
        let api_user = pick(ENV_API_USER, args.api_user)
            .ok_or_else(|| ApiError::Config(format!("no API user given and {ENV_API_USER} is unset")))?;
        let api_password = pick(ENV_API_PASSWORD, args.api_password)
            .ok_or_else(|| ApiError::Config(format!("no API password given and {ENV_API_PASSWORD} is unset")))?;

        Ok(Self::new(api_url, api_version, api_user, api_password))
    }

    /// API root, always ending in exactly one `/`.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn api_user(&self) -> &str {
        &self.api_user
    }

    pub fn api_password(&self) -> &SecretString {
        &self.api_password
    }
}

fn normalize_base(url: &str) -> String {
    format!("{}/", url.trim_end_matches('/'))
}
