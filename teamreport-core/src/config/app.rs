//! Registered application keys and API endpoint locations.

use zeroize::Zeroizing;

use super::http::{HttpConfig, PaginationConfig};
use crate::credentials::Permission;
use crate::{ReportError, Result};

const DEFAULT_API_BASE: &str = "https://api.dropboxapi.com/2";
const DEFAULT_AUTHORIZE_URL: &str = "https://www.dropbox.com/oauth2/authorize";
const DEFAULT_TOKEN_URL: &str = "https://api.dropboxapi.com/oauth2/token";

/// Key and secret of one registered application.
#[derive(Clone)]
pub struct AppKey {
    pub key: String,
    secret: Zeroizing<String>,
}

impl AppKey {
    /// Creates an app key; the secret is zeroed on drop.
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: Zeroizing::new(secret.into()),
        }
    }

    /// Exposes the secret for the token exchange.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    fn is_blank(&self) -> bool {
        self.key.trim().is_empty() || self.secret.trim().is_empty()
    }
}

impl std::fmt::Debug for AppKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppKey")
            .field("key", &self.key)
            .field("secret", &"****")
            .finish()
    }
}

/// Locations of the team API and the OAuth2 endpoints.
///
/// Overridable so tests can point the client at a local mock server.
#[derive(Debug, Clone)]
pub struct ApiEndpoints {
    /// Base URL of the RPC API, without trailing slash
    pub api_base: String,
    /// OAuth2 authorization page
    pub authorize_url: String,
    /// OAuth2 token exchange endpoint
    pub token_url: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
        }
    }
}

impl ApiEndpoints {
    /// Default OAuth2 endpoints with a different API base.
    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Sets the authorization page URL.
    pub fn with_authorize_url(mut self, url: impl Into<String>) -> Self {
        self.authorize_url = url.into();
        self
    }

    /// Sets the token exchange URL.
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Full URL of an RPC endpoint such as `team/members/list`.
    pub fn rpc_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.api_base.trim_end_matches('/'), endpoint)
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("API base", &self.api_base),
            ("authorize", &self.authorize_url),
            ("token", &self.token_url),
        ] {
            url::Url::parse(value).map_err(|e| {
                ReportError::configuration(format!("Invalid {name} URL '{value}': {e}"))
            })?;
        }
        Ok(())
    }
}

/// Complete configuration of a report run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Application name shown in the authorization dialogue
    pub app_name: String,
    pub info_app: Option<AppKey>,
    pub file_app: Option<AppKey>,
    pub audit_app: Option<AppKey>,
    pub endpoints: ApiEndpoints,
    pub http: HttpConfig,
    pub pagination: PaginationConfig,
}

impl AppConfig {
    /// Creates a configuration with no app keys and default endpoints.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            info_app: None,
            file_app: None,
            audit_app: None,
            endpoints: ApiEndpoints::default(),
            http: HttpConfig::default(),
            pagination: PaginationConfig::default(),
        }
    }

    /// Registers the application used for `permission`.
    pub fn with_app(mut self, permission: Permission, app: AppKey) -> Self {
        match permission {
            Permission::Info => self.info_app = Some(app),
            Permission::File => self.file_app = Some(app),
            Permission::Audit => self.audit_app = Some(app),
        }
        self
    }

    /// Sets the API and OAuth2 endpoints.
    pub fn with_endpoints(mut self, endpoints: ApiEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Sets the HTTP client configuration.
    pub fn with_http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    /// Sets the pagination limits.
    pub fn with_pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = pagination;
        self
    }

    /// Returns the application registered for `permission`.
    ///
    /// # Errors
    /// Returns a configuration error when no non-blank key is registered.
    pub fn app_for(&self, permission: Permission) -> Result<&AppKey> {
        let app = match permission {
            Permission::Info => self.info_app.as_ref(),
            Permission::File => self.file_app.as_ref(),
            Permission::Audit => self.audit_app.as_ref(),
        };
        app.filter(|a| !a.is_blank()).ok_or_else(|| {
            ReportError::configuration(format!(
                "No app key/secret configured for '{}' permission",
                permission.label()
            ))
        })
    }

    /// Verifies that every permission in `required` has an app key.
    ///
    /// # Errors
    /// Returns the first missing permission as a configuration error.
    pub fn check_permissions(&self, required: &[Permission]) -> Result<()> {
        for permission in required {
            self.app_for(*permission)?;
        }
        Ok(())
    }

    /// Validates endpoint URLs.
    ///
    /// # Errors
    /// Returns a configuration error for any URL that does not parse.
    pub fn validate(&self) -> Result<()> {
        self.endpoints.validate()
    }
}
