//! Token acquisition for each permission scope.
//!
//! The pipeline only sees the [`Authorizer`] trait. [`CodeFlowAuthorizer`]
//! implements it with the OAuth2 authorization-code flow: the user opens an
//! authorize URL, approves the app, and pastes the code back through a
//! [`CodePrompt`]. Tests substitute a scripted authorizer.
//!
//! # Security
//! Authorization codes, app secrets and tokens are never logged.

use async_trait::async_trait;
use oauth2::basic::BasicClient;
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RequestTokenError,
    TokenResponse, TokenUrl,
};
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::config::{ApiEndpoints, AppKey, HttpConfig};
use crate::credentials::{AccessToken, Permission};
use crate::{ReportError, Result};

/// Acquires one access token per permission scope.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Obtains a token for `permission` using the registered `app`.
    ///
    /// # Errors
    /// Any failure is an [`ReportError::Auth`] error and aborts the run.
    async fn acquire(&self, app: &AppKey, permission: Permission) -> Result<AccessToken>;
}

/// What the user is asked to approve.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationRequest<'a> {
    /// Application name shown to the user
    pub app_name: &'a str,
    pub permission: Permission,
    /// Authorize page to visit
    pub url: &'a str,
}

/// Collects the authorization code from the user.
///
/// Implementations may block; acquisition runs before any report logic.
pub trait CodePrompt: Send + Sync {
    /// Presents `request` and returns the code the user pasted.
    ///
    /// # Errors
    /// Returns an error when the code cannot be read.
    fn read_code(&self, request: &AuthorizationRequest<'_>) -> Result<String>;
}


/// OAuth2 authorization-code flow without redirect URI.
pub struct CodeFlowAuthorizer<P> {
    app_name: String,
    authorize_url: String,
    token_url: String,
    http: reqwest::Client,
    prompt: P,
}

impl<P: CodePrompt> CodeFlowAuthorizer<P> {
    /// Creates an authorizer against `endpoints`.
    ///
    /// # Errors
    /// Returns a configuration error when the HTTP client cannot be built
    /// (for instance an unusable proxy).
    pub fn new(
        app_name: impl Into<String>,
        endpoints: &ApiEndpoints,
        http: &HttpConfig,
        prompt: P,
    ) -> Result<Self> {
        Ok(Self {
            app_name: app_name.into(),
            authorize_url: endpoints.authorize_url.clone(),
            token_url: endpoints.token_url.clone(),
            http: crate::client::build_http_client(http)?,
            prompt,
        })
    }

    /// Authorize page URL for `app`, carrying a fresh `state`.
    ///
    /// # Errors
    /// Returns a configuration error when the authorize URL does not parse.
    pub fn authorize_url(&self, app: &AppKey, state: &str) -> Result<String> {
        let auth_url = AuthUrl::new(self.authorize_url.clone()).map_err(|e| {
            ReportError::configuration(format!(
                "Invalid authorize URL '{}': {}",
                self.authorize_url, e
            ))
        })?;
        let client = BasicClient::new(ClientId::new(app.key.clone())).set_auth_uri(auth_url);
        let (url, _state) = client
            .authorize_url(|| CsrfToken::new(state.to_string()))
            .url();
        Ok(url.to_string())
    }

    /// Exchanges an authorization code for an access token.
    ///
    /// # Errors
    /// Returns an authorization error for an empty code, a failed request,
    /// a rejected code or an undecodable response.
    pub async fn exchange(
        &self,
        app: &AppKey,
        permission: Permission,
        code: &str,
    ) -> Result<AccessToken> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ReportError::auth_failed(
                permission.label(),
                "no authorization code entered",
            ));
        }

        let token_url = TokenUrl::new(self.token_url.clone()).map_err(|e| {
            ReportError::configuration(format!("Invalid token URL '{}': {}", self.token_url, e))
        })?;
        let client = BasicClient::new(ClientId::new(app.key.clone()))
            .set_client_secret(ClientSecret::new(app.secret().to_string()))
            .set_auth_type(AuthType::RequestBody)
            .set_token_uri(token_url);

        let response = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| match e {
                RequestTokenError::ServerResponse(rejection) => {
                    let summary = rejection
                        .error_description()
                        .cloned()
                        .unwrap_or_else(|| rejection.error().to_string());
                    ReportError::auth_failed(
                        permission.label(),
                        format!("Token exchange rejected: {summary}"),
                    )
                }
                other => ReportError::auth_source(permission.label(), "Token request failed", other),
            })?;

        let token = Zeroizing::new(response.access_token().secret().clone());
        if token.is_empty() {
            return Err(ReportError::auth_failed(
                permission.label(),
                "token response carries an empty access token",
            ));
        }

        Ok(AccessToken::new(token.as_str()))
    }
}

#[async_trait]
impl<P: CodePrompt> Authorizer for CodeFlowAuthorizer<P> {
    async fn acquire(&self, app: &AppKey, permission: Permission) -> Result<AccessToken> {
        let state = uuid::Uuid::new_v4().to_string();
        let url = self.authorize_url(app, &state)?;

        info!("Authorising '{}' permission", permission.label());
        let code = Zeroizing::new(self.prompt.read_code(&AuthorizationRequest {
            app_name: &self.app_name,
            permission,
            url: &url,
        })?);

        let token = self.exchange(app, permission, &code).await?;
        debug!("Acquired token for '{}': {:?}", permission.label(), token);
        Ok(token)
    }
}

impl<P> std::fmt::Debug for CodeFlowAuthorizer<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeFlowAuthorizer")
            .field("app_name", &self.app_name)
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct FixedCode(&'static str);

    impl CodePrompt for FixedCode {
        fn read_code(&self, _request: &AuthorizationRequest<'_>) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn authorizer(code: &'static str) -> CodeFlowAuthorizer<FixedCode> {
        CodeFlowAuthorizer::new(
            "teamreport",
            &ApiEndpoints::default(),
            &HttpConfig::default(),
            FixedCode(code),
        )
        .unwrap()
    }

    #[test]
    fn test_authorize_url_parameters() {
        let app = AppKey::new("app-key-1", "secret");
        let url = authorizer("c").authorize_url(&app, "state-123").unwrap();
        let parsed = url::Url::parse(&url).unwrap();

        assert_eq!(parsed.host_str(), Some("www.dropbox.com"));
        assert_eq!(parsed.path(), "/oauth2/authorize");
        let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("client_id".to_string(), "app-key-1".to_string())));
        assert!(pairs.contains(&("response_type".to_string(), "code".to_string())));
        assert!(pairs.contains(&("state".to_string(), "state-123".to_string())));
        assert!(!url.contains("secret"));
    }

    #[tokio::test]
    async fn test_empty_code_is_auth_error() {
        let app = AppKey::new("k", "s");
        let err = authorizer("   ")
            .acquire(&app, Permission::Info)
            .await
            .unwrap_err();

        assert_eq!(err.category(), crate::ErrorCategory::Auth);
        assert!(err.to_string().contains("Team Information"));
    }

    #[test]
    fn test_debug_omits_client() {
        let debug = format!("{:?}", authorizer("c"));
        assert!(debug.contains("CodeFlowAuthorizer"));
        assert!(debug.contains("oauth2/token"));
    }
}
