//! HTTP implementation of [`TeamApi`] against the Dropbox Business API v2.
//!
//! Every call is an RPC-style `POST` with a JSON body. Calls made on behalf of
//! a member carry the `Dropbox-API-Select-User` header. Rate-limited (429)
//! and server-error (5xx) responses are retried with exponential back-off,
//! honouring `Retry-After` when present. Token revocation is the exception:
//! one attempt with a short timeout.

mod wire;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::api::{AsMember, TeamApi};
use crate::config::{ApiEndpoints, AppConfig, HttpConfig};
use crate::credentials::AccessToken;
use crate::models::{FolderMembership, MemberDevices, SharedFolder, SpaceUsage, TeamMember};
use crate::pagination::{Cursor, Page};
use crate::{ReportError, Result};

use wire::{
    ApiErrorBody, CursorArg, ListFolderMembersArgs, ListFoldersArgs, ListFoldersResult,
    ListMembersDevicesArg, ListMembersDevicesResult, MembersListArg, MembersListResult,
    SharedFolderMembers, SpaceUsageResult,
};

/// Header selecting the member a team token acts as.
pub const SELECT_USER_HEADER: &str = "Dropbox-API-Select-User";

const MEMBERS_LIST: &str = "team/members/list";
const MEMBERS_LIST_CONTINUE: &str = "team/members/list/continue";
const DEVICES_LIST: &str = "team/devices/list_members_devices";
const FOLDERS_LIST: &str = "sharing/list_folders";
const FOLDERS_LIST_CONTINUE: &str = "sharing/list_folders/continue";
const FOLDER_MEMBERS_LIST: &str = "sharing/list_folder_members";
const FOLDER_MEMBERS_LIST_CONTINUE: &str = "sharing/list_folder_members/continue";
const SPACE_USAGE: &str = "users/get_space_usage";
const TOKEN_REVOKE: &str = "auth/token/revoke";

/// Revocation is attempted once, under its own short timeout.
const REVOKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Attempt budget of one call.
#[derive(Debug, Clone, Copy)]
struct Attempts {
    max_retries: u32,
    timeout: Option<Duration>,
}

impl Attempts {
    const SINGLE: Self = Self {
        max_retries: 0,
        timeout: Some(REVOKE_TIMEOUT),
    };
}

/// Builds the reqwest client shared by the API client and the authorizer.
///
/// # Errors
/// Returns a configuration error for an unusable proxy or when the TLS
/// backend cannot be initialized.
pub fn build_http_client(config: &HttpConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .user_agent(concat!("teamreport/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::none());

    if let Some(proxy) = config.proxy_url() {
        debug!("Explicit proxy configuration: {}", proxy);
        let proxy = reqwest::Proxy::all(&proxy).map_err(|e| {
            ReportError::configuration(format!("Invalid proxy '{proxy}': {e}"))
        })?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| ReportError::configuration(format!("Failed to create HTTP client: {e}")))
}

/// Team API client.
#[derive(Debug, Clone)]
pub struct DropboxClient {
    http: reqwest::Client,
    endpoints: ApiEndpoints,
    max_retries: u32,
    retry_backoff: Duration,
}

impl DropboxClient {
    /// Creates a client for `endpoints`.
    ///
    /// # Errors
    /// See [`build_http_client`].
    pub fn new(endpoints: ApiEndpoints, config: &HttpConfig) -> Result<Self> {
        Ok(Self {
            http: build_http_client(config)?,
            endpoints,
            max_retries: config.max_retries,
            retry_backoff: config.retry_backoff,
        })
    }

    /// Creates a client from a run configuration.
    ///
    /// # Errors
    /// See [`build_http_client`].
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(config.endpoints.clone(), &config.http)
    }

    const fn listing_attempts(&self) -> Attempts {
        Attempts {
            max_retries: self.max_retries,
            timeout: None,
        }
    }

    /// Issues one RPC call, retrying transient failures within `attempts`,
    /// and returns the successful response.
    async fn send<B>(
        &self,
        endpoint: &str,
        token: &AccessToken,
        as_member: Option<AsMember<'_>>,
        body: &B,
        attempts: Attempts,
    ) -> Result<reqwest::Response>
    where
        B: Serialize + Sync + ?Sized,
    {
        let url = self.endpoints.rpc_url(endpoint);
        let mut retries = 0u32;
        let mut delay = self.retry_backoff;

        loop {
            let mut request = self
                .http
                .post(&url)
                .bearer_auth(token.secret())
                .json(body);
            if let Some(member) = as_member {
                request = request.header(SELECT_USER_HEADER, member);
            }
            if let Some(timeout) = attempts.timeout {
                request = request.timeout(timeout);
            }

            let response = request
                .send()
                .await
                .map_err(|e| ReportError::transport(endpoint, "request failed", e))?;
            let status = response.status();

            if status.is_success() {
                return Ok(response);
            }

            let transient =
                status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            if transient && retries < attempts.max_retries {
                retries = retries.saturating_add(1);
                let wait = retry_after(&response).unwrap_or(delay);
                warn!(
                    "{} returned {}, retry {}/{} after {:?}",
                    endpoint, status, retries, attempts.max_retries, wait
                );
                tokio::time::sleep(wait).await;
                delay = delay.saturating_mul(2);
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            let summary = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|e| e.error_summary)
                .unwrap_or(body);
            return Err(ReportError::api_status(endpoint, status.as_u16(), summary));
        }
    }

    /// Issues one RPC call and decodes its JSON result.
    async fn rpc<B, T>(
        &self,
        endpoint: &str,
        token: &AccessToken,
        as_member: Option<AsMember<'_>>,
        body: &B,
    ) -> Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        debug!("POST {}", endpoint);
        self.send(endpoint, token, as_member, body, self.listing_attempts())
            .await?
            .json()
            .await
            .map_err(|e| ReportError::transport(endpoint, "failed to decode response", e))
    }

    fn members_page(endpoint: &str, result: MembersListResult) -> Result<Page<TeamMember>> {
        let members = result.members.into_iter().map(TeamMember::from).collect();
        Page::from_has_more(endpoint, members, result.has_more, result.cursor)
    }

    fn folders_page(result: ListFoldersResult) -> Page<SharedFolder> {
        let folders = result.entries.into_iter().map(SharedFolder::from).collect();
        Page::from_cursor(folders, result.cursor)
    }

    fn folder_members_page(mut result: SharedFolderMembers) -> Page<FolderMembership> {
        let cursor = result.cursor.take();
        Page::from_cursor(result.into_entries(), cursor)
    }
}

/// Server-requested delay from a `Retry-After: <seconds>` header.
fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[async_trait]
impl TeamApi for DropboxClient {
    async fn members_list(&self, token: &AccessToken) -> Result<Page<TeamMember>> {
        let result = self
            .rpc(MEMBERS_LIST, token, None, &MembersListArg::default())
            .await?;
        Self::members_page(MEMBERS_LIST, result)
    }

    async fn members_list_continue(
        &self,
        token: &AccessToken,
        cursor: &Cursor,
    ) -> Result<Page<TeamMember>> {
        let arg = CursorArg {
            cursor: cursor.as_str(),
        };
        let result = self.rpc(MEMBERS_LIST_CONTINUE, token, None, &arg).await?;
        Self::members_page(MEMBERS_LIST_CONTINUE, result)
    }

    async fn devices_list(
        &self,
        token: &AccessToken,
        cursor: Option<&Cursor>,
    ) -> Result<Page<MemberDevices>> {
        let arg = ListMembersDevicesArg::all_sessions(cursor.map(Cursor::as_str));
        let result: ListMembersDevicesResult = self.rpc(DEVICES_LIST, token, None, &arg).await?;
        let devices = result.devices.into_iter().map(MemberDevices::from).collect();
        Page::from_has_more(DEVICES_LIST, devices, result.has_more, result.cursor)
    }

    async fn shared_folders_list(
        &self,
        token: &AccessToken,
        as_member: AsMember<'_>,
    ) -> Result<Page<SharedFolder>> {
        let result = self
            .rpc(FOLDERS_LIST, token, Some(as_member), &ListFoldersArgs::default())
            .await?;
        Ok(Self::folders_page(result))
    }

    async fn shared_folders_list_continue(
        &self,
        token: &AccessToken,
        as_member: AsMember<'_>,
        cursor: &Cursor,
    ) -> Result<Page<SharedFolder>> {
        let arg = CursorArg {
            cursor: cursor.as_str(),
        };
        let result = self
            .rpc(FOLDERS_LIST_CONTINUE, token, Some(as_member), &arg)
            .await?;
        Ok(Self::folders_page(result))
    }

    async fn folder_members_list(
        &self,
        token: &AccessToken,
        as_member: AsMember<'_>,
        shared_folder_id: &str,
    ) -> Result<Page<FolderMembership>> {
        let arg = ListFolderMembersArgs::new(shared_folder_id);
        let result = self
            .rpc(FOLDER_MEMBERS_LIST, token, Some(as_member), &arg)
            .await?;
        Ok(Self::folder_members_page(result))
    }

    async fn folder_members_list_continue(
        &self,
        token: &AccessToken,
        as_member: AsMember<'_>,
        cursor: &Cursor,
    ) -> Result<Page<FolderMembership>> {
        let arg = CursorArg {
            cursor: cursor.as_str(),
        };
        let result = self
            .rpc(FOLDER_MEMBERS_LIST_CONTINUE, token, Some(as_member), &arg)
            .await?;
        Ok(Self::folder_members_page(result))
    }

    async fn space_usage(
        &self,
        token: &AccessToken,
        as_member: AsMember<'_>,
    ) -> Result<SpaceUsage> {
        let result: SpaceUsageResult = self
            .rpc(SPACE_USAGE, token, Some(as_member), &serde_json::Value::Null)
            .await?;
        Ok(result.into())
    }

    async fn revoke_token(&self, token: &AccessToken) -> Result<()> {
        debug!("POST {}", TOKEN_REVOKE);
        self.send(
            TOKEN_REVOKE,
            token,
            None,
            &serde_json::Value::Null,
            Attempts::SINGLE,
        )
        .await
            .map(|_| ())
    }
}
