//! Typed team API surface consumed by the crawl pipeline.
//!
//! The pipeline only depends on this trait. [`crate::client::DropboxClient`]
//! implements it over HTTP; tests implement it with scripted pages.

use async_trait::async_trait;

use crate::Result;
use crate::credentials::AccessToken;
use crate::models::{FolderMembership, MemberDevices, SharedFolder, SpaceUsage, TeamMember};
use crate::pagination::{Cursor, Page};

/// Team member id whose authorization context a call runs under.
pub type AsMember<'a> = &'a str;

/// First/continue calls for every listing the reports crawl.
///
/// Implementations adapt their API's completion convention into
/// [`Page`]; callers never inspect raw cursors or `has_more` flags.
///
/// # Object Safety
/// This trait is object-safe, so reports can run against
/// `&dyn TeamApi`.
#[async_trait]
pub trait TeamApi: Send + Sync {
    /// Lists team members (first page).
    async fn members_list(&self, token: &AccessToken) -> Result<Page<TeamMember>>;

    /// Lists team members (continuation).
    async fn members_list_continue(
        &self,
        token: &AccessToken,
        cursor: &Cursor,
    ) -> Result<Page<TeamMember>>;

    /// Lists desktop, mobile and web sessions of all members.
    ///
    /// The same endpoint serves the first page (`cursor` is `None`) and every
    /// continuation.
    async fn devices_list(
        &self,
        token: &AccessToken,
        cursor: Option<&Cursor>,
    ) -> Result<Page<MemberDevices>>;

    /// Lists shared folders visible to `as_member` (first page).
    async fn shared_folders_list(
        &self,
        token: &AccessToken,
        as_member: AsMember<'_>,
    ) -> Result<Page<SharedFolder>>;

    /// Lists shared folders visible to `as_member` (continuation).
    async fn shared_folders_list_continue(
        &self,
        token: &AccessToken,
        as_member: AsMember<'_>,
        cursor: &Cursor,
    ) -> Result<Page<SharedFolder>>;

    /// Lists groups, users and invitees of a shared folder (first page).
    async fn folder_members_list(
        &self,
        token: &AccessToken,
        as_member: AsMember<'_>,
        shared_folder_id: &str,
    ) -> Result<Page<FolderMembership>>;

    /// Lists groups, users and invitees of a shared folder (continuation).
    async fn folder_members_list_continue(
        &self,
        token: &AccessToken,
        as_member: AsMember<'_>,
        cursor: &Cursor,
    ) -> Result<Page<FolderMembership>>;

    /// Returns the storage usage of `as_member`.
    async fn space_usage(&self, token: &AccessToken, as_member: AsMember<'_>)
    -> Result<SpaceUsage>;

    /// Revokes `token`.
    async fn revoke_token(&self, token: &AccessToken) -> Result<()>;
}
