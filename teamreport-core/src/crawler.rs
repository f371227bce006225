//! Page sources for each team listing.
//!
//! Each source binds a [`TeamApi`] to a token (and, where needed, the member
//! to act as) so a [`Collector`](crate::pagination::Collector) can drain it.

use async_trait::async_trait;

use crate::Result;
use crate::api::TeamApi;
use crate::credentials::AccessToken;
use crate::models::{FolderMembership, MemberDevices, SharedFolder, TeamMember};
use crate::pagination::{Cursor, Page, PageSource};

/// All members of the team.
pub struct MemberListing<'a, A: ?Sized> {
    api: &'a A,
    token: &'a AccessToken,
}

impl<'a, A: TeamApi + ?Sized> MemberListing<'a, A> {
    /// Lists the team with an info token.
    pub fn new(api: &'a A, token: &'a AccessToken) -> Self {
        Self { api, token }
    }
}

#[async_trait]
impl<A: TeamApi + ?Sized> PageSource for MemberListing<'_, A> {
    type Item = TeamMember;

    fn endpoint(&self) -> &str {
        "team/members/list"
    }

    async fn first(&self) -> Result<Page<TeamMember>> {
        self.api.members_list(self.token).await
    }

    async fn next(&self, cursor: &Cursor) -> Result<Page<TeamMember>> {
        self.api.members_list_continue(self.token, cursor).await
    }
}

/// Device sessions of every member.
pub struct DeviceListing<'a, A: ?Sized> {
    api: &'a A,
    token: &'a AccessToken,
}

impl<'a, A: TeamApi + ?Sized> DeviceListing<'a, A> {
    /// Lists every desktop, mobile and web session.
    pub fn new(api: &'a A, token: &'a AccessToken) -> Self {
        Self { api, token }
    }
}

#[async_trait]
impl<A: TeamApi + ?Sized> PageSource for DeviceListing<'_, A> {
    type Item = MemberDevices;

    fn endpoint(&self) -> &str {
        "team/devices/list_members_devices"
    }

    async fn first(&self) -> Result<Page<MemberDevices>> {
        self.api.devices_list(self.token, None).await
    }

    async fn next(&self, cursor: &Cursor) -> Result<Page<MemberDevices>> {
        self.api.devices_list(self.token, Some(cursor)).await
    }
}

/// Shared folders visible to one member.
pub struct SharedFolderListing<'a, A: ?Sized> {
    api: &'a A,
    token: &'a AccessToken,
    as_member: &'a str,
}

impl<'a, A: TeamApi + ?Sized> SharedFolderListing<'a, A> {
    /// Lists folders visible to `as_member`.
    pub fn new(api: &'a A, token: &'a AccessToken, as_member: &'a str) -> Self {
        Self {
            api,
            token,
            as_member,
        }
    }
}

#[async_trait]
impl<A: TeamApi + ?Sized> PageSource for SharedFolderListing<'_, A> {
    type Item = SharedFolder;

    fn endpoint(&self) -> &str {
        "sharing/list_folders"
    }

    async fn first(&self) -> Result<Page<SharedFolder>> {
        self.api.shared_folders_list(self.token, self.as_member).await
    }

    async fn next(&self, cursor: &Cursor) -> Result<Page<SharedFolder>> {
        self.api
            .shared_folders_list_continue(self.token, self.as_member, cursor)
            .await
    }
}

/// Members of one shared folder, listed as a member who can see it.
pub struct FolderMemberListing<'a, A: ?Sized> {
    api: &'a A,
    token: &'a AccessToken,
    as_member: &'a str,
    shared_folder_id: &'a str,
}

impl<'a, A: TeamApi + ?Sized> FolderMemberListing<'a, A> {
    /// Lists members of `shared_folder_id` as `as_member`.
    pub fn new(
        api: &'a A,
        token: &'a AccessToken,
        as_member: &'a str,
        shared_folder_id: &'a str,
    ) -> Self {
        Self {
            api,
            token,
            as_member,
            shared_folder_id,
        }
    }
}

#[async_trait]
impl<A: TeamApi + ?Sized> PageSource for FolderMemberListing<'_, A> {
    type Item = FolderMembership;

    fn endpoint(&self) -> &str {
        "sharing/list_folder_members"
    }

    async fn first(&self) -> Result<Page<FolderMembership>> {
        self.api
            .folder_members_list(self.token, self.as_member, self.shared_folder_id)
            .await
    }

    async fn next(&self, cursor: &Cursor) -> Result<Page<FolderMembership>> {
        self.api
            .folder_members_list_continue(self.token, self.as_member, cursor)
            .await
    }
}
