//! JSON request and response bodies of the team API.
//!
//! Union values arrive as objects with a `.tag` member; only the tag is kept.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    DesktopSession, DeviceSession, FolderMembership, GroupMembership, InviteeMembership,
    MemberDevices, MobileSession, SessionInfo, SharedFolder, SpaceUsage, TeamMember, UserInfo,
    UserMembership, WebSession,
};

const PAGE_LIMIT: u32 = 100;

#[derive(Debug, Default, Deserialize)]
pub(super) struct Tag {
    #[serde(rename = ".tag", default)]
    tag: String,
}

fn tag_of(value: Option<Tag>) -> String {
    value.map(|t| t.tag).unwrap_or_default()
}

/// Error body returned with 4xx/5xx statuses.
#[derive(Debug, Deserialize)]
pub(super) struct ApiErrorBody {
    pub(super) error_summary: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct CursorArg<'a> {
    pub(super) cursor: &'a str,
}

// team/members/list

#[derive(Debug, Serialize)]
pub(super) struct MembersListArg {
    limit: u32,
    include_removed: bool,
}

impl Default for MembersListArg {
    fn default() -> Self {
        Self {
            limit: PAGE_LIMIT,
            include_removed: false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct MembersListResult {
    pub(super) members: Vec<MemberInfo>,
    #[serde(default)]
    pub(super) cursor: Option<String>,
    #[serde(default)]
    pub(super) has_more: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct MemberInfo {
    profile: MemberProfile,
    #[serde(default)]
    role: Option<Tag>,
}

#[derive(Debug, Deserialize)]
struct MemberProfile {
    team_member_id: String,
    #[serde(default)]
    account_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    email_verified: bool,
    #[serde(default)]
    external_id: Option<String>,
    #[serde(default)]
    status: Option<Tag>,
    #[serde(default)]
    membership_type: Option<Tag>,
}

impl From<MemberInfo> for TeamMember {
    fn from(info: MemberInfo) -> Self {
        let profile = info.profile;
        Self {
            team_member_id: profile.team_member_id,
            account_id: profile.account_id,
            email: profile.email,
            email_verified: profile.email_verified,
            external_id: profile.external_id,
            membership_type: tag_of(profile.membership_type),
            role: tag_of(info.role),
            status: tag_of(profile.status),
        }
    }
}

// team/devices/list_members_devices

#[derive(Debug, Serialize)]
pub(super) struct ListMembersDevicesArg<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    cursor: Option<&'a str>,
    include_web_sessions: bool,
    include_desktop_clients: bool,
    include_mobile_clients: bool,
}

impl<'a> ListMembersDevicesArg<'a> {
    pub(super) const fn all_sessions(cursor: Option<&'a str>) -> Self {
        Self {
            cursor,
            include_web_sessions: true,
            include_desktop_clients: true,
            include_mobile_clients: true,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ListMembersDevicesResult {
    pub(super) devices: Vec<MemberDevicesEntry>,
    #[serde(default)]
    pub(super) has_more: bool,
    #[serde(default)]
    pub(super) cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct MemberDevicesEntry {
    team_member_id: String,
    #[serde(default)]
    desktop_clients: Vec<DesktopClient>,
    #[serde(default)]
    mobile_clients: Vec<MobileClient>,
    #[serde(default)]
    web_sessions: Vec<ActiveWebSession>,
}

#[derive(Debug, Deserialize)]
struct WireSessionInfo {
    session_id: String,
    #[serde(default)]
    ip_address: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    created: Option<DateTime<Utc>>,
    #[serde(default)]
    updated: Option<DateTime<Utc>>,
}

impl From<WireSessionInfo> for SessionInfo {
    fn from(info: WireSessionInfo) -> Self {
        Self {
            session_id: info.session_id,
            ip_address: info.ip_address,
            country: info.country,
            created: info.created,
            updated: info.updated,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DesktopClient {
    #[serde(flatten)]
    info: WireSessionInfo,
    #[serde(default)]
    host_name: String,
    #[serde(default)]
    client_type: Option<Tag>,
    #[serde(default)]
    client_version: String,
    #[serde(default)]
    platform: String,
    #[serde(default)]
    is_delete_on_unlink_supported: bool,
}

#[derive(Debug, Deserialize)]
struct MobileClient {
    #[serde(flatten)]
    info: WireSessionInfo,
    #[serde(default)]
    device_name: String,
    #[serde(default)]
    client_type: Option<Tag>,
    #[serde(default)]
    client_version: Option<String>,
    #[serde(default)]
    os_version: Option<String>,
    #[serde(default)]
    last_carrier: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ActiveWebSession {
    #[serde(flatten)]
    info: WireSessionInfo,
    #[serde(default)]
    user_agent: String,
    #[serde(default)]
    os: String,
    #[serde(default)]
    browser: String,
}

impl From<MemberDevicesEntry> for MemberDevices {
    fn from(entry: MemberDevicesEntry) -> Self {
        let desktop = entry.desktop_clients.into_iter().map(|c| {
            DeviceSession::Desktop(DesktopSession {
                info: c.info.into(),
                host_name: c.host_name,
                client_type: tag_of(c.client_type),
                client_version: c.client_version,
                platform: c.platform,
                is_delete_on_unlink_supported: c.is_delete_on_unlink_supported,
            })
        });
        let mobile = entry.mobile_clients.into_iter().map(|c| {
            DeviceSession::Mobile(MobileSession {
                info: c.info.into(),
                device_name: c.device_name,
                client_type: tag_of(c.client_type),
                client_version: c.client_version,
                os_version: c.os_version,
                last_carrier: c.last_carrier,
            })
        });
        let web = entry.web_sessions.into_iter().map(|s| {
            DeviceSession::Web(WebSession {
                info: s.info.into(),
                user_agent: s.user_agent,
                os: s.os,
                browser: s.browser,
            })
        });

        Self {
            team_member_id: entry.team_member_id,
            sessions: desktop.chain(mobile).chain(web).collect(),
        }
    }
}

// sharing/list_folders

#[derive(Debug, Serialize)]
pub(super) struct ListFoldersArgs {
    limit: u32,
}

impl Default for ListFoldersArgs {
    fn default() -> Self {
        Self { limit: PAGE_LIMIT }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ListFoldersResult {
    pub(super) entries: Vec<SharedFolderMetadata>,
    #[serde(default)]
    pub(super) cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SharedFolderMetadata {
    shared_folder_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    is_team_folder: bool,
}

impl From<SharedFolderMetadata> for SharedFolder {
    fn from(meta: SharedFolderMetadata) -> Self {
        Self {
            shared_folder_id: meta.shared_folder_id,
            name: meta.name,
            is_team_folder: meta.is_team_folder,
        }
    }
}

// sharing/list_folder_members

#[derive(Debug, Serialize)]
pub(super) struct ListFolderMembersArgs<'a> {
    shared_folder_id: &'a str,
    limit: u32,
}

impl<'a> ListFolderMembersArgs<'a> {
    pub(super) const fn new(shared_folder_id: &'a str) -> Self {
        Self {
            shared_folder_id,
            limit: PAGE_LIMIT,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct SharedFolderMembers {
    #[serde(default)]
    users: Vec<UserMembershipInfo>,
    #[serde(default)]
    groups: Vec<GroupMembershipInfo>,
    #[serde(default)]
    invitees: Vec<InviteeMembershipInfo>,
    #[serde(default)]
    pub(super) cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUserInfo {
    account_id: String,
    #[serde(default)]
    team_member_id: Option<String>,
    #[serde(default)]
    same_team: bool,
}

impl From<WireUserInfo> for UserInfo {
    fn from(user: WireUserInfo) -> Self {
        Self {
            account_id: user.account_id,
            team_member_id: user.team_member_id,
            same_team: user.same_team,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserMembershipInfo {
    access_type: Tag,
    user: WireUserInfo,
}

#[derive(Debug, Deserialize)]
struct GroupInfo {
    group_id: String,
    #[serde(default)]
    group_name: String,
    #[serde(default)]
    group_external_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroupMembershipInfo {
    access_type: Tag,
    group: GroupInfo,
}

#[derive(Debug, Deserialize)]
struct InviteeInfo {
    #[serde(default)]
    email: String,
}

#[derive(Debug, Deserialize)]
struct InviteeMembershipInfo {
    access_type: Tag,
    invitee: InviteeInfo,
    #[serde(default)]
    user: Option<WireUserInfo>,
}

impl SharedFolderMembers {
    /// Flattens one page into groups, then users, then invitees.
    pub(super) fn into_entries(self) -> Vec<FolderMembership> {
        let groups = self.groups.into_iter().map(|g| {
            FolderMembership::Group(GroupMembership {
                access_type: g.access_type.tag,
                group_id: g.group.group_id,
                group_name: g.group.group_name,
                group_external_id: g.group.group_external_id,
            })
        });
        let users = self.users.into_iter().map(|u| {
            FolderMembership::User(UserMembership {
                access_type: u.access_type.tag,
                user: u.user.into(),
            })
        });
        let invitees = self.invitees.into_iter().map(|i| {
            FolderMembership::Invitee(InviteeMembership {
                access_type: i.access_type.tag,
                email: i.invitee.email,
                user: i.user.map(UserInfo::from),
            })
        });
        groups.chain(users).chain(invitees).collect()
    }
}

// users/get_space_usage

#[derive(Debug, Deserialize)]
pub(super) struct SpaceUsageResult {
    used: u64,
}

impl From<SpaceUsageResult> for SpaceUsage {
    fn from(result: SpaceUsageResult) -> Self {
        Self { used: result.used }
    }
}
