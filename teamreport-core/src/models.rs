//! Team entities collected from the team API.
//!
//! These are the decoded, API-independent shapes the reports project into
//! rows. Wire formats live with the HTTP client.

use chrono::{DateTime, SecondsFormat, Utc};

/// A member of the team, keyed by `team_member_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamMember {
    pub team_member_id: String,
    pub account_id: String,
    pub email: String,
    pub email_verified: bool,
    pub external_id: Option<String>,
    /// Membership type tag, e.g. `full` or `limited`
    pub membership_type: String,
    /// Admin role tag, e.g. `member_only` or `team_admin`
    pub role: String,
    /// Status tag, e.g. `active`, `invited`, `suspended`
    pub status: String,
}

/// Shared folder metadata as seen by one member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedFolder {
    pub shared_folder_id: String,
    pub name: String,
    pub is_team_folder: bool,
}

/// Identity of a user referenced from a folder membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub account_id: String,
    pub team_member_id: Option<String>,
    pub same_team: bool,
}

/// A group with access to a shared folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMembership {
    pub access_type: String,
    pub group_id: String,
    pub group_name: String,
    pub group_external_id: Option<String>,
}

/// A user with access to a shared folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserMembership {
    pub access_type: String,
    pub user: UserInfo,
}

/// An invitation to a shared folder that may not be accepted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteeMembership {
    pub access_type: String,
    pub email: String,
    /// Present once the invitee maps to an account
    pub user: Option<UserInfo>,
}

/// One entry of a shared folder's member listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderMembership {
    Group(GroupMembership),
    User(UserMembership),
    Invitee(InviteeMembership),
}

impl FolderMembership {
    /// Emission rank: groups, then users, then invitees.
    pub const fn rank(&self) -> u8 {
        match self {
            Self::Group(_) => 0,
            Self::User(_) => 1,
            Self::Invitee(_) => 2,
        }
    }
}

/// Fields shared by every device session kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionInfo {
    pub session_id: String,
    pub ip_address: Option<String>,
    pub country: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

/// A linked desktop client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesktopSession {
    pub info: SessionInfo,
    pub host_name: String,
    pub client_type: String,
    pub client_version: String,
    pub platform: String,
    pub is_delete_on_unlink_supported: bool,
}

/// A linked mobile client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MobileSession {
    pub info: SessionInfo,
    pub device_name: String,
    pub client_type: String,
    pub client_version: Option<String>,
    pub os_version: Option<String>,
    pub last_carrier: Option<String>,
}

/// An active web browser session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebSession {
    pub info: SessionInfo,
    pub user_agent: String,
    pub os: String,
    pub browser: String,
}

/// A single device session of any kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSession {
    Desktop(DesktopSession),
    Mobile(MobileSession),
    Web(WebSession),
}

impl DeviceSession {
    /// Label written to the `session-type` column.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Desktop(_) => "Desktop",
            Self::Mobile(_) => "Mobile",
            Self::Web(_) => "Web",
        }
    }

    /// Fields common to all session kinds.
    pub const fn info(&self) -> &SessionInfo {
        match self {
            Self::Desktop(s) => &s.info,
            Self::Mobile(s) => &s.info,
            Self::Web(s) => &s.info,
        }
    }
}

/// All sessions of one team member, as returned by the devices listing.
///
/// Sessions are ordered desktop clients first, then mobile clients, then web
/// sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDevices {
    pub team_member_id: String,
    pub sessions: Vec<DeviceSession>,
}

/// Storage usage of a single member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpaceUsage {
    pub used: u64,
}

/// Formats an optional timestamp for a report column.
///
/// Absent timestamps become the empty string.
pub fn format_timestamp(value: Option<&DateTime<Utc>>) -> String {
    value
        .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_timestamp() {
        let ts = Utc.with_ymd_and_hms(2017, 3, 4, 5, 6, 7).single();
        assert_eq!(format_timestamp(ts.as_ref()), "2017-03-04T05:06:07Z");
        assert_eq!(format_timestamp(None), "");
    }

    #[test]
    fn test_session_kind_labels() {
        let desktop = DeviceSession::Desktop(DesktopSession::default());
        let mobile = DeviceSession::Mobile(MobileSession::default());
        let web = DeviceSession::Web(WebSession::default());

        assert_eq!(desktop.kind(), "Desktop");
        assert_eq!(mobile.kind(), "Mobile");
        assert_eq!(web.kind(), "Web");
    }

    #[test]
    fn test_membership_rank_orders_groups_first() {
        let mut entries = vec![
            FolderMembership::Invitee(InviteeMembership {
                access_type: "viewer".to_string(),
                email: "guest@example.com".to_string(),
                user: None,
            }),
            FolderMembership::User(UserMembership {
                access_type: "owner".to_string(),
                user: UserInfo {
                    account_id: "dbid:a1".to_string(),
                    team_member_id: Some("dbmid:tm1".to_string()),
                    same_team: true,
                },
            }),
            FolderMembership::Group(GroupMembership {
                access_type: "editor".to_string(),
                group_id: "g:1".to_string(),
                group_name: "Sales".to_string(),
                group_external_id: None,
            }),
        ];
        entries.sort_by_key(FolderMembership::rank);

        assert!(matches!(entries[0], FolderMembership::Group(_)));
        assert!(matches!(entries[1], FolderMembership::User(_)));
        assert!(matches!(entries[2], FolderMembership::Invitee(_)));
    }
}
