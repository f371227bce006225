//! Shared folders and their members.
//!
//! Rows are emitted per folder in discovery order, and within a folder as
//! groups, then users, then invitees.

use super::{ReportContext, ReportState, flag, load_members};
use crate::Result;
use crate::correlation::{FolderCorrelator, FolderMembers};
use crate::credentials::Permission;
use crate::models::{FolderMembership, SharedFolder, UserInfo};

pub(super) const HEADER: [&str; 12] = [
    "shared-folder-id",
    "shared-folder-name",
    "is-team-folder",
    "management-type",
    "access-level",
    "account-id",
    "team-member-id",
    "email",
    "same-team",
    "group-id",
    "group-external-id",
    "group-name",
];

pub(super) async fn run(ctx: &mut ReportContext<'_>) -> Result<()> {
    let members = load_members(ctx).await?;
    let token = ctx.token(Permission::File)?;
    let correlator = FolderCorrelator::new(ctx.api(), token, ctx.collector());

    let index = correlator.discover(&members).await?;

    ctx.transition(ReportState::Correlating);
    let expansion = correlator.expand(&index).await;
    ctx.record_warnings(expansion.warnings);

    ctx.transition(ReportState::Emitting);
    ctx.write_headers(&HEADER)?;
    for FolderMembers { folder, members } in &expansion.folders {
        for membership in members {
            ctx.write_row(&row(folder, membership))?;
        }
    }
    Ok(())
}

/// Account columns: account-id, team-member-id, same-team.
fn user_columns(user: Option<&UserInfo>) -> [String; 3] {
    user.map_or_else(Default::default, |u| {
        [
            u.account_id.clone(),
            u.team_member_id.clone().unwrap_or_default(),
            flag(u.same_team),
        ]
    })
}

fn row(folder: &SharedFolder, membership: &FolderMembership) -> Vec<String> {
    let (management, access, email) = match membership {
        FolderMembership::Group(g) => ("group", &g.access_type, ""),
        FolderMembership::User(u) => ("user", &u.access_type, ""),
        FolderMembership::Invitee(i) => ("invitee", &i.access_type, i.email.as_str()),
    };
    let [account_id, team_member_id, same_team] = match membership {
        FolderMembership::Group(_) => Default::default(),
        FolderMembership::User(u) => user_columns(Some(&u.user)),
        FolderMembership::Invitee(i) => user_columns(i.user.as_ref()),
    };
    let [group_id, group_external_id, group_name] = match membership {
        FolderMembership::Group(g) => [
            g.group_id.clone(),
            g.group_external_id.clone().unwrap_or_default(),
            g.group_name.clone(),
        ],
        _ => Default::default(),
    };

    vec![
        folder.shared_folder_id.clone(),
        folder.name.clone(),
        flag(folder.is_team_folder),
        management.to_string(),
        access.clone(),
        account_id,
        team_member_id,
        email.to_string(),
        same_team,
        group_id,
        group_external_id,
        group_name,
    ]
}
