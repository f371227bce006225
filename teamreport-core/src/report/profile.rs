//! Team member profiles.

use super::{ReportContext, ReportState, flag, load_members};
use crate::Result;
use crate::models::TeamMember;

pub(super) const HEADER: [&str; 8] = [
    "Account Id",
    "Team Member Id",
    "Email",
    "Email verified?",
    "External Id",
    "Membership Type",
    "Role",
    "Status",
];

pub(super) async fn run(ctx: &mut ReportContext<'_>) -> Result<()> {
    let members = load_members(ctx).await?;

    ctx.transition(ReportState::Emitting);
    ctx.write_headers(&HEADER)?;
    for member in &members {
        ctx.write_row(&row(member))?;
    }
    Ok(())
}

fn row(member: &TeamMember) -> Vec<String> {
    vec![
        member.account_id.clone(),
        member.team_member_id.clone(),
        member.email.clone(),
        flag(member.email_verified),
        member.external_id.clone().unwrap_or_default(),
        member.membership_type.clone(),
        member.role.clone(),
        member.status.clone(),
    ]
}
