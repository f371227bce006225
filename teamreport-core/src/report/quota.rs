//! Storage usage of every member.
//!
//! Usage is read with the file-access token acting as each member in turn.
//! A failed lookup aborts the report; rows for earlier members stay written.

use tracing::error;

use super::{ReportContext, ReportState, load_members};
use crate::Result;
use crate::credentials::Permission;
use crate::models::{SpaceUsage, TeamMember};

pub(super) const HEADER: [&str; 4] = ["Account Id", "Team Member Id", "Email", "Usage (bytes)"];

pub(super) async fn run(ctx: &mut ReportContext<'_>) -> Result<()> {
    let members = load_members(ctx).await?;
    let token = ctx.token(Permission::File)?;

    ctx.transition(ReportState::Emitting);
    ctx.write_headers(&HEADER)?;
    for member in &members {
        let usage = ctx
            .api()
            .space_usage(token, &member.team_member_id)
            .await
            .map_err(|e| {
                error!("Unable to load quota for member: '{}'", member.account_id);
                e
            })?;
        ctx.write_row(&row(member, usage))?;
    }
    Ok(())
}

fn row(member: &TeamMember, usage: SpaceUsage) -> Vec<String> {
    vec![
        member.account_id.clone(),
        member.team_member_id.clone(),
        member.email.clone(),
        usage.used.to_string(),
    ]
}
