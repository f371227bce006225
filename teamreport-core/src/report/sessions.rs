//! Desktop, mobile and web sessions of every member.
//!
//! Every session kind shares one 20-column layout; columns that do not apply
//! to a kind are written as empty strings.
//!
//! Rows are built in full before the header is written, so a failed session
//! listing leaves the output without a header.

use tracing::info;

use super::{ReportContext, ReportState, flag, load_members};
use crate::Result;
use crate::correlation::MemberDirectory;
use crate::credentials::Permission;
use crate::crawler::DeviceListing;
use crate::error::ReportWarning;
use crate::models::{DeviceSession, SessionInfo, TeamMember, format_timestamp};

pub(super) const HEADER: [&str; 20] = [
    "account-id",
    "team-member-id",
    "email",
    "session-type",
    "session-id",
    "ip-address",
    "country",
    "client-type",
    "client-version",
    "os",
    "platform",
    "os-version",
    "last-carrier",
    "device-name",
    "hostname",
    "browser",
    "user-agent",
    "is-delete-on-unlink-supported",
    "created",
    "updated",
];

pub(super) async fn run(ctx: &mut ReportContext<'_>) -> Result<()> {
    let members = load_members(ctx).await?;
    let directory = MemberDirectory::new(&members);
    let token = ctx.token(Permission::File)?;

    info!("Loading sessions");
    let devices = ctx
        .collector()
        .collect(&DeviceListing::new(ctx.api(), token))
        .await
        .map_err(|e| {
            tracing::error!("Unable to load members sessions: {}", e);
            e
        })?;

    ctx.transition(ReportState::Correlating);
    let mut rows = Vec::new();
    for entry in &devices {
        let Some(member) = directory.resolve(&entry.team_member_id) else {
            ctx.warn(ReportWarning::JoinMiss {
                team_member_id: entry.team_member_id.clone(),
            });
            continue;
        };
        rows.extend(entry.sessions.iter().map(|session| row(member, session)));
    }

    ctx.transition(ReportState::Emitting);
    ctx.write_headers(&HEADER)?;
    for row in &rows {
        ctx.write_row(row)?;
    }
    Ok(())
}

/// Kind-specific columns, from `client-type` to
/// `is-delete-on-unlink-supported`.
#[derive(Default)]
struct KindColumns {
    client_type: String,
    client_version: String,
    os: String,
    platform: String,
    os_version: String,
    last_carrier: String,
    device_name: String,
    hostname: String,
    browser: String,
    user_agent: String,
    delete_on_unlink: String,
}

fn kind_columns(session: &DeviceSession) -> KindColumns {
    match session {
        DeviceSession::Desktop(s) => KindColumns {
            client_type: s.client_type.clone(),
            client_version: s.client_version.clone(),
            platform: s.platform.clone(),
            hostname: s.host_name.clone(),
            delete_on_unlink: flag(s.is_delete_on_unlink_supported),
            ..KindColumns::default()
        },
        DeviceSession::Mobile(s) => KindColumns {
            client_type: s.client_type.clone(),
            client_version: s.client_version.clone().unwrap_or_default(),
            os_version: s.os_version.clone().unwrap_or_default(),
            last_carrier: s.last_carrier.clone().unwrap_or_default(),
            device_name: s.device_name.clone(),
            ..KindColumns::default()
        },
        DeviceSession::Web(s) => KindColumns {
            os: s.os.clone(),
            browser: s.browser.clone(),
            user_agent: s.user_agent.clone(),
            ..KindColumns::default()
        },
    }
}

fn row(member: &TeamMember, session: &DeviceSession) -> Vec<String> {
    let SessionInfo {
        session_id,
        ip_address,
        country,
        created,
        updated,
    } = session.info();
    let kind = kind_columns(session);

    vec![
        member.account_id.clone(),
        member.team_member_id.clone(),
        member.email.clone(),
        session.kind().to_string(),
        session_id.clone(),
        ip_address.clone().unwrap_or_default(),
        country.clone().unwrap_or_default(),
        kind.client_type,
        kind.client_version,
        kind.os,
        kind.platform,
        kind.os_version,
        kind.last_carrier,
        kind.device_name,
        kind.hostname,
        kind.browser,
        kind.user_agent,
        kind.delete_on_unlink,
        format_timestamp(created.as_ref()),
        format_timestamp(updated.as_ref()),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pagination::Collector;
    use crate::report::tests::credentials;
    use crate::test_support::{FakeTeamApi, RecordingSink, desktop, devices, member, mobile, web};

    fn column(name: &str) -> usize {
        HEADER.iter().position(|h| *h == name).unwrap()
    }

    #[test]
    fn test_desktop_row_leaves_other_kinds_empty() {
        let row = row(&member("tm1", "alice@x.com"), &desktop("d1"));

        assert_eq!(row.len(), HEADER.len());
        assert_eq!(row[column("session-type")], "Desktop");
        assert_eq!(row[column("hostname")], "workstation");
        assert_eq!(row[column("is-delete-on-unlink-supported")], "true");
        for name in ["browser", "user-agent", "os-version", "last-carrier", "os", "device-name"] {
            assert_eq!(row[column(name)], "", "{name}");
        }
        assert_eq!(row[column("created")], "");
    }

    #[test]
    fn test_mobile_and_web_rows() {
        let m = member("tm1", "alice@x.com");

        let row_m = row(&m, &mobile("m1"));
        assert_eq!(row_m[column("session-type")], "Mobile");
        assert_eq!(row_m[column("os-version")], "10.2");
        assert_eq!(row_m[column("hostname")], "");
        assert_eq!(row_m[column("is-delete-on-unlink-supported")], "");

        let row_w = row(&m, &web("w1"));
        assert_eq!(row_w[column("session-type")], "Web");
        assert_eq!(row_w[column("browser")], "Firefox");
        assert_eq!(row_w[column("client-type")], "");
        assert_eq!(row_w[column("platform")], "");
    }

    #[tokio::test]
    async fn test_unknown_member_is_skipped_with_warning() {
        let api = FakeTeamApi::new()
            .with_member_pages(vec![vec![member("tm1", "alice@x.com")]])
            .with_device_pages(vec![
                vec![devices("tm2", vec![desktop("d-orphan")])],
                vec![devices("tm1", vec![web("w1")])],
            ]);
        let store = credentials();
        let mut sink = RecordingSink::new();
        let mut ctx = ReportContext::new(&api, &store, Collector::default(), &mut sink);

        run(&mut ctx).await.unwrap();
        assert_eq!(
            ctx.warnings(),
            &[ReportWarning::JoinMiss {
                team_member_id: "tm2".to_string()
            }]
        );
        drop(ctx);

        assert_eq!(sink.rows().len(), 1);
        assert_eq!(sink.rows()[0][column("email")], "alice@x.com");
        assert_eq!(api.calls("team/devices/list_members_devices"), 2);
    }
}
