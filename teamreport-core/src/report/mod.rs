//! Report variants and their shared run context.
//!
//! Reports are registered statically in [`ReportKind`]. Each variant declares
//! the permissions it needs, drives collector and correlator passes through a
//! [`ReportContext`], and projects entities into fixed-width rows.
//!
//! # Module Structure
//! - `profile`: one row per team member
//! - `quota`: storage usage per member
//! - `sessions`: desktop, mobile and web sessions per member
//! - `shared_folders`: members of every shared folder

mod profile;
mod quota;
mod sessions;
mod shared_folders;

use std::str::FromStr;

use tracing::{debug, info};

use crate::api::TeamApi;
use crate::credentials::{AccessToken, CredentialStore, Permission};
use crate::crawler::MemberListing;
use crate::error::ReportWarning;
use crate::models::TeamMember;
use crate::pagination::Collector;
use crate::sink::{RowWriter, TabularSink};
use crate::{ReportError, Result};

/// Available reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    /// Member profiles
    TeamMemberProfile,
    /// Storage usage per member
    TeamMemberQuota,
    /// Device sessions per member
    TeamMemberSession,
    /// Shared folders and their members
    SharedFolderMembers,
}

impl ReportKind {
    /// Every registered report, in listing order.
    pub const ALL: [Self; 4] = [
        Self::TeamMemberProfile,
        Self::TeamMemberQuota,
        Self::TeamMemberSession,
        Self::SharedFolderMembers,
    ];

    /// Name accepted by `--report`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::TeamMemberProfile => "TeamMemberProfile",
            Self::TeamMemberQuota => "TeamMemberQuota",
            Self::TeamMemberSession => "TeamMemberSession",
            Self::SharedFolderMembers => "SharedFolderMembers",
        }
    }

    /// One-line description for the supported report listing.
    pub const fn description(self) -> &'static str {
        match self {
            Self::TeamMemberProfile => "List all team member profiles of a team",
            Self::TeamMemberQuota => "List storage usage of all team member of a team",
            Self::TeamMemberSession => {
                "List existing sessions (desktop/mobile/web) of all team member of a team"
            }
            Self::SharedFolderMembers => "List all shared folders and their members of a team",
        }
    }

    /// Permissions in acquisition order.
    pub const fn required_permissions(self) -> &'static [Permission] {
        match self {
            Self::TeamMemberProfile => &[Permission::Info],
            Self::TeamMemberQuota | Self::TeamMemberSession | Self::SharedFolderMembers => {
                &[Permission::Info, Permission::File]
            }
        }
    }

    /// Column names of the report.
    pub const fn headers(self) -> &'static [&'static str] {
        match self {
            Self::TeamMemberProfile => &profile::HEADER,
            Self::TeamMemberQuota => &quota::HEADER,
            Self::TeamMemberSession => &sessions::HEADER,
            Self::SharedFolderMembers => &shared_folders::HEADER,
        }
    }

    /// Runs the report to completion.
    ///
    /// The context ends in [`ReportState::Done`] on success and
    /// [`ReportState::Failed`] otherwise.
    ///
    /// # Errors
    /// Collection, correlation and output errors are fatal and returned as
    /// is. Rows already handed to the sink stay there.
    pub async fn run(self, ctx: &mut ReportContext<'_>) -> Result<()> {
        info!("Start report: {}", self.name());
        let result = match self {
            Self::TeamMemberProfile => profile::run(ctx).await,
            Self::TeamMemberQuota => quota::run(ctx).await,
            Self::TeamMemberSession => sessions::run(ctx).await,
            Self::SharedFolderMembers => shared_folders::run(ctx).await,
        };

        match &result {
            Ok(()) => {
                ctx.transition(ReportState::Done);
                info!(
                    "Finished report: {} ({} rows)",
                    self.name(),
                    ctx.rows_written()
                );
            }
            Err(_) => ctx.transition(ReportState::Failed),
        }
        result
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReportKind {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ReportError::UnknownReport {
                name: s.to_string(),
            })
    }
}

/// Progress of one report run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportState {
    NotStarted,
    Collecting,
    Correlating,
    Emitting,
    Done,
    Failed,
}

/// Everything a report needs while it runs.
///
/// Owns nothing but the warning list; the API, credentials and sink are
/// borrowed from the orchestrator for the duration of the run.
pub struct ReportContext<'a> {
    api: &'a dyn TeamApi,
    credentials: &'a CredentialStore,
    collector: Collector,
    output: RowWriter<'a>,
    warnings: Vec<ReportWarning>,
    state: ReportState,
}

impl<'a> ReportContext<'a> {
    /// Creates a context writing to an opened sink.
    pub fn new(
        api: &'a dyn TeamApi,
        credentials: &'a CredentialStore,
        collector: Collector,
        sink: &'a mut dyn TabularSink,
    ) -> Self {
        Self {
            api,
            credentials,
            collector,
            output: RowWriter::new(sink),
            warnings: Vec::new(),
            state: ReportState::NotStarted,
        }
    }

    /// Team API to crawl.
    pub fn api(&self) -> &'a dyn TeamApi {
        self.api
    }

    /// Token acquired for `permission`.
    ///
    /// # Errors
    /// Fails when the report did not declare `permission`.
    pub fn token(&self, permission: Permission) -> Result<&'a AccessToken> {
        self.credentials.token(permission)
    }

    /// Collector bounded by the run's page cap.
    pub const fn collector(&self) -> Collector {
        self.collector
    }

    /// Current state.
    pub const fn state(&self) -> ReportState {
        self.state
    }

    /// Moves to `state`.
    pub fn transition(&mut self, state: ReportState) {
        debug!("Report state: {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Writes the header row.
    ///
    /// # Errors
    /// See [`RowWriter::write_headers`].
    pub fn write_headers(&mut self, headers: &[&str]) -> Result<()> {
        self.output.write_headers(headers)
    }

    /// Writes one data row.
    ///
    /// # Errors
    /// See [`RowWriter::write_row`].
    pub fn write_row(&mut self, fields: &[String]) -> Result<()> {
        self.output.write_row(fields)
    }

    /// Number of rows written so far.
    pub const fn rows_written(&self) -> usize {
        self.output.rows_written()
    }

    /// Records a warning that was already logged.
    pub fn record_warnings(&mut self, warnings: impl IntoIterator<Item = ReportWarning>) {
        self.warnings.extend(warnings);
    }

    /// Logs and records a warning.
    pub fn warn(&mut self, warning: ReportWarning) {
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Warnings recorded so far.
    pub fn warnings(&self) -> &[ReportWarning] {
        &self.warnings
    }

    /// Consumes the context into the run summary.
    pub fn into_summary(self, report: ReportKind) -> ReportSummary {
        ReportSummary {
            report,
            rows_written: self.output.rows_written(),
            warnings: self.warnings,
            state: self.state,
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub report: ReportKind,
    pub rows_written: usize,
    pub warnings: Vec<ReportWarning>,
    pub state: ReportState,
}

/// Collects every team member with the team information token.
async fn load_members(ctx: &mut ReportContext<'_>) -> Result<Vec<TeamMember>> {
    ctx.transition(ReportState::Collecting);
    let token = ctx.token(Permission::Info)?;

    info!("Loading members");
    let members = ctx
        .collector()
        .collect(&MemberListing::new(ctx.api(), token))
        .await
        .map_err(|e| {
            tracing::error!("Unable to load member list: {}", e);
            e
        })?;
    info!("Finished loading member list ({} members)", members.len());
    Ok(members)
}

/// Renders a boolean the way every report does.
fn flag(value: bool) -> String {
    value.to_string()
}
