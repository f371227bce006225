//! In-crate fakes for the API, authorizer and sink collaborators.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::arithmetic_side_effects,
    missing_docs
)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::api::{AsMember, TeamApi};
use crate::auth::Authorizer;
use crate::config::AppKey;
use crate::credentials::{AccessToken, Permission};
use crate::models::{
    DesktopSession, DeviceSession, FolderMembership, GroupMembership, InviteeMembership,
    MemberDevices, MobileSession, SessionInfo, SharedFolder, SpaceUsage, TeamMember, UserInfo,
    UserMembership, WebSession,
};
use crate::pagination::{Cursor, Page, PageSource};
use crate::sink::TabularSink;
use crate::{ReportError, Result};

// ---------------------------------------------------------------------------
// Entity builders

pub fn member(team_member_id: &str, email: &str) -> TeamMember {
    TeamMember {
        team_member_id: team_member_id.to_string(),
        account_id: format!("dbid:{team_member_id}"),
        email: email.to_string(),
        email_verified: true,
        external_id: None,
        membership_type: "full".to_string(),
        role: "member_only".to_string(),
        status: "active".to_string(),
    }
}

pub fn folder(shared_folder_id: &str, name: &str) -> SharedFolder {
    SharedFolder {
        shared_folder_id: shared_folder_id.to_string(),
        name: name.to_string(),
        is_team_folder: false,
    }
}

pub fn group(group_id: &str, group_name: &str) -> FolderMembership {
    FolderMembership::Group(GroupMembership {
        access_type: "editor".to_string(),
        group_id: group_id.to_string(),
        group_name: group_name.to_string(),
        group_external_id: None,
    })
}

pub fn user(account_id: &str, team_member_id: Option<&str>) -> FolderMembership {
    FolderMembership::User(UserMembership {
        access_type: "owner".to_string(),
        user: UserInfo {
            account_id: account_id.to_string(),
            team_member_id: team_member_id.map(str::to_string),
            same_team: team_member_id.is_some(),
        },
    })
}

pub fn invitee(email: &str) -> FolderMembership {
    FolderMembership::Invitee(InviteeMembership {
        access_type: "viewer".to_string(),
        email: email.to_string(),
        user: None,
    })
}

fn session_info(session_id: &str) -> SessionInfo {
    SessionInfo {
        session_id: session_id.to_string(),
        ip_address: Some("192.0.2.10".to_string()),
        country: Some("Japan".to_string()),
        created: None,
        updated: None,
    }
}

pub fn desktop(session_id: &str) -> DeviceSession {
    DeviceSession::Desktop(DesktopSession {
        info: session_info(session_id),
        host_name: "workstation".to_string(),
        client_type: "windows".to_string(),
        client_version: "20.4.19".to_string(),
        platform: "Windows 10".to_string(),
        is_delete_on_unlink_supported: true,
    })
}

pub fn mobile(session_id: &str) -> DeviceSession {
    DeviceSession::Mobile(MobileSession {
        info: session_info(session_id),
        device_name: "Phone".to_string(),
        client_type: "iphone".to_string(),
        client_version: Some("35.2".to_string()),
        os_version: Some("10.2".to_string()),
        last_carrier: Some("Carrier".to_string()),
    })
}

pub fn web(session_id: &str) -> DeviceSession {
    DeviceSession::Web(WebSession {
        info: session_info(session_id),
        user_agent: "Mozilla/5.0".to_string(),
        os: "Linux".to_string(),
        browser: "Firefox".to_string(),
    })
}

pub fn devices(team_member_id: &str, sessions: Vec<DeviceSession>) -> MemberDevices {
    MemberDevices {
        team_member_id: team_member_id.to_string(),
        sessions,
    }
}

// ---------------------------------------------------------------------------
// Scripted page source

/// Page source over fixed `u32` pages.
pub struct ScriptedSource {
    pages: Vec<Vec<u32>>,
    endless: bool,
    failing_at: Option<usize>,
    first_calls: AtomicUsize,
    next_calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(pages: Vec<Vec<u32>>) -> Self {
        Self {
            pages,
            endless: false,
            failing_at: None,
            first_calls: AtomicUsize::new(0),
            next_calls: AtomicUsize::new(0),
        }
    }

    /// A listing that reports more pages forever.
    pub fn endless(page: Vec<u32>) -> Self {
        let mut source = Self::new(vec![page]);
        source.endless = true;
        source
    }

    /// Makes the `n`th continuation call (1-based) fail.
    pub fn failing_at(mut self, n: usize) -> Self {
        self.failing_at = Some(n);
        self
    }

    pub fn first_calls(&self) -> usize {
        self.first_calls.load(Ordering::SeqCst)
    }

    pub fn next_calls(&self) -> usize {
        self.next_calls.load(Ordering::SeqCst)
    }

    fn page(&self, index: usize) -> Page<u32> {
        if self.endless {
            let cursor = Cursor::new("endless").unwrap();
            return Page {
                entries: self.pages[0].clone(),
                continuation: crate::pagination::Continuation::More(cursor),
            };
        }
        let next = index + 1;
        let cursor = (next < self.pages.len()).then(|| next.to_string());
        Page::from_cursor(self.pages[index].clone(), cursor)
    }
}

#[async_trait]
impl PageSource for ScriptedSource {
    type Item = u32;

    fn endpoint(&self) -> &str {
        "scripted/list"
    }

    async fn first(&self) -> Result<Page<u32>> {
        self.first_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.page(0))
    }

    async fn next(&self, cursor: &Cursor) -> Result<Page<u32>> {
        let call = self.next_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing_at == Some(call) {
            return Err(ReportError::api_status("scripted/list/continue", 500, "scripted failure"));
        }
        if self.endless {
            return Ok(self.page(0));
        }
        let index: usize = cursor.as_str().parse().unwrap();
        Ok(self.page(index))
    }
}

// ---------------------------------------------------------------------------
// Fake team API

/// Cursor encoding: `<scope>#<page index>`.
fn cursor_for(scope: &str, index: usize) -> String {
    format!("{scope}#{index}")
}

fn page_index(cursor: &Cursor) -> (String, usize) {
    let (scope, index) = cursor.as_str().rsplit_once('#').unwrap();
    (scope.to_string(), index.parse().unwrap())
}

fn has_more_page<T: Clone>(
    endpoint: &str,
    scope: &str,
    pages: &[Vec<T>],
    index: usize,
) -> Result<Page<T>> {
    let entries = pages.get(index).cloned().unwrap_or_default();
    let has_more = index + 1 < pages.len();
    let cursor = has_more.then(|| cursor_for(scope, index + 1));
    Page::from_has_more(endpoint, entries, has_more, cursor)
}

fn cursor_page<T: Clone>(scope: &str, pages: &[Vec<T>], index: usize) -> Page<T> {
    let entries = pages.get(index).cloned().unwrap_or_default();
    let cursor = (index + 1 < pages.len()).then(|| cursor_for(scope, index + 1));
    Page::from_cursor(entries, cursor)
}

fn scripted_failure(endpoint: &str) -> ReportError {
    ReportError::api_status(endpoint, 500, "scripted failure")
}

/// Scripted, in-memory [`TeamApi`].
#[derive(Default)]
pub struct FakeTeamApi {
    member_pages: Vec<Vec<TeamMember>>,
    failing_member_page: Option<usize>,
    device_pages: Vec<Vec<MemberDevices>>,
    folders: HashMap<String, Vec<Vec<SharedFolder>>>,
    failing_folders: HashSet<String>,
    folder_members: HashMap<String, (String, Vec<Vec<FolderMembership>>)>,
    failing_folder_members: HashSet<String>,
    usage: HashMap<String, u64>,
    failing_usage: HashSet<String>,
    failing_revoke: bool,
    calls: Mutex<HashMap<String, usize>>,
    revoked: Mutex<Vec<String>>,
}

impl FakeTeamApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_member_pages(mut self, pages: Vec<Vec<TeamMember>>) -> Self {
        self.member_pages = pages;
        self
    }

    /// Makes fetching member page `index` (0-based) fail.
    pub fn failing_member_page(mut self, index: usize) -> Self {
        self.failing_member_page = Some(index);
        self
    }

    pub fn with_device_pages(mut self, pages: Vec<Vec<MemberDevices>>) -> Self {
        self.device_pages = pages;
        self
    }

    pub fn with_folders(mut self, as_member: &str, pages: Vec<Vec<SharedFolder>>) -> Self {
        self.folders.insert(as_member.to_string(), pages);
        self
    }

    pub fn failing_folders_for(mut self, as_member: &str) -> Self {
        self.failing_folders.insert(as_member.to_string());
        self
    }

    /// Scripts the member listing of a folder, visible only to `as_member`.
    pub fn with_folder_members(
        mut self,
        as_member: &str,
        shared_folder_id: &str,
        pages: Vec<Vec<FolderMembership>>,
    ) -> Self {
        self.folder_members
            .insert(shared_folder_id.to_string(), (as_member.to_string(), pages));
        self
    }

    pub fn failing_folder_members_for(mut self, shared_folder_id: &str) -> Self {
        self.failing_folder_members
            .insert(shared_folder_id.to_string());
        self
    }

    pub fn with_usage(mut self, as_member: &str, used: u64) -> Self {
        self.usage.insert(as_member.to_string(), used);
        self
    }

    pub fn failing_usage_for(mut self, as_member: &str) -> Self {
        self.failing_usage.insert(as_member.to_string());
        self
    }

    pub fn failing_revoke(mut self) -> Self {
        self.failing_revoke = true;
        self
    }

    /// Number of calls made to `endpoint`.
    pub fn calls(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(endpoint)
            .copied()
            .unwrap_or_default()
    }

    /// Raw tokens passed to `revoke_token`, in call order.
    pub fn revoked(&self) -> Vec<String> {
        self.revoked.lock().unwrap().clone()
    }

    fn record(&self, endpoint: &str) {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(endpoint.to_string())
            .or_default() += 1;
    }

    fn member_page(&self, endpoint: &str, index: usize) -> Result<Page<TeamMember>> {
        if self.failing_member_page == Some(index) {
            return Err(scripted_failure(endpoint));
        }
        has_more_page(endpoint, "members", &self.member_pages, index)
    }

    fn folder_page(&self, endpoint: &str, as_member: &str, index: usize) -> Result<Page<SharedFolder>> {
        if self.failing_folders.contains(as_member) {
            return Err(scripted_failure(endpoint));
        }
        let pages = self.folders.get(as_member).map_or(&[][..], Vec::as_slice);
        Ok(cursor_page(as_member, pages, index))
    }

    fn folder_member_page(
        &self,
        endpoint: &str,
        as_member: &str,
        shared_folder_id: &str,
        index: usize,
    ) -> Result<Page<FolderMembership>> {
        if self.failing_folder_members.contains(shared_folder_id) {
            return Err(scripted_failure(endpoint));
        }
        match self.folder_members.get(shared_folder_id) {
            Some((visible_to, pages)) if visible_to == as_member => {
                Ok(cursor_page(shared_folder_id, pages, index))
            }
            Some(_) => Err(ReportError::api_status(
                endpoint,
                409,
                "access_error/no_permission/",
            )),
            None => Ok(Page::last(Vec::new())),
        }
    }
}

#[async_trait]
impl TeamApi for FakeTeamApi {
    async fn members_list(&self, _token: &AccessToken) -> Result<Page<TeamMember>> {
        self.record("team/members/list");
        self.member_page("team/members/list", 0)
    }

    async fn members_list_continue(
        &self,
        _token: &AccessToken,
        cursor: &Cursor,
    ) -> Result<Page<TeamMember>> {
        self.record("team/members/list/continue");
        let (_, index) = page_index(cursor);
        self.member_page("team/members/list/continue", index)
    }

    async fn devices_list(
        &self,
        _token: &AccessToken,
        cursor: Option<&Cursor>,
    ) -> Result<Page<MemberDevices>> {
        let endpoint = "team/devices/list_members_devices";
        self.record(endpoint);
        let index = cursor.map_or(0, |c| page_index(c).1);
        has_more_page(endpoint, "devices", &self.device_pages, index)
    }

    async fn shared_folders_list(
        &self,
        _token: &AccessToken,
        as_member: AsMember<'_>,
    ) -> Result<Page<SharedFolder>> {
        self.record("sharing/list_folders");
        self.folder_page("sharing/list_folders", as_member, 0)
    }

    async fn shared_folders_list_continue(
        &self,
        _token: &AccessToken,
        as_member: AsMember<'_>,
        cursor: &Cursor,
    ) -> Result<Page<SharedFolder>> {
        self.record("sharing/list_folders/continue");
        let (scope, index) = page_index(cursor);
        assert_eq!(scope, as_member, "cursor used under another member");
        self.folder_page("sharing/list_folders/continue", as_member, index)
    }

    async fn folder_members_list(
        &self,
        _token: &AccessToken,
        as_member: AsMember<'_>,
        shared_folder_id: &str,
    ) -> Result<Page<FolderMembership>> {
        self.record("sharing/list_folder_members");
        self.folder_member_page("sharing/list_folder_members", as_member, shared_folder_id, 0)
    }

    async fn folder_members_list_continue(
        &self,
        _token: &AccessToken,
        as_member: AsMember<'_>,
        cursor: &Cursor,
    ) -> Result<Page<FolderMembership>> {
        self.record("sharing/list_folder_members/continue");
        let (shared_folder_id, index) = page_index(cursor);
        self.folder_member_page(
            "sharing/list_folder_members/continue",
            as_member,
            &shared_folder_id,
            index,
        )
    }

    async fn space_usage(&self, _token: &AccessToken, as_member: AsMember<'_>) -> Result<SpaceUsage> {
        self.record("users/get_space_usage");
        if self.failing_usage.contains(as_member) {
            return Err(scripted_failure("users/get_space_usage"));
        }
        Ok(SpaceUsage {
            used: self.usage.get(as_member).copied().unwrap_or_default(),
        })
    }

    async fn revoke_token(&self, token: &AccessToken) -> Result<()> {
        self.record("auth/token/revoke");
        self.revoked.lock().unwrap().push(token.secret().to_string());
        if self.failing_revoke {
            return Err(scripted_failure("auth/token/revoke"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Scripted authorizer

/// Issues `token-<permission key>` for every permission.
#[derive(Default)]
pub struct ScriptedAuthorizer {
    failing: Option<Permission>,
    acquired: Mutex<Vec<Permission>>,
}

impl ScriptedAuthorizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(mut self, permission: Permission) -> Self {
        self.failing = Some(permission);
        self
    }

    /// Permissions requested so far, in order.
    pub fn acquired(&self) -> Vec<Permission> {
        self.acquired.lock().unwrap().clone()
    }
}

#[async_trait]
impl Authorizer for ScriptedAuthorizer {
    async fn acquire(&self, _app: &AppKey, permission: Permission) -> Result<AccessToken> {
        self.acquired.lock().unwrap().push(permission);
        if self.failing == Some(permission) {
            return Err(ReportError::auth_failed(permission.label(), "user declined"));
        }
        Ok(AccessToken::new(format!("token-{}", permission.key())))
    }
}

// ---------------------------------------------------------------------------
// Recording sink

/// Sink that keeps everything in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    open_calls: usize,
    close_calls: usize,
    headers: Vec<Vec<String>>,
    rows: Vec<Vec<String>>,
    failing_open: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_open(mut self) -> Self {
        self.failing_open = true;
        self
    }

    pub fn open_calls(&self) -> usize {
        self.open_calls
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls
    }

    pub fn header_calls(&self) -> usize {
        self.headers.len()
    }

    pub fn header(&self) -> Option<&Vec<String>> {
        self.headers.first()
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }
}

impl TabularSink for RecordingSink {
    fn open(&mut self) -> Result<()> {
        self.open_calls += 1;
        if self.failing_open {
            return Err(ReportError::sink_contract("scripted open failure"));
        }
        Ok(())
    }

    fn headers(&mut self, headers: &[&str]) -> Result<()> {
        self.headers
            .push(headers.iter().map(|h| (*h).to_string()).collect());
        Ok(())
    }

    fn row(&mut self, fields: &[String]) -> Result<()> {
        self.rows.push(fields.to_vec());
        Ok(())
    }

    fn close(&mut self) {
        self.close_calls += 1;
    }
}
