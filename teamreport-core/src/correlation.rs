//! Joins across independently paginated collections.
//!
//! Two joins are needed by the reports:
//! - device sessions reference members by `team_member_id`, resolved through
//!   a [`MemberDirectory`]
//! - shared folders can only be listed *as* a member, and their members must
//!   then be listed as some member who can see the folder. Phase 1 of
//!   [`FolderCorrelator`] builds a [`CorrelationIndex`] from folder id to the
//!   folder and the member to act as; phase 2 walks that index.
//!
//! Indexes are written during their build pass and read-only afterwards.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::api::TeamApi;
use crate::credentials::AccessToken;
use crate::crawler::{FolderMemberListing, SharedFolderListing};
use crate::error::ReportWarning;
use crate::models::{FolderMembership, SharedFolder, TeamMember};
use crate::pagination::Collector;
use crate::Result;

/// Lookup of members by `team_member_id`.
#[derive(Debug, Default)]
pub struct MemberDirectory<'a> {
    by_id: HashMap<&'a str, &'a TeamMember>,
}

impl<'a> MemberDirectory<'a> {
    /// Indexes `members`; a repeated id keeps the later entry.
    pub fn new(members: &'a [TeamMember]) -> Self {
        let by_id = members
            .iter()
            .map(|m| (m.team_member_id.as_str(), m))
            .collect();
        Self { by_id }
    }

    /// Resolves a member id.
    pub fn resolve(&self, team_member_id: &str) -> Option<&'a TeamMember> {
        self.by_id.get(team_member_id).copied()
    }

    /// Number of distinct member ids.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns true when no member is indexed.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Maps a child key to its entity and to the authorization context (member
/// id) under which its own children must be fetched.
///
/// Keys iterate in first-discovery order. Recording a key again overwrites
/// both entity and context, so the last recorder wins.
#[derive(Debug, Clone)]
pub struct CorrelationIndex<E> {
    order: Vec<String>,
    entities: HashMap<String, E>,
    contexts: HashMap<String, String>,
}

impl<E> Default for CorrelationIndex<E> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            entities: HashMap::new(),
            contexts: HashMap::new(),
        }
    }
}

impl<E> CorrelationIndex<E> {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `entity` under `key`, discovered while acting as `context`.
    pub fn record(&mut self, key: impl Into<String>, entity: E, context: impl Into<String>) {
        let key = key.into();
        self.contexts.insert(key.clone(), context.into());
        self.insert_entity(key, entity);
    }

    /// Records `entity` without an authorization context.
    ///
    /// Such keys are reported as correlation gaps by phase 2.
    pub fn insert_entity(&mut self, key: impl Into<String>, entity: E) {
        let key = key.into();
        if self.entities.insert(key.clone(), entity).is_none() {
            self.order.push(key);
        }
    }

    /// Entity recorded under `key`.
    pub fn entity(&self, key: &str) -> Option<&E> {
        self.entities.get(key)
    }

    /// Member id to act as when fetching children of `key`.
    pub fn context(&self, key: &str) -> Option<&str> {
        self.contexts.get(key).map(String::as_str)
    }

    /// Keys in first-discovery order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true when nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// A shared folder together with its complete member listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderMembers {
    pub folder: SharedFolder,
    /// Groups first, then users, then invitees; API order within each kind
    pub members: Vec<FolderMembership>,
}

/// Outcome of phase 2.
#[derive(Debug, Default)]
pub struct FolderExpansion {
    /// Folders whose members were listed, in index order
    pub folders: Vec<FolderMembers>,
    /// Folders that were skipped, and why
    pub warnings: Vec<ReportWarning>,
}

/// Two-phase shared folder correlation.
pub struct FolderCorrelator<'a, A: ?Sized> {
    api: &'a A,
    token: &'a AccessToken,
    collector: Collector,
}

impl<'a, A: TeamApi + ?Sized> FolderCorrelator<'a, A> {
    /// Binds the correlator to the API and the file-access token.
    pub const fn new(api: &'a A, token: &'a AccessToken, collector: Collector) -> Self {
        Self {
            api,
            token,
            collector,
        }
    }

    /// Phase 1: lists shared folders as every member, in member order.
    ///
    /// A folder visible to several members ends up attributed to the last of
    /// them in iteration order, with that member's view of its metadata.
    ///
    /// # Errors
    /// Any listing failure aborts the whole pass.
    pub async fn discover(&self, members: &[TeamMember]) -> Result<CorrelationIndex<SharedFolder>> {
        let mut index = CorrelationIndex::new();

        for member in members {
            let listing =
                SharedFolderListing::new(self.api, self.token, member.team_member_id.as_str());
            let folders = self.collector.collect(&listing).await.map_err(|e| {
                tracing::error!(
                    "Unable to load shared folders for member ({}): {}",
                    member.team_member_id,
                    e
                );
                e
            })?;

            debug!(
                "Member {} sees {} shared folder(s)",
                member.team_member_id,
                folders.len()
            );
            for folder in folders {
                let key = folder.shared_folder_id.clone();
                index.record(key, folder, member.team_member_id.as_str());
            }
        }

        info!("Discovered {} shared folder(s)", index.len());
        Ok(index)
    }

    /// Phase 2: lists the members of every indexed folder.
    ///
    /// Never fails. Folders without an authorization context, and folders
    /// whose member listing fails, are skipped and reported as warnings.
    pub async fn expand(&self, index: &CorrelationIndex<SharedFolder>) -> FolderExpansion {
        let mut expansion = FolderExpansion::default();

        for shared_folder_id in index.keys() {
            let Some(folder) = index.entity(shared_folder_id) else {
                continue;
            };
            let Some(as_member) = index.context(shared_folder_id) else {
                let warning = ReportWarning::CorrelationGap {
                    shared_folder_id: shared_folder_id.to_string(),
                };
                warn!("{}", warning);
                expansion.warnings.push(warning);
                continue;
            };

            let listing =
                FolderMemberListing::new(self.api, self.token, as_member, shared_folder_id);
            match self.collector.collect(&listing).await {
                Ok(mut members) => {
                    members.sort_by_key(FolderMembership::rank);
                    expansion.folders.push(FolderMembers {
                        folder: folder.clone(),
                        members,
                    });
                }
                Err(e) => {
                    let warning = ReportWarning::FolderMembersUnavailable {
                        shared_folder_id: shared_folder_id.to_string(),
                        reason: e.to_string(),
                    };
                    warn!("{}", warning);
                    expansion.warnings.push(warning);
                }
            }
        }

        expansion
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{FakeTeamApi, folder, group, invitee, member, user};

    #[test]
    fn test_member_directory_resolves() {
        let members = vec![member("tm1", "alice@x.com"), member("tm2", "bob@x.com")];
        let directory = MemberDirectory::new(&members);

        assert_eq!(directory.resolve("tm1").unwrap().email, "alice@x.com");
        assert!(directory.resolve("tm9").is_none());
        assert_eq!(directory.len(), 2);
    }

    #[test]
    fn test_index_last_write_wins_keeps_first_position() {
        let mut index = CorrelationIndex::new();
        index.record("f1", "first view", "tm1");
        index.record("f2", "other", "tm1");
        index.record("f1", "second view", "tm2");

        assert_eq!(index.keys().collect::<Vec<_>>(), vec!["f1", "f2"]);
        assert_eq!(index.context("f1"), Some("tm2"));
        assert_eq!(index.entity("f1"), Some(&"second view"));
        assert_eq!(index.len(), 2);
    }

    #[tokio::test]
    async fn test_discover_attributes_shared_folder_to_last_member() {
        let members = vec![
            member("m1", "m1@x.com"),
            member("m2", "m2@x.com"),
            member("m3", "m3@x.com"),
        ];
        let api = FakeTeamApi::new()
            .with_folders("m1", vec![vec![folder("sf-a", "A")]])
            .with_folders("m2", vec![vec![folder("sf-f", "F")]])
            .with_folders("m3", vec![vec![folder("sf-f", "F")], vec![folder("sf-b", "B")]]);
        let token = AccessToken::new("file");

        let index = FolderCorrelator::new(&api, &token, Collector::default())
            .discover(&members)
            .await
            .unwrap();

        assert_eq!(index.context("sf-f"), Some("m3"));
        assert_eq!(index.context("sf-a"), Some("m1"));
        assert_eq!(index.keys().collect::<Vec<_>>(), vec!["sf-a", "sf-f", "sf-b"]);
    }

    #[tokio::test]
    async fn test_discover_fails_when_member_listing_fails() {
        let members = vec![member("m1", "m1@x.com"), member("m2", "m2@x.com")];
        let api = FakeTeamApi::new()
            .with_folders("m1", vec![vec![folder("sf-a", "A")]])
            .failing_folders_for("m2");
        let token = AccessToken::new("file");

        let result = FolderCorrelator::new(&api, &token, Collector::default())
            .discover(&members)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_expand_lists_members_as_recorded_member() {
        let api = FakeTeamApi::new().with_folder_members(
            "m2",
            "sf-1",
            vec![
                vec![invitee("guest@y.com"), user("dbid:u1", Some("m1"))],
                vec![group("g1", "Sales")],
            ],
        );
        let token = AccessToken::new("file");
        let mut index = CorrelationIndex::new();
        index.record("sf-1", folder("sf-1", "Plans"), "m2");

        let expansion = FolderCorrelator::new(&api, &token, Collector::default())
            .expand(&index)
            .await;

        assert!(expansion.warnings.is_empty());
        assert_eq!(expansion.folders.len(), 1);
        let ranks: Vec<u8> = expansion.folders[0]
            .members
            .iter()
            .map(FolderMembership::rank)
            .collect();
        assert_eq!(ranks, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_expand_skips_folder_without_context() {
        let api = FakeTeamApi::new()
            .with_folder_members("m1", "sf-2", vec![vec![group("g1", "Sales")]]);
        let token = AccessToken::new("file");
        let mut index = CorrelationIndex::new();
        index.insert_entity("sf-1", folder("sf-1", "Orphan"));
        index.record("sf-2", folder("sf-2", "Known"), "m1");

        let expansion = FolderCorrelator::new(&api, &token, Collector::default())
            .expand(&index)
            .await;

        assert_eq!(
            expansion.warnings,
            vec![ReportWarning::CorrelationGap {
                shared_folder_id: "sf-1".to_string()
            }]
        );
        assert_eq!(expansion.folders.len(), 1);
        assert_eq!(expansion.folders[0].folder.shared_folder_id, "sf-2");
        // No call was made for the orphan.
        assert_eq!(api.calls("sharing/list_folder_members"), 1);
    }

    #[tokio::test]
    async fn test_expand_continues_after_member_listing_failure() {
        let api = FakeTeamApi::new()
            .failing_folder_members_for("sf-1")
            .with_folder_members("m1", "sf-2", vec![vec![group("g1", "Sales")]]);
        let token = AccessToken::new("file");
        let mut index = CorrelationIndex::new();
        index.record("sf-1", folder("sf-1", "Broken"), "m1");
        index.record("sf-2", folder("sf-2", "Fine"), "m1");

        let expansion = FolderCorrelator::new(&api, &token, Collector::default())
            .expand(&index)
            .await;

        assert_eq!(expansion.folders.len(), 1);
        assert_eq!(expansion.warnings.len(), 1);
        assert!(matches!(
            &expansion.warnings[0],
            ReportWarning::FolderMembersUnavailable { shared_folder_id, .. } if shared_folder_id == "sf-1"
        ));
    }
}
