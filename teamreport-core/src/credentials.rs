//! Permissions, access tokens and the per-run credential store.
//!
//! # Security
//! - Tokens are stored in `Zeroizing` containers and cleared on drop
//! - Tokens never appear in `Debug` output or logs

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use crate::{ReportError, Result};

/// Permission scope a report can require.
///
/// Each scope is backed by a separate registered application and therefore
/// a separate access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Permission {
    /// Team information (member listing)
    Info,
    /// Team file access (acting as members)
    File,
    /// Team auditing
    Audit,
}

impl Permission {
    /// Every permission, in canonical order.
    pub const ALL: [Self; 3] = [Self::Info, Self::File, Self::Audit];

    /// Human readable scope label used in the authorization dialogue.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Info => "Team Information",
            Self::File => "Team file access",
            Self::Audit => "Team auditing",
        }
    }

    /// Short lowercase name used in configuration keys.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::File => "file",
            Self::Audit => "audit",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Collapses duplicates while keeping first-occurrence order.
///
/// The order decides the sequence of authorization dialogues.
pub fn distinct_permissions(required: &[Permission]) -> Vec<Permission> {
    let mut distinct = Vec::with_capacity(required.len());
    for permission in required {
        if !distinct.contains(permission) {
            distinct.push(*permission);
        }
    }
    distinct
}

/// Bearer access token with automatic memory zeroing.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(Zeroizing<String>);

impl AccessToken {
    /// Wraps a raw token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(Zeroizing::new(token.into()))
    }

    /// Exposes the raw token for an Authorization header.
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccessToken({})", crate::error::redact_token(&self.0))
    }
}

/// Token acquired for one permission during the current run.
#[derive(Debug, Clone)]
pub struct Credential {
    pub permission: Permission,
    pub token: AccessToken,
    pub acquired_at: DateTime<Utc>,
}

impl Credential {
    /// Records a freshly acquired token.
    pub fn new(permission: Permission, token: AccessToken) -> Self {
        Self {
            permission,
            token,
            acquired_at: Utc::now(),
        }
    }
}

/// Holds at most one credential per permission for a single run.
#[derive(Debug, Default)]
pub struct CredentialStore {
    credentials: Vec<Credential>,
}

impl CredentialStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a credential.
    ///
    /// # Errors
    /// Returns an authorization error when the permission already holds a
    /// credential; each scope is acquired exactly once per run.
    pub fn insert(&mut self, credential: Credential) -> Result<()> {
        if self.contains(credential.permission) {
            return Err(ReportError::auth_failed(
                credential.permission.label(),
                "a token for this permission was already acquired in this run",
            ));
        }
        self.credentials.push(credential);
        Ok(())
    }

    /// Returns true when a credential for `permission` is held.
    pub fn contains(&self, permission: Permission) -> bool {
        self.credentials.iter().any(|c| c.permission == permission)
    }

    /// Returns the token for `permission`.
    ///
    /// # Errors
    /// Returns an authorization error when the permission was never acquired,
    /// which means a report used a scope it did not declare.
    pub fn token(&self, permission: Permission) -> Result<&AccessToken> {
        self.credentials
            .iter()
            .find(|c| c.permission == permission)
            .map(|c| &c.token)
            .ok_or_else(|| {
                ReportError::auth_failed(permission.label(), "no token acquired for this permission")
            })
    }

    /// Number of credentials held.
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    /// Returns true when no credential is held.
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// Removes every credential, in acquisition order, for revocation.
    pub fn drain(&mut self) -> Vec<Credential> {
        std::mem::take(&mut self.credentials)
    }
}
