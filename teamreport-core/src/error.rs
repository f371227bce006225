//! Error types with token sanitization.
//!
//! Fatal failures are [`ReportError`] values and propagate to the
//! orchestrator. Recoverable conditions found while joining collections are
//! [`ReportWarning`] values: they are logged, collected into the run summary,
//! and never abort a report.

use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for teamreport operations.
///
/// # Security
/// Access tokens and app secrets are never part of an error message.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Credential acquisition or code exchange failed
    #[error("Authorization failed for '{permission}': {context}")]
    Auth {
        permission: String,
        context: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// A team API call failed before a response could be decoded
    #[error("API call to {endpoint} failed: {context}")]
    Transport {
        endpoint: String,
        context: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// The team API answered with a non-success status
    #[error("API call to {endpoint} returned {status}: {summary}")]
    ApiStatus {
        endpoint: String,
        status: u16,
        summary: String,
    },

    /// A paginated walk did not report completion within the page cap
    #[error("Pagination of {endpoint} exceeded {max_pages} pages without completing")]
    PageLimitExceeded { endpoint: String, max_pages: u32 },

    /// Writing to the tabular output failed or violated its contract
    #[error("Output failed: {context}")]
    Sink {
        context: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Configuration or validation error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The requested report name is not registered
    #[error("Unsupported report type: '{name}'")]
    UnknownReport { name: String },
}

/// Coarse classification of [`ReportError`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Credential acquisition or exchange
    Auth,
    /// Any team API call, including runaway pagination
    Transport,
    /// Tabular sink I/O or contract violation
    Output,
    /// Invalid or missing configuration
    Configuration,
}

/// Convenience type alias for Results with ReportError
pub type Result<T> = std::result::Result<T, ReportError>;

impl ReportError {
    /// Creates an authorization error without an underlying cause
    pub fn auth_failed(permission: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Auth {
            permission: permission.into(),
            context: context.into(),
            source: None,
        }
    }

    /// Creates an authorization error wrapping its cause
    pub fn auth_source<E>(permission: impl Into<String>, context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Auth {
            permission: permission.into(),
            context: context.into(),
            source: Some(Box::new(error)),
        }
    }

    /// Creates a transport error for an endpoint, wrapping its cause
    pub fn transport<E>(endpoint: impl Into<String>, context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport {
            endpoint: endpoint.into(),
            context: context.into(),
            source: Some(Box::new(error)),
        }
    }

    /// Creates a transport error for a malformed or unexpected response
    pub fn protocol(endpoint: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            context: context.into(),
            source: None,
        }
    }

    /// Creates an error for a non-success API status
    pub fn api_status(endpoint: impl Into<String>, status: u16, summary: impl Into<String>) -> Self {
        Self::ApiStatus {
            endpoint: endpoint.into(),
            status,
            summary: summary.into(),
        }
    }

    /// Creates the error raised when a walk hits the page cap
    pub fn page_limit(endpoint: impl Into<String>, max_pages: u32) -> Self {
        Self::PageLimitExceeded {
            endpoint: endpoint.into(),
            max_pages,
        }
    }

    /// Creates a sink error wrapping its cause
    pub fn sink_failed<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Sink {
            context: context.into(),
            source: Some(Box::new(error)),
        }
    }

    /// Creates a sink contract violation
    pub fn sink_contract(context: impl Into<String>) -> Self {
        Self::Sink {
            context: context.into(),
            source: None,
        }
    }

    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Maps this error onto the failure taxonomy.
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Auth { .. } => ErrorCategory::Auth,
            Self::Transport { .. } | Self::ApiStatus { .. } | Self::PageLimitExceeded { .. } => {
                ErrorCategory::Transport
            }
            Self::Sink { .. } => ErrorCategory::Output,
            Self::Configuration { .. } | Self::UnknownReport { .. } => ErrorCategory::Configuration,
        }
    }
}

/// Recoverable condition observed while correlating collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportWarning {
    /// A shared folder has no known member to query it as
    CorrelationGap { shared_folder_id: String },
    /// A device record references a team member that was not listed
    JoinMiss { team_member_id: String },
    /// Listing the members of a shared folder failed; the folder was skipped
    FolderMembersUnavailable {
        shared_folder_id: String,
        reason: String,
    },
}

impl std::fmt::Display for ReportWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CorrelationGap { shared_folder_id } => write!(
                f,
                "Could not determine the member to query shared folder '{shared_folder_id}' as"
            ),
            Self::JoinMiss { team_member_id } => write!(
                f,
                "Member profile not found for team member id '{team_member_id}'"
            ),
            Self::FolderMembersUnavailable {
                shared_folder_id,
                reason,
            } => write!(
                f,
                "Unable to load members of shared folder '{shared_folder_id}': {reason}"
            ),
        }
    }
}

/// Masks an access token for logging.
///
/// Keeps at most the first four characters so two tokens can be told apart
/// in debug output without exposing either.
///
/// # Example
///
/// ```rust
/// use teamreport_core::error::redact_token;
///
/// assert_eq!(redact_token("sl.ABCDEFGHIJ"), "sl.A****");
/// assert_eq!(redact_token("abc"), "****");
/// ```
pub fn redact_token(token: &str) -> String {
    if token.chars().count() <= 8 {
        return "****".to_string();
    }
    let prefix: String = token.chars().take(4).collect();
    format!("{prefix}****")
}
