//! Core pipeline for teamreport.
//!
//! This crate crawls the paginated listings of a Dropbox Business team,
//! joins them across authorization contexts, and writes the result as
//! fixed-width tabular reports.
//!
//! # Security Guarantees
//! - Access tokens and app secrets are zeroed on drop and never logged
//! - Every token acquired during a run is revoked when the run ends
//! - Configuration is an explicit value; there is no process-wide state
//!
//! # Architecture
//! - [`pagination::Collector`] drains any listing into a complete sequence
//! - [`correlation`] joins listings that must be queried as different members
//! - [`report::ReportKind`] variants project entities into rows
//! - [`orchestrator::Orchestrator`] owns the credential and sink lifecycle
//!
//! The team API ([`api::TeamApi`]), token acquisition ([`auth::Authorizer`])
//! and output ([`sink::TabularSink`]) are traits so each can be replaced.

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod correlation;
pub mod crawler;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod pagination;
pub mod report;
pub mod sink;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use api::TeamApi;
pub use auth::{Authorizer, AuthorizationRequest, CodeFlowAuthorizer, CodePrompt};
pub use client::DropboxClient;
pub use config::{ApiEndpoints, AppConfig, AppKey, HttpConfig, PaginationConfig};
pub use credentials::{AccessToken, Permission};
pub use error::{ErrorCategory, ReportError, ReportWarning, Result};
pub use logging::init_logging;
pub use orchestrator::Orchestrator;
pub use report::{ReportKind, ReportState, ReportSummary};
pub use sink::{CsvSink, TabularSink};
