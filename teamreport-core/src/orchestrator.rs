//! Runs one report end to end.
//!
//! Order of a run:
//! 1. check that every required permission has an app key
//! 2. open the sink
//! 3. acquire one token per distinct permission
//! 4. run the report
//! 5. revoke every acquired token
//! 6. close the sink
//!
//! Steps 5 and 6 happen whatever the outcome of steps 3 and 4. Revocation
//! failures are logged and never change the result.

use tracing::{error, info, warn};

use crate::api::TeamApi;
use crate::auth::Authorizer;
use crate::config::AppConfig;
use crate::credentials::{Credential, CredentialStore, Permission, distinct_permissions};
use crate::pagination::Collector;
use crate::report::{ReportContext, ReportKind, ReportSummary};
use crate::sink::TabularSink;
use crate::Result;

/// Wires configuration, API, authorizer and sink together for a run.
pub struct Orchestrator<'a> {
    config: &'a AppConfig,
    api: &'a dyn TeamApi,
    authorizer: &'a dyn Authorizer,
}

impl<'a> Orchestrator<'a> {
    /// Creates an orchestrator.
    pub fn new(config: &'a AppConfig, api: &'a dyn TeamApi, authorizer: &'a dyn Authorizer) -> Self {
        Self {
            config,
            api,
            authorizer,
        }
    }

    /// Runs `report`, writing to `sink`.
    ///
    /// # Errors
    /// - configuration errors before anything is opened or acquired
    /// - sink errors when the sink cannot be opened or written
    /// - authorization errors from token acquisition
    /// - transport errors from the report's API calls
    pub async fn run(
        &self,
        report: ReportKind,
        sink: &mut dyn TabularSink,
    ) -> Result<ReportSummary> {
        let required = distinct_permissions(report.required_permissions());
        self.config.check_permissions(&required)?;

        sink.open()?;
        let result = self.run_opened(report, &required, sink).await;
        sink.close();

        match &result {
            Ok(summary) => info!(
                "Report {} completed: {} rows, {} warnings",
                report,
                summary.rows_written,
                summary.warnings.len()
            ),
            Err(e) => error!("Report {} failed: {}", report, e),
        }
        result
    }

    async fn run_opened(
        &self,
        report: ReportKind,
        required: &[Permission],
        sink: &mut dyn TabularSink,
    ) -> Result<ReportSummary> {
        let mut credentials = CredentialStore::new();

        let result = match self.acquire(required, &mut credentials).await {
            Ok(()) => {
                let collector = Collector::new(&self.config.pagination);
                let mut ctx = ReportContext::new(self.api, &credentials, collector, sink);
                let outcome = report.run(&mut ctx).await;
                outcome.map(|()| ctx.into_summary(report))
            }
            Err(e) => {
                error!("Unable to acquire enough authorisations.");
                Err(e)
            }
        };

        self.revoke(&mut credentials).await;
        result
    }

    async fn acquire(&self, required: &[Permission], credentials: &mut CredentialStore) -> Result<()> {
        for &permission in required {
            let app = self.config.app_for(permission)?;
            let token = self
                .authorizer
                .acquire(app, permission)
                .await
                .map_err(|e| {
                    error!("Unable to acquire token for '{}'", permission.label());
                    e
                })?;
            credentials.insert(Credential::new(permission, token))?;
        }
        Ok(())
    }

    async fn revoke(&self, credentials: &mut CredentialStore) {
        for credential in credentials.drain() {
            info!("Clean up token: {}", credential.permission.label());
            if let Err(e) = self.api.revoke_token(&credential.token).await {
                warn!(
                    "Unable to revoke token for '{}': {}",
                    credential.permission.label(),
                    e
                );
            }
        }
    }
}
