//! Dropbox Business team report tool.
//!
//! Writes one report about a team as a CSV file.
//!
//! # Security Guarantees
//! - App secrets and access tokens are never logged
//! - Every token acquired for a run is revoked before exit
//! - Nothing is contacted when the command line is invalid

use anyhow::Context;
use clap::Parser;
use teamreport::{Cli, ConsolePrompt, usage_with_reports};
use teamreport_core::{CodeFlowAuthorizer, DropboxClient, Orchestrator, init_logging};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet).context("Failed to initialise logging")?;
    info!("teamreport version: {}", env!("CARGO_PKG_VERSION"));

    let request = match cli.request() {
        Ok(request) => request,
        Err(e) => {
            error!("{}", e);
            eprint!("{}", usage_with_reports());
            std::process::exit(2);
        }
    };

    let config = cli.build_config();
    config.validate()?;

    let api = DropboxClient::from_config(&config)?;
    let authorizer =
        CodeFlowAuthorizer::new(&config.app_name, &config.endpoints, &config.http, ConsolePrompt)?;
    let mut sink = cli.sink(request.out.clone());

    info!("Output: {}", request.out.display());
    let result = Orchestrator::new(&config, &api, &authorizer)
        .run(request.report, &mut sink)
        .await;

    match result {
        Ok(_) => Ok(()),
        Err(e) => {
            error!("Could not complete report {}: {}", request.report, e);
            std::process::exit(1);
        }
    }
}
