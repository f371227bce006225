//! Command-line surface of teamreport.
//!
//! Parses flags and environment into an [`AppConfig`] and a [`RunRequest`].
//! Kept in a library so it can be tested without running the binary.

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser};
use teamreport_core::{
    AppConfig, AppKey, AuthorizationRequest, CodePrompt, CsvSink, HttpConfig, PaginationConfig,
    Permission, ReportError, ReportKind, Result,
};

/// Application name shown in the authorization dialogue.
pub const APP_NAME: &str = "teamreport";

/// CLI argument structure
#[derive(Parser)]
#[command(name = "teamreport")]
#[command(about = "Dropbox Business team reports as CSV")]
#[command(version)]
#[command(long_about = "
teamreport - Dropbox Business team reports

Crawls the team member, session, quota and shared folder listings of a
Dropbox Business team and writes one report as a CSV file.

Each report needs one or more team applications. Their keys are read from
the environment:
  TEAMREPORT_INFO_APP_KEY / TEAMREPORT_INFO_APP_SECRET    Team Information
  TEAMREPORT_FILE_APP_KEY / TEAMREPORT_FILE_APP_SECRET    Team file access
  TEAMREPORT_AUDIT_APP_KEY / TEAMREPORT_AUDIT_APP_SECRET  Team auditing

Every token acquired for a run is revoked when the run ends.

EXAMPLES:
  teamreport --report TeamMemberProfile --out members.csv
  teamreport --report SharedFolderMembers --out folders.csv --enable-bom
")]
pub struct Cli {
    /// Report type name
    #[arg(long, value_name = "NAME")]
    pub report: Option<String>,

    /// Output file path
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// HTTP(S) proxy
    #[arg(long, value_name = "HOST:PORT", value_parser = parse_proxy)]
    pub proxy: Option<String>,

    /// Add a UTF-8 byte order mark to the output file
    #[arg(long)]
    pub enable_bom: bool,

    /// Mirror every row to stdout
    #[arg(long)]
    pub echo: bool,

    /// Maximum pages fetched from one listing
    #[arg(long, value_name = "N")]
    pub max_pages: Option<u32>,

    #[command(flatten)]
    pub apps: AppArgs,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Keys and secrets of the registered team applications.
#[derive(Args)]
pub struct AppArgs {
    /// App key with Team Information permission
    #[arg(long, env = "TEAMREPORT_INFO_APP_KEY", hide_env_values = true)]
    pub info_app_key: Option<String>,

    /// App secret with Team Information permission
    #[arg(long, env = "TEAMREPORT_INFO_APP_SECRET", hide_env_values = true)]
    pub info_app_secret: Option<String>,

    /// App key with Team file access permission
    #[arg(long, env = "TEAMREPORT_FILE_APP_KEY", hide_env_values = true)]
    pub file_app_key: Option<String>,

    /// App secret with Team file access permission
    #[arg(long, env = "TEAMREPORT_FILE_APP_SECRET", hide_env_values = true)]
    pub file_app_secret: Option<String>,

    /// App key with Team auditing permission
    #[arg(long, env = "TEAMREPORT_AUDIT_APP_KEY", hide_env_values = true)]
    pub audit_app_key: Option<String>,

    /// App secret with Team auditing permission
    #[arg(long, env = "TEAMREPORT_AUDIT_APP_SECRET", hide_env_values = true)]
    pub audit_app_secret: Option<String>,
}

impl AppArgs {
    fn pair(&self, permission: Permission) -> Option<AppKey> {
        let (key, secret) = match permission {
            Permission::Info => (&self.info_app_key, &self.info_app_secret),
            Permission::File => (&self.file_app_key, &self.file_app_secret),
            Permission::Audit => (&self.audit_app_key, &self.audit_app_secret),
        };
        Some(AppKey::new(key.as_deref()?, secret.as_deref()?))
    }
}

/// Verbosity flags
#[derive(Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, help = "Suppress all output except errors")]
    pub quiet: bool,
}

/// What to run and where to write it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub report: ReportKind,
    /// CSV file to create
    pub out: PathBuf,
}

impl Cli {
    /// Resolves the report and output path.
    ///
    /// # Errors
    /// Returns a configuration error for a missing `--out`, and an unknown
    /// report error for a missing or unsupported `--report`.
    pub fn request(&self) -> Result<RunRequest> {
        let out = self
            .out
            .clone()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| ReportError::configuration("Required option: Output file path"))?;
        let report = self.report.as_deref().unwrap_or_default().parse()?;
        Ok(RunRequest { report, out })
    }

    /// Builds the run configuration from flags and environment.
    pub fn build_config(&self) -> AppConfig {
        let mut http = HttpConfig::new();
        if let Some(proxy) = &self.proxy {
            http = http.with_proxy(proxy);
        }
        let mut pagination = PaginationConfig::new();
        if let Some(max_pages) = self.max_pages {
            pagination = pagination.with_max_pages(max_pages);
        }

        let mut config = AppConfig::new(APP_NAME)
            .with_http(http)
            .with_pagination(pagination);
        for permission in Permission::ALL {
            if let Some(app) = self.apps.pair(permission) {
                config = config.with_app(permission, app);
            }
        }
        config
    }

    /// Output sink for `out`, honouring `--enable-bom` and `--echo`.
    pub fn sink(&self, out: PathBuf) -> CsvSink {
        CsvSink::new(out)
            .with_bom(self.enable_bom)
            .with_echo(self.echo)
    }
}

/// Rejects proxies that are not `host:port` or a URL.
fn parse_proxy(value: &str) -> std::result::Result<String, String> {
    let candidate = if value.contains("://") {
        value.to_string()
    } else {
        format!("http://{value}")
    };
    let url = url::Url::parse(&candidate).map_err(|e| format!("invalid proxy '{value}': {e}"))?;
    if url.host_str().is_none() {
        return Err(format!("invalid proxy '{value}': no host"));
    }
    Ok(value.to_string())
}

/// Listing of every supported report, one name and description each.
pub fn supported_reports() -> String {
    let listing: String = ReportKind::ALL
        .iter()
        .map(|kind| format!("{}\n    - {}\n", kind.name(), kind.description()))
        .collect();
    format!("\nSupported Report types: \n\n{listing}")
}

/// Usage text followed by the supported reports.
pub fn usage_with_reports() -> String {
    format!("{}\n{}", Cli::command().render_usage(), supported_reports())
}

/// Reads the authorization code on the console.
///
/// Instructions go to stdout; the code is entered without echo.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsolePrompt;

impl CodePrompt for ConsolePrompt {
    fn read_code(&self, request: &AuthorizationRequest<'_>) -> Result<String> {
        println!("=====================");
        println!(
            "Authorise application '{}' with '{}' permission.",
            request.app_name,
            request.permission.label()
        );
        println!("1. Visit the URL for the auth dialog:");
        println!();
        println!("{}", request.url);
        println!();
        println!("2. Click 'Allow' (you might have to login first)");
        println!("3. Copy the authorisation code: ");

        rpassword::prompt_password("Enter the authorisation code here: ").map_err(|e| {
            ReportError::auth_source(
                request.permission.label(),
                "Unable to read the authorisation code",
                e,
            )
        })
    }
}
