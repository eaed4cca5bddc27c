use crate::report::run_report;
use crate::server;
use clap::{Args, Parser, Subcommand};
use field_reports::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Field Reports",
    about = "Send daily field-sales summaries to salesmen and admins over WhatsApp",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run one report pass and print the summary as JSON
    Report(ReportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Only process tenants configured with this IANA timezone
    #[arg(long)]
    pub(crate) tz: Option<String>,
    /// Bypass the once-per-day send lock
    #[arg(long)]
    pub(crate) force: bool,
    /// Gate and render without locking or sending
    #[arg(long)]
    pub(crate) dry_run: bool,
    /// Restrict the run to these tenant ids (repeatable)
    #[arg(long = "tenant")]
    pub(crate) tenants: Vec<String>,
    /// Redirect every message to this phone number (repeatable)
    #[arg(long = "to")]
    pub(crate) recipients: Vec<String>,
    /// JSON file holding tenants, salesmen, and visits
    #[arg(long)]
    pub(crate) seed: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Report(args) => run_report(args).await,
    }
}
