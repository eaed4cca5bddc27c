//! One-off report runs from the command line.
//!
//! This replaces the old pile of copy-pasted send-to-one-person scripts: the
//! same runner as the HTTP surface, narrowed by tenant and recipient flags.

use crate::cli::ReportArgs;
use crate::infra::{InMemorySendLog, InMemoryTenantDirectory, InMemoryVisitStore};
use crate::seed;
use field_reports::config::AppConfig;
use field_reports::error::AppError;
use field_reports::reports::dispatch::WhatsAppDispatcher;
use field_reports::reports::domain::TenantId;
use field_reports::reports::runner::{ReportRunner, RunOptions};
use field_reports::telemetry;
use std::sync::Arc;

pub(crate) async fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let seed = match &args.seed {
        Some(path) => seed::from_file(path)?,
        None => seed::demo(),
    };

    let runner = ReportRunner::new(
        Arc::new(InMemoryTenantDirectory::new(seed.tenants)),
        Arc::new(InMemoryVisitStore::new(seed.salesmen, seed.visits)),
        Arc::new(InMemorySendLog::default()),
        Arc::new(WhatsAppDispatcher::new(config.messaging.clone())?),
    );

    let options = RunOptions {
        tz_filter: args.tz,
        force: args.force,
        dry_run: args.dry_run,
        tenant_filter: if args.tenants.is_empty() {
            None
        } else {
            Some(args.tenants.into_iter().map(TenantId).collect())
        },
        recipient_override: if args.recipients.is_empty() {
            None
        } else {
            Some(args.recipients)
        },
    };

    let summary = runner.run(&options).await?;
    let rendered = serde_json::to_string_pretty(&summary)
        .map_err(|err| AppError::Data(err.to_string()))?;
    println!("{rendered}");
    Ok(())
}
