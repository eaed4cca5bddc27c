mod cli;
mod infra;
mod report;
mod routes;
mod seed;
mod server;

use field_reports::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
