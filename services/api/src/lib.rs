mod cli;
mod demo;
mod infra;
mod reports;
mod routes;
mod server;

use deal_intake::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
