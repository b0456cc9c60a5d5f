mod cli;
mod infra;
mod routes;
mod server;

use fin_insight::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
