mod cli;
mod infra;
mod routes;
mod score;
mod server;

use skin_assess::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
