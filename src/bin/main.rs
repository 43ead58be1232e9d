//! Binary entrypoint for the fragments CLI

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match fragments_client::cli::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            fragments_client::cli::report_error(e.as_ref());
            ExitCode::FAILURE
        }
    }
}
