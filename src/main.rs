use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use mod_updater_lib::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    mod_updater_lib::init_logging(cli.debug, &cli.log_file);
    info!("Starting mod updater.");

    match mod_updater_lib::run(cli).await {
        Ok(_) => {
            info!("Mod updater finished.");
            ExitCode::SUCCESS
        }
        Err(e) if e.is_validation() => {
            error!("{}", e);
            ExitCode::from(2)
        }
        Err(e) => {
            error!("Mod updater failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
