pub mod cli;
pub mod core;

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::cli::Cli;
use crate::core::catalog::ModrinthClient;
use crate::core::downloader::Downloader;
use crate::core::error::UpdaterResult;
use crate::core::updater::{interrupt_signal, with_deadline, RunSummary, Updater};
use crate::core::version::VersionGate;

/// Console logging plus a full debug log written to `log_file`.
pub fn init_logging(debug: bool, log_file: &Path) {
    let console_default = if debug {
        "info,mod_updater_lib=debug,mod_updater=debug"
    } else {
        "info"
    };
    let console = fmt::layer().with_target(false).with_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(console_default)),
    );

    let file = match File::create(log_file) {
        Ok(file) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .with_filter(EnvFilter::new("info,mod_updater_lib=debug,mod_updater=debug")),
        ),
        Err(e) => {
            eprintln!("Cannot write log file {:?}: {}", log_file, e);
            None
        }
    };

    tracing_subscriber::registry().with(console).with(file).init();
}

/// Run one update against the live catalog.
///
/// Ctrl-C or the configured timeout drops whatever is in flight; partially
/// downloaded files clean themselves up and archived files are left as they are.
pub async fn run(cli: Cli) -> UpdaterResult<RunSummary> {
    let config = cli.into_config()?;
    let timeout = config.run_timeout;

    let work = async {
        let catalog = ModrinthClient::new(&config.settings)?;
        let gate = VersionGate::load(&catalog).await?;
        let downloader = Downloader::new(catalog.http_client().clone());
        Updater::new(&config, &catalog, &downloader, &gate).run().await
    };

    let summary = with_deadline(work, timeout, interrupt_signal(tokio::signal::ctrl_c())).await?;
    info!("{}", summary);
    Ok(summary)
}
