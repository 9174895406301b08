mod api;
mod app;
mod application;
mod cli;
mod config;
mod domain;
mod logging;
mod ui;
mod utils;

use anyhow::Context;
use clap::Parser;
use iced::window;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::application::Coordinator;
use crate::cli::Cli;
use crate::config::LauncherConfig;
use crate::domain::RunOutcome;
use crate::ui::console::ConsoleUi;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.config();

    // Dropped on return, which flushes the log file.
    let _log_guard = logging::init_logging(&config.log_file)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        log_file = %config.log_file.display(),
        "App launcher started"
    );

    let result = if cli.headless {
        run_headless(&cli, config)
    } else {
        run_gui(&cli, config)
    };

    match &result {
        Ok(()) => info!("App launcher finished"),
        Err(e) => tracing::error!(error = %e, "App launcher stopped"),
    }
    result
}

fn run_gui(cli: &Cli, config: LauncherConfig) -> anyhow::Result<()> {
    let url = cli.url.clone().unwrap_or_default();
    let process_name = cli.process.clone().unwrap_or_default();

    iced::application(
        move || app::LauncherApp::new(config.clone(), url.clone(), process_name.clone()),
        app::update,
        app::view,
    )
    .title("App Launcher")
    .subscription(app::subscription)
    .window(window::Settings {
        size: iced::Size::new(420.0, 380.0),
        resizable: false,
        exit_on_close_request: false,
        ..Default::default()
    })
    .run()
    .context("GUI failed")
}

fn run_headless(cli: &Cli, config: LauncherConfig) -> anyhow::Result<()> {
    let request = cli
        .request()
        .context("--headless needs both URL and PROCESS")?;
    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;

    let outcome = runtime.block_on(async {
        let coordinator = Coordinator::from_config(config)?;
        let ui = ConsoleUi::new();
        let cancel = CancellationToken::new();

        let ctrl_c = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Interrupted, cancelling run");
                    cancel.cancel();
                }
            }
        });

        let outcome = coordinator.run(request, &ui, cancel).await;
        ctrl_c.abort();
        anyhow::Ok(outcome)
    })?;

    match outcome {
        RunOutcome::Completed => Ok(()),
        RunOutcome::Rejected => anyhow::bail!("Invalid input"),
        RunOutcome::Failed(e) => Err(e.into()),
        RunOutcome::Cancelled => anyhow::bail!("Cancelled"),
    }
}
