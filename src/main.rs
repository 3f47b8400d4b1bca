//! Second Voice CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use second_voice::cli::{
    app::{load_merged_config, open_store, run_session, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    memory_cmd::{
        handle_clear_command, handle_ideas_command, handle_links_command,
        handle_presets_command, handle_settings_command, CommandError,
    },
    presenter::Presenter,
};
use second_voice::domain::config::AppConfig;
use second_voice::infrastructure::{JsonFileStore, XdgConfigStore};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Idea store at the configured data directory
async fn memory_store() -> JsonFileStore {
    // API key comes from env/file only
    open_store(&load_merged_config(AppConfig::empty()).await)
}

fn finish(presenter: &Presenter, result: Result<(), CommandError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            presenter.error(&e.to_string());
            if e.is_usage() {
                ExitCode::from(EXIT_USAGE_ERROR)
            } else {
                ExitCode::from(EXIT_ERROR)
            }
        }
    }
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let presenter = Presenter::new();

    match cli.command {
        Some(Commands::Config { action }) => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            ExitCode::SUCCESS
        }
        Some(Commands::Presets) => {
            handle_presets_command(&presenter);
            ExitCode::SUCCESS
        }
        Some(Commands::Ideas { action }) => {
            let store = memory_store().await;
            finish(&presenter, handle_ideas_command(action, &store, &presenter).await)
        }
        Some(Commands::Links { action }) => {
            let store = memory_store().await;
            finish(&presenter, handle_links_command(action, &store, &presenter).await)
        }
        Some(Commands::Settings { action }) => {
            let store = memory_store().await;
            finish(&presenter, handle_settings_command(action, &store, &presenter).await)
        }
        Some(Commands::Clear { yes }) => {
            let store = memory_store().await;
            finish(&presenter, handle_clear_command(yes, &store, &presenter).await)
        }
        None => {
            let config = load_merged_config(AppConfig::empty()).await;
            run_session(config, cli.voice).await
        }
    }
}
