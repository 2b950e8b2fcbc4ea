pub mod api;
pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::cli::convert::Currency;
use crate::core::config::AppConfig;
use crate::core::{KeyValueStore, RateReader, RefreshJob};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Serve,
    Refresh,
    Rates,
    Convert { amount: f64, currency: Currency },
}

/// Loads the config file (or defaults) and applies `DRAGONFLY_*` overrides.
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    let config = config.with_env_overrides()?;
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

/// Wires the handlers' dependencies around one shared store.
pub fn build_state(config: &AppConfig, store: Arc<dyn KeyValueStore>) -> Result<api::AppState> {
    let fetcher = providers::build_fetcher(&config.providers)?;
    let refresher = RefreshJob::new(fetcher, Arc::clone(&store), config.refresh.clear_previous);
    Ok(api::AppState {
        reader: RateReader::new(store),
        refresher: Arc::new(refresher),
    })
}

/// Runs against the configured cache, or a process-local store when `memory` is set.
pub async fn run_command(
    command: AppCommand,
    config_path: Option<&str>,
    memory: bool,
) -> Result<()> {
    info!("vesrates starting...");

    let config = load_config(config_path)?;
    let store: Arc<dyn KeyValueStore> = if memory {
        info!("Using in-memory store, rates are not persisted");
        Arc::new(store::MemoryStore::new())
    } else {
        Arc::new(store::RedisStore::new(&config.cache)?)
    };

    run_with_store(command, &config, store).await
}

pub async fn run_with_store(
    command: AppCommand,
    config: &AppConfig,
    store: Arc<dyn KeyValueStore>,
) -> Result<()> {
    let state = build_state(config, store)?;

    match command {
        AppCommand::Serve => api::server::run(&config.server.address, state).await,
        AppCommand::Refresh => {
            let spinner = cli::ui::new_spinner("Fetching rates...");
            let result = state.refresher.run().await;
            spinner.finish_and_clear();
            println!("{}", cli::rates::display_refreshed(&result?));
            Ok(())
        }
        AppCommand::Rates => {
            let outcome = state.reader.read().await?;
            println!("{}", cli::rates::display_cached(&outcome));
            Ok(())
        }
        AppCommand::Convert { amount, currency } => {
            let outcome = state.reader.read().await?;
            println!(
                "{}",
                cli::convert::display_conversion(&outcome, amount, currency)?
            );
            Ok(())
        }
    }
}
