pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::{AppConfig, SourceConfig};
use crate::core::{CachePolicy, Dataset, Table, TableSource};
use crate::providers::{CachingLoader, DirectorySource, HttpSource};
use crate::store::memory::MemoryCache;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub enum AppCommand {
    Ask { question: String, json: bool },
    Snapshot { output: Option<PathBuf> },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("CFO Copilot starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let data = match load_tables(build_source(&config.source)?, &config).await {
        Ok(data) => data,
        Err(e) => match &config.fallback_path {
            Some(fallback) => {
                warn!(error = %e, "Failed to load tables, falling back to {}", fallback);
                load_tables(Box::new(DirectorySource::new(fallback)), &config)
                    .await
                    .with_context(|| format!("Fallback tables at {fallback} failed to load"))?
            }
            None => return Err(e),
        },
    };

    let entity = config.entity.as_deref().filter(|e| !e.is_empty());

    match command {
        AppCommand::Ask { question, json } => {
            cli::ask::run(&question, &data, entity, &config.display, json)
        }
        AppCommand::Snapshot { output } => cli::snapshot::run(&data, entity, output.as_deref()),
    }
}

/// Loads all tables from `source` through a memoizing loader, showing progress.
async fn load_tables(source: Box<dyn TableSource>, config: &AppConfig) -> Result<Arc<Dataset>> {
    let loader = CachingLoader::new(
        source,
        Arc::new(MemoryCache::<String, Arc<Dataset>>::new(
            CachePolicy::with_ttl_secs(config.cache_ttl_secs),
        )),
    );

    let pb = cli::ui::new_progress_bar(Table::ALL.len() as u64);
    pb.set_message("Loading tables");
    let loaded = loader
        .load_with_progress(&|table| {
            pb.set_message(format!("Loaded {table}"));
            pb.inc(1);
        })
        .await;
    pb.finish_and_clear();
    loaded
}

/// Creates the table source named by the config.
pub fn build_source(config: &SourceConfig) -> Result<Box<dyn TableSource>> {
    let source: Box<dyn TableSource> = match config {
        SourceConfig::Directory { path } => Box::new(DirectorySource::new(path)),
        SourceConfig::Http { base_url } => Box::new(HttpSource::new(base_url)?),
    };
    debug!("Using table source {}", source.location());
    Ok(source)
}
