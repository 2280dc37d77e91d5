//! `assetmill serve`: Serve bundles and keep them in step with sources.

use std::path::Path;

use assetmill_watch::{DiskSync, EventPump, SourceWatcher, StabilityPolicy};
use tracing::info;

use crate::pipeline::{build_registry, load_config};

pub async fn run(
    config_path: Option<&Path>,
    port: Option<u16>,
    no_watch: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }

    let registry = build_registry(&config)?;
    let disk = DiskSync::new(registry.clone());
    if config.build_on_disk {
        let written = disk.sync_all(false).await?;
        info!(count = written.len(), "Wrote missing bundles");
    }

    let watcher = if no_watch {
        None
    } else {
        let mut pump = EventPump::new(
            registry.clone(),
            StabilityPolicy::from(&config.watch),
            std::env::current_dir()?,
        );
        if config.build_on_disk {
            pump = pump.with_disk_sync(disk);
        }
        Some(SourceWatcher::start(pump, &config.sources)?)
    };

    println!("assetmill serving on http://{}:{}", config.gateway.host, config.gateway.port);
    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutdown requested");
    };
    assetmill_gateway::start(&config, registry, shutdown).await?;

    if let Some(watcher) = watcher {
        watcher.stop();
    }
    Ok(())
}
