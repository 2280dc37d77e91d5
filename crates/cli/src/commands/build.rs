//! `assetmill build`: Seed sources and write every bundle to disk.

use std::path::Path;

use assetmill_watch::DiskSync;

use crate::pipeline::{build_registry, load_config};

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let registry = build_registry(&config)?;

    let written = DiskSync::new(registry).sync_all(true).await?;
    for path in &written {
        println!("  wrote {}", path.display());
    }
    println!("✅ Built {} bundles into {}", written.len(), config.output_dir.display());
    Ok(())
}
