//! `assetmill init`: Write a starter configuration.

use std::path::Path;

use assetmill_config::AppConfig;

use crate::pipeline::config_file;

pub async fn run(config_path: Option<&Path>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_file(config_path);

    println!("assetmill: Project Setup");
    println!("=========================\n");

    if path.exists() && !force {
        println!("  Config file exists: {} (use --force to overwrite)", path.display());
    } else {
        std::fs::write(&path, AppConfig::default_toml())?;
        println!("✅ Wrote {}", path.display());
    }

    let config = AppConfig::load_from(&path).map_err(|e| format!("Failed to load config: {e}"))?;
    for dir in config.sources.iter().chain(std::iter::once(&config.output_dir)) {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
            println!("✅ Created {}", dir.display());
        }
    }

    println!("\nNext: put .css, .js, .svg and .html files under the source directories,");
    println!("then run `assetmill serve`.");
    Ok(())
}
