//! Shared setup: configuration, registry construction and seeding.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use assetmill_config::{AppConfig, CONFIG_FILE};
use assetmill_core::{BasicMinifier, BundleRegistry, Initializer, RegistryOptions};
use assetmill_watch::seed_directory;
use tracing::info;

/// Load configuration from `path` (default `./assetmill.toml`) with
/// environment overrides applied.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = AppConfig::load_with_env(&config_file(path))
        .map_err(|e| format!("Failed to load config: {e}"))?;
    Ok(config)
}

/// The configuration file `init` and `status` look at.
pub fn config_file(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
}

/// An initializer that re-reads `path` every time the script bundle is rebuilt.
pub fn file_initializer(path: PathBuf) -> Initializer {
    Arc::new(move || {
        std::fs::read_to_string(&path)
            .map_err(|e| assetmill_core::Error::Initializer(format!("{}: {e}", path.display())))
    })
}

/// Build a registry from `config`, apply the HTML template and seed every
/// source directory.
pub fn build_registry(config: &AppConfig) -> Result<Arc<BundleRegistry>, Box<dyn std::error::Error>> {
    let options = RegistryOptions {
        app_name: config.app_name.clone(),
        output_dir: config.output_dir.clone(),
        assets_url_prefix: config.assets_url_prefix.clone(),
        runtime_initializer: config.runtime_init_js.clone().map(file_initializer),
    };
    let registry = Arc::new(BundleRegistry::new(options, Arc::new(BasicMinifier)));

    if let Some(template) = &config.html_template {
        let document = std::fs::read_to_string(template)
            .map_err(|e| format!("Failed to read HTML template {}: {e}", template.display()))?;
        registry.load_html_template(&document);
    }

    for source in &config.sources {
        let report = seed_directory(&registry, source)?;
        info!(
            dir = %source.display(),
            applied = report.applied,
            ignored = report.ignored,
            "Source seeded"
        );
    }

    Ok(registry)
}
