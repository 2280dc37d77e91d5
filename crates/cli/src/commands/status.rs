//! `assetmill status`: Show configuration and bundle sizes.

use std::path::Path;

use assetmill_core::BundleKind;

use crate::pipeline::{build_registry, config_file, load_config};

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;

    println!("assetmill Status");
    println!("================");
    println!("  App name:     {}", config.app_name);
    println!("  Output dir:   {}", config.output_dir.display());
    println!("  URL prefix:   {}", if config.assets_url_prefix.is_empty() { "/" } else { config.assets_url_prefix.as_str() });
    println!("  Dev mode:     {}", if config.dev_mode { "on" } else { "off" });
    println!("  Disk builds:  {}", if config.build_on_disk { "on" } else { "off" });
    println!("  Gateway:      {}:{}", config.gateway.host, config.gateway.port);
    for source in &config.sources {
        let marker = if source.is_dir() { "" } else { " (missing)" };
        println!("  Source:       {}{marker}", source.display());
    }

    let registry = build_registry(&config)?;
    println!("\n  Bundles:");
    for kind in BundleKind::ALL {
        let bundle = registry.bundle(kind);
        let size = match registry.snapshot(kind) {
            Ok(snapshot) => format!("{} bytes", snapshot.len()),
            Err(e) => format!("error: {e}"),
        };
        println!(
            "    {:<12} {:<24} {:>3} units  {size}",
            kind.output_name(),
            bundle.url_path(),
            bundle.body_len()
        );
    }
    println!("    icons: {}", registry.icon_count());

    if config_file(config_path).exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file, run `assetmill init` first");
    }

    Ok(())
}
