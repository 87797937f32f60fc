//! Publishing commands: import, clear, reset

use anyhow::{Context, Result};
use cairn_asset::{AssetManifest, AssetServices};
use std::path::Path;

pub fn run_import(
    services: &AssetServices,
    references: &[String],
    manifest: Option<&Path>,
) -> Result<()> {
    if let Some(path) = manifest.filter(|p| p.exists()) {
        let previous = AssetManifest::load(path)?;
        services.registry.preload(&previous)?;
    }

    for reference in references {
        let asset = services
            .registry
            .get_reference(reference)
            .with_context(|| format!("Failed to import {}", reference))?;
        let output = services.registry.storage().output_path(&asset)?;
        println!("{} -> {}", reference, output.display());
    }

    if let Some(path) = manifest {
        services.registry.snapshot().save(path)?;
    }

    Ok(())
}

pub fn run_clear(services: &AssetServices) -> Result<()> {
    services.registry.clear()?;
    println!(
        "Removed {}",
        services.registry.storage().storage_path().display()
    );
    Ok(())
}

pub fn run_reset(services: &AssetServices, manifest: Option<&Path>) -> Result<()> {
    services.registry.clear()?;

    let assets = services.namespaces.all_assets()?;
    let count = services.registry.warm(&assets)?;

    if let Some(path) = manifest {
        services.registry.snapshot().save(path)?;
        println!("Wrote manifest {}", path.display());
    }

    println!(
        "Published {} assets from {} namespaces to {}",
        count,
        services.namespaces.len(),
        services.registry.storage().storage_path().display()
    );
    Ok(())
}
