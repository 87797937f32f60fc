//! Asset details

use anyhow::Result;
use cairn_asset::{Asset, AssetServices};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct AssetInfo {
    reference: String,
    namespace: String,
    path: String,
    file_type: String,
    source: String,
    fingerprint: String,
    published: String,
    output_path: String,
    url: String,
    gzip: bool,
}

pub fn run(services: &AssetServices, reference: &str, format: &str) -> Result<()> {
    let asset = Asset::parse(reference)?;
    let source = services.namespaces.resolve(&asset)?;
    let resolved = services.registry.get(&asset)?;
    let policy = services
        .registry
        .storage()
        .file_types()
        .policy_for_asset(&resolved);

    let info = AssetInfo {
        reference: resolved.reference(),
        namespace: resolved.namespace().to_string(),
        path: resolved.path().to_string(),
        file_type: resolved.file_type().to_string(),
        source: source.display().to_string(),
        fingerprint: resolved
            .fingerprint()
            .map(|fp| fp.to_base64())
            .unwrap_or_default(),
        published: resolved.published_file_name(),
        output_path: services
            .registry
            .storage()
            .output_path(&resolved)?
            .display()
            .to_string(),
        url: services.urls.generate(&resolved)?,
        gzip: policy.gzip,
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&info)?),
        "toml" => print!("{}", toml::to_string_pretty(&info)?),
        other => anyhow::bail!("Unknown format '{}'. Use: json, toml", other),
    }

    Ok(())
}
