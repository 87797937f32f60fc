//! Rendering commands: link, url, inline

use anyhow::Result;
use cairn_asset::{Asset, AssetServices};

pub fn run_link(services: &AssetServices, references: &[String]) -> Result<()> {
    let references: Vec<&str> = references.iter().map(String::as_str).collect();
    println!("{}", services.html.link_assets(&references)?);
    Ok(())
}

pub fn run_url(services: &AssetServices, reference: &str) -> Result<()> {
    let asset = Asset::parse(reference)?;
    println!("{}", services.urls.generate(&asset)?);
    Ok(())
}

pub fn run_inline(services: &AssetServices, reference: &str) -> Result<()> {
    print!("{}", services.html.inline(reference)?);
    Ok(())
}
