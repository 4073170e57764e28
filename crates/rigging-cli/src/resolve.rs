//! Implementation of the `rigging resolve` command.

use crate::context::ContextArgs;
use anyhow::{Context, Result};
use clap::ValueEnum;
use rigging_pkg::{ConflictPolicy, Manifest, Recipe};
use std::path::PathBuf;
use tracing::info;

/// How the resolved manifest is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable listing.
    Text,
    /// Pretty JSON.
    Json,
    /// TOML.
    Toml,
}

/// Options for the resolve command.
#[derive(Debug)]
pub struct ResolveOptions {
    /// Recipe file to read.
    pub recipe: PathBuf,
    /// Target platform flags.
    pub context: ContextArgs,
    /// Output format.
    pub format: OutputFormat,
    /// Switch the recipe's conflict policy to override.
    pub allow_override: bool,
}

/// Resolve the recipe and render the manifest.
pub fn run(options: &ResolveOptions) -> Result<String> {
    let mut recipe = Recipe::from_path(&options.recipe)
        .with_context(|| format!("Failed to read recipe '{}'", options.recipe.display()))?;
    if options.allow_override {
        recipe.conflict_policy = ConflictPolicy::Override;
    }

    let ctx = options.context.to_context()?;
    let manifest = recipe
        .resolve(&ctx)
        .with_context(|| format!("Failed to resolve recipe for {ctx}"))?;

    info!(packages = manifest.len(), "resolved {}", options.recipe.display());
    render(&manifest, options.format)
}

/// Render a manifest in the requested format.
pub fn render(manifest: &Manifest, format: OutputFormat) -> Result<String> {
    let output = match format {
        OutputFormat::Text => manifest.to_string(),
        OutputFormat::Json => manifest.to_json().context("Failed to serialize manifest")?,
        OutputFormat::Toml => manifest
            .to_toml_string()
            .context("Failed to serialize manifest")?,
    };
    Ok(output)
}
