//! Implementation of the `rigging matrix` command.

use anyhow::{bail, Context, Result};
use rigging_pkg::{Manifest, PlatformContext, Recipe};
use std::path::PathBuf;
use tracing::warn;

/// Operating systems resolved when none are given.
pub fn default_oses() -> Vec<String> {
    ["Windows", "Linux", "Macos"]
        .iter()
        .map(|s| (*s).to_string())
        .collect()
}

/// Options for the matrix command.
#[derive(Debug)]
pub struct MatrixOptions {
    /// Recipe file to read.
    pub recipe: PathBuf,
    /// Operating systems to resolve for.
    pub oses: Vec<String>,
    /// Profile supplying compiler, build type and architecture.
    pub profile: Option<PathBuf>,
}

/// Result of resolving one recipe for several platforms.
#[derive(Debug, Default)]
pub struct MatrixReport {
    /// One entry per requested OS, in request order.
    pub rows: Vec<MatrixRow>,
}

/// Outcome for one OS.
#[derive(Debug)]
pub struct MatrixRow {
    /// The OS resolved for.
    pub os: String,
    /// The manifest, or the error message.
    pub outcome: Result<Manifest, String>,
}

impl MatrixReport {
    /// Number of platforms that failed to resolve.
    pub fn failures(&self) -> usize {
        self.rows.iter().filter(|r| r.outcome.is_err()).count()
    }

    /// Print each platform's packages.
    pub fn print_summary(&self) {
        for row in &self.rows {
            match &row.outcome {
                Ok(manifest) => {
                    let names: Vec<&str> = manifest.names().collect();
                    println!("{} ({}): {}", row.os, manifest.len(), names.join(", "));
                }
                Err(message) => println!("{}: error: {message}", row.os),
            }
        }
    }

    /// Fail if any platform failed.
    pub fn into_result(self) -> Result<()> {
        let failures = self.failures();
        if failures > 0 {
            bail!(
                "{failures} of {} platforms failed to resolve",
                self.rows.len()
            );
        }
        Ok(())
    }
}

/// Resolve the recipe once per OS.
///
/// Per-platform failures are recorded in the report rather than aborting.
pub fn run(options: &MatrixOptions) -> Result<MatrixReport> {
    let recipe = Recipe::from_path(&options.recipe)
        .with_context(|| format!("Failed to read recipe '{}'", options.recipe.display()))?;

    let base = match &options.profile {
        Some(path) => PlatformContext::from_profile(path)
            .with_context(|| format!("Failed to load profile '{}'", path.display()))?,
        None => PlatformContext::detect(),
    };

    Ok(resolve_matrix(&recipe, &base, &options.oses))
}

fn resolve_matrix(recipe: &Recipe, base: &PlatformContext, oses: &[String]) -> MatrixReport {
    let rows = oses
        .iter()
        .map(|os| {
            let ctx = base.clone().with_os(os);
            let outcome = recipe.resolve(&ctx).map_err(|e| {
                warn!(os = %os, error = %e, "resolution failed");
                e.to_string()
            });
            MatrixRow {
                os: ctx.os.unwrap_or_else(|| os.clone()),
                outcome,
            }
        })
        .collect();

    MatrixReport { rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> PlatformContext {
        PlatformContext::new().with_compiler("gcc").with_build_type("Release")
    }

    #[test]
    fn test_matrix_per_os() {
        let report = resolve_matrix(&Recipe::starter().unwrap(), &base(), &default_oses());
        assert_eq!(report.rows.len(), 3);
        assert_eq!(report.failures(), 0);

        let counts: Vec<usize> = report
            .rows
            .iter()
            .map(|r| r.outcome.as_ref().unwrap().len())
            .collect();
        assert_eq!(counts, vec![8, 5, 5]);
    }

    #[test]
    fn test_matrix_without_profile_settings() {
        let report = resolve_matrix(
            &Recipe::starter().unwrap(),
            &PlatformContext::new(),
            &default_oses(),
        );
        assert_eq!(report.failures(), 0);
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_matrix_canonicalises_os() {
        let report = resolve_matrix(&Recipe::starter().unwrap(), &base(), &["windows".to_string()]);
        assert_eq!(report.rows[0].os, "Windows");
    }

    #[test]
    fn test_matrix_records_failures() {
        let recipe = Recipe::parse(
            r#"
requires = ["glm/1.0.1"]

[[conditional]]
when = { os = "Linux" }
requires = ["glm/0.9.9.8"]
"#,
        )
        .unwrap();

        let report = resolve_matrix(&recipe, &base(), &default_oses());
        assert_eq!(report.failures(), 1);
        assert!(report.rows[1].outcome.is_err());
        assert!(report.into_result().is_err());
    }
}
