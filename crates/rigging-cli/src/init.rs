//! Recipe initialization for `rigging init`.

use anyhow::{bail, Context, Result};
use rigging_pkg::{Recipe, RECIPE_FILE};
use std::fs;
use std::path::{Path, PathBuf};

/// Generators folder used by `--flat` when none is given.
const DEFAULT_FLAT_FOLDER: &str = "conan";

/// Options for recipe initialization.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Directory to write the recipe into.
    pub dir: PathBuf,

    /// Write a flat unconditional list.
    pub flat: bool,

    /// Fixed generators folder for the flat recipe.
    pub generators_folder: Option<String>,

    /// Recipe name (defaults to directory name).
    pub name: Option<String>,

    /// Overwrite an existing recipe.
    pub force: bool,
}

/// Write a starter recipe into `options.dir`.
pub fn init_recipe(options: &InitOptions) -> Result<PathBuf> {
    let recipe_path = options.dir.join(RECIPE_FILE);
    if recipe_path.exists() && !options.force {
        bail!(
            "Cannot initialize: `{}` already exists in this directory (use --force to overwrite)",
            RECIPE_FILE
        );
    }

    let mut recipe = if options.flat {
        Recipe::starter_flat(
            options
                .generators_folder
                .clone()
                .unwrap_or_else(|| DEFAULT_FLAT_FOLDER.to_string()),
        )
    } else {
        Recipe::starter().context("Failed to build starter recipe")?
    };
    recipe.name = match &options.name {
        Some(name) => Some(name.clone()),
        None => infer_recipe_name(&options.dir),
    };

    let content = recipe
        .to_toml_string()
        .context("Failed to serialize recipe")?;
    fs::write(&recipe_path, content)
        .with_context(|| format!("Failed to write {}", recipe_path.display()))?;

    let shape = if options.flat { "flat" } else { "per-platform" };
    println!("Created {shape} recipe `{}`", recipe_path.display());

    Ok(recipe_path)
}

/// Infer the recipe name from the directory name.
fn infer_recipe_name(dir: &Path) -> Option<String> {
    dir.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn options(dir: &Path) -> InitOptions {
        InitOptions {
            dir: dir.to_path_buf(),
            flat: false,
            generators_folder: None,
            name: None,
            force: false,
        }
    }

    #[test]
    fn test_init_writes_parsable_recipe() {
        let tmp = TempDir::new().unwrap();
        let project = tmp.path().join("shaders");
        fs::create_dir(&project).unwrap();

        let path = init_recipe(&options(&project)).unwrap();
        let recipe = Recipe::from_path(&path).unwrap();
        assert_eq!(recipe.name.as_deref(), Some("shaders"));
        assert_eq!(recipe.requires.len(), 5);
        assert_eq!(recipe.conditional.len(), 3);
    }

    #[test]
    fn test_init_flat_with_folder() {
        let tmp = TempDir::new().unwrap();
        let opts = InitOptions {
            flat: true,
            generators_folder: Some("deps".to_string()),
            name: Some("textures".to_string()),
            ..options(tmp.path())
        };

        let path = init_recipe(&opts).unwrap();
        let recipe = Recipe::from_path(&path).unwrap();
        assert_eq!(recipe.name.as_deref(), Some("textures"));
        assert_eq!(recipe.requires.len(), 6);
        assert_eq!(
            recipe.layout,
            rigging_pkg::Layout::GeneratorsFolder("deps".to_string())
        );
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(RECIPE_FILE), "requires = []\n").unwrap();

        assert!(init_recipe(&options(tmp.path())).is_err());

        let forced = InitOptions {
            force: true,
            ..options(tmp.path())
        };
        assert!(init_recipe(&forced).is_ok());
    }

    #[test]
    fn test_infer_recipe_name() {
        assert_eq!(
            infer_recipe_name(Path::new("/tmp/lighting")),
            Some("lighting".to_string())
        );
    }
}
