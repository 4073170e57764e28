//! Recipe (`rigging.toml`) parsing and validation.
//!
//! A recipe declares a base requirement list, global options, and groups of
//! requirements that only apply on some platforms:
//!
//! ```toml
//! requires = ["glm/1.0.1", "spdlog/1.17.0"]
//!
//! [recipe]
//! generators = ["CMakeToolchain", "CMakeDeps"]
//! layout = "cmake"
//!
//! [options]
//! "spdlog/*:use_std_fmt" = true
//!
//! [[conditional]]
//! when = { os = "Windows" }
//! requires = ["glfw/3.4"]
//! ```

use crate::condition::{Condition, ConditionalRule};
use crate::layout::Layout;
use crate::manifest::Manifest;
use crate::options::{BuildOptions, OptionError};
use crate::platform::PlatformContext;
use crate::requirement::{Requirement, RequirementError, RequirementSpec};
use crate::resolve::{resolve, ConflictPolicy, ResolveConfig, ResolveError, DEFAULT_GENERATORS};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// The recipe filename.
pub const RECIPE_FILE: &str = "rigging.toml";

/// Errors that can occur when working with recipes.
#[derive(Error, Debug)]
pub enum RecipeError {
    #[error("failed to read recipe file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse recipe: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize recipe: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Requirement(#[from] RequirementError),

    #[error(transparent)]
    Option(#[from] OptionError),

    #[error("package '{0}' is listed more than once in `requires`")]
    DuplicateRequirement(String),
}

/// On-disk shape of a recipe.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecipeFile {
    #[serde(default)]
    requires: Vec<RequirementSpec>,

    #[serde(default)]
    recipe: RecipeSection,

    #[serde(default, skip_serializing_if = "BuildOptions::is_empty")]
    options: BuildOptions,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    conditional: Vec<ConditionalGroup>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct RecipeSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,

    #[serde(default = "default_generators")]
    generators: Vec<String>,

    #[serde(default)]
    conflict_policy: ConflictPolicy,

    #[serde(default)]
    layout: Layout,
}

impl Default for RecipeSection {
    fn default() -> Self {
        Self {
            name: None,
            generators: default_generators(),
            conflict_policy: ConflictPolicy::default(),
            layout: Layout::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConditionalGroup {
    requires: Vec<RequirementSpec>,
    #[serde(default)]
    when: Condition,
}

fn default_generators() -> Vec<String> {
    DEFAULT_GENERATORS.iter().map(|g| (*g).to_string()).collect()
}

/// A parsed recipe: everything needed to resolve a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    /// Optional recipe name.
    pub name: Option<String>,

    /// Generators for the external build-file tool.
    pub generators: Vec<String>,

    /// Output layout.
    pub layout: Layout,

    /// How conflicting conditional requirements are handled.
    pub conflict_policy: ConflictPolicy,

    /// Global build options.
    pub options: BuildOptions,

    /// Unconditional requirements, in declaration order.
    pub requires: Vec<Requirement>,

    /// Conditional requirements, flattened in declaration order.
    pub conditional: Vec<ConditionalRule>,
}

impl Default for Recipe {
    fn default() -> Self {
        Self {
            name: None,
            generators: default_generators(),
            layout: Layout::default(),
            conflict_policy: ConflictPolicy::default(),
            options: BuildOptions::default(),
            requires: Vec::new(),
            conditional: Vec::new(),
        }
    }
}

impl Recipe {
    /// Load a recipe from a file path.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RecipeError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a recipe from a TOML string.
    pub fn parse(content: &str) -> Result<Self, RecipeError> {
        let file: RecipeFile = toml::from_str(content)?;

        let requires = file
            .requires
            .into_iter()
            .map(Requirement::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let mut conditional = Vec::new();
        for group in file.conditional {
            for spec in group.requires {
                conditional.push(ConditionalRule::new(
                    group.when.clone(),
                    Requirement::try_from(spec)?,
                ));
            }
        }

        let recipe = Self {
            name: file.recipe.name,
            generators: file.recipe.generators,
            layout: file.recipe.layout,
            conflict_policy: file.recipe.conflict_policy,
            options: file.options,
            requires,
            conditional,
        };
        recipe.validate()?;
        Ok(recipe)
    }

    fn validate(&self) -> Result<(), RecipeError> {
        let mut seen = HashSet::new();
        for req in &self.requires {
            if !seen.insert(req.name.as_str()) {
                return Err(RecipeError::DuplicateRequirement(req.name.clone()));
            }
        }
        Ok(())
    }

    /// Serialize the recipe to a TOML string.
    ///
    /// Consecutive rules with the same condition are written as one group.
    pub fn to_toml_string(&self) -> Result<String, RecipeError> {
        let mut groups: Vec<ConditionalGroup> = Vec::new();
        for rule in &self.conditional {
            let spec = RequirementSpec::from(&rule.requirement);
            match groups.last_mut() {
                Some(group) if group.when == rule.predicate => group.requires.push(spec),
                _ => groups.push(ConditionalGroup {
                    requires: vec![spec],
                    when: rule.predicate.clone(),
                }),
            }
        }

        let file = RecipeFile {
            requires: self.requires.iter().map(RequirementSpec::from).collect(),
            recipe: RecipeSection {
                name: self.name.clone(),
                generators: self.generators.clone(),
                conflict_policy: self.conflict_policy,
                layout: self.layout.clone(),
            },
            options: self.options.clone(),
            conditional: groups,
        };
        Ok(toml::to_string_pretty(&file)?)
    }

    /// The resolution settings this recipe declares.
    pub fn config(&self) -> ResolveConfig {
        ResolveConfig::new()
            .with_options(self.options.clone())
            .with_conflict_policy(self.conflict_policy)
            .with_layout(self.layout.clone())
            .with_generators(self.generators.iter().cloned())
    }

    /// Resolve this recipe for `ctx`.
    pub fn resolve(&self, ctx: &PlatformContext) -> Result<Manifest, ResolveError> {
        resolve(&self.requires, &self.conditional, ctx, &self.config())
    }

    /// Every package the recipe can bring in, on any platform.
    pub fn declared(&self) -> impl Iterator<Item = &Requirement> {
        self.requires
            .iter()
            .chain(self.conditional.iter().map(|rule| &rule.requirement))
    }

    /// Starter recipe for a graphics project: shared libraries everywhere,
    /// window/loader/model libraries only on Windows where no system
    /// packages are available.
    pub fn starter() -> Result<Self, RecipeError> {
        let windows = Condition::os("Windows");
        let options = BuildOptions::builder()
            .set("spdlog/*:use_std_fmt", true)?
            .build();

        Ok(Self {
            requires: requirements(&[
                ("glbinding", "3.5.0"),
                ("glm", "1.0.1"),
                ("imgui", "1.92.2b-docking"),
                ("stb", "cci.20240531"),
                ("spdlog", "1.17.0"),
            ]),
            conditional: requirements(&[
                ("glfw", "3.4"),
                ("khrplatform", "cci.20200529"),
                ("assimp", "6.0.2"),
            ])
            .into_iter()
            .map(|req| ConditionalRule::new(windows.clone(), req))
            .collect(),
            options,
            ..Self::default()
        })
    }

    /// Starter recipe with a flat, unconditional list and a fixed
    /// generators folder.
    pub fn starter_flat(generators_folder: impl Into<String>) -> Self {
        Self {
            requires: requirements(&[
                ("glfw", "3.3.8"),
                ("glbinding", "3.3.0"),
                ("stb", "cci.20230920"),
                ("glm", "0.9.9.8"),
                ("imgui", "1.90"),
                ("assimp", "5.3.1"),
            ]),
            layout: Layout::GeneratorsFolder(generators_folder.into()),
            ..Self::default()
        }
    }
}

fn requirements(pairs: &[(&str, &str)]) -> Vec<Requirement> {
    pairs
        .iter()
        .map(|(name, version)| Requirement::new(*name, *version))
        .collect()
}
