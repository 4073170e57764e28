//! Dependency manifest resolution.
//!
//! Resolution is a pure function of the base requirements, the conditional
//! rules, and the platform context:
//! - the base list is taken as-is, in order
//! - each rule whose predicate holds appends its requirement, in rule order
//! - a rule that names a package already present is a conflict, handled
//!   according to the [`ConflictPolicy`]

use crate::condition::{ConditionalRule, Predicate};
use crate::layout::Layout;
use crate::manifest::Manifest;
use crate::options::BuildOptions;
use crate::platform::{ContextError, PlatformContext};
use crate::requirement::Requirement;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, trace};

/// Generators used when a recipe does not name any.
pub const DEFAULT_GENERATORS: &[&str] = &["CMakeToolchain", "CMakeDeps", "VirtualRunEnv"];

/// Errors that can occur during resolution.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The same package would appear twice in the manifest.
    #[error("duplicate requirement for package '{package}'")]
    DuplicateRequirement { package: String },

    /// A setting needed for resolution is missing.
    #[error("invalid platform context: {0}")]
    InvalidContext(#[from] ContextError),

    /// A global option targets no declared package.
    #[error("option '{key}' does not match any declared package")]
    UnknownOption { key: String },
}

/// What to do when a conditional rule names a package already present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Fail with [`ResolveError::DuplicateRequirement`].
    #[default]
    Error,

    /// Replace the earlier entry in place; the last matching rule wins.
    Override,
}

/// Immutable settings for a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveConfig {
    options: BuildOptions,
    conflict_policy: ConflictPolicy,
    layout: Layout,
    generators: Vec<String>,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            options: BuildOptions::default(),
            conflict_policy: ConflictPolicy::default(),
            layout: Layout::default(),
            generators: DEFAULT_GENERATORS.iter().map(|g| (*g).to_string()).collect(),
        }
    }
}

impl ResolveConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the global build options.
    #[must_use]
    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the conflict policy.
    #[must_use]
    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    /// Set the output layout.
    #[must_use]
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Set the generators.
    #[must_use]
    pub fn with_generators<I, S>(mut self, generators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.generators = generators.into_iter().map(Into::into).collect();
        self
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn conflict_policy(&self) -> ConflictPolicy {
        self.conflict_policy
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn generators(&self) -> &[String] {
        &self.generators
    }
}

/// Resolve a manifest for `ctx`.
///
/// # Errors
///
/// Returns an error if:
/// - the context has no operating system
/// - the base list names a package twice
/// - a matching rule names a package already present under [`ConflictPolicy::Error`]
/// - a global option matches no package in the base list or any rule
pub fn resolve<P: Predicate>(
    base: &[Requirement],
    rules: &[ConditionalRule<P>],
    ctx: &PlatformContext,
    config: &ResolveConfig,
) -> Result<Manifest, ResolveError> {
    ctx.validate()?;
    check_unique(base)?;
    check_options(&config.options, base, rules)?;

    let mut requirements = base.to_vec();

    for rule in rules {
        let req = &rule.requirement;
        if !rule.applies(ctx) {
            trace!(package = %req.name, "conditional rule skipped");
            continue;
        }

        match requirements.iter().position(|r| r.name == req.name) {
            None => {
                debug!(package = %req.name, version = %req.version, "conditional rule applied");
                requirements.push(req.clone());
            }
            Some(index) => match config.conflict_policy {
                ConflictPolicy::Error => {
                    return Err(ResolveError::DuplicateRequirement {
                        package: req.name.clone(),
                    });
                }
                ConflictPolicy::Override => {
                    debug!(
                        package = %req.name,
                        from = %requirements[index].version,
                        to = %req.version,
                        "conditional rule overrides requirement"
                    );
                    requirements[index] = req.clone();
                }
            },
        }
    }

    let generators_folder = config.layout.generators_folder(ctx);

    debug!(
        context = %ctx,
        packages = requirements.len(),
        "manifest resolved"
    );

    Ok(Manifest::new(
        ctx.clone(),
        requirements,
        config.options.clone(),
        config.generators.clone(),
        generators_folder,
    ))
}

fn check_unique(base: &[Requirement]) -> Result<(), ResolveError> {
    let mut seen = HashSet::new();
    for req in base {
        if !seen.insert(req.name.as_str()) {
            return Err(ResolveError::DuplicateRequirement {
                package: req.name.clone(),
            });
        }
    }
    Ok(())
}

fn check_options<P>(
    options: &BuildOptions,
    base: &[Requirement],
    rules: &[ConditionalRule<P>],
) -> Result<(), ResolveError> {
    let declared = base.iter().chain(rules.iter().map(|r| &r.requirement));
    match options.unmatched_keys(declared).first() {
        Some(key) => Err(ResolveError::UnknownOption {
            key: key.to_string(),
        }),
        None => Ok(()),
    }
}

/// Reusable resolver bound to one configuration.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    config: ResolveConfig,
}

impl Resolver {
    /// Create a resolver with the given configuration.
    pub fn new(config: ResolveConfig) -> Self {
        Self { config }
    }

    /// The resolver's configuration.
    pub fn config(&self) -> &ResolveConfig {
        &self.config
    }

    /// Resolve a manifest for `ctx`. See [`resolve`].
    pub fn resolve<P: Predicate>(
        &self,
        base: &[Requirement],
        rules: &[ConditionalRule<P>],
        ctx: &PlatformContext,
    ) -> Result<Manifest, ResolveError> {
        resolve(base, rules, ctx, &self.config)
    }
}
