//! Platform-aware dependency recipe resolution.
//!
//! This crate provides:
//! - Parsing and validation of `rigging.toml` recipes
//! - Package requirements with per-package default options
//! - Global `pattern:option` build options
//! - Platform contexts loaded from profiles or detected from the host
//! - Declarative per-platform conditional requirements
//! - Resolution into an ordered, duplicate-free manifest

mod condition;
mod layout;
mod manifest;
mod options;
mod platform;
mod recipe;
mod requirement;
mod resolve;

pub use condition::{Condition, ConditionalRule, Matcher, Predicate};
pub use layout::Layout;
pub use manifest::Manifest;
pub use options::{BuildOptions, BuildOptionsBuilder, OptionError, OptionKey, OptionValue};
pub use platform::{canonical_os, ContextError, PlatformContext, Setting};
pub use recipe::{Recipe, RecipeError, RECIPE_FILE};
pub use requirement::{Requirement, RequirementError, RequirementSpec};
pub use resolve::{
    resolve, ConflictPolicy, ResolveConfig, ResolveError, Resolver, DEFAULT_GENERATORS,
};
