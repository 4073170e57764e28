//! The resolved manifest handed to the external build-file generator.

use crate::options::{BuildOptions, OptionValue};
use crate::platform::PlatformContext;
use crate::requirement::Requirement;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Ordered, duplicate-free requirements plus global options for one context.
///
/// A manifest is produced by resolution and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    generators_folder: String,
    generators: Vec<String>,
    context: PlatformContext,
    options: BuildOptions,
    requirements: Vec<Requirement>,
}

impl Manifest {
    pub(crate) fn new(
        context: PlatformContext,
        requirements: Vec<Requirement>,
        options: BuildOptions,
        generators: Vec<String>,
        generators_folder: String,
    ) -> Self {
        Self {
            generators_folder,
            generators,
            context,
            options,
            requirements,
        }
    }

    /// Returns the number of requirements.
    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    /// Returns true if there are no requirements.
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// The requirements in resolution order.
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Iterate over the requirements in resolution order.
    pub fn iter(&self) -> std::slice::Iter<'_, Requirement> {
        self.requirements.iter()
    }

    /// Package names in resolution order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.requirements.iter().map(|r| r.name.as_str())
    }

    /// Get a requirement by package name.
    pub fn get(&self, name: &str) -> Option<&Requirement> {
        self.requirements.iter().find(|r| r.name == name)
    }

    /// Whether a package is part of the manifest.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// The global options.
    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Effective options of one package: its defaults plus matching globals.
    pub fn effective_options(&self, name: &str) -> Option<BTreeMap<String, OptionValue>> {
        self.get(name).map(|req| self.options.for_requirement(req))
    }

    /// Generators the external tool should run.
    pub fn generators(&self) -> &[String] {
        &self.generators
    }

    /// Folder the generators write into.
    pub fn generators_folder(&self) -> &str {
        &self.generators_folder
    }

    /// The context this manifest was resolved for.
    pub fn context(&self) -> &PlatformContext {
        &self.context
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a Requirement;
    type IntoIter = std::slice::Iter<'a, Requirement>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Resolved for {}", self.context)?;
        writeln!(f, "Requirements ({}):", self.requirements.len())?;
        for req in &self.requirements {
            writeln!(f, "  {req}")?;
        }
        if !self.options.is_empty() {
            writeln!(f, "Options:")?;
            for (key, value) in self.options.iter() {
                writeln!(f, "  {key} = {value}")?;
            }
        }
        if !self.generators.is_empty() {
            writeln!(f, "Generators: {}", self.generators.join(", "))?;
        }
        write!(f, "Generators folder: {}", self.generators_folder)
    }
}
