//! Package requirements (`name/version` references).

use crate::options::OptionValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when parsing a requirement.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequirementError {
    #[error("invalid package reference '{reference}': {reason}")]
    InvalidReference {
        reference: String,
        reason: &'static str,
    },
}

/// A single dependency: package name, version selector, and default options.
///
/// The version is an opaque selector. It is never interpreted here, so
/// references like `stb/cci.20240531` or `imgui/1.92.2b-docking` are kept
/// exactly as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// Package name.
    pub name: String,

    /// Version or version selector.
    pub version: String,

    /// Default build options for this package.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, OptionValue>,
}

impl Requirement {
    /// Create a requirement without options.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            options: BTreeMap::new(),
        }
    }

    /// Parse a `name/version` reference.
    pub fn parse(reference: &str) -> Result<Self, RequirementError> {
        let invalid = |reason| RequirementError::InvalidReference {
            reference: reference.to_string(),
            reason,
        };

        let (name, version) = reference
            .trim()
            .split_once('/')
            .ok_or_else(|| invalid("expected 'name/version'"))?;

        validate_name(name).map_err(invalid)?;

        if version.is_empty() {
            return Err(invalid("version cannot be empty"));
        }
        if version.contains(char::is_whitespace) || version.contains('/') {
            return Err(invalid("version cannot contain whitespace or '/'"));
        }

        Ok(Self::new(name, version))
    }

    /// Attach a default build option.
    #[must_use]
    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    /// The `name/version` reference for this requirement.
    pub fn reference(&self) -> String {
        format!("{}/{}", self.name, self.version)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

impl FromStr for Requirement {
    type Err = RequirementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("name cannot be empty");
    }

    if name.len() > 100 {
        return Err("name cannot exceed 100 characters");
    }

    if !name.chars().next().is_some_and(|c| c.is_ascii_alphanumeric()) {
        return Err("name must start with a letter or digit");
    }

    for c in name.chars() {
        if !c.is_ascii_alphanumeric() && !matches!(c, '_' | '-' | '.' | '+') {
            return Err("name can only contain letters, numbers, '_', '-', '.' and '+'");
        }
    }

    Ok(())
}

/// How a requirement is written in a recipe file.
///
/// Either a plain reference string or a table with per-package options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequirementSpec {
    /// `"glm/1.0.1"`.
    Reference(String),

    /// `{ ref = "spdlog/1.17.0", options = { shared = true } }`.
    Detailed {
        #[serde(rename = "ref")]
        reference: String,
        #[serde(default)]
        options: BTreeMap<String, OptionValue>,
    },
}

impl TryFrom<RequirementSpec> for Requirement {
    type Error = RequirementError;

    fn try_from(spec: RequirementSpec) -> Result<Self, Self::Error> {
        match spec {
            RequirementSpec::Reference(reference) => Self::parse(&reference),
            RequirementSpec::Detailed { reference, options } => {
                let mut requirement = Self::parse(&reference)?;
                requirement.options = options;
                Ok(requirement)
            }
        }
    }
}

impl From<&Requirement> for RequirementSpec {
    fn from(requirement: &Requirement) -> Self {
        if requirement.options.is_empty() {
            Self::Reference(requirement.reference())
        } else {
            Self::Detailed {
                reference: requirement.reference(),
                options: requirement.options.clone(),
            }
        }
    }
}
