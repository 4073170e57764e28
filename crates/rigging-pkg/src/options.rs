//! Build options: per-package defaults and global `pattern:option` overrides.
//!
//! Global options are keyed by a package pattern and an option name:
//!
//! ```toml
//! [options]
//! "spdlog/*:use_std_fmt" = true
//! "assimp:shared" = false
//! ```
//!
//! A pattern containing `/` is matched against the full `name/version`
//! reference, otherwise against the package name alone.

use crate::requirement::Requirement;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when parsing build options.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionError {
    #[error("invalid option key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("option '{key}' expects a {expected} value, got '{value}'")]
    InvalidValue {
        key: String,
        expected: &'static str,
        value: String,
    },
}

/// Value of a build option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl OptionValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Str(_) => "string",
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// Options whose value type is fixed regardless of the package declaring them.
const BOOLEAN_OPTIONS: &[&str] = &["use_std_fmt", "shared", "fPIC", "header_only"];

/// A global option key: `<package-pattern>:<option>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OptionKey {
    pattern: String,
    option: String,
    matcher: glob::Pattern,
}

impl OptionKey {
    /// Parse a key such as `spdlog/*:use_std_fmt`.
    pub fn parse(key: &str) -> Result<Self, OptionError> {
        let invalid = |reason: &str| OptionError::InvalidKey {
            key: key.to_string(),
            reason: reason.to_string(),
        };

        let (pattern, option) = key
            .rsplit_once(':')
            .ok_or_else(|| invalid("expected '<package-pattern>:<option>'"))?;

        if pattern.is_empty() {
            return Err(invalid("package pattern cannot be empty"));
        }
        if option.is_empty() {
            return Err(invalid("option name cannot be empty"));
        }
        if !option
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(invalid(
                "option name can only contain letters, numbers, '_' and '-'",
            ));
        }

        let matcher = glob::Pattern::new(pattern).map_err(|e| invalid(&e.to_string()))?;

        Ok(Self {
            pattern: pattern.to_string(),
            option: option.to_string(),
            matcher,
        })
    }

    /// The package pattern part of the key.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The option name part of the key.
    pub fn option(&self) -> &str {
        &self.option
    }

    /// Whether this key applies to the given requirement.
    pub fn matches(&self, requirement: &Requirement) -> bool {
        if self.pattern.contains('/') {
            self.matcher.matches(&requirement.reference())
        } else {
            self.matcher.matches(&requirement.name)
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.pattern, self.option)
    }
}

impl FromStr for OptionKey {
    type Err = OptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Global build options applied across the resolved requirements.
///
/// Immutable once built; construct with [`BuildOptions::builder`] or parse
/// from a recipe's `[options]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, OptionValue>",
    into = "BTreeMap<String, OptionValue>"
)]
pub struct BuildOptions {
    entries: BTreeMap<OptionKey, OptionValue>,
}

impl BuildOptions {
    /// An empty option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start building an option set.
    pub fn builder() -> BuildOptionsBuilder {
        BuildOptionsBuilder::default()
    }

    /// Returns true if no options are set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of option entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Look up a value by its textual key.
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries
            .iter()
            .find(|(k, _)| k.to_string() == key)
            .map(|(_, v)| v)
    }

    /// Iterate over all entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&OptionKey, &OptionValue)> {
        self.entries.iter()
    }

    /// Effective options for one package.
    ///
    /// Starts from the requirement's own defaults and applies every global
    /// option whose pattern matches it, in key order.
    pub fn for_requirement(&self, requirement: &Requirement) -> BTreeMap<String, OptionValue> {
        let mut effective = requirement.options.clone();
        for (key, value) in &self.entries {
            if key.matches(requirement) {
                effective.insert(key.option().to_string(), value.clone());
            }
        }
        effective
    }

    /// Keys that match none of the given requirements.
    pub fn unmatched_keys<'a, I>(&self, requirements: I) -> Vec<&OptionKey>
    where
        I: IntoIterator<Item = &'a Requirement>,
        I::IntoIter: Clone,
    {
        let requirements = requirements.into_iter();
        self.entries
            .keys()
            .filter(|key| !requirements.clone().any(|req| key.matches(req)))
            .collect()
    }
}

impl TryFrom<BTreeMap<String, OptionValue>> for BuildOptions {
    type Error = OptionError;

    fn try_from(raw: BTreeMap<String, OptionValue>) -> Result<Self, Self::Error> {
        let mut builder = Self::builder();
        for (key, value) in raw {
            builder = builder.set(&key, value)?;
        }
        Ok(builder.build())
    }
}

impl From<BuildOptions> for BTreeMap<String, OptionValue> {
    fn from(options: BuildOptions) -> Self {
        options
            .entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }
}

/// Builder for [`BuildOptions`].
#[derive(Debug, Default)]
pub struct BuildOptionsBuilder {
    entries: BTreeMap<OptionKey, OptionValue>,
}

impl BuildOptionsBuilder {
    /// Set an option, validating the key and well-known value types.
    pub fn set(mut self, key: &str, value: impl Into<OptionValue>) -> Result<Self, OptionError> {
        let key = OptionKey::parse(key)?;
        let value = value.into();

        if BOOLEAN_OPTIONS.contains(&key.option()) && !matches!(value, OptionValue::Bool(_)) {
            return Err(OptionError::InvalidValue {
                key: key.to_string(),
                expected: OptionValue::Bool(false).kind(),
                value: format!("{value} ({})", value.kind()),
            });
        }

        self.entries.insert(key, value);
        Ok(self)
    }

    /// Finish building.
    pub fn build(self) -> BuildOptions {
        BuildOptions {
            entries: self.entries,
        }
    }
}
