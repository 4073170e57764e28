//! Predicates over a [`PlatformContext`] and the rules they guard.
//!
//! In a recipe a condition is a table of settings:
//!
//! ```toml
//! [[conditional]]
//! when = { os = "Windows" }
//! requires = ["glfw/3.4"]
//!
//! [[conditional]]
//! when = { os = ["Linux", "FreeBSD"], not = { compiler = "clang" } }
//! requires = ["libunwind/1.8.1"]
//! ```

use crate::platform::{canonical_os, PlatformContext, Setting};
use crate::requirement::Requirement;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A pure test over a platform context.
pub trait Predicate {
    /// Whether the predicate holds for `ctx`.
    fn matches(&self, ctx: &PlatformContext) -> bool;
}

impl<F> Predicate for F
where
    F: Fn(&PlatformContext) -> bool,
{
    fn matches(&self, ctx: &PlatformContext) -> bool {
        self(ctx)
    }
}

/// Accepted values for one setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Matcher {
    One(String),
    AnyOf(Vec<String>),
}

impl Matcher {
    fn values(&self) -> &[String] {
        match self {
            Self::One(v) => std::slice::from_ref(v),
            Self::AnyOf(vs) => vs,
        }
    }

    fn accepts(&self, setting: Setting, actual: &str) -> bool {
        self.values().iter().any(|expected| {
            if setting == Setting::Os {
                canonical_os(expected) == actual
            } else {
                expected == actual
            }
        })
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One(v) => write!(f, "{v}"),
            Self::AnyOf(vs) => write!(f, "[{}]", vs.join(", ")),
        }
    }
}

/// Declarative condition: every present setting must match.
///
/// A setting the context leaves unset never matches. The empty condition
/// always holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Condition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<Matcher>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compiler: Option<Matcher>,

    #[serde(
        default,
        alias = "build-type",
        skip_serializing_if = "Option::is_none"
    )]
    pub build_type: Option<Matcher>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<Matcher>,

    /// Nested condition that must NOT hold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<Condition>>,
}

impl Condition {
    /// The condition that always holds.
    pub fn always() -> Self {
        Self::default()
    }

    /// Holds when the operating system equals `os`.
    pub fn os(os: impl Into<String>) -> Self {
        Self::always().and(Setting::Os, Matcher::One(os.into()))
    }

    /// Holds when the operating system is one of `oses`.
    pub fn os_any<I, S>(oses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = oses.into_iter().map(Into::into).collect();
        Self::always().and(Setting::Os, Matcher::AnyOf(values))
    }

    /// Additionally require `setting` to match.
    #[must_use]
    pub fn and(mut self, setting: Setting, matcher: Matcher) -> Self {
        *self.slot_mut(setting) = Some(matcher);
        self
    }

    /// Additionally require `other` to not hold.
    #[must_use]
    pub fn unless(mut self, other: Condition) -> Self {
        self.not = Some(Box::new(other));
        self
    }

    /// Whether this condition has no constraints.
    pub fn is_always(&self) -> bool {
        Setting::ALL.iter().all(|s| self.slot(*s).is_none()) && self.not.is_none()
    }

    fn slot(&self, setting: Setting) -> Option<&Matcher> {
        match setting {
            Setting::Os => self.os.as_ref(),
            Setting::Compiler => self.compiler.as_ref(),
            Setting::BuildType => self.build_type.as_ref(),
            Setting::Arch => self.arch.as_ref(),
        }
    }

    fn slot_mut(&mut self, setting: Setting) -> &mut Option<Matcher> {
        match setting {
            Setting::Os => &mut self.os,
            Setting::Compiler => &mut self.compiler,
            Setting::BuildType => &mut self.build_type,
            Setting::Arch => &mut self.arch,
        }
    }
}

impl Predicate for Condition {
    fn matches(&self, ctx: &PlatformContext) -> bool {
        let settings_hold = Setting::ALL.iter().all(|setting| match self.slot(*setting) {
            None => true,
            Some(matcher) => ctx
                .get(*setting)
                .is_some_and(|actual| matcher.accepts(*setting, actual)),
        });

        settings_hold && !self.not.as_ref().is_some_and(|inner| inner.matches(ctx))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_always() {
            return write!(f, "always");
        }

        let mut parts: Vec<String> = Setting::ALL
            .iter()
            .filter_map(|s| self.slot(*s).map(|m| format!("{s}={m}")))
            .collect();
        if let Some(inner) = &self.not {
            parts.push(format!("not ({inner})"));
        }
        write!(f, "{}", parts.join(" and "))
    }
}

/// A requirement that applies only when its predicate holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalRule<P = Condition> {
    pub predicate: P,
    pub requirement: Requirement,
}

impl<P: Predicate> ConditionalRule<P> {
    pub fn new(predicate: P, requirement: Requirement) -> Self {
        Self {
            predicate,
            requirement,
        }
    }

    /// Whether the rule applies to `ctx`.
    pub fn applies(&self, ctx: &PlatformContext) -> bool {
        self.predicate.matches(ctx)
    }
}
