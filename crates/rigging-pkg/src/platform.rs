//! Target platform description used to evaluate conditional requirements.
//!
//! Profiles are TOML files with a `[settings]` table:
//!
//! ```toml
//! [settings]
//! os = "Windows"
//! compiler = "msvc"
//! build_type = "Release"
//! arch = "x86_64"
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur when building or loading a platform context.
#[derive(Error, Debug)]
pub enum ContextError {
    #[error("platform context is missing required setting '{0}'")]
    Missing(Setting),

    #[error("failed to read profile: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse profile: {0}")]
    Parse(#[from] toml::de::Error),
}

/// One of the settings a conditional rule can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Setting {
    Os,
    Compiler,
    BuildType,
    Arch,
}

impl Setting {
    /// All settings, in declaration order.
    pub const ALL: [Setting; 4] = [Self::Os, Self::Compiler, Self::BuildType, Self::Arch];

    /// Returns the setting name as written in profiles.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Os => "os",
            Self::Compiler => "compiler",
            Self::BuildType => "build_type",
            Self::Arch => "arch",
        }
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The environment facts conditional rules may branch on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformContext {
    /// Operating system identifier (required for resolution).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,

    /// Compiler identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compiler: Option<String>,

    /// Build type (`Debug`, `Release`, ...).
    #[serde(
        default,
        alias = "build-type",
        skip_serializing_if = "Option::is_none"
    )]
    pub build_type: Option<String>,

    /// Target architecture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Profile {
    #[serde(default)]
    settings: PlatformContext,
}

impl PlatformContext {
    /// An empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the operating system. Known names are canonicalised.
    #[must_use]
    pub fn with_os(mut self, os: impl AsRef<str>) -> Self {
        self.os = Some(canonical_os(os.as_ref()));
        self
    }

    /// Set the compiler.
    #[must_use]
    pub fn with_compiler(mut self, compiler: impl Into<String>) -> Self {
        self.compiler = Some(compiler.into());
        self
    }

    /// Set the build type.
    #[must_use]
    pub fn with_build_type(mut self, build_type: impl Into<String>) -> Self {
        self.build_type = Some(build_type.into());
        self
    }

    /// Set the architecture.
    #[must_use]
    pub fn with_arch(mut self, arch: impl Into<String>) -> Self {
        self.arch = Some(arch.into());
        self
    }

    /// Describe the host machine.
    ///
    /// The compiler cannot be detected and is left unset.
    pub fn detect() -> Self {
        let arch = match std::env::consts::ARCH {
            "aarch64" => "armv8",
            other => other,
        };

        Self::new()
            .with_os(std::env::consts::OS)
            .with_arch(arch)
            .with_build_type("Release")
    }

    /// Load a context from a profile file.
    pub fn from_profile(path: impl AsRef<Path>) -> Result<Self, ContextError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_profile(&content)
    }

    /// Parse a context from profile text.
    pub fn parse_profile(content: &str) -> Result<Self, ContextError> {
        let profile: Profile = toml::from_str(content)?;
        let mut context = profile.settings;
        context.os = context.os.as_deref().map(canonical_os);
        Ok(context)
    }

    /// Fill unset settings from `other`.
    #[must_use]
    pub fn or(self, other: &PlatformContext) -> Self {
        Self {
            os: self.os.or_else(|| other.os.clone()),
            compiler: self.compiler.or_else(|| other.compiler.clone()),
            build_type: self.build_type.or_else(|| other.build_type.clone()),
            arch: self.arch.or_else(|| other.arch.clone()),
        }
    }

    /// Get a setting's value, if set.
    pub fn get(&self, setting: Setting) -> Option<&str> {
        let value = match setting {
            Setting::Os => &self.os,
            Setting::Compiler => &self.compiler,
            Setting::BuildType => &self.build_type,
            Setting::Arch => &self.arch,
        };
        value.as_deref()
    }

    /// Get a setting that must be present and non-blank.
    pub fn require(&self, setting: Setting) -> Result<&str, ContextError> {
        self.get(setting)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ContextError::Missing(setting))
    }

    /// Check that the settings needed for resolution are present.
    pub fn validate(&self) -> Result<(), ContextError> {
        self.require(Setting::Os).map(|_| ())
    }
}

impl fmt::Display for PlatformContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = Setting::ALL
            .iter()
            .filter_map(|s| self.get(*s).map(|v| format!("{s}={v}")))
            .collect();
        if parts.is_empty() {
            write!(f, "(empty)")
        } else {
            write!(f, "{}", parts.join(" "))
        }
    }
}

/// Canonical spelling of an operating system name.
///
/// Unknown names are returned unchanged.
pub fn canonical_os(os: &str) -> String {
    let trimmed = os.trim();
    let canonical = match trimmed.to_ascii_lowercase().as_str() {
        "windows" | "win32" => "Windows",
        "linux" => "Linux",
        "macos" | "darwin" | "osx" => "Macos",
        "freebsd" => "FreeBSD",
        "android" => "Android",
        "ios" => "iOS",
        _ => return trimmed.to_string(),
    };
    canonical.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_canonicalises_os() {
        let ctx = PlatformContext::new().with_os("windows");
        assert_eq!(ctx.os.as_deref(), Some("Windows"));

        let ctx = PlatformContext::new().with_os("darwin");
        assert_eq!(ctx.os.as_deref(), Some("Macos"));

        let ctx = PlatformContext::new().with_os("Haiku");
        assert_eq!(ctx.os.as_deref(), Some("Haiku"));
    }

    #[test]
    fn test_validate_requires_os() {
        let err = PlatformContext::new().with_arch("x86_64").validate().unwrap_err();
        assert!(matches!(err, ContextError::Missing(Setting::Os)));

        let blank = PlatformContext {
            os: Some("  ".to_string()),
            ..PlatformContext::default()
        };
        assert!(blank.validate().is_err());

        assert!(PlatformContext::new().with_os("Linux").validate().is_ok());
    }

    #[test]
    fn test_parse_profile_settings() {
        let ctx = PlatformContext::parse_profile(
            r#"
[settings]
os = "windows"
compiler = "msvc"
build-type = "Debug"
arch = "x86_64"
"#,
        )
        .unwrap();

        assert_eq!(ctx.get(Setting::Os), Some("Windows"));
        assert_eq!(ctx.get(Setting::Compiler), Some("msvc"));
        assert_eq!(ctx.get(Setting::BuildType), Some("Debug"));
        assert_eq!(ctx.get(Setting::Arch), Some("x86_64"));
    }

    #[test]
    fn test_parse_profile_without_settings_is_empty() {
        let ctx = PlatformContext::parse_profile("").unwrap();
        assert_eq!(ctx, PlatformContext::default());
    }

    #[test]
    fn test_load_profile_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("linux.toml");
        std::fs::write(&path, "[settings]\nos = \"Linux\"\nbuild_type = \"Release\"\n").unwrap();

        let ctx = PlatformContext::from_profile(&path).unwrap();
        assert_eq!(ctx.os.as_deref(), Some("Linux"));
        assert_eq!(ctx.build_type.as_deref(), Some("Release"));
    }

    #[test]
    fn test_or_fills_only_unset_fields() {
        let profile = PlatformContext::new().with_os("Linux").with_arch("armv8");
        let ctx = PlatformContext::new().with_os("Windows").or(&profile);
        assert_eq!(ctx.os.as_deref(), Some("Windows"));
        assert_eq!(ctx.arch.as_deref(), Some("armv8"));
    }

    #[test]
    fn test_detect_sets_os_and_build_type() {
        let ctx = PlatformContext::detect();
        assert!(ctx.validate().is_ok());
        assert_eq!(ctx.build_type.as_deref(), Some("Release"));
        assert!(ctx.compiler.is_none());
    }

    #[test]
    fn test_display_lists_set_fields() {
        let ctx = PlatformContext::new().with_os("Linux").with_build_type("Debug");
        assert_eq!(ctx.to_string(), "os=Linux build_type=Debug");
        assert_eq!(PlatformContext::new().to_string(), "(empty)");
    }
}
