//! Output layout for the external build-file generators.

use crate::platform::{PlatformContext, Setting};
use serde::{Deserialize, Serialize};

/// Compilers whose CMake generators are multi-config by default.
const MULTI_CONFIG_COMPILERS: &[&str] = &["msvc", "Visual Studio"];

/// Where generated build files go.
///
/// Written in a recipe as `layout = "cmake"` or
/// `layout = { generators-folder = "conan" }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    /// Conventional CMake tree: `build/<build_type>/generators`, or
    /// `build/generators` for multi-config toolchains and contexts
    /// without a build type.
    #[default]
    Cmake,

    /// Fixed folder, passed through unchanged.
    GeneratorsFolder(String),
}

impl Layout {
    /// The generators folder for `ctx`.
    ///
    /// Never fails: an unset build type falls back to `build/generators`.
    pub fn generators_folder(&self, ctx: &PlatformContext) -> String {
        match self {
            Self::GeneratorsFolder(folder) => folder.clone(),
            Self::Cmake => {
                let multi_config = ctx
                    .get(Setting::Compiler)
                    .is_some_and(|c| MULTI_CONFIG_COMPILERS.contains(&c));
                match ctx.get(Setting::BuildType) {
                    Some(build_type) if !multi_config => format!("build/{build_type}/generators"),
                    _ => "build/generators".to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_passes_through() {
        let layout = Layout::GeneratorsFolder("conan".to_string());
        let folder = layout.generators_folder(&PlatformContext::new());
        assert_eq!(folder, "conan");
    }

    #[test]
    fn test_cmake_single_config_uses_build_type() {
        let ctx = PlatformContext::new()
            .with_os("Linux")
            .with_compiler("gcc")
            .with_build_type("Debug");
        assert_eq!(
            Layout::Cmake.generators_folder(&ctx),
            "build/Debug/generators"
        );
    }

    #[test]
    fn test_cmake_multi_config_ignores_build_type() {
        let ctx = PlatformContext::new().with_os("Windows").with_compiler("msvc");
        assert_eq!(
            Layout::Cmake.generators_folder(&ctx),
            "build/generators"
        );
    }

    #[test]
    fn test_cmake_without_build_type_falls_back() {
        let ctx = PlatformContext::new().with_os("Linux");
        assert_eq!(Layout::Cmake.generators_folder(&ctx), "build/generators");

        let ctx = ctx.with_compiler("gcc");
        assert_eq!(Layout::Cmake.generators_folder(&ctx), "build/generators");
    }

    #[test]
    fn test_deserialize_both_forms() {
        #[derive(Deserialize)]
        struct Wrapper {
            layout: Layout,
        }

        let cmake: Wrapper = toml::from_str("layout = \"cmake\"").unwrap();
        assert_eq!(cmake.layout, Layout::Cmake);

        let fixed: Wrapper = toml::from_str("layout = { generators-folder = \"conan\" }").unwrap();
        assert_eq!(fixed.layout, Layout::GeneratorsFolder("conan".to_string()));
    }
}
