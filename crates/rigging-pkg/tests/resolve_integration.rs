//! Integration tests for recipe resolution across platforms

use rigging_pkg::{
    resolve, Condition, ConditionalRule, ConflictPolicy, OptionValue, PlatformContext, Recipe,
    Requirement, ResolveConfig, ResolveError,
};

const BASE: [&str; 5] = ["glbinding", "glm", "imgui", "stb", "spdlog"];
const WINDOWS_ONLY: [&str; 3] = ["glfw", "khrplatform", "assimp"];

fn context(os: &str) -> PlatformContext {
    PlatformContext::new()
        .with_os(os)
        .with_compiler("gcc")
        .with_build_type("Release")
        .with_arch("x86_64")
}

fn os_only(os: &str) -> PlatformContext {
    PlatformContext::new().with_os(os)
}

#[test]
fn test_windows_adds_conditional_packages() {
    let recipe = Recipe::starter().unwrap();
    let manifest = recipe.resolve(&context("Windows")).unwrap();

    let expected: Vec<&str> = BASE.iter().chain(WINDOWS_ONLY.iter()).copied().collect();
    assert_eq!(manifest.names().collect::<Vec<_>>(), expected);
    assert_eq!(manifest.len(), 8);
}

#[test]
fn test_other_platforms_get_base_unchanged() {
    let recipe = Recipe::starter().unwrap();

    for os in ["Linux", "Macos", "FreeBSD", "Haiku"] {
        let manifest = recipe.resolve(&context(os)).unwrap();
        assert_eq!(manifest.requirements(), recipe.requires.as_slice(), "os = {os}");
    }
}

#[test]
fn test_windows_with_only_os_set() {
    let recipe = Recipe::starter().unwrap();
    let manifest = recipe.resolve(&os_only("Windows")).unwrap();

    assert_eq!(
        manifest.names().collect::<Vec<_>>(),
        vec!["glbinding", "glm", "imgui", "stb", "spdlog", "glfw", "khrplatform", "assimp"]
    );
    assert_eq!(manifest.generators_folder(), "build/generators");
}

#[test]
fn test_other_platforms_with_only_os_set() {
    let recipe = Recipe::starter().unwrap();

    for os in ["Linux", "Macos", "FreeBSD", "Haiku"] {
        let manifest = recipe.resolve(&os_only(os)).unwrap();
        assert_eq!(manifest.requirements(), recipe.requires.as_slice(), "os = {os}");
    }
}

#[test]
fn test_resolution_is_idempotent() {
    let recipe = Recipe::starter().unwrap();
    let ctx = context("Windows");

    let first = recipe.resolve(&ctx).unwrap();
    let second = recipe.resolve(&ctx).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
}

#[test]
fn test_empty_rules_return_base_for_any_context() {
    let base = vec![Requirement::new("a", "1"), Requirement::new("b", "2")];
    let rules: Vec<ConditionalRule> = Vec::new();

    for os in ["Windows", "Linux"] {
        let manifest = resolve(&base, &rules, &context(os), &ResolveConfig::new()).unwrap();
        assert_eq!(manifest.requirements(), base.as_slice());

        let manifest = resolve(&base, &rules, &os_only(os), &ResolveConfig::new()).unwrap();
        assert_eq!(manifest.requirements(), base.as_slice());
    }
}

#[test]
fn test_conditional_duplicate_names_package() {
    let base = vec![Requirement::new("a", "1"), Requirement::new("b", "2")];
    let rules = vec![ConditionalRule::new(
        Condition::os("Windows"),
        Requirement::new("a", "1"),
    )];

    let err = resolve(&base, &rules, &context("Windows"), &ResolveConfig::new()).unwrap_err();
    assert!(matches!(&err, ResolveError::DuplicateRequirement { package } if package == "a"));
    assert!(err.to_string().contains("'a'"));
}

#[test]
fn test_override_policy_from_recipe() {
    let recipe = Recipe::parse(
        r#"
requires = ["glm/0.9.9.8", "spdlog/1.17.0"]

[recipe]
conflict-policy = "override"

[[conditional]]
when = { os = "Windows" }
requires = ["glm/1.0.1"]
"#,
    )
    .unwrap();

    let windows = recipe.resolve(&context("Windows")).unwrap();
    assert_eq!(windows.get("glm").unwrap().version, "1.0.1");
    assert_eq!(windows.names().collect::<Vec<_>>(), vec!["glm", "spdlog"]);

    let linux = recipe.resolve(&context("Linux")).unwrap();
    assert_eq!(linux.get("glm").unwrap().version, "0.9.9.8");
    assert_eq!(recipe.conflict_policy, ConflictPolicy::Override);
}

#[test]
fn test_missing_os_is_rejected() {
    let ctx = PlatformContext::new().with_build_type("Release");
    let err = Recipe::starter().unwrap().resolve(&ctx).unwrap_err();
    assert!(matches!(err, ResolveError::InvalidContext(..)));
}

#[test]
fn test_unknown_option_is_rejected() {
    let recipe = Recipe::parse(
        r#"
requires = ["glm/1.0.1"]

[options]
"spdlog/*:use_std_fmt" = true
"#,
    )
    .unwrap();

    let err = recipe.resolve(&context("Linux")).unwrap_err();
    assert!(matches!(err, ResolveError::UnknownOption { key } if key == "spdlog/*:use_std_fmt"));
}

#[test]
fn test_logging_backend_option_reaches_manifest() {
    let manifest = Recipe::starter().unwrap().resolve(&context("Linux")).unwrap();
    let spdlog = manifest.effective_options("spdlog").unwrap();
    assert_eq!(spdlog.get("use_std_fmt"), Some(&OptionValue::Bool(true)));
    assert!(manifest.effective_options("glm").unwrap().is_empty());
}

#[test]
fn test_flat_recipe_passes_generators_folder_through() {
    let recipe = Recipe::starter_flat("conan");

    for os in ["Windows", "Linux"] {
        let manifest = recipe.resolve(&context(os)).unwrap();
        assert_eq!(manifest.len(), 6);
        assert_eq!(manifest.generators_folder(), "conan");
    }
}

#[test]
fn test_cmake_layout_follows_context() {
    let recipe = Recipe::starter().unwrap();

    let gcc = recipe.resolve(&context("Linux")).unwrap();
    assert_eq!(gcc.generators_folder(), "build/Release/generators");

    let msvc = recipe
        .resolve(&context("Windows").with_compiler("msvc"))
        .unwrap();
    assert_eq!(msvc.generators_folder(), "build/generators");

    let bare = recipe.resolve(&os_only("Linux")).unwrap();
    assert_eq!(bare.generators_folder(), "build/generators");
}

#[test]
fn test_profile_drives_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let profile = dir.path().join("windows.toml");
    std::fs::write(
        &profile,
        "[settings]\nos = \"windows\"\ncompiler = \"msvc\"\narch = \"x86_64\"\n",
    )
    .unwrap();

    let ctx = PlatformContext::from_profile(&profile).unwrap();
    let manifest = Recipe::starter().unwrap().resolve(&ctx).unwrap();
    assert!(manifest.contains("assimp"));
}

#[test]
fn test_concurrent_resolution() {
    let recipe = Recipe::starter().unwrap();
    let expected = recipe.resolve(&context("Windows")).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| recipe.resolve(&context("Windows")).unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
