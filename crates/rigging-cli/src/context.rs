//! Platform context from command-line flags, profiles, and the host.

use anyhow::{Context, Result};
use clap::Args;
use rigging_pkg::PlatformContext;
use std::path::PathBuf;
use tracing::debug;

/// Flags describing the target platform.
#[derive(Debug, Clone, Default, Args)]
pub struct ContextArgs {
    /// Profile file with a [settings] table
    #[arg(long, env = "RIGGING_PROFILE")]
    pub profile: Option<PathBuf>,

    /// Target operating system (e.g. Windows, Linux, Macos)
    #[arg(long)]
    pub os: Option<String>,

    /// Target compiler (e.g. msvc, gcc, clang)
    #[arg(long)]
    pub compiler: Option<String>,

    /// Build type (e.g. Release, Debug)
    #[arg(long)]
    pub build_type: Option<String>,

    /// Target architecture (e.g. x86_64, armv8)
    #[arg(long)]
    pub arch: Option<String>,

    /// Fill unset settings from the host machine
    #[arg(long)]
    pub detect: bool,
}

impl ContextArgs {
    /// Build the context: explicit flags, then the profile, then the host.
    ///
    /// The host is consulted when `--detect` is given or when neither a
    /// profile nor `--os` was supplied.
    pub fn to_context(&self) -> Result<PlatformContext> {
        let mut ctx = PlatformContext::new();
        if let Some(os) = &self.os {
            ctx = ctx.with_os(os);
        }
        if let Some(compiler) = &self.compiler {
            ctx = ctx.with_compiler(compiler);
        }
        if let Some(build_type) = &self.build_type {
            ctx = ctx.with_build_type(build_type);
        }
        if let Some(arch) = &self.arch {
            ctx = ctx.with_arch(arch);
        }

        if let Some(path) = &self.profile {
            let profile = PlatformContext::from_profile(path)
                .with_context(|| format!("Failed to load profile '{}'", path.display()))?;
            ctx = ctx.or(&profile);
        }

        if self.detect || (self.profile.is_none() && self.os.is_none()) {
            ctx = ctx.or(&PlatformContext::detect());
        }

        debug!(context = %ctx, "platform context");
        Ok(ctx)
    }
}
