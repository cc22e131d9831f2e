//! One-shot environment snapshot.
//!
//! All environment knobs are read exactly once at startup into a
//! [`BuildConfig`]; resolvers receive their inputs explicitly so they stay
//! pure functions of their arguments.
//!
//! Recognized variables:
//! - `QUARRY_GITHUB_TOKEN` / `GITHUB_TOKEN` / `GH_TOKEN` — release-feed
//!   bearer token, first set wins
//! - `QUARRY_ARCH` — overrides the detected host architecture
//! - `QUARRY_BUILD_TARGET` — restricts the build phase to one target;
//!   the value `dev` also preserves the build directory between runs
//! - `QUARRY_VERSION_SUFFIX` — overrides the default fork marker
//! - `QUARRY_TOOLCHAIN_FILE` — overrides toolchain-descriptor resolution
//! - `QUARRY_LLDB_ARCHIVE` — overrides archive resolution (no download)

use std::env;

pub const ENV_ARCH: &str = "QUARRY_ARCH";
pub const ENV_BUILD_TARGET: &str = "QUARRY_BUILD_TARGET";
pub const ENV_VERSION_SUFFIX: &str = "QUARRY_VERSION_SUFFIX";
pub const ENV_TOOLCHAIN_FILE: &str = "QUARRY_TOOLCHAIN_FILE";
pub const ENV_LLDB_ARCHIVE: &str = "QUARRY_LLDB_ARCHIVE";

/// Token variables, highest priority first.
const TOKEN_VARS: [&str; 3] = ["QUARRY_GITHUB_TOKEN", "GITHUB_TOKEN", "GH_TOKEN"];

/// Build-target value that suppresses the pre-configure wipe.
pub const DEV_TARGET: &str = "dev";

/// Environment-sourced build options, captured once at the entry point.
#[derive(Debug, Clone, Default)]
pub struct BuildConfig {
    pub arch_override: Option<String>,
    pub build_target: Option<String>,
    pub version_suffix: Option<String>,
    pub toolchain_file: Option<String>,
    pub lldb_archive: Option<String>,
    pub github_token: Option<String>,
}

impl BuildConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|var| env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |var: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            arch_override: get(ENV_ARCH),
            build_target: get(ENV_BUILD_TARGET),
            version_suffix: get(ENV_VERSION_SUFFIX),
            toolchain_file: get(ENV_TOOLCHAIN_FILE),
            lldb_archive: get(ENV_LLDB_ARCHIVE),
            github_token: TOKEN_VARS.iter().find_map(|&var| get(var)),
        }
    }

    /// Whether the build-target override requests an incremental dev build.
    pub fn is_dev_build(&self) -> bool {
        self.build_target.as_deref() == Some(DEV_TARGET)
    }
}
