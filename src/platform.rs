//! Host platform and architecture normalization.
//!
//! Two independent lookup tables live here: the target triple (matched
//! against release-asset names, never parsed back) and the packaging
//! platform id (handed to the configure phase). They cover the same
//! support matrix but serve different consumers, so they are written out
//! separately and kept in lockstep on purpose.

use tracing::warn;

/// Host operating system bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    Darwin,
    Windows,
    /// Anything else; flows through as absent triple/platform-id
    Other,
}

impl Platform {
    pub fn from_os(os: &str) -> Self {
        match os {
            "linux" => Self::Linux,
            "macos" => Self::Darwin,
            "windows" => Self::Windows,
            other => {
                warn!("unrecognized host operating system '{other}'");
                Self::Other
            }
        }
    }
}

/// Normalize architecture aliases to the canonical x64/arm64/arm buckets.
/// Unknown values pass through unchanged.
pub fn normalize_arch(raw: &str) -> String {
    match raw {
        "x64" | "amd64" | "x86_64" => "x64",
        "arm64" | "aarch64" => "arm64",
        "arm" | "armhf" => "arm",
        other => other,
    }
    .to_string()
}

/// Normalized host identity, derived once per run.
#[derive(Debug, Clone)]
pub struct HostDescriptor {
    pub platform: Platform,
    pub arch: String,
}

impl HostDescriptor {
    /// Detect the host, honoring an architecture override when given.
    pub fn detect(arch_override: Option<&str>) -> Self {
        let platform = Platform::from_os(std::env::consts::OS);
        let raw = arch_override.unwrap_or(std::env::consts::ARCH);
        Self {
            platform,
            arch: normalize_arch(raw),
        }
    }

    /// Target triple used to match prebuilt release assets.
    pub fn triple(&self) -> Option<String> {
        let triple = match (self.platform, self.arch.as_str()) {
            (Platform::Darwin, "arm64") => "aarch64-apple-darwin",
            (Platform::Darwin, _) => "x86_64-apple-darwin",
            (Platform::Linux, "arm64") => "aarch64-linux-gnu",
            (Platform::Linux, arch) if arch.starts_with("arm") => "arm-linux-gnueabihf",
            (Platform::Linux, _) => "x86_64-linux-gnu",
            (Platform::Windows, _) => "x86_64-windows-msvc",
            (Platform::Other, _) => return None,
        };
        Some(triple.to_string())
    }

    /// Packaging-facing platform id, e.g. `darwin-arm64` or `win32-x64`.
    ///
    /// Windows always packages as `win32-x64`; arm64 hosts run the x64
    /// build under emulation rather than cross-compiling.
    pub fn platform_id(&self) -> Option<String> {
        let id = match (self.platform, self.arch.as_str()) {
            (Platform::Darwin, "arm64") => "darwin-arm64",
            (Platform::Darwin, _) => "darwin-x64",
            (Platform::Linux, "arm64") => "linux-arm64",
            (Platform::Linux, arch) if arch.starts_with("arm") => "linux-armhf",
            (Platform::Linux, _) => "linux-x64",
            (Platform::Windows, _) => "win32-x64",
            (Platform::Other, _) => return None,
        };
        Some(id.to_string())
    }
}
