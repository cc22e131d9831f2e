//! CMake toolchain-descriptor resolution.
//!
//! Descriptors live under `cmake/` as `toolchain-<triple>.cmake` files.
//! Each platform carries a ranked candidate list; the first file that
//! exists on disk wins. Absence is a normal result — the build then
//! proceeds with the compiler defaults.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::platform::Platform;
use crate::resolve::Resolution;

/// Ranked descriptor filenames for a platform/arch bucket.
///
/// Windows prefers the MSVC descriptor and falls back to the GNU one.
/// This table mirrors the triple support matrix but is deliberately
/// independent of it: triples name release assets, these name files.
pub fn toolchain_candidates(platform: Platform, arch: &str) -> Vec<&'static str> {
    match platform {
        Platform::Windows => vec![
            "toolchain-x86_64-windows-msvc.cmake",
            "toolchain-x86_64-windows-gnu.cmake",
        ],
        Platform::Linux => vec![match arch {
            "arm64" => "toolchain-aarch64-linux-gnu.cmake",
            a if a.starts_with("arm") => "toolchain-arm-linux-gnueabihf.cmake",
            _ => "toolchain-x86_64-linux-gnu.cmake",
        }],
        Platform::Darwin => vec![match arch {
            "arm64" => "toolchain-aarch64-apple-darwin.cmake",
            _ => "toolchain-x86_64-apple-darwin.cmake",
        }],
        Platform::Other => Vec::new(),
    }
}

/// Return the first existing candidate under `toolchain_dir`.
pub fn resolve_toolchain(
    toolchain_dir: &Path,
    platform: Platform,
    arch: &str,
) -> Resolution<PathBuf> {
    let candidates = toolchain_candidates(platform, arch);
    if candidates.is_empty() {
        return Resolution::Unresolved("no toolchain candidates for this platform".into());
    }
    for name in &candidates {
        let path = toolchain_dir.join(name);
        if path.exists() {
            debug!("toolchain descriptor: {}", path.display());
            return Resolution::Resolved(path);
        }
    }
    Resolution::Unresolved(format!(
        "no toolchain descriptor under {} (tried {})",
        toolchain_dir.display(),
        candidates.join(", ")
    ))
}
