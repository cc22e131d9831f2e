//! Two-phase CMake plan assembly and execution.
//!
//! The invoker wipes (or, for dev builds, preserves) the build
//! directory, assembles the configure and build argument lists from the
//! host identity plus the resolved toolchain and LLDB archive, and then
//! drives `cmake` twice through the process runner. The only fatal
//! resolution precondition is the LLDB package: everything else degrades
//! to an omitted flag with a warning.

use std::io;
use std::path::PathBuf;

use reqwest::Client;
use tracing::{info, warn};

use crate::config::BuildConfig;
use crate::error::{BuildError, BuildResult};
use crate::platform::{HostDescriptor, Platform};
use crate::process;
use crate::release;
use crate::resolve::Resolution;
use crate::toolchain;

/// Build output directory, relative to the repository root.
pub const BUILD_DIR: &str = "build";
/// Download cache for prebuilt archives. Lives outside `build/` so the
/// pre-configure wipe never discards a cached download.
pub const CACHE_DIR: &str = "downloads/lldb";
/// Directory holding the toolchain descriptors.
pub const TOOLCHAIN_DIR: &str = "cmake";

/// Fork marker appended to the package version unless overridden.
pub const DEFAULT_VERSION_SUFFIX: &str = "-quarry";

const WINDOWS_GENERATOR: &str = "Visual Studio 17 2022";
const UNIX_GENERATOR: &str = "Ninja";

/// The fully assembled two-phase command plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    pub configure_args: Vec<String>,
    pub build_args: Vec<String>,
    /// Extra environment for the configure child (Visual Studio root on Windows)
    pub env: Vec<(String, String)>,
}

/// Composes and executes the configure/build invocation.
pub struct BuildInvoker {
    root: PathBuf,
    config: BuildConfig,
    host: HostDescriptor,
    endpoint: String,
}

impl BuildInvoker {
    pub fn new(root: PathBuf, config: BuildConfig, host: HostDescriptor) -> Self {
        Self {
            root,
            config,
            host,
            endpoint: release::RELEASE_ENDPOINT.to_string(),
        }
    }

    /// Point the resolver at a different release feed. Test seam.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root.join(BUILD_DIR)
    }

    /// Wipe and recreate the build directory, unless the dev target is
    /// active, in which case existing contents are preserved untouched.
    pub fn prepare_build_dir(&self) -> BuildResult<()> {
        let build_dir = self.build_dir();
        if self.config.is_dev_build() {
            info!("dev target set, keeping {}", build_dir.display());
            std::fs::create_dir_all(&build_dir)?;
            return Ok(());
        }
        match std::fs::remove_dir_all(&build_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        std::fs::create_dir_all(&build_dir)?;
        Ok(())
    }

    /// Assemble the full two-phase plan. Fails only when no LLDB package
    /// can be produced; every other miss becomes an omitted flag.
    pub async fn plan(&self, client: &Client) -> BuildResult<BuildPlan> {
        let triple = self.host.triple();
        if triple.is_none() {
            warn!("no target triple for this host; prebuilt LLDB resolution is unavailable");
        }

        let mut configure_args = vec![
            "-S".to_string(),
            self.root.display().to_string(),
            "-B".to_string(),
            self.build_dir().display().to_string(),
            "-DCMAKE_BUILD_TYPE=Release".to_string(),
        ];

        let suffix = self
            .config
            .version_suffix
            .clone()
            .unwrap_or_else(|| DEFAULT_VERSION_SUFFIX.to_string());
        configure_args.push(format!("-DQUARRY_VERSION_SUFFIX={suffix}"));

        if let Some(id) = self.host.platform_id() {
            configure_args.push(format!("-DQUARRY_PLATFORM_ID={id}"));
        } else {
            warn!("unrecognized packaging platform; omitting -DQUARRY_PLATFORM_ID");
        }

        configure_args.extend(generator_args(&self.host));

        let toolchain = match self.config.toolchain_file.clone() {
            Some(path) => Resolution::Resolved(PathBuf::from(path)),
            None => toolchain::resolve_toolchain(
                &self.root.join(TOOLCHAIN_DIR),
                self.host.platform,
                &self.host.arch,
            ),
        };
        match toolchain {
            Resolution::Resolved(path) => {
                configure_args.push(format!("-DCMAKE_TOOLCHAIN_FILE={}", path.display()));
            }
            Resolution::Unresolved(reason) => {
                warn!("building with the default compiler: {reason}");
            }
        }

        let archive = self.resolve_lldb_archive(client, triple.as_deref()).await?;
        configure_args.push(format!("-DLLDB_PACKAGE={}", archive.display()));

        let mut build_args = vec![
            "--build".to_string(),
            self.build_dir().display().to_string(),
            "--config".to_string(),
            "Release".to_string(),
            "--parallel".to_string(),
            num_cpus::get().to_string(),
        ];
        if let Some(target) = &self.config.build_target {
            build_args.push("--target".to_string());
            build_args.push(target.clone());
        }

        let env = configure_env().await;

        Ok(BuildPlan {
            configure_args,
            build_args,
            env,
        })
    }

    /// Override wins; otherwise download from the feed. Exhausting both
    /// paths is the one universally fatal precondition.
    async fn resolve_lldb_archive(
        &self,
        client: &Client,
        triple: Option<&str>,
    ) -> BuildResult<PathBuf> {
        if let Some(path) = &self.config.lldb_archive {
            info!("using LLDB archive override: {path}");
            return Ok(PathBuf::from(path));
        }

        let resolved = match triple {
            Some(triple) => {
                release::resolve_archive(
                    client,
                    &self.endpoint,
                    self.config.github_token.as_deref(),
                    &self.root.join(CACHE_DIR),
                    triple,
                )
                .await
            }
            None => Resolution::Unresolved("no target triple for this host".into()),
        };

        match resolved {
            Resolution::Resolved(path) => Ok(path),
            Resolution::Unresolved(_) => Err(BuildError::MissingLldbPackage {
                expected: triple
                    .map(release::expected_asset_name)
                    .unwrap_or_else(|| "lldb--<triple>.zip".to_string()),
            }),
        }
    }

    /// Run the whole invocation: cleanup, configure, build. A nonzero
    /// exit from either phase aborts immediately.
    pub async fn invoke(&self, client: &Client) -> BuildResult<()> {
        self.prepare_build_dir()?;
        let plan = self.plan(client).await?;

        info!("configuring in {}", self.build_dir().display());
        process::run("cmake", &plan.configure_args, &plan.env).await?;

        info!("building");
        process::run("cmake", &plan.build_args, &[]).await?;

        Ok(())
    }
}

/// Generator selection: Windows uses the Visual Studio multi-config
/// generator with an explicit architecture; everything else uses Ninja.
fn generator_args(host: &HostDescriptor) -> Vec<String> {
    match host.platform {
        Platform::Windows => {
            // arm64 hosts build x64 under emulation rather than cross-compiling
            let arch = match host.arch.as_str() {
                "x64" | "arm64" => "x64",
                _ => "Win32",
            };
            vec![
                "-G".to_string(),
                WINDOWS_GENERATOR.to_string(),
                "-A".to_string(),
                arch.to_string(),
            ]
        }
        _ => vec!["-G".to_string(), UNIX_GENERATOR.to_string()],
    }
}

/// Extra environment for the configure child. On Windows this locates a
/// Visual Studio installation when `VSINSTALLDIR` is not already set;
/// discovery failure is non-fatal (configure may still find a compiler).
async fn configure_env() -> Vec<(String, String)> {
    #[cfg(windows)]
    {
        if std::env::var_os("VSINSTALLDIR").is_none() {
            if let Some(path) = discover_visual_studio().await {
                info!("using Visual Studio at {}", path.display());
                return vec![("VSINSTALLDIR".to_string(), path.display().to_string())];
            }
            warn!("no Visual Studio installation found; configure may fail to locate a compiler");
        }
    }
    Vec::new()
}

#[cfg(windows)]
const VS_LOCATOR: &str = r"C:\Program Files (x86)\Microsoft Visual Studio\Installer\vswhere.exe";

/// Ask vswhere for the newest installation; fall back to probing the
/// usual version/edition locations in order.
#[cfg(windows)]
async fn discover_visual_studio() -> Option<PathBuf> {
    let output = tokio::process::Command::new(VS_LOCATOR)
        .args(["-latest", "-products", "*", "-property", "installationPath"])
        .output()
        .await;
    if let Ok(output) = output {
        if output.status.success() {
            let reported = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !reported.is_empty() {
                let path = PathBuf::from(reported);
                if path.exists() {
                    return Some(path);
                }
            }
        }
    }

    for version in ["2022", "2019"] {
        for edition in ["Enterprise", "Professional", "Community", "BuildTools"] {
            let guess = PathBuf::from(format!(
                r"C:\Program Files\Microsoft Visual Studio\{version}\{edition}"
            ));
            if guess.exists() {
                return Some(guess);
            }
        }
    }
    None
}
