//! Build orchestrator for the Quarry debug adapter's native components.
//!
//! The orchestrator normalizes the host platform, resolves a CMake
//! toolchain descriptor and a prebuilt LLDB archive (downloaded from the
//! release feed unless overridden), and drives a two-phase CMake
//! configure/build with the resulting flags. All knobs are environment
//! variables; see [`config`] for the full list.

pub mod builder;
pub mod config;
pub mod error;
pub mod platform;
pub mod process;
pub mod release;
pub mod resolve;
pub mod toolchain;

pub use builder::{BuildInvoker, BuildPlan};
pub use config::BuildConfig;
pub use error::{BuildError, BuildResult};
pub use platform::{HostDescriptor, Platform};
pub use resolve::Resolution;
