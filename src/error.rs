//! Error types for the build orchestration.
//!
//! Resolution misses are not errors — they travel as
//! [`crate::resolve::Resolution::Unresolved`] values so call sites can
//! apply overrides. Everything in this enum is fatal.

use std::io;
use thiserror::Error;

/// Fatal failures that abort the build run.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Neither an archive override nor the release feed produced an LLDB package
    #[error(
        "no LLDB package available: set QUARRY_LLDB_ARCHIVE or publish '{expected}' on the release feed"
    )]
    MissingLldbPackage { expected: String },

    /// An invoked tool exited with a nonzero status
    #[error("{program} exited with code {code}")]
    CommandFailed { program: String, code: i32 },

    /// An invoked tool could not be started at all
    #[error("failed to spawn {program}: {source}")]
    CommandSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias for build operations
pub type BuildResult<T> = Result<T, BuildError>;
