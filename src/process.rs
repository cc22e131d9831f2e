//! Subprocess execution with relayed output.
//!
//! Child stdout/stderr are piped and forwarded line by line to the
//! parent's corresponding stream, prefixed with the program name. Lines
//! are read as bytes with lossy UTF-8 decoding so non-UTF8 compiler
//! output cannot kill a reader task.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{BuildError, BuildResult};

/// Run `program` with `args`, relaying output as it arrives.
///
/// Resolves to `Ok(())` only on exit code 0. A nonzero exit maps to
/// [`BuildError::CommandFailed`], a spawn-level error (binary missing,
/// permission denied) to [`BuildError::CommandSpawn`].
pub async fn run(program: &str, args: &[String], envs: &[(String, String)]) -> BuildResult<()> {
    let mut cmd = base_command(program);
    cmd.args(args);
    for (key, value) in envs {
        cmd.env(key, value);
    }
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

    debug!("running {program} {}", args.join(" "));
    let mut child = cmd.spawn().map_err(|source| BuildError::CommandSpawn {
        program: program.to_string(),
        source,
    })?;

    let tag = format!("[{program}]");
    let stdout_relay = child
        .stdout
        .take()
        .map(|stream| spawn_relay(stream, tag.clone(), false));
    let stderr_relay = child
        .stderr
        .take()
        .map(|stream| spawn_relay(stream, tag, true));

    let status = child.wait().await.map_err(|source| BuildError::CommandSpawn {
        program: program.to_string(),
        source,
    })?;

    // Let the relays drain before reporting, so trailing diagnostics
    // are not lost on failure
    if let Some(relay) = stdout_relay {
        let _ = relay.await;
    }
    if let Some(relay) = stderr_relay {
        let _ = relay.await;
    }

    if status.success() {
        Ok(())
    } else {
        Err(BuildError::CommandFailed {
            program: program.to_string(),
            code: status.code().unwrap_or(-1),
        })
    }
}

/// Whether `program` is on the search path. Never errors.
pub fn command_exists(program: &str) -> bool {
    which::which(program).is_ok()
}

/// Windows cannot spawn script executables (.bat/.cmd) directly, so every
/// invocation is routed through the command interpreter. Callers never
/// see the difference.
#[cfg(windows)]
fn base_command(program: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(program);
    cmd
}

#[cfg(not(windows))]
fn base_command(program: &str) -> Command {
    Command::new(program)
}

fn spawn_relay(
    stream: impl AsyncRead + Unpin + Send + 'static,
    tag: String,
    to_stderr: bool,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    while matches!(buf.last(), Some(b'\n' | b'\r')) {
                        buf.pop();
                    }
                    let line = String::from_utf8_lossy(&buf);
                    if to_stderr {
                        eprintln!("{tag} {line}");
                    } else {
                        println!("{tag} {line}");
                    }
                }
                Err(e) => {
                    debug!("relay reader exiting: {e}");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[cfg(unix)]
    async fn zero_exit_resolves_ok() {
        assert!(run("true", &[], &[]).await.is_ok());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn nonzero_exit_carries_the_code() {
        let err = run("false", &[], &[]).await.unwrap_err();
        match err {
            BuildError::CommandFailed { program, code } => {
                assert_eq!(program, "false");
                assert_eq!(code, 1);
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }

    // On Windows the cmd /C wrapper turns a missing binary into a
    // nonzero exit instead of a spawn error, so this is unix-only.
    #[tokio::test]
    #[cfg(unix)]
    async fn missing_binary_is_a_spawn_error() {
        let err = run("definitely-not-a-real-binary-4217", &[], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::CommandSpawn { .. }));
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn env_is_passed_to_the_child() {
        let args = vec!["-c".to_string(), "test \"$QB_PROBE\" = probed".to_string()];
        let envs = vec![("QB_PROBE".to_string(), "probed".to_string())];
        assert!(run("sh", &args, &envs).await.is_ok());
    }

    #[test]
    fn command_exists_probes_the_path() {
        #[cfg(unix)]
        assert!(command_exists("ls"));
        assert!(!command_exists("definitely-not-a-real-binary-4217"));
    }
}
