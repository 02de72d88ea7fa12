use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{Environment, ExecError};

/// Runs one external command to completion.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `argv` in `workdir` with exactly the variables in `env`.
    ///
    /// Succeeds only when the process exits with status 0.
    async fn run(&self, argv: &[String], workdir: &Path, env: &Environment)
        -> Result<(), ExecError>;
}

/// Spawns real child processes that share the parent's standard streams.
///
/// Dropping the `run` future kills the child.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        argv: &[String],
        workdir: &Path,
        env: &Environment,
    ) -> Result<(), ExecError> {
        let (name, args) = argv.split_first().ok_or(ExecError::EmptyCommand)?;

        // Look the tool up on the PATH the child will see, not just our own.
        let search_path = env
            .get_os("PATH")
            .map(OsStr::to_os_string)
            .or_else(|| std::env::var_os("PATH"));
        let program = which::which_in(name, search_path, workdir).map_err(|source| {
            ExecError::NotFound {
                command: name.clone(),
                source,
            }
        })?;

        debug!(
            program = %program.display(),
            "Running command (in {}): {}",
            workdir.display(),
            argv.join(" ")
        );

        let status = Command::new(&program)
            .args(args)
            .current_dir(workdir)
            .env_clear()
            .envs(env.present())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            // A cancelled build must not leave the tool running.
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|source| ExecError::Spawn {
                command: name.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ExecError::NonZeroExit {
                command: name.clone(),
                code: status.code(),
            })
        }
    }
}
