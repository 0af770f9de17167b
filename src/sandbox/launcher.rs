//! Command assembly and execution for the sandbox binary.
//!
//! The final argument vector is
//!
//! ```text
//! [env -i]? <binary> <flags...> <sandboxed command...>
//! ```
//!
//! It is handed to a [`ProcessRunner`] as a plain vector; no shell ever sees
//! it. Execution blocks until the child exits and has no timeout. A caller
//! that needs cancellation has to run it on its own thread and kill the
//! child out of band.
//!
//! With clear-env, a bare binary name is looked up by `env` on its own
//! default path rather than the caller's `$PATH`. Set an absolute binary
//! when the two may differ.

use std::borrow::Cow;
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::process::{Command, ExitStatus, Stdio};

use tracing::{debug, instrument, trace, warn};

use super::builder::Bubblewrap;
use crate::error::LaunchError;

/// Prefix that strips the inherited environment.
const CLEAR_ENV_PREFIX: [&str; 2] = ["env", "-i"];

/// Output from a finished sandbox invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output from the command.
    pub stdout: Vec<u8>,
    /// Standard error from the command.
    pub stderr: Vec<u8>,
    /// Exit code from the command; `128 + signal` if it was killed.
    pub exit_code: i32,
}

impl CommandOutput {
    /// Returns `true` if the command exited successfully (exit code 0).
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    #[must_use]
    pub fn stdout_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    #[must_use]
    pub fn stderr_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }
}

/// Capability to run an argument vector and capture its result.
///
/// Implementations must pass `argv` to the program exactly, without shell
/// interpretation, and report the exit status precisely. `argv[0]` is the
/// program. An `Err` means the program could not be started.
pub trait ProcessRunner {
    fn run(&self, argv: &[String]) -> io::Result<CommandOutput>;
}

/// Runs commands with [`std::process::Command`], capturing stdout and stderr.
///
/// Both pipes are drained concurrently by `Command::output`, so a chatty
/// child cannot deadlock on a full pipe.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, argv: &[String]) -> io::Result<CommandOutput> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty argument vector"))?;

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()?;

        Ok(CommandOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: exit_code(output.status),
        })
    }
}

/// Maps an exit status to a single integer, shell style.
fn exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(-1)
}

impl Bubblewrap {
    /// Assembles the full argument vector for running `sandboxed_command`.
    ///
    /// Pure and total: the builder is not modified and nothing is validated.
    #[must_use]
    pub fn build_command<I, S>(&self, sandboxed_command: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut command = Vec::with_capacity(CLEAR_ENV_PREFIX.len() + 1 + self.flags().len());

        if self.clears_env() {
            command.extend(CLEAR_ENV_PREFIX.map(String::from));
        }
        command.push(self.binary().to_string());
        command.extend_from_slice(self.flags());
        command.extend(sandboxed_command.into_iter().map(Into::into));
        command
    }

    /// Runs `sandboxed_command` inside the sandbox with the [`SystemRunner`].
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `LaunchError::Spawn` if the sandbox binary (or `env`) cannot be started
    /// - `LaunchError::Execution` if the child exits non-zero; the error carries
    ///   the exit code and everything it wrote
    pub fn execute<I, S>(&self, sandboxed_command: I) -> Result<CommandOutput, LaunchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.execute_with(&SystemRunner, sandboxed_command)
    }

    /// Like [`execute`](Self::execute), with a caller-supplied runner.
    ///
    /// # Errors
    ///
    /// Same as [`execute`](Self::execute).
    #[instrument(skip_all, fields(binary = %self.binary(), clear_env = self.clears_env()))]
    pub fn execute_with<R, I, S>(
        &self,
        runner: &R,
        sandboxed_command: I,
    ) -> Result<CommandOutput, LaunchError>
    where
        R: ProcessRunner + ?Sized,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv = self.build_command(sandboxed_command);
        trace!(?argv, "Assembled sandbox command");
        debug!(
            flags = self.flags().len(),
            args = argv.len(),
            "Spawning sandbox"
        );

        let output = runner.run(&argv).map_err(|source| LaunchError::Spawn {
            binary: argv[0].clone(),
            source,
        })?;

        if !output.success() {
            warn!(exit_code = output.exit_code, "Sandboxed command failed");
            return Err(LaunchError::Execution {
                exit_code: output.exit_code,
                output,
            });
        }

        debug!("Sandboxed command completed");
        Ok(output)
    }
}
