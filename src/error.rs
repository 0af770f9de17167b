//! Error types for the bubblewrap launcher.
//!
//! Uses thiserror for deriving std::error::Error and miette for rich diagnostics.
//!
//! Building a command never fails. Every error here comes from running it,
//! loading a profile, or checking the host.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::sandbox::CommandOutput;

/// Top-level error type for the application.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// System requirements not met
    #[error("System requirements check failed")]
    #[diagnostic(code(bwrap::system::requirements))]
    SystemRequirements(#[from] SystemRequirementsError),

    /// Sandbox launch or execution failed
    #[error(transparent)]
    #[diagnostic(transparent)]
    Launch(#[from] LaunchError),

    /// Sandbox profile could not be loaded
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    #[diagnostic(code(bwrap::io))]
    Io(#[from] std::io::Error),
}

/// Errors raised while running the assembled sandbox command.
#[derive(Error, Debug, Diagnostic)]
pub enum LaunchError {
    /// The sandbox binary could not be started at all.
    #[error("Failed to spawn sandbox binary `{binary}`")]
    #[diagnostic(
        code(bwrap::launch::spawn),
        help("Check that bubblewrap is installed and the binary path is executable")
    )]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    /// The child ran and exited with a non-zero status.
    #[error("Sandboxed command exited with status {exit_code}: {}", .output.stderr_lossy().trim_end())]
    #[diagnostic(code(bwrap::launch::execution))]
    Execution {
        exit_code: i32,
        output: CommandOutput,
    },
}

impl LaunchError {
    /// Exit status of the child, if it ran.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Spawn { .. } => None,
            Self::Execution { exit_code, .. } => Some(*exit_code),
        }
    }

    /// Output captured before the child exited, if it ran.
    #[must_use]
    pub fn output(&self) -> Option<&CommandOutput> {
        match self {
            Self::Spawn { .. } => None,
            Self::Execution { output, .. } => Some(output),
        }
    }
}

/// Errors related to loading a sandbox profile.
#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    /// Profile file could not be read
    #[error("Failed to read sandbox profile {}", .path.display())]
    #[diagnostic(code(bwrap::config::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Profile is not valid TOML or has unknown directives
    #[error("Invalid sandbox profile {}", .path.display())]
    #[diagnostic(
        code(bwrap::config::parse),
        help("Each [[directives]] entry needs a `type` such as \"ro-bind\", \"unshare\" or \"setenv\"")
    )]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Errors related to system requirements validation.
#[derive(Error, Debug, Diagnostic)]
pub enum SystemRequirementsError {
    /// Sandbox binary missing
    #[error("Sandbox binary `{binary}` was not found")]
    #[diagnostic(
        code(bwrap::system::binary),
        help("Install bubblewrap (e.g. `apt install bubblewrap`) or pass --binary")
    )]
    BinaryNotFound { binary: String },

    /// Sandbox binary present but not executable
    #[error("Sandbox binary {} is not executable", .path.display())]
    #[diagnostic(code(bwrap::system::binary_permissions))]
    BinaryNotExecutable { path: PathBuf },

    /// Unprivileged user namespaces not enabled
    #[error("Unprivileged user namespaces are not enabled")]
    #[diagnostic(
        code(bwrap::system::userns),
        help("Enable with: sysctl -w kernel.unprivileged_userns_clone=1, or install bwrap setuid")
    )]
    UserNamespacesDisabled,

    /// Failed to read system information
    #[error("Failed to read system information: {context}")]
    #[diagnostic(code(bwrap::system::read_failed))]
    ReadFailed {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_error_carries_status_and_output() {
        let err = LaunchError::Execution {
            exit_code: 3,
            output: CommandOutput {
                stdout: b"partial\n".to_vec(),
                stderr: b"bwrap: No permissions\n".to_vec(),
                exit_code: 3,
            },
        };

        assert_eq!(err.exit_code(), Some(3));
        assert_eq!(
            err.output().map(CommandOutput::stdout_lossy).as_deref(),
            Some("partial\n")
        );
        assert_eq!(
            err.to_string(),
            "Sandboxed command exited with status 3: bwrap: No permissions"
        );
    }

    #[test]
    fn test_spawn_error_has_no_output() {
        let err = LaunchError::Spawn {
            binary: "/nonexistent/bwrap".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };

        assert_eq!(err.exit_code(), None);
        assert!(err.output().is_none());
        assert!(err.to_string().contains("/nonexistent/bwrap"));
    }

    #[test]
    fn test_launch_error_converts_into_top_level() {
        let err: Error = LaunchError::Spawn {
            binary: "bwrap".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        }
        .into();

        assert!(matches!(err, Error::Launch(LaunchError::Spawn { .. })));
    }

    #[test]
    fn test_io_error_converts_into_top_level() {
        fn write_failure() -> Result<()> {
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))?;
            Ok(())
        }

        let err = write_failure().expect_err("io error propagates");
        assert!(matches!(err, Error::Io(_)));
    }
}
