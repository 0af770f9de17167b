//! bwrap-launcher - Entry Point
//!
//! Runs a command inside bubblewrap, built from a TOML profile and/or
//! command-line overrides.

use std::borrow::Cow;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use miette::Result;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use bwrap_launcher::{Bubblewrap, CommandOutput, LaunchError, SandboxConfig, system};

/// Run a command inside a bubblewrap sandbox.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Sandbox profile (TOML) listing directives in order
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Sandbox binary to run instead of the profile's or `bwrap`
    #[arg(long, env = "BWRAP_LAUNCHER_BINARY")]
    binary: Option<String>,

    /// Strip the inherited environment with `env -i`
    #[arg(long, default_value = "false")]
    clear_env: bool,

    /// Print the assembled command instead of running it
    #[arg(long, default_value = "false")]
    dry_run: bool,

    /// Skip system requirements checks; the binary is then not pinned to
    /// an absolute path, so under --clear-env `env` looks it up itself
    #[arg(long, default_value = "false")]
    skip_checks: bool,

    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Command to run inside the sandbox
    #[arg(last = true, required = true)]
    command: Vec<String>,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Logs go to stderr so the sandboxed command owns stdout
    let filter = if args.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    debug!("bwrap-launcher v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => SandboxConfig::from_path(path)?,
        None => SandboxConfig::new(),
    };
    if let Some(binary) = args.binary {
        config = config.with_binary(binary);
    }
    if args.clear_env {
        config = config.with_clear_env(true);
    }

    let mut bwrap = config.into_bubblewrap();

    if args.dry_run {
        println!("{}", shell_line(&bwrap.build_command(args.command)));
        return Ok(ExitCode::SUCCESS);
    }

    if args.skip_checks {
        warn!("Skipping system requirements checks (--skip-checks)");
    } else {
        match system::check_all(bwrap.binary()) {
            Ok(reqs) => {
                info!(
                    "System requirements satisfied: kernel {}, binary {}, setuid: {}, userns: {}",
                    reqs.kernel_version,
                    reqs.binary_path.display(),
                    reqs.binary_setuid,
                    reqs.user_namespaces
                );
                pin_binary(&mut bwrap, &reqs.binary_path);
            }
            Err(e) => {
                error!("System requirements check failed");
                return Err(e.into());
            }
        }
    }

    match bwrap.execute(args.command) {
        Ok(output) => {
            relay(&output)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(LaunchError::Execution { exit_code, output }) => {
            relay(&output)?;
            debug!(exit_code, "Propagating sandbox exit status");
            Ok(ExitCode::from(exit_status(exit_code)))
        }
        Err(e) => Err(e.into()),
    }
}

/// Joins an argument vector into one line a POSIX shell reads back verbatim.
fn shell_line(argv: &[String]) -> String {
    argv.iter()
        .map(|token| shell_escape::escape(Cow::Borrowed(token.as_str())))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Maps a child exit code onto our own; anything outside 1..=255 becomes 1.
fn exit_status(exit_code: i32) -> u8 {
    match u8::try_from(exit_code) {
        Ok(0) | Err(_) => 1,
        Ok(code) => code,
    }
}

/// Runs the binary the preflight resolved on our `$PATH`. Under `env -i`
/// the bare name would otherwise be looked up on `env`'s default path.
fn pin_binary(bwrap: &mut Bubblewrap, resolved: &Path) {
    bwrap.set_binary(resolved.to_string_lossy());
}

/// Copies the captured streams to our own stdout and stderr.
fn relay(output: &CommandOutput) -> bwrap_launcher::Result<()> {
    std::io::stdout().write_all(&output.stdout)?;
    std::io::stderr().write_all(&output.stderr)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|token| token.to_string()).collect()
    }

    #[test]
    fn test_shell_line_leaves_plain_tokens_bare() {
        assert_eq!(
            shell_line(&argv(&["bwrap", "--ro-bind", "/usr", "/usr", "ls"])),
            "bwrap --ro-bind /usr /usr ls"
        );
    }

    #[test]
    fn test_shell_line_quotes_special_tokens() {
        assert_eq!(
            shell_line(&argv(&["bwrap", "--setenv", "A", "", "echo", "a b", "$HOME"])),
            "bwrap --setenv A '' echo 'a b' '$HOME'"
        );
        assert_eq!(shell_line(&argv(&["it's"])), r"'it'\''s'");
    }

    #[test]
    fn test_exit_status_passes_child_code() {
        assert_eq!(exit_status(7), 7);
        assert_eq!(exit_status(137), 137);
        assert_eq!(exit_status(255), 255);
    }

    #[test]
    fn test_exit_status_out_of_range_is_failure() {
        assert_eq!(exit_status(-1), 1);
        assert_eq!(exit_status(256), 1);
        assert_eq!(exit_status(0), 1);
    }

    #[test]
    fn test_pin_binary_used_under_clear_env() {
        let mut bwrap = Bubblewrap::new();
        bwrap.clear_env(true);
        pin_binary(&mut bwrap, Path::new("/usr/bin/bwrap"));

        assert_eq!(
            bwrap.build_command(["true"]),
            ["env", "-i", "/usr/bin/bwrap", "true"]
        );
    }

    #[test]
    fn test_relay_accepts_empty_output() {
        let output = CommandOutput {
            stdout: Vec::new(),
            stderr: Vec::new(),
            exit_code: 0,
        };
        assert!(relay(&output).is_ok());
    }
}
