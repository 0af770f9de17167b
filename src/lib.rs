//! bwrap-launcher - argument builder and launcher for bubblewrap.
//!
//! This crate turns high-level sandbox intents (bind mounts, namespace
//! unshares, environment handling, filesystem setup) into a correctly ordered
//! argument vector for the `bwrap` binary, runs it, and reports success or
//! failure with the captured output.
//!
//! The builder is a mechanical accumulator. It does not check that a flag
//! combination makes sense to bubblewrap (for instance `--hostname` without
//! `--unshare-uts`).
//!
//! # Platform Requirements
//!
//! - Linux with bubblewrap installed
//! - Unprivileged user namespaces enabled, or a setuid `bwrap`
//!
//! # Example
//!
//! ```no_run
//! use bwrap_launcher::{sandbox::Bubblewrap, system};
//!
//! fn main() -> miette::Result<()> {
//!     // Validate system requirements
//!     system::check_all("bwrap")?;
//!
//!     let mut bwrap = Bubblewrap::new();
//!     bwrap.read_only_bind("/", None).unshare_net().clear_env(true);
//!
//!     let output = bwrap.execute(["uname", "-a"])?;
//!     print!("{}", output.stdout_lossy());
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod sandbox;
pub mod system;

// Re-export commonly used types
pub use error::{Error, LaunchError, Result};
pub use sandbox::{Bubblewrap, CommandOutput, Directive, Namespace, SandboxConfig};
