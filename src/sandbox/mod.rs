//! Bubblewrap command construction and execution.
//!
//! A [`Bubblewrap`] builder records directives (bind mounts, namespace
//! unshares, environment changes, filesystem setup) as bubblewrap flags in
//! call order. The launcher half assembles the final argument vector and runs
//! it, turning a non-zero exit into [`LaunchError::Execution`].
//!
//! The builder is a plain owned value. Sharing one across threads requires
//! external locking, otherwise token groups from different callers may
//! interleave.
//!
//! [`LaunchError::Execution`]: crate::error::LaunchError::Execution
//!
//! # Example
//!
//! ```no_run
//! use bwrap_launcher::sandbox::Bubblewrap;
//!
//! let mut bwrap = Bubblewrap::new();
//! bwrap
//!     .read_only_bind("/usr", None)
//!     .symlink("usr/lib", "/lib")
//!     .symlink("usr/bin", "/bin")
//!     .proc(None)
//!     .dev(None)
//!     .unshare_all()
//!     .die_with_parent();
//!
//! let output = bwrap.execute(["ls", "/"]).unwrap();
//! assert!(output.success());
//! println!("Output: {}", output.stdout_lossy());
//! ```

mod builder;
mod config;
mod directive;
mod launcher;

pub use builder::{Bubblewrap, DEFAULT_BINARY};
pub use config::SandboxConfig;
pub use directive::{
    DEFAULT_DEV_DEST, DEFAULT_PROC_DEST, DIRECTIVES, Directive, DirectiveKind, DirectiveSpec,
    Namespace,
};
pub use launcher::{CommandOutput, ProcessRunner, SystemRunner};
