//! System requirements validation.
//!
//! This module provides preflight checks that the host can run the sandbox
//! binary: the binary resolves to an executable and user namespaces are
//! available.

mod requirements;

pub use requirements::{
    SystemRequirements, check_all, check_binary, check_kernel_version, check_user_namespaces,
};
