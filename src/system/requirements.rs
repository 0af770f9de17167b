//! System requirements checking implementation.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::error::{Error, Result, SystemRequirementsError};

const USERNS_CLONE_SYSCTL: &str = "/proc/sys/kernel/unprivileged_userns_clone";
const MAX_USER_NAMESPACES_SYSCTL: &str = "/proc/sys/user/max_user_namespaces";

/// Results of all system requirements checks.
#[derive(Debug, Clone)]
pub struct SystemRequirements {
    /// Kernel release string (e.g., "6.8.0-45-generic")
    pub kernel_version: String,
    /// Resolved path of the sandbox binary
    pub binary_path: PathBuf,
    /// Whether the sandbox binary is installed setuid
    pub binary_setuid: bool,
    /// Whether unprivileged user namespaces are enabled
    pub user_namespaces: bool,
}

/// Check all system requirements and return detailed results.
///
/// Returns `Ok(SystemRequirements)` with all check results, or
/// `Err` with the first failing requirement. Disabled user namespaces are
/// not a failure when the binary is setuid, since bubblewrap then creates
/// the namespaces with its own privileges.
pub fn check_all(binary: &str) -> Result<SystemRequirements> {
    let kernel_version = check_kernel_version()?;
    let binary_path = check_binary(binary)?;
    let binary_setuid = is_setuid(&binary_path);
    let user_namespaces = accept_user_namespaces(check_user_namespaces(), binary_setuid)?;

    Ok(SystemRequirements {
        kernel_version,
        binary_path,
        binary_setuid,
        user_namespaces,
    })
}

/// Downgrades `UserNamespacesDisabled` to `Ok(false)` for a setuid binary.
fn accept_user_namespaces(result: Result<bool>, setuid: bool) -> Result<bool> {
    match result {
        Err(Error::SystemRequirements(SystemRequirementsError::UserNamespacesDisabled))
            if setuid =>
        {
            warn!("Unprivileged user namespaces are disabled, relying on setuid sandbox binary");
            Ok(false)
        }
        other => other,
    }
}

/// Reports the running kernel release.
///
/// # Errors
///
/// Returns error if the `uname` syscall fails.
pub fn check_kernel_version() -> Result<String> {
    let uname = nix::sys::utsname::uname().map_err(|e| SystemRequirementsError::ReadFailed {
        context: "uname syscall".to_string(),
        source: std::io::Error::from_raw_os_error(e as i32),
    })?;

    Ok(uname.release().to_string_lossy().to_string())
}

/// Resolves the sandbox binary to an executable path.
///
/// A name containing `/` is checked as given. Otherwise each `$PATH` entry
/// is searched in order, the same way `execvp` would.
///
/// # Errors
///
/// Returns `BinaryNotFound` if nothing matches and `BinaryNotExecutable` if
/// an explicit path lacks execute permission.
pub fn check_binary(binary: &str) -> Result<PathBuf> {
    if binary.contains('/') {
        let path = PathBuf::from(binary);
        if !path.is_file() {
            return Err(SystemRequirementsError::BinaryNotFound {
                binary: binary.to_string(),
            }
            .into());
        }
        if !is_executable(&path) {
            return Err(SystemRequirementsError::BinaryNotExecutable { path }.into());
        }
        return Ok(path);
    }

    let search_path = std::env::var_os("PATH").unwrap_or_default();
    for dir in std::env::split_paths(&search_path) {
        let candidate = dir.join(binary);
        trace!(candidate = %candidate.display(), "Checking for sandbox binary");
        if candidate.is_file() && is_executable(&candidate) {
            debug!(path = %candidate.display(), "Resolved sandbox binary");
            return Ok(candidate);
        }
    }

    Err(SystemRequirementsError::BinaryNotFound {
        binary: binary.to_string(),
    }
    .into())
}

fn is_executable(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|meta| meta.permissions().mode() & 0o111 != 0)
}

fn is_setuid(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|meta| meta.permissions().mode() & 0o4000 != 0)
}

/// Check unprivileged user namespaces are enabled.
///
/// Reads `/proc/sys/kernel/unprivileged_userns_clone` where the kernel has
/// it (Debian-patched kernels), otherwise `/proc/sys/user/max_user_namespaces`.
/// When neither exists, user namespaces are assumed to be available.
///
/// A setuid bubblewrap works without them; [`check_all`] accounts for that.
///
/// # Errors
///
/// Returns error if user namespaces are disabled or a sysctl is unreadable.
pub fn check_user_namespaces() -> Result<bool> {
    let clone = read_sysctl(Path::new(USERNS_CLONE_SYSCTL))?;
    let max = read_sysctl(Path::new(MAX_USER_NAMESPACES_SYSCTL))?;

    if !userns_enabled(clone.as_deref(), max.as_deref()) {
        return Err(SystemRequirementsError::UserNamespacesDisabled.into());
    }

    Ok(true)
}

fn read_sysctl(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }

    fs::read_to_string(path)
        .map(Some)
        .map_err(|e| {
            SystemRequirementsError::ReadFailed {
                context: path.display().to_string(),
                source: e,
            }
            .into()
        })
}

/// Decides from the raw sysctl contents whether user namespaces are usable.
fn userns_enabled(clone: Option<&str>, max: Option<&str>) -> bool {
    if let Some(clone) = clone {
        return clone.trim().parse::<u32>().unwrap_or(0) == 1;
    }
    match max {
        Some(max) => max.trim().parse::<u64>().unwrap_or(0) > 0,
        None => true,
    }
}
