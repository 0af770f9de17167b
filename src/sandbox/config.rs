//! Declarative sandbox profiles.
//!
//! A profile is a TOML document naming the binary, whether to clear the
//! environment, and an ordered list of directives:
//!
//! ```toml
//! binary = "/usr/bin/bwrap"
//! clear_env = true
//!
//! [[directives]]
//! type = "ro-bind"
//! source = "/usr"
//!
//! [[directives]]
//! type = "unshare"
//! namespace = "net"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::builder::Bubblewrap;
use super::directive::Directive;
use crate::error::ConfigError;

/// Configuration for a sandbox invocation.
///
/// Use the builder methods or [`SandboxConfig::from_path`] to create one,
/// then [`SandboxConfig::into_bubblewrap`] to get a ready builder.
///
/// # Example
///
/// ```
/// use bwrap_launcher::sandbox::{Directive, Namespace, SandboxConfig};
///
/// let bwrap = SandboxConfig::new()
///     .with_binary("/usr/bin/bwrap")
///     .with_clear_env(true)
///     .with_directive(Directive::Unshare { namespace: Namespace::Pid })
///     .into_bubblewrap();
///
/// assert_eq!(
///     bwrap.build_command(["ps"]),
///     ["env", "-i", "/usr/bin/bwrap", "--unshare-pid", "ps"]
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SandboxConfig {
    /// Sandbox binary; `bwrap` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary: Option<String>,

    /// Strip the inherited environment with `env -i`.
    pub clear_env: bool,

    /// Directives in the order they are applied.
    pub directives: Vec<Directive>,
}

impl SandboxConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a profile from TOML text.
    ///
    /// `origin` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` if the text is not a valid profile.
    pub fn from_toml_str(text: &str, origin: impl AsRef<Path>) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.as_ref().to_path_buf(),
            source,
        })
    }

    /// Reads and parses a profile file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` if the file cannot be read and
    /// `ConfigError::Parse` if it is not a valid profile.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_toml_str(&text, path)?;
        debug!(
            directives = config.directives.len(),
            clear_env = config.clear_env,
            "Loaded sandbox profile"
        );
        Ok(config)
    }

    /// Sets the sandbox binary.
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = Some(binary.into());
        self
    }

    /// Sets whether the environment is cleared.
    #[must_use]
    pub fn with_clear_env(mut self, clear: bool) -> Self {
        self.clear_env = clear;
        self
    }

    /// Appends a directive.
    #[must_use]
    pub fn with_directive(mut self, directive: Directive) -> Self {
        self.directives.push(directive);
        self
    }

    /// Replays this profile onto a fresh builder.
    #[must_use]
    pub fn into_bubblewrap(self) -> Bubblewrap {
        let mut bwrap = Bubblewrap::new();
        if let Some(binary) = self.binary {
            bwrap.set_binary(binary);
        }
        bwrap.clear_env(self.clear_env).extend(self.directives);
        bwrap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::Namespace;

    #[test]
    fn test_default_config() {
        let config = SandboxConfig::default();
        assert!(config.binary.is_none());
        assert!(!config.clear_env);
        assert!(config.directives.is_empty());
        assert_eq!(config.into_bubblewrap(), Bubblewrap::new());
    }

    #[test]
    fn test_builder_chain() {
        let config = SandboxConfig::new()
            .with_binary("/opt/bwrap")
            .with_clear_env(true)
            .with_directive(Directive::Tmpfs {
                dest: "/tmp".into(),
            });

        assert_eq!(config.binary.as_deref(), Some("/opt/bwrap"));
        assert!(config.clear_env);
        assert_eq!(config.directives.len(), 1);
    }

    #[test]
    fn test_parse_every_directive_type() {
        let text = r#"
            [[directives]]
            type = "ro-bind"
            source = "/usr"

            [[directives]]
            type = "bind"
            source = "/srv"
            dest = "/data"

            [[directives]]
            type = "symlink"
            source = "usr/lib"
            dest = "/lib"

            [[directives]]
            type = "proc"

            [[directives]]
            type = "dev"
            dest = "/dev"

            [[directives]]
            type = "tmpfs"
            dest = "/tmp"

            [[directives]]
            type = "dir"
            dest = "/run"

            [[directives]]
            type = "new-session"

            [[directives]]
            type = "die-with-parent"

            [[directives]]
            type = "hostname"
            name = "box"

            [[directives]]
            type = "chdir"
            dir = "/data"

            [[directives]]
            type = "unsetenv"
            name = "DISPLAY"

            [[directives]]
            type = "setenv"
            name = "LANG"
            value = "C.UTF-8"

            [[directives]]
            type = "unshare"
            namespace = "uts"

            [[directives]]
            type = "uid"
            uid = 1000

            [[directives]]
            type = "gid"
            gid = 1000
        "#;

        let config = SandboxConfig::from_toml_str(text, "inline.toml").expect("valid profile");
        assert_eq!(config.directives.len(), 16);
        assert_eq!(
            config.directives[13],
            Directive::Unshare {
                namespace: Namespace::Uts
            }
        );

        let bwrap = config.into_bubblewrap();
        assert_eq!(
            bwrap.flags(),
            [
                "--ro-bind",
                "/usr",
                "/usr",
                "--bind",
                "/srv",
                "/data",
                "--symlink",
                "usr/lib",
                "/lib",
                "--proc",
                "/proc",
                "--dev",
                "/dev",
                "--tmpfs",
                "/tmp",
                "--dir",
                "/run",
                "--new-session",
                "--die-with-parent",
                "--hostname",
                "box",
                "--chdir",
                "/data",
                "--unsetenv",
                "DISPLAY",
                "--setenv",
                "LANG",
                "C.UTF-8",
                "--unshare-uts",
                "--uid",
                "1000",
                "--gid",
                "1000",
            ]
        );
    }

    #[test]
    fn test_unknown_directive_is_rejected() {
        let text = r#"
            [[directives]]
            type = "overlay"
            source = "/usr"
        "#;
        let err = SandboxConfig::from_toml_str(text, "bad.toml").expect_err("unknown type");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_stray_key_on_flag_only_directive_is_rejected() {
        for kind in ["new-session", "die-with-parent"] {
            let text = format!("[[directives]]\ntype = \"{kind}\"\ndest = \"/x\"\n");
            let err = SandboxConfig::from_toml_str(&text, "bad.toml")
                .expect_err("flag-only directives take no keys");
            assert!(matches!(err, ConfigError::Parse { .. }), "{kind}: {err:?}");
        }

        let text = "[[directives]]\ntype = \"new-session\"\n";
        let config = SandboxConfig::from_toml_str(text, "ok.toml").expect("bare entry is valid");
        assert_eq!(config.directives, [Directive::NewSession {}]);
    }

    #[test]
    fn test_unknown_namespace_is_rejected() {
        let text = r#"
            [[directives]]
            type = "unshare"
            namespace = "time"
        "#;
        assert!(SandboxConfig::from_toml_str(text, "bad.toml").is_err());
    }

    #[test]
    fn test_unknown_top_level_key_is_rejected() {
        assert!(SandboxConfig::from_toml_str("timeout = 30", "bad.toml").is_err());
    }

    #[test]
    fn test_binary_and_clear_env_from_toml() {
        let config = SandboxConfig::from_toml_str(
            "binary = \"/opt/bwrap\"\nclear_env = true\n",
            "inline.toml",
        )
        .expect("valid profile");

        assert_eq!(
            config.into_bubblewrap().build_command(["env"]),
            ["env", "-i", "/opt/bwrap", "env"]
        );
    }
}
