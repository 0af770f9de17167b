//! Ordered accumulator of bubblewrap directives.

use super::directive::{Directive, Namespace};

/// Sandbox binary used when none is set.
pub const DEFAULT_BINARY: &str = "bwrap";

/// Accumulates sandbox directives as bubblewrap flag tokens.
///
/// Each directive method appends its complete token group and returns the
/// same builder, so configuration chains. Call order is flag order.
///
/// Flags are never reset. Executing the same builder twice after adding more
/// directives runs with everything added so far.
///
/// # Example
///
/// ```
/// use bwrap_launcher::sandbox::{Bubblewrap, Namespace};
///
/// let mut bwrap = Bubblewrap::new();
/// bwrap
///     .read_only_bind("/usr", None)
///     .symlink("usr/lib", "/lib")
///     .proc(None)
///     .unshare(Namespace::Net)
///     .die_with_parent();
///
/// assert_eq!(
///     bwrap.build_command(["id"]),
///     [
///         "bwrap", "--ro-bind", "/usr", "/usr", "--symlink", "usr/lib", "/lib",
///         "--proc", "/proc", "--unshare-net", "--die-with-parent", "id",
///     ]
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubblewrap {
    flags: Vec<String>,
    binary: String,
    clear_env: bool,
}

impl Default for Bubblewrap {
    fn default() -> Self {
        Self {
            flags: Vec::new(),
            binary: String::from(DEFAULT_BINARY),
            clear_env: false,
        }
    }
}

impl Bubblewrap {
    /// Creates an empty builder targeting `bwrap`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulated flag tokens in call order.
    #[must_use]
    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    /// The sandbox binary that will be invoked.
    #[must_use]
    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Whether the inherited environment is stripped with `env -i`.
    #[must_use]
    pub fn clears_env(&self) -> bool {
        self.clear_env
    }

    /// Replaces the sandbox binary. The last call wins.
    pub fn set_binary(&mut self, binary: impl Into<String>) -> &mut Self {
        self.binary = binary.into();
        self
    }

    /// Runs the sandbox binary under `env -i` when `clear` is true.
    ///
    /// This adds no bubblewrap flag; it only changes the command prefix.
    pub fn clear_env(&mut self, clear: bool) -> &mut Self {
        self.clear_env = clear;
        self
    }

    /// Appends the token group of an arbitrary directive.
    pub fn push(&mut self, directive: Directive) -> &mut Self {
        self.flags.extend(directive.tokens());
        self
    }

    /// Appends several directives in iteration order.
    pub fn extend<I>(&mut self, directives: I) -> &mut Self
    where
        I: IntoIterator<Item = Directive>,
    {
        for directive in directives {
            self.push(directive);
        }
        self
    }

    /// Read-only bind mount of `source` at `dest` (or at `source`).
    pub fn read_only_bind(&mut self, source: impl Into<String>, dest: Option<&str>) -> &mut Self {
        self.push(Directive::ReadOnlyBind {
            source: source.into(),
            dest: dest.map(String::from),
        })
    }

    /// Read/write bind mount of `source` at `dest` (or at `source`).
    pub fn bind(&mut self, source: impl Into<String>, dest: Option<&str>) -> &mut Self {
        self.push(Directive::Bind {
            source: source.into(),
            dest: dest.map(String::from),
        })
    }

    /// Creates a symlink at `dest` pointing to `source`.
    pub fn symlink(&mut self, source: impl Into<String>, dest: impl Into<String>) -> &mut Self {
        self.push(Directive::Symlink {
            source: source.into(),
            dest: dest.into(),
        })
    }

    /// Mounts procfs at `dest`, `/proc` by default.
    pub fn proc(&mut self, dest: Option<&str>) -> &mut Self {
        self.push(Directive::Proc {
            dest: dest.map(String::from),
        })
    }

    /// Mounts a new devtmpfs at `dest`, `/dev` by default.
    pub fn dev(&mut self, dest: Option<&str>) -> &mut Self {
        self.push(Directive::Dev {
            dest: dest.map(String::from),
        })
    }

    /// Mounts a new tmpfs at `dest`.
    pub fn tmpfs(&mut self, dest: impl Into<String>) -> &mut Self {
        self.push(Directive::Tmpfs { dest: dest.into() })
    }

    /// Creates a directory at `dest`.
    pub fn dir(&mut self, dest: impl Into<String>) -> &mut Self {
        self.push(Directive::Dir { dest: dest.into() })
    }

    /// Starts a new terminal session for the sandbox.
    pub fn new_session(&mut self) -> &mut Self {
        self.push(Directive::NewSession {})
    }

    /// Kills the sandbox when the launching process dies.
    pub fn die_with_parent(&mut self) -> &mut Self {
        self.push(Directive::DieWithParent {})
    }

    /// Sets a custom hostname. bubblewrap requires `--unshare-uts` for this,
    /// which is not checked here.
    pub fn hostname(&mut self, name: impl Into<String>) -> &mut Self {
        self.push(Directive::Hostname { name: name.into() })
    }

    /// Changes into `dir` before running the command.
    pub fn chdir(&mut self, dir: impl Into<String>) -> &mut Self {
        self.push(Directive::Chdir { dir: dir.into() })
    }

    /// Unsets an environment variable inside the sandbox.
    pub fn unsetenv(&mut self, name: impl Into<String>) -> &mut Self {
        self.push(Directive::UnsetEnv { name: name.into() })
    }

    /// Sets an environment variable inside the sandbox.
    pub fn setenv(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.push(Directive::SetEnv {
            name: name.into(),
            value: value.into(),
        })
    }

    /// Creates a new namespace of the given kind.
    pub fn unshare(&mut self, namespace: Namespace) -> &mut Self {
        self.push(Directive::Unshare { namespace })
    }

    pub fn unshare_user(&mut self) -> &mut Self {
        self.unshare(Namespace::User)
    }

    pub fn unshare_ipc(&mut self) -> &mut Self {
        self.unshare(Namespace::Ipc)
    }

    pub fn unshare_pid(&mut self) -> &mut Self {
        self.unshare(Namespace::Pid)
    }

    pub fn unshare_net(&mut self) -> &mut Self {
        self.unshare(Namespace::Net)
    }

    pub fn unshare_uts(&mut self) -> &mut Self {
        self.unshare(Namespace::Uts)
    }

    pub fn unshare_cgroup(&mut self) -> &mut Self {
        self.unshare(Namespace::Cgroup)
    }

    /// Unshares every namespace bubblewrap supports.
    pub fn unshare_all(&mut self) -> &mut Self {
        self.unshare(Namespace::All)
    }

    /// Uses a custom user id in the sandbox.
    pub fn uid(&mut self, uid: u32) -> &mut Self {
        self.push(Directive::Uid { uid })
    }

    /// Uses a custom group id in the sandbox.
    pub fn gid(&mut self, gid: u32) -> &mut Self {
        self.push(Directive::Gid { gid })
    }
}
