//! The bubblewrap flag table.
//!
//! Every directive the builder understands is listed once in [`DIRECTIVES`]
//! with the flag it emits and the number of argument tokens that follow it.
//! [`Directive::tokens`] is the only place a directive is expanded into
//! command-line arguments.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default mount point for `--proc`.
pub const DEFAULT_PROC_DEST: &str = "/proc";

/// Default mount point for `--dev`.
pub const DEFAULT_DEV_DEST: &str = "/dev";

/// A kernel namespace bubblewrap can unshare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    User,
    Ipc,
    Pid,
    Net,
    Uts,
    Cgroup,
    /// Every namespace bubblewrap knows about.
    All,
}

impl Namespace {
    /// All namespaces in flag table order.
    pub const ALL: [Self; 7] = [
        Self::User,
        Self::Ipc,
        Self::Pid,
        Self::Net,
        Self::Uts,
        Self::Cgroup,
        Self::All,
    ];

    /// The `--unshare-<kind>` flag for this namespace.
    #[must_use]
    pub const fn unshare_flag(self) -> &'static str {
        match self {
            Self::User => "--unshare-user",
            Self::Ipc => "--unshare-ipc",
            Self::Pid => "--unshare-pid",
            Self::Net => "--unshare-net",
            Self::Uts => "--unshare-uts",
            Self::Cgroup => "--unshare-cgroup",
            Self::All => "--unshare-all",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::User => "user",
            Self::Ipc => "ipc",
            Self::Pid => "pid",
            Self::Net => "net",
            Self::Uts => "uts",
            Self::Cgroup => "cgroup",
            Self::All => "all",
        };
        f.write_str(name)
    }
}

/// Discriminant of a [`Directive`], used to look up its table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    ReadOnlyBind,
    Bind,
    Symlink,
    Proc,
    Dev,
    Tmpfs,
    Dir,
    NewSession,
    DieWithParent,
    Hostname,
    Chdir,
    UnsetEnv,
    SetEnv,
    Unshare(Namespace),
    Uid,
    Gid,
}

/// One row of the flag table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectiveSpec {
    pub kind: DirectiveKind,
    /// Flag token emitted first.
    pub flag: &'static str,
    /// Number of argument tokens following the flag.
    pub arity: usize,
}

const fn row(kind: DirectiveKind, flag: &'static str, arity: usize) -> DirectiveSpec {
    DirectiveSpec { kind, flag, arity }
}

/// Every directive, its flag and its arity.
pub const DIRECTIVES: &[DirectiveSpec] = &[
    row(DirectiveKind::ReadOnlyBind, "--ro-bind", 2),
    row(DirectiveKind::Bind, "--bind", 2),
    row(DirectiveKind::Symlink, "--symlink", 2),
    row(DirectiveKind::Proc, "--proc", 1),
    row(DirectiveKind::Dev, "--dev", 1),
    row(DirectiveKind::Tmpfs, "--tmpfs", 1),
    row(DirectiveKind::Dir, "--dir", 1),
    row(DirectiveKind::NewSession, "--new-session", 0),
    row(DirectiveKind::DieWithParent, "--die-with-parent", 0),
    row(DirectiveKind::Hostname, "--hostname", 1),
    row(DirectiveKind::Chdir, "--chdir", 1),
    row(DirectiveKind::UnsetEnv, "--unsetenv", 1),
    row(DirectiveKind::SetEnv, "--setenv", 2),
    row(
        DirectiveKind::Unshare(Namespace::User),
        Namespace::User.unshare_flag(),
        0,
    ),
    row(
        DirectiveKind::Unshare(Namespace::Ipc),
        Namespace::Ipc.unshare_flag(),
        0,
    ),
    row(
        DirectiveKind::Unshare(Namespace::Pid),
        Namespace::Pid.unshare_flag(),
        0,
    ),
    row(
        DirectiveKind::Unshare(Namespace::Net),
        Namespace::Net.unshare_flag(),
        0,
    ),
    row(
        DirectiveKind::Unshare(Namespace::Uts),
        Namespace::Uts.unshare_flag(),
        0,
    ),
    row(
        DirectiveKind::Unshare(Namespace::Cgroup),
        Namespace::Cgroup.unshare_flag(),
        0,
    ),
    row(
        DirectiveKind::Unshare(Namespace::All),
        Namespace::All.unshare_flag(),
        0,
    ),
    row(DirectiveKind::Uid, "--uid", 1),
    row(DirectiveKind::Gid, "--gid", 1),
];

impl DirectiveKind {
    /// Looks up this kind's row in [`DIRECTIVES`].
    #[must_use]
    pub fn spec(self) -> &'static DirectiveSpec {
        DIRECTIVES
            .iter()
            .find(|spec| spec.kind == self)
            .unwrap_or_else(|| unreachable!("{self:?} has no entry in DIRECTIVES"))
    }
}

/// A single sandbox intent together with its arguments.
///
/// Serialized form is tagged by `type` using the bubblewrap flag name, e.g.
/// `{ type = "ro-bind", source = "/usr" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", deny_unknown_fields)]
pub enum Directive {
    /// Read-only bind mount; `dest` defaults to `source`.
    #[serde(rename = "ro-bind")]
    ReadOnlyBind {
        source: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dest: Option<String>,
    },
    /// Read/write bind mount; `dest` defaults to `source`.
    #[serde(rename = "bind")]
    Bind {
        source: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dest: Option<String>,
    },
    #[serde(rename = "symlink")]
    Symlink { source: String, dest: String },
    /// procfs mount; `dest` defaults to `/proc`.
    #[serde(rename = "proc")]
    Proc {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dest: Option<String>,
    },
    /// devtmpfs mount; `dest` defaults to `/dev`.
    #[serde(rename = "dev")]
    Dev {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dest: Option<String>,
    },
    #[serde(rename = "tmpfs")]
    Tmpfs { dest: String },
    #[serde(rename = "dir")]
    Dir { dest: String },
    // Empty struct variants so `deny_unknown_fields` also covers them.
    #[serde(rename = "new-session")]
    NewSession {},
    #[serde(rename = "die-with-parent")]
    DieWithParent {},
    #[serde(rename = "hostname")]
    Hostname { name: String },
    #[serde(rename = "chdir")]
    Chdir { dir: String },
    #[serde(rename = "unsetenv")]
    UnsetEnv { name: String },
    #[serde(rename = "setenv")]
    SetEnv { name: String, value: String },
    #[serde(rename = "unshare")]
    Unshare { namespace: Namespace },
    #[serde(rename = "uid")]
    Uid { uid: u32 },
    #[serde(rename = "gid")]
    Gid { gid: u32 },
}

impl Directive {
    #[must_use]
    pub fn kind(&self) -> DirectiveKind {
        match self {
            Self::ReadOnlyBind { .. } => DirectiveKind::ReadOnlyBind,
            Self::Bind { .. } => DirectiveKind::Bind,
            Self::Symlink { .. } => DirectiveKind::Symlink,
            Self::Proc { .. } => DirectiveKind::Proc,
            Self::Dev { .. } => DirectiveKind::Dev,
            Self::Tmpfs { .. } => DirectiveKind::Tmpfs,
            Self::Dir { .. } => DirectiveKind::Dir,
            Self::NewSession {} => DirectiveKind::NewSession,
            Self::DieWithParent {} => DirectiveKind::DieWithParent,
            Self::Hostname { .. } => DirectiveKind::Hostname,
            Self::Chdir { .. } => DirectiveKind::Chdir,
            Self::UnsetEnv { .. } => DirectiveKind::UnsetEnv,
            Self::SetEnv { .. } => DirectiveKind::SetEnv,
            Self::Unshare { namespace } => DirectiveKind::Unshare(*namespace),
            Self::Uid { .. } => DirectiveKind::Uid,
            Self::Gid { .. } => DirectiveKind::Gid,
        }
    }

    /// Argument tokens following the flag, with defaults resolved.
    fn args(&self) -> Vec<String> {
        match self {
            Self::ReadOnlyBind { source, dest } | Self::Bind { source, dest } => {
                let dest = dest.clone().unwrap_or_else(|| source.clone());
                vec![source.clone(), dest]
            }
            Self::Symlink { source, dest } => vec![source.clone(), dest.clone()],
            Self::Proc { dest } => vec![dest.as_deref().unwrap_or(DEFAULT_PROC_DEST).to_string()],
            Self::Dev { dest } => vec![dest.as_deref().unwrap_or(DEFAULT_DEV_DEST).to_string()],
            Self::Tmpfs { dest } | Self::Dir { dest } => vec![dest.clone()],
            Self::NewSession {} | Self::DieWithParent {} | Self::Unshare { .. } => Vec::new(),
            Self::Hostname { name } | Self::UnsetEnv { name } => vec![name.clone()],
            Self::Chdir { dir } => vec![dir.clone()],
            Self::SetEnv { name, value } => vec![name.clone(), value.clone()],
            Self::Uid { uid } => vec![uid.to_string()],
            Self::Gid { gid } => vec![gid.to_string()],
        }
    }

    /// Expands this directive into its complete token group: the flag
    /// followed by exactly `arity` arguments.
    #[must_use]
    pub fn tokens(&self) -> Vec<String> {
        let spec = self.kind().spec();
        let args = self.args();
        debug_assert_eq!(args.len(), spec.arity, "{:?} arity mismatch", spec.kind);

        let mut tokens = Vec::with_capacity(1 + args.len());
        tokens.push(spec.flag.to_string());
        tokens.extend(args);
        tokens
    }
}
