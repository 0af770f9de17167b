//! Integration tests for loading sandbox profiles from disk.

use std::io::Write;

use bwrap_launcher::error::ConfigError;
use bwrap_launcher::sandbox::{Directive, SandboxConfig};

fn write_profile(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create profile");
    file.write_all(text.as_bytes()).expect("write profile");
    file
}

/// Test that a profile file replays into the same command as the builder.
#[test]
fn test_profile_file_round_trip() {
    let file = write_profile(
        r#"
        binary = "/usr/bin/bwrap"
        clear_env = true

        [[directives]]
        type = "ro-bind"
        source = "/usr"

        [[directives]]
        type = "symlink"
        source = "usr/bin"
        dest = "/bin"

        [[directives]]
        type = "proc"

        [[directives]]
        type = "unshare"
        namespace = "all"

        [[directives]]
        type = "die-with-parent"
        "#,
    );

    let bwrap = SandboxConfig::from_path(file.path())
        .expect("valid profile")
        .into_bubblewrap();

    assert_eq!(
        bwrap.build_command(["sh"]),
        [
            "env",
            "-i",
            "/usr/bin/bwrap",
            "--ro-bind",
            "/usr",
            "/usr",
            "--symlink",
            "usr/bin",
            "/bin",
            "--proc",
            "/proc",
            "--unshare-all",
            "--die-with-parent",
            "sh",
        ]
    );
}

/// Test that an empty profile behaves like a fresh builder.
#[test]
fn test_empty_profile() {
    let file = write_profile("");
    let config = SandboxConfig::from_path(file.path()).expect("empty profile is valid");
    assert_eq!(config, SandboxConfig::default());
    assert_eq!(config.into_bubblewrap().build_command(["ls"]), ["bwrap", "ls"]);
}

/// Test that a missing file reports a read error with its path.
#[test]
fn test_missing_profile() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("absent.toml");

    let err = SandboxConfig::from_path(&path).expect_err("file does not exist");
    match err {
        ConfigError::Read { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("expected read error, got {other:?}"),
    }
}

/// Test that a directive missing a required field is rejected.
#[test]
fn test_incomplete_directive() {
    let file = write_profile(
        r#"
        [[directives]]
        type = "setenv"
        name = "ONLY_NAME"
        "#,
    );

    let err = SandboxConfig::from_path(file.path()).expect_err("value is required");
    assert!(matches!(err, ConfigError::Parse { .. }));
}

/// Test that a serialized profile parses back to the same directives.
#[test]
fn test_serialized_profile_parses_back() {
    let config = SandboxConfig::new()
        .with_clear_env(true)
        .with_directive(Directive::Bind {
            source: "/srv".into(),
            dest: None,
        })
        .with_directive(Directive::NewSession {});

    let text = toml::to_string(&config).expect("serialize profile");
    let file = write_profile(&text);
    let parsed = SandboxConfig::from_path(file.path()).expect("parse serialized profile");

    assert_eq!(parsed, config);
}
