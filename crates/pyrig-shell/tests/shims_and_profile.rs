use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use pyrig_backend::{ProfileInit, PythonVersion, ResolvedRuntime, ShimStyle};
use pyrig_platform::{HostEnvironment, HostKind};
use pyrig_shell::{
    PathUpdate, ShellConfig, ShellType, ensure_profile_init, install_shims, update_profile_path,
};
use tempfile::tempdir;

fn runtime(root: &Path, style: ShimStyle) -> ResolvedRuntime {
    ResolvedRuntime {
        version: PythonVersion::series(3, 12),
        interpreter: root.join("python3.12"),
        pip: root.join("pip3.12"),
        style,
    }
}

fn env(home: &Path, path: &str) -> HostEnvironment {
    HostEnvironment {
        kind: HostKind::Native,
        home: home.to_path_buf(),
        path: path.to_string(),
        shell: Some("/bin/bash".to_string()),
        user: Some("dev".to_string()),
    }
}

fn entries(dir: &Path) -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .expect("read bin dir")
        .map(|entry| entry.expect("dir entry").path())
        .collect();
    entries.sort();
    entries
}

#[test]
fn symlink_shims_are_idempotent() {
    let temp_dir = tempdir().expect("create temp dir");
    let bin = temp_dir.path().join(".local/bin");
    let runtime = runtime(Path::new("/usr/bin"), ShimStyle::Symlink);

    install_shims(&bin, &runtime).expect("first install");
    install_shims(&bin, &runtime).expect("second install");

    assert_eq!(entries(&bin), vec![bin.join("pip"), bin.join("python")]);
    assert_eq!(
        fs::read_link(bin.join("python")).expect("python is a link"),
        PathBuf::from("/usr/bin/python3.12")
    );
    assert_eq!(
        fs::read_link(bin.join("pip")).expect("pip is a link"),
        PathBuf::from("/usr/bin/pip3.12")
    );
}

#[test]
fn shims_replace_previous_files_and_links() {
    let temp_dir = tempdir().expect("create temp dir");
    let bin = temp_dir.path().join("bin");
    fs::create_dir_all(&bin).expect("create bin");
    fs::write(bin.join("python"), "#!/bin/sh\nexec /usr/bin/python2 \"$@\"\n").expect("old shim");
    std::os::unix::fs::symlink("/does/not/exist", bin.join("pip")).expect("dangling link");

    let runtime = runtime(Path::new("/usr/bin"), ShimStyle::Symlink);
    install_shims(&bin, &runtime).expect("install over old entries");

    assert_eq!(
        fs::read_link(bin.join("pip")).expect("pip is a link"),
        PathBuf::from("/usr/bin/pip3.12")
    );
    assert!(
        fs::symlink_metadata(bin.join("python"))
            .expect("python exists")
            .file_type()
            .is_symlink()
    );
}

#[test]
fn wrapper_shims_are_executable_scripts() {
    let temp_dir = tempdir().expect("create temp dir");
    let bin = temp_dir.path().join("bin");
    let runtime = runtime(
        Path::new("/home/dev/.pyenv/shims"),
        ShimStyle::Wrapper {
            preamble: vec!["eval \"$(pyenv init -)\"".to_string()],
        },
    );

    install_shims(&bin, &runtime).expect("first install");
    install_shims(&bin, &runtime).expect("second install");

    let script = fs::read_to_string(bin.join("python")).expect("read wrapper");
    assert!(script.starts_with("#!/usr/bin/env bash\n"));
    assert!(script.contains("exec \"/home/dev/.pyenv/shims/python3.12\" \"$@\""));
    let mode = fs::metadata(bin.join("pip")).expect("pip").permissions().mode();
    assert_eq!(mode & 0o777, 0o755);
    assert_eq!(entries(&bin).len(), 2);
}

#[test]
fn profile_update_twice_writes_one_line() {
    let temp_dir = tempdir().expect("create temp dir");
    let home = temp_dir.path();
    let profile = home.join(".bashrc");
    fs::write(&profile, "alias ll='ls -l'\n").expect("write profile");
    let env = env(home, "/usr/bin:/bin");
    let local_bin = home.join(".local/bin");

    let mut config = ShellConfig::load(ShellType::Bash, profile.clone()).expect("load");
    let first = update_profile_path(&mut config, &env, &local_bin).expect("first update");
    let mut config = ShellConfig::load(ShellType::Bash, profile.clone()).expect("reload");
    let second = update_profile_path(&mut config, &env, &local_bin).expect("second update");

    assert!(matches!(first, PathUpdate::Added { .. }));
    assert_eq!(second, PathUpdate::AlreadyInProfile);
    let content = fs::read_to_string(&profile).expect("read profile");
    assert!(content.starts_with("alias ll='ls -l'\n"));
    assert_eq!(
        content.matches("export PATH=\"$HOME/.local/bin:$PATH\"").count(),
        1
    );
}

#[test]
fn dir_already_on_path_leaves_profile_untouched() {
    let temp_dir = tempdir().expect("create temp dir");
    let home = temp_dir.path();
    let profile = home.join(".profile");
    let local_bin = home.join(".local/bin");
    let env = env(home, &format!("{}:/usr/bin", local_bin.display()));

    let mut config = ShellConfig::load(ShellType::Sh, profile.clone()).expect("load");
    let update = update_profile_path(&mut config, &env, &local_bin).expect("update");

    assert_eq!(update, PathUpdate::AlreadyInPath);
    assert!(!profile.exists());
}

#[test]
fn profile_init_block_is_added_once() {
    let temp_dir = tempdir().expect("create temp dir");
    let profile = temp_dir.path().join(".zshrc");
    let init = ProfileInit {
        marker: "pyenv init",
        label: "pyenv",
        command: "export PYENV_ROOT=\"$HOME/.pyenv\"\neval \"$(pyenv init -)\"".to_string(),
    };

    let mut config = ShellConfig::load(ShellType::Zsh, profile.clone()).expect("load");
    assert!(ensure_profile_init(&mut config, &init).expect("first"));
    let mut config = ShellConfig::load(ShellType::Zsh, profile.clone()).expect("reload");
    assert!(!ensure_profile_init(&mut config, &init).expect("second"));

    let content = fs::read_to_string(&profile).expect("read profile");
    assert_eq!(content.matches("pyenv init").count(), 1);
    assert!(content.starts_with("# pyenv\n"));
}
