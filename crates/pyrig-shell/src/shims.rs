use std::fmt::Write as _;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;

use pyrig_backend::{ResolvedRuntime, ShimStyle};

#[derive(Error, Debug)]
pub enum ShimError {
    #[error("Failed to create {dir}: {source}")]
    CreateDir {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to remove old shim {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write shim {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Script that runs `preamble` and then execs `target` with the caller's
/// arguments.
#[must_use]
pub fn wrapper_script(preamble: &[String], target: &Path) -> String {
    let mut script = String::from("#!/usr/bin/env bash\n");
    for line in preamble {
        let _ = writeln!(script, "{line}");
    }
    let _ = writeln!(script, "exec \"{}\" \"$@\"", target.display());
    script
}

fn remove_existing(path: &Path) -> Result<(), ShimError> {
    // symlink_metadata so that dangling links are seen too.
    match fs::symlink_metadata(path) {
        Ok(_) => {
            debug!("Removing old shim {}", path.display());
            fs::remove_file(path).map_err(|source| ShimError::Remove {
                path: path.to_path_buf(),
                source,
            })
        }
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(ShimError::Remove {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn write_shim(path: &Path, target: &Path, style: &ShimStyle) -> io::Result<()> {
    match style {
        ShimStyle::Symlink => std::os::unix::fs::symlink(target, path),
        ShimStyle::Wrapper { preamble } => {
            fs::write(path, wrapper_script(preamble, target))?;
            fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        }
    }
}

/// Replace `python` and `pip` in `bin_dir` with shims for `runtime`. Any
/// previous entry under those names is removed first.
pub fn install_shims(bin_dir: &Path, runtime: &ResolvedRuntime) -> Result<Vec<PathBuf>, ShimError> {
    fs::create_dir_all(bin_dir).map_err(|source| ShimError::CreateDir {
        dir: bin_dir.to_path_buf(),
        source,
    })?;

    let mut installed = Vec::with_capacity(2);
    for (name, target) in [("python", &runtime.interpreter), ("pip", &runtime.pip)] {
        let path = bin_dir.join(name);
        remove_existing(&path)?;
        write_shim(&path, target, &runtime.style).map_err(|source| ShimError::Write {
            path: path.clone(),
            source,
        })?;
        info!("{} -> {}", path.display(), target.display());
        installed.push(path);
    }

    Ok(installed)
}
