use std::path::Path;

use log::{debug, info};

use pyrig_backend::ProfileInit;
use pyrig_platform::HostEnvironment;

use crate::config::{ConfigError, ShellConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathUpdate {
    AlreadyInPath,
    AlreadyInProfile,
    Added { line: String },
}

/// How `dir` is spelled in the profile: relative to `$HOME` when it lives
/// there, so the line survives a renamed home directory.
fn profile_entry(env: &HostEnvironment, dir: &Path) -> String {
    match dir.strip_prefix(&env.home) {
        Ok(relative) if relative.as_os_str().is_empty() => "$HOME".to_string(),
        Ok(relative) => format!("$HOME/{}", relative.display()),
        Err(_) => dir.display().to_string(),
    }
}

#[must_use]
pub fn path_export_line(env: &HostEnvironment, dir: &Path) -> String {
    format!("export PATH=\"{}:$PATH\"", profile_entry(env, dir))
}

/// Prepend `dir` to `PATH` in the profile unless the running environment
/// already has it or the profile already mentions it.
pub fn update_profile_path(
    config: &mut ShellConfig,
    env: &HostEnvironment,
    dir: &Path,
) -> Result<PathUpdate, ConfigError> {
    if env.path_contains(dir) {
        debug!("{} is already in PATH", dir.display());
        return Ok(PathUpdate::AlreadyInPath);
    }

    let entry = profile_entry(env, dir);
    let absolute = dir.display().to_string();
    if config.content.contains(&entry) || config.content.contains(&absolute) {
        debug!(
            "{} already mentions {entry}",
            config.config_path.display()
        );
        return Ok(PathUpdate::AlreadyInProfile);
    }

    let edit = config.add_path_entry(&entry);
    debug!("Profile edit:\n{}", edit.diff_preview());
    config.apply_edit(&edit)?;
    info!(
        "Added {entry} to PATH in {}; open a new shell to pick it up",
        config.config_path.display()
    );

    Ok(PathUpdate::Added {
        line: path_export_line(env, dir),
    })
}

/// Append a provider's init block once. Returns whether the file changed.
pub fn ensure_profile_init(
    config: &mut ShellConfig,
    init: &ProfileInit,
) -> Result<bool, ConfigError> {
    if config.has_init(init.marker) {
        debug!(
            "{} already initialises {}",
            config.config_path.display(),
            init.label
        );
        return Ok(false);
    }

    let edit = config.add_init(&init.command, init.label);
    debug!("Profile edit:\n{}", edit.diff_preview());
    config.apply_edit(&edit)?;
    info!(
        "Added {} initialization to {}",
        init.label,
        config.config_path.display()
    );
    Ok(true)
}
