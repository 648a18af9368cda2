use crate::detect::ShellType;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error on {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    fn io(path: &std::path::Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| ConfigError::IoError {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A shell startup file held in memory. Edits are computed first and written
/// with [`ShellConfig::apply_edit`].
pub struct ShellConfig {
    pub shell_type: ShellType,
    pub config_path: PathBuf,
    pub content: String,
}

impl ShellConfig {
    pub fn load(shell_type: ShellType, config_path: PathBuf) -> Result<Self, ConfigError> {
        let content = if config_path.exists() {
            fs::read_to_string(&config_path).map_err(ConfigError::io(&config_path))?
        } else {
            String::new()
        };

        Ok(Self {
            shell_type,
            config_path,
            content,
        })
    }

    #[must_use]
    pub fn has_init(&self, marker: &str) -> bool {
        self.content.contains(marker)
    }

    /// Append `init_command` under a `# label` comment.
    pub fn add_init(&self, init_command: &str, label: &str) -> ShellConfigEdit {
        ShellConfigEdit {
            original: self.content.clone(),
            modified: self.append(&format!("# {label}\n{init_command}\n")),
            changes: vec![format!("Add {label} initialization")],
        }
    }

    /// Append a line that puts `entry` in front of `PATH`.
    pub fn add_path_entry(&self, entry: &str) -> ShellConfigEdit {
        let line = format!("export PATH=\"{entry}:$PATH\"");
        ShellConfigEdit {
            original: self.content.clone(),
            modified: self.append(&format!("# pyrig\n{line}\n")),
            changes: vec![format!("Add {entry} to PATH")],
        }
    }

    pub fn apply_edit(&mut self, edit: &ShellConfigEdit) -> Result<(), ConfigError> {
        if !edit.has_changes() {
            return Ok(());
        }

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::io(parent))?;
        }

        fs::write(&self.config_path, &edit.modified).map_err(ConfigError::io(&self.config_path))?;
        self.content.clone_from(&edit.modified);

        Ok(())
    }

    fn append(&self, block: &str) -> String {
        let mut modified = self.content.clone();
        if !modified.is_empty() && !modified.ends_with('\n') {
            modified.push('\n');
        }
        if !modified.is_empty() {
            modified.push('\n');
        }
        modified.push_str(block);
        modified
    }
}

pub struct ShellConfigEdit {
    pub original: String,
    pub modified: String,
    pub changes: Vec<String>,
}

impl ShellConfigEdit {
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    #[must_use]
    pub fn diff_preview(&self) -> String {
        if !self.has_changes() {
            return "No changes needed.".to_string();
        }

        let mut preview = String::new();

        for change in &self.changes {
            let _ = writeln!(preview, "+ {change}");
        }

        preview
    }
}
